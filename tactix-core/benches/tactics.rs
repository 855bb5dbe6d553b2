//! Criterion benchmarks for tactix-core
//!
//! These benchmarks can be run with:
//! ```bash
//! cargo bench -p tactix-core
//! ```

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tactix_core::ast::{TermKind, TermManager};
use tactix_core::goal::Goal;
use tactix_core::resource::TacticContext;
use tactix_core::rewrite::ThRewriter;
use tactix_core::tactic::{
    and_then, mk_bit_blast_tactic, mk_simplify_tactic, mk_solve_eqs_tactic,
    mk_split_clause_tactic, or_else, repeat, skip,
};

/// Rewrite `sum_i (i+1)*x_i <= n` over integers
fn bench_rewrite_linear(c: &mut Criterion) {
    let mut group = c.benchmark_group("rewrite_linear");

    for n in [10usize, 50, 200] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut tm = TermManager::new();
                let int = tm.sorts.int_sort;
                let mut terms = Vec::with_capacity(n);
                for i in 0..n {
                    let x = tm.mk_var(&format!("x{i}"), int);
                    let k = tm.mk_int(i as i64 + 1);
                    terms.push(tm.mk_mul([k, x]));
                }
                let sum = tm.mk_add(terms);
                let bound = tm.mk_int(n as i64);
                let atom = tm.mk_le(sum, bound);
                let mut rw = ThRewriter::default();
                black_box(rw.rewrite(&mut tm, atom))
            });
        });
    }

    group.finish();
}

/// Bit-blast `x * y = c` at increasing widths
fn bench_bit_blast_mul(c: &mut Criterion) {
    let mut group = c.benchmark_group("bit_blast_mul");

    for width in [4u32, 8, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, &width| {
            b.iter(|| {
                let mut tm = TermManager::new();
                let bv = tm.sorts.bitvec(width);
                let x = tm.mk_var("x", bv);
                let y = tm.mk_var("y", bv);
                let prod = tm.mk_app(TermKind::BvMul(x, y));
                let k = tm.mk_bv(6, width);
                let f = tm.mk_eq(prod, k);
                let mut g = Goal::new(true, false, false).unwrap();
                g.assert_expr(&mut tm, f);
                let mut ctx = TacticContext::new(&mut tm);
                black_box(mk_bit_blast_tactic().apply(g, &mut ctx))
            });
        });
    }

    group.finish();
}

/// Case splitting followed by equation solving on a chain of clauses
fn bench_split_pipeline(c: &mut Criterion) {
    c.bench_function("split_solve_eqs_chain", |b| {
        b.iter(|| {
            let mut tm = TermManager::new();
            let bool_sort = tm.sorts.bool_sort;
            let atoms: Vec<_> = (0..6).map(|i| tm.mk_var(&format!("p{i}"), bool_sort)).collect();
            let mut g = Goal::new(true, false, false).unwrap();
            for w in atoms.windows(2) {
                let np = tm.mk_not(w[0]);
                let clause = tm.mk_or([np, w[1]]);
                g.assert_expr(&mut tm, clause);
            }
            let mut t = and_then(
                mk_simplify_tactic(),
                repeat(
                    or_else(and_then(mk_split_clause_tactic(), mk_solve_eqs_tactic()), skip()),
                    Some(4),
                ),
            );
            let mut ctx = TacticContext::new(&mut tm);
            black_box(t.apply(g, &mut ctx))
        });
    });
}

criterion_group!(
    benches,
    bench_rewrite_linear,
    bench_bit_blast_mul,
    bench_split_pipeline
);
criterion_main!(benches);
