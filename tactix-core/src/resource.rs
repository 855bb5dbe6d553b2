//! Cancellation, resource limits and the context tactics run in.
//!
//! A [`TacticContext`] bundles the term manager with everything that can
//! interrupt a tactic: a shared [`CancellationToken`], [`ResourceLimits`]
//! on memory and rewrite steps, and an optional deadline installed by
//! `try_for`. Long-running code polls these through a [`ResourceGuard`] at
//! safe points (after each formula and in every rewriter iteration).

use crate::ast::TermManager;
use crate::error::{Result, TactixError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Shared cancellation flag.
///
/// Clones share the flag, so a token handed to another thread can stop a
/// running tactic.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Fresh, not canceled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Clear the flag so the token can be reused.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Memory and step limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Limit on the estimated term arena size in bytes
    pub max_memory: Option<usize>,
    /// Limit on rewrite steps per rewriter invocation
    pub max_steps: Option<u64>,
}

impl ResourceLimits {
    /// No limits.
    pub fn unbounded() -> Self {
        Self::default()
    }
}

/// Deadline installed by `try_for`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    /// When the budget expires
    pub at: Instant,
    /// The budget, reported in the timeout error
    pub budget_ms: u64,
}

impl Deadline {
    /// Deadline `ms` milliseconds from now.
    pub fn after_ms(ms: u64) -> Self {
        Self {
            at: Instant::now() + Duration::from_millis(ms),
            budget_ms: ms,
        }
    }

    /// The earlier of two optional deadlines.
    pub fn tightest(a: Option<Deadline>, b: Option<Deadline>) -> Option<Deadline> {
        match (a, b) {
            (Some(a), Some(b)) => Some(if a.at <= b.at { a } else { b }),
            (a, None) => a,
            (None, b) => b,
        }
    }
}

/// Snapshot of the interrupt sources of a context.
///
/// The guard does not borrow the context, so it can be polled while the
/// term manager is mutably borrowed elsewhere.
#[derive(Debug, Clone, Default)]
pub struct ResourceGuard {
    token: Option<CancellationToken>,
    deadline: Option<Deadline>,
    max_memory: Option<usize>,
}

impl ResourceGuard {
    /// A guard that never fires.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Fail if canceled, past the deadline, or over the memory limit.
    pub fn check(&self, tm: &TermManager) -> Result<()> {
        if self.token.as_ref().is_some_and(CancellationToken::is_canceled) {
            return Err(TactixError::Canceled);
        }
        if let Some(d) = self.deadline
            && Instant::now() >= d.at
        {
            return Err(TactixError::Timeout { ms: d.budget_ms });
        }
        if let Some(limit) = self.max_memory
            && tm.memory_estimate() > limit
        {
            return Err(TactixError::MemoryExceeded { limit });
        }
        Ok(())
    }
}

/// Everything a tactic needs besides its goal.
#[derive(Debug)]
pub struct TacticContext<'a> {
    /// Term manager shared by all goals of the session
    pub tm: &'a mut TermManager,
    token: CancellationToken,
    /// Memory and step limits
    pub limits: ResourceLimits,
    deadline: Option<Deadline>,
}

impl<'a> TacticContext<'a> {
    /// Context with a fresh token and no limits.
    pub fn new(tm: &'a mut TermManager) -> Self {
        Self::with_token(tm, CancellationToken::new())
    }

    /// Context observing an existing token.
    pub fn with_token(tm: &'a mut TermManager, token: CancellationToken) -> Self {
        Self {
            tm,
            token,
            limits: ResourceLimits::default(),
            deadline: None,
        }
    }

    /// Replace the limits.
    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// The cancellation token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Current deadline, if any.
    pub fn deadline(&self) -> Option<Deadline> {
        self.deadline
    }

    /// Install a deadline, returning the previous one.
    pub fn set_deadline(&mut self, deadline: Option<Deadline>) -> Option<Deadline> {
        std::mem::replace(&mut self.deadline, deadline)
    }

    /// Snapshot of the interrupt sources.
    pub fn guard(&self) -> ResourceGuard {
        ResourceGuard {
            token: Some(self.token.clone()),
            deadline: self.deadline,
            max_memory: self.limits.max_memory,
        }
    }

    /// Poll all interrupt sources.
    pub fn check(&self) -> Result<()> {
        self.guard().check(self.tm)
    }
}
