//! Worklist Fixed-Point Solver
//!
//! The engine's core loop: pop `(pointer, delta)` entries, grow points-to
//! sets, propagate along the pointer-flow graph, derive field/array/call
//! work from variable deltas, and keep the call graph and plug-ins in sync.

mod engine;

pub use engine::{Solver, SolverCore};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cooperative cancellation checked between worklist pops. Cancellation
/// leaves a partial (under-approximate) result; no cleanup is required.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancellationToken {
    /// `time_limit` in seconds; 0 means no deadline.
    pub fn new(time_limit: u64) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: (time_limit > 0).then(|| Instant::now() + Duration::from_secs(time_limit)),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        if self.flag.load(Ordering::Relaxed) {
            return true;
        }
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Counters reported by the result processor.
#[derive(Debug, Clone, Default)]
pub struct SolverStats {
    pub pops: usize,
    pub propagations: usize,
    pub duration_ms: f64,
    pub cancelled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_manual_cancel() {
        let token = CancellationToken::new(0);
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
        // clones observe the same flag
        let clone = token.clone();
        assert!(clone.is_cancelled());
    }
}
