//! Monotonic call counters shared across concurrent calls.

use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for every call the gateway has handled.
///
/// Cheap to clone; clones share the same counters. Counters only grow until
/// an operator calls [`CallStats::reset`].
#[derive(Debug, Clone, Default)]
pub struct CallStats {
    inner: Arc<CallStatsInner>,
}

#[derive(Debug, Default)]
struct CallStatsInner {
    total: AtomicU64,
    success: AtomicU64,
    failure: AtomicU64,
    retries: AtomicU64,
    timeouts: AtomicU64,
    quality_rejections: AtomicU64,
    concurrency_limit_hits: AtomicU64,
}

/// Point-in-time copy of [`CallStats`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatsSnapshot {
    /// Calls handled
    pub total: u64,
    /// Calls that returned content
    pub success: u64,
    /// Calls that returned an error
    pub failure: u64,
    /// Attempts beyond the first, summed over all calls
    pub retries: u64,
    /// Attempts that overran their deadline
    pub timeouts: u64,
    /// Calls rejected by the quality gate
    pub quality_rejections: u64,
    /// Admissions that found every slot taken
    pub concurrency_limit_hits: u64,
    /// success / total, or 0 before the first call
    pub success_rate: f64,
}

impl CallStats {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a finished call.
    pub fn record_call(&self, success: bool) {
        self.inner.total.fetch_add(1, Ordering::Relaxed);
        if success {
            self.inner.success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.inner.failure.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Count retry attempts and deadline overruns for one call.
    pub fn record_attempts(&self, retries: u32, timeouts: u32) {
        self.inner
            .retries
            .fetch_add(u64::from(retries), Ordering::Relaxed);
        self.inner
            .timeouts
            .fetch_add(u64::from(timeouts), Ordering::Relaxed);
    }

    /// Count a quality gate rejection.
    pub fn record_quality_rejection(&self) {
        self.inner.quality_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Count an admission that had to wait or was turned away.
    pub fn record_concurrency_limit_hit(&self) {
        self.inner
            .concurrency_limit_hits
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Calls handled.
    pub fn total(&self) -> u64 {
        self.inner.total.load(Ordering::Relaxed)
    }

    /// Calls that returned content.
    pub fn success(&self) -> u64 {
        self.inner.success.load(Ordering::Relaxed)
    }

    /// Calls that returned an error.
    pub fn failure(&self) -> u64 {
        self.inner.failure.load(Ordering::Relaxed)
    }

    /// Retry attempts.
    pub fn retries(&self) -> u64 {
        self.inner.retries.load(Ordering::Relaxed)
    }

    /// Deadline overruns.
    pub fn timeouts(&self) -> u64 {
        self.inner.timeouts.load(Ordering::Relaxed)
    }

    /// Quality gate rejections.
    pub fn quality_rejections(&self) -> u64 {
        self.inner.quality_rejections.load(Ordering::Relaxed)
    }

    /// Admissions that found the gate full.
    pub fn concurrency_limit_hits(&self) -> u64 {
        self.inner.concurrency_limit_hits.load(Ordering::Relaxed)
    }

    /// Copy every counter.
    pub fn snapshot(&self) -> StatsSnapshot {
        let total = self.total();
        let success = self.success();
        StatsSnapshot {
            total,
            success,
            failure: self.failure(),
            retries: self.retries(),
            timeouts: self.timeouts(),
            quality_rejections: self.quality_rejections(),
            concurrency_limit_hits: self.concurrency_limit_hits(),
            success_rate: if total == 0 {
                0.0
            } else {
                success as f64 / total as f64
            },
        }
    }

    /// Zero every counter. Operator action only.
    pub fn reset(&self) {
        let inner = &self.inner;
        for counter in [
            &inner.total,
            &inner.success,
            &inner.failure,
            &inner.retries,
            &inner.timeouts,
            &inner.quality_rejections,
            &inner.concurrency_limit_hits,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
