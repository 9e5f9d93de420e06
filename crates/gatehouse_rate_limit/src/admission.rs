//! Concurrency admission control using a Tokio Semaphore.

use crate::GatewaySettings;
use gatehouse_error::{GatewayError, GatewayErrorKind, GatewayResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Bounds the number of in-flight calls.
///
/// Callers that find every slot taken wait in the semaphore's FIFO queue. An
/// optional backlog cap limits how many may wait; arrivals beyond it are
/// rejected immediately.
///
/// # Example
///
/// ```
/// use gatehouse_rate_limit::AdmissionGate;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let gate = AdmissionGate::new(2, None);
/// let permit = gate.acquire().await?;
/// assert!(!permit.waited());
/// assert_eq!(gate.in_flight(), 1);
/// drop(permit);
/// assert_eq!(gate.in_flight(), 0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    max_waiting: Option<usize>,
    waiting: Arc<AtomicUsize>,
    limit_hits: Arc<AtomicU64>,
}

impl AdmissionGate {
    /// Create a gate admitting `capacity` concurrent calls (at least one).
    pub fn new(capacity: usize, max_waiting: Option<usize>) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            max_waiting,
            waiting: Arc::new(AtomicUsize::new(0)),
            limit_hits: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create a gate from gateway settings.
    pub fn from_settings(settings: &GatewaySettings) -> Self {
        Self::new(settings.max_concurrent_calls, settings.max_waiting_calls)
    }

    /// Acquire a slot, suspending until one frees.
    ///
    /// # Errors
    ///
    /// Returns `AdmissionRejected` when the backlog is full.
    pub async fn acquire(&self) -> GatewayResult<AdmissionPermit> {
        if let Ok(permit) = self.semaphore.clone().try_acquire_owned() {
            return Ok(AdmissionPermit {
                _permit: permit,
                waited: false,
            });
        }

        self.limit_hits.fetch_add(1, Ordering::Relaxed);

        let _waiter = self.enter_backlog()?;
        debug!(
            capacity = self.capacity,
            waiting = self.waiting(),
            "Concurrency limit reached, waiting for a slot"
        );

        let permit = self.semaphore.clone().acquire_owned().await.map_err(|_| {
            GatewayError::new(GatewayErrorKind::AdmissionRejected(
                "admission gate closed".to_string(),
            ))
        })?;

        Ok(AdmissionPermit {
            _permit: permit,
            waited: true,
        })
    }

    fn enter_backlog(&self) -> GatewayResult<BacklogGuard> {
        let entered = match self.max_waiting {
            None => {
                self.waiting.fetch_add(1, Ordering::AcqRel);
                true
            }
            Some(max) => self
                .waiting
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                    (current < max).then_some(current + 1)
                })
                .is_ok(),
        };

        if entered {
            Ok(BacklogGuard {
                waiting: Arc::clone(&self.waiting),
            })
        } else {
            warn!(
                capacity = self.capacity,
                max_waiting = ?self.max_waiting,
                "Admission backlog full, rejecting call"
            );
            Err(GatewayError::new(GatewayErrorKind::AdmissionRejected(
                format!(
                    "{} calls in flight and {} waiting",
                    self.capacity,
                    self.waiting()
                ),
            )))
        }
    }

    /// Configured concurrency cap.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently held.
    pub fn in_flight(&self) -> usize {
        self.capacity - self.semaphore.available_permits()
    }

    /// Callers currently waiting for a slot.
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::Acquire)
    }

    /// Acquisitions that found the gate full since creation.
    pub fn limit_hits(&self) -> u64 {
        self.limit_hits.load(Ordering::Relaxed)
    }
}

/// Leaves the backlog on drop, including when the waiting future is cancelled.
struct BacklogGuard {
    waiting: Arc<AtomicUsize>,
}

impl Drop for BacklogGuard {
    fn drop(&mut self) {
        self.waiting.fetch_sub(1, Ordering::AcqRel);
    }
}

/// RAII guard for an admission slot.
///
/// Releases the slot when dropped, on every exit path.
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: tokio::sync::OwnedSemaphorePermit,
    waited: bool,
}

impl AdmissionPermit {
    /// Whether this acquisition had to wait for a slot.
    pub fn waited(&self) -> bool {
        self.waited
    }
}
