//! Bounded in-memory audit trail with optional persistence.

use gatehouse_core::AuditRecord;
use gatehouse_interface::AuditSink;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, warn};

/// Records kept in memory when no capacity is given.
pub const DEFAULT_AUDIT_CAPACITY: usize = 1000;

/// Ring of the most recent audit records.
///
/// When a sink is attached every appended record is also handed to it on a
/// background task. Sink failures are logged and never reach the caller.
#[derive(Clone)]
pub struct AuditLog {
    records: Arc<Mutex<VecDeque<AuditRecord>>>,
    capacity: usize,
    sink: Option<Arc<dyn AuditSink>>,
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIT_CAPACITY)
    }
}

impl AuditLog {
    /// Keep at most `capacity` records (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
            sink: None,
        }
    }

    /// Persist every appended record to `sink` as well.
    pub fn with_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Append a record, evicting the oldest when full.
    pub fn append(&self, record: AuditRecord) {
        if let Some(sink) = &self.sink {
            self.persist(Arc::clone(sink), record.clone());
        }

        let mut records = self.records.lock();
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    fn persist(&self, sink: Arc<dyn AuditSink>, record: AuditRecord) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(call_id = %record.call_id, "No runtime available, audit record not persisted");
            return;
        };
        handle.spawn(async move {
            match sink.persist(&record).await {
                Ok(()) => debug!(call_id = %record.call_id, "Audit record persisted"),
                Err(e) => warn!(call_id = %record.call_id, error = %e, "Failed to persist audit record"),
            }
        });
    }

    /// Up to `n` most recent records, oldest first.
    pub fn recent(&self, n: usize) -> Vec<AuditRecord> {
        let records = self.records.lock();
        let skip = records.len().saturating_sub(n);
        records.iter().skip(skip).cloned().collect()
    }

    /// Records currently held.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether no record has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Maximum records held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
