//! In-memory audit trail.

use parking_lot::Mutex;

use super::{AuditRecord, AuditSink, OperationName, SinkError};

/// In-memory, queryable record store.
///
/// Records are kept in append order. With a capacity set, appends beyond it
/// fail with `SinkError::Full`.
///
/// # Example
///
/// ```
/// use tenant_pipeline::audit::{AuditRecord, AuditSink, AuditTrail, OperationName, OperationResult};
///
/// let trail = AuditTrail::new();
/// trail
///     .append(&AuditRecord::new("req-1", OperationName::WebhookAdd, OperationResult::Success))
///     .unwrap();
///
/// assert_eq!(trail.by_correlation_id("req-1").len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct AuditTrail {
    records: Mutex<Vec<AuditRecord>>,
    capacity: Option<usize>,
}

impl AuditTrail {
    /// Creates an unbounded trail.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a trail that holds at most `capacity` records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Mutex::new(Vec::with_capacity(capacity)),
            capacity: Some(capacity),
        }
    }

    /// Returns a snapshot of every record.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().clone()
    }

    /// Records for one operation.
    pub fn by_operation(&self, operation: OperationName) -> Vec<AuditRecord> {
        self.filter(|r| r.operation() == operation)
    }

    /// Records for one object.
    pub fn by_object_id(&self, object_id: &str) -> Vec<AuditRecord> {
        self.filter(|r| r.object_id() == object_id)
    }

    /// Records for one request.
    pub fn by_correlation_id(&self, correlation_id: &str) -> Vec<AuditRecord> {
        self.filter(|r| r.correlation_id() == correlation_id)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Drops every record.
    pub fn clear(&self) {
        self.records.lock().clear();
    }

    fn filter(&self, predicate: impl Fn(&AuditRecord) -> bool) -> Vec<AuditRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| predicate(r))
            .cloned()
            .collect()
    }
}

impl AuditSink for AuditTrail {
    fn append(&self, record: &AuditRecord) -> Result<(), SinkError> {
        let mut records = self.records.lock();
        if self.capacity.is_some_and(|cap| records.len() >= cap) {
            return Err(SinkError::Full);
        }
        records.push(record.clone());
        Ok(())
    }
}
