use std::sync::Arc;

use thiserror::Error;

use super::AuditRecord;

/// Tracing target audit records are emitted on.
pub const AUDIT_TARGET: &str = "tenant_audit";

/// Error returned when a record cannot be appended.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// The sink's backing service is unreachable.
    #[error("audit sink unavailable: {0}")]
    Unavailable(String),
    /// The sink reached its capacity.
    #[error("audit sink full")]
    Full,
}

/// Destination for audit records.
///
/// Appending is best-effort: the audit logger reports a failed append as a
/// warning and the request carries on.
pub trait AuditSink: Send + Sync {
    /// Appends one record.
    ///
    /// # Errors
    ///
    /// Returns `SinkError` if the record could not be stored.
    fn append(&self, record: &AuditRecord) -> Result<(), SinkError>;
}

impl<S: AuditSink + ?Sized> AuditSink for Arc<S> {
    fn append(&self, record: &AuditRecord) -> Result<(), SinkError> {
        (**self).append(record)
    }
}

/// Writes every record as a structured `tracing` event on the
/// [`AUDIT_TARGET`] target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn append(&self, record: &AuditRecord) -> Result<(), SinkError> {
        tracing::info!(
            target: AUDIT_TARGET,
            correlation_id = %record.correlation_id(),
            operation = %record.operation(),
            result = %record.result(),
            object_type = %record.object_type(),
            object_id = %record.object_id(),
            actor = %record.actor(),
            detail = %record.detail(),
            "audit record"
        );
        Ok(())
    }
}

/// Sends every record to several sinks.
///
/// All sinks are attempted; the first error is returned afterwards.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn AuditSink>>,
}

impl FanoutSink {
    /// Creates an empty fan-out.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a destination.
    pub fn with(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl AuditSink for FanoutSink {
    fn append(&self, record: &AuditRecord) -> Result<(), SinkError> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.append(record) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
