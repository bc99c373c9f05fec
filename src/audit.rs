//! Audit trail for tenant-scoped mutations.
//!
//! This module provides:
//! - `AuditRecord`: the immutable record of one mutation outcome
//! - `AuditSink`: destination trait, with `TracingAuditSink`, `AuditTrail` and `FanoutSink`
//! - `AuditLogger`: builds records from the request context and appends them
//!
//! Records carry identifiers and outcomes only. Payloads and secrets are
//! never copied into them.

mod event;
mod logger;
mod sink;
mod trail;

pub use event::{AuditDetail, AuditRecord, OperationName, OperationResult};
pub use logger::AuditLogger;
pub use sink::{AuditSink, FanoutSink, SinkError, TracingAuditSink, AUDIT_TARGET};
pub use trail::AuditTrail;
