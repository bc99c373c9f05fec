use std::sync::Arc;

use super::{AuditDetail, AuditRecord, AuditSink, OperationName, OperationResult, TracingAuditSink};
use crate::context::{RequestContext, ITEM_OBJECT, ITEM_OBJECT_TYPE, ITEM_USER};

/// Builds audit records from the request context and hands them to a sink.
///
/// The object id, object type and actor are read from the context items
/// `obj`, `obj-type` and `usr`; every other item is copied into the
/// record's fields. A failed append is logged as a warning and otherwise
/// ignored.
#[derive(Clone)]
pub struct AuditLogger {
    sink: Arc<dyn AuditSink>,
}

impl AuditLogger {
    /// Creates a logger writing to `sink`.
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Creates a logger that emits records as `tracing` events only.
    pub fn tracing() -> Self {
        Self::new(Arc::new(TracingAuditSink))
    }

    /// Records one mutation outcome.
    pub fn record(
        &self,
        ctx: &RequestContext,
        operation: OperationName,
        result: OperationResult,
        detail: AuditDetail,
    ) {
        let actor = ctx
            .item_str(ITEM_USER)
            .map(str::to_string)
            .unwrap_or_else(|| ctx.principal().owner_and_name());

        let mut record = AuditRecord::new(ctx.correlation_id(), operation, result)
            .with_object(
                ctx.item_str(ITEM_OBJECT_TYPE).unwrap_or_default(),
                ctx.item_str(ITEM_OBJECT).unwrap_or_default(),
            )
            .with_actor(actor)
            .with_detail(detail);

        for (key, value) in ctx.items() {
            if matches!(key.as_str(), ITEM_OBJECT | ITEM_OBJECT_TYPE | ITEM_USER) {
                continue;
            }
            record = record.with_field(key.clone(), value.clone());
        }

        if let Err(e) = self.sink.append(&record) {
            ctx.log()
                .warn(format_args!("audit append failed for {operation}: {e}"));
        }
    }
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::tracing()
    }
}

impl std::fmt::Debug for AuditLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLogger").finish_non_exhaustive()
    }
}
