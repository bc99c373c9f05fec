//! Audit record schema.
//!
//! Records carry identifiers and outcome metadata only. Request bodies and
//! secret-bearing fields never enter a record.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::error::Error;

/// Name of an audited mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OperationName {
    /// Application created
    #[serde(rename = "add-application")]
    ApplicationAdd,
    /// Application modified
    #[serde(rename = "application-update")]
    ApplicationUpdate,
    /// Application removed
    #[serde(rename = "application-delete")]
    ApplicationDelete,
    /// Webhook created
    #[serde(rename = "add-webhook")]
    WebhookAdd,
    /// Webhook modified
    #[serde(rename = "webhook-update")]
    WebhookUpdate,
    /// Webhook removed
    #[serde(rename = "webhook-delete")]
    WebhookDelete,
}

impl OperationName {
    /// Wire name of the operation.
    pub fn as_str(self) -> &'static str {
        match self {
            OperationName::ApplicationAdd => "add-application",
            OperationName::ApplicationUpdate => "application-update",
            OperationName::ApplicationDelete => "application-delete",
            OperationName::WebhookAdd => "add-webhook",
            OperationName::WebhookUpdate => "webhook-update",
            OperationName::WebhookDelete => "webhook-delete",
        }
    }
}

impl fmt::Display for OperationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an audited mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationResult {
    /// The store reported a change
    Success,
    /// Rejected, failed, or changed nothing
    Failure,
}

impl fmt::Display for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationResult::Success => write!(f, "success"),
            OperationResult::Failure => write!(f, "failure"),
        }
    }
}

/// Free-form key/value detail attached to a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AuditDetail(BTreeMap<String, String>);

impl AuditDetail {
    /// Detail with no entries.
    pub fn none() -> Self {
        Self::default()
    }

    /// Detail with a single `error` entry.
    pub fn error(message: impl Into<String>) -> Self {
        Self::none().with("error", message)
    }

    /// Detail describing a pipeline error, including its kind.
    ///
    /// Carries the full error text, including details hidden from the caller.
    pub fn from_error(error: &Error) -> Self {
        Self::error(error.to_string()).with("kind", error.kind().to_string())
    }

    /// Adds or replaces an entry.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Returns an entry.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Whether the detail has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AuditDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in &self.0 {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{key}={value}")?;
            first = false;
        }
        Ok(())
    }
}

/// One audited mutation outcome.
///
/// Built once by the audit logger and never modified afterwards.
///
/// # Example
///
/// ```
/// use tenant_pipeline::audit::{AuditDetail, AuditRecord, OperationName, OperationResult};
///
/// let record = AuditRecord::new("req-123", OperationName::ApplicationUpdate, OperationResult::Failure)
///     .with_object("application", "admin/app1")
///     .with_actor("org-a/alice")
///     .with_detail(AuditDetail::error("not affected"));
///
/// assert_eq!(record.correlation_id(), "req-123");
/// assert_eq!(record.detail().get("error"), Some("not affected"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    operation: OperationName,
    result: OperationResult,
    object_type: String,
    object_id: String,
    actor: String,
    correlation_id: String,
    detail: AuditDetail,
    fields: BTreeMap<String, Value>,
}

impl AuditRecord {
    /// Creates a record with the required fields.
    pub fn new(
        correlation_id: impl Into<String>,
        operation: OperationName,
        result: OperationResult,
    ) -> Self {
        Self {
            operation,
            result,
            object_type: String::new(),
            object_id: String::new(),
            actor: String::new(),
            correlation_id: correlation_id.into(),
            detail: AuditDetail::none(),
            fields: BTreeMap::new(),
        }
    }

    /// Sets the object type and identifier.
    pub fn with_object(mut self, object_type: impl Into<String>, object_id: impl Into<String>) -> Self {
        self.object_type = object_type.into();
        self.object_id = object_id.into();
        self
    }

    /// Sets the acting user, `owner/name`.
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    /// Sets the detail.
    pub fn with_detail(mut self, detail: AuditDetail) -> Self {
        self.detail = detail;
        self
    }

    /// Adds a context field.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Returns the operation name.
    pub fn operation(&self) -> OperationName {
        self.operation
    }

    /// Returns the outcome.
    pub fn result(&self) -> OperationResult {
        self.result
    }

    /// Returns the object type.
    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    /// Returns the object identifier.
    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    /// Returns the acting user.
    pub fn actor(&self) -> &str {
        &self.actor
    }

    /// Returns the request correlation id.
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Returns the detail.
    pub fn detail(&self) -> &AuditDetail {
        &self.detail
    }

    /// Returns the remaining context fields.
    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }
}

impl fmt::Display for AuditRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AuditRecord[operation={}, result={}, correlation_id={}, actor={}, object={}",
            self.operation,
            self.result,
            self.correlation_id,
            if self.actor.is_empty() { "<none>" } else { self.actor.as_str() },
            self.object_id,
        )?;
        if !self.detail.is_empty() {
            write!(f, ", detail={{{}}}", self.detail)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    #[test]
    fn operation_names_match_wire_format() {
        assert_eq!(OperationName::ApplicationAdd.to_string(), "add-application");
        assert_eq!(OperationName::ApplicationUpdate.to_string(), "application-update");
        assert_eq!(OperationName::WebhookDelete.to_string(), "webhook-delete");
        assert_eq!(
            serde_json::to_value(OperationName::WebhookAdd).unwrap(),
            "add-webhook"
        );
    }

    #[test]
    fn operation_result_display() {
        assert_eq!(OperationResult::Success.to_string(), "success");
        assert_eq!(OperationResult::Failure.to_string(), "failure");
    }

    #[test]
    fn detail_from_error_keeps_full_text() {
        let err = Error::from(StoreError::Backend("deadlock on app table".into()));
        let detail = AuditDetail::from_error(&err);

        assert!(detail.get("error").unwrap().contains("deadlock"));
        assert_eq!(detail.get("kind"), Some("persistence"));
    }

    #[test]
    fn record_builder() {
        let record = AuditRecord::new("req-1", OperationName::WebhookAdd, OperationResult::Success)
            .with_object("webhook", "org-a/h1")
            .with_actor("org-a/alice")
            .with_field("ip", Value::from("10.0.0.1"));

        assert_eq!(record.operation(), OperationName::WebhookAdd);
        assert_eq!(record.result(), OperationResult::Success);
        assert_eq!(record.object_type(), "webhook");
        assert_eq!(record.object_id(), "org-a/h1");
        assert_eq!(record.actor(), "org-a/alice");
        assert_eq!(record.fields()["ip"], "10.0.0.1");
        assert!(record.detail().is_empty());
    }

    #[test]
    fn record_display_marks_missing_actor() {
        let record = AuditRecord::new(
            "req-anon",
            OperationName::ApplicationDelete,
            OperationResult::Failure,
        )
        .with_detail(AuditDetail::error("not affected"));

        let display = record.to_string();
        assert!(display.contains("<none>"));
        assert!(display.contains("error=not affected"));
    }

    #[test]
    fn record_serializes_camel_case() {
        let record = AuditRecord::new("req-9", OperationName::ApplicationAdd, OperationResult::Success)
            .with_object("application", "admin/app1");
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["operation"], "add-application");
        assert_eq!(json["result"], "success");
        assert_eq!(json["objectId"], "admin/app1");
        assert_eq!(json["correlationId"], "req-9");
    }
}
