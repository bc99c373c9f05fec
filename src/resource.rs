//! Tenant-scoped resources handled by the pipeline.
//!
//! A resource is identified by `owner/name`, belongs to exactly one
//! organization, and exposes its URL-typed fields in a fixed order so the
//! sanitizer can check them deterministically.

mod application;
mod webhook;

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::audit::OperationName;

pub use application::Application;
pub use webhook::{Webhook, WebhookHeader};

/// Replacement written over secret-bearing fields for viewers without full visibility.
pub const MASKED_VALUE: &str = "***";

/// Builds the global identifier of a resource.
pub fn resource_id(owner: &str, name: &str) -> String {
    format!("{owner}/{name}")
}

/// The kinds of resource the pipeline knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    /// Client applications (owner pinned to the root tenant)
    Application,
    /// Outbound event webhooks (owner supplied by the caller)
    Webhook,
}

/// Mutating operation classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// Create
    Add,
    /// Modify an existing record
    Update,
    /// Remove an existing record
    Delete,
}

impl ResourceKind {
    /// Name used for the `obj-type` audit field.
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Application => "application",
            ResourceKind::Webhook => "webhook",
        }
    }

    /// Whether the owner of every resource of this kind is the root tenant,
    /// whatever the payload says.
    pub fn has_fixed_owner(self) -> bool {
        matches!(self, ResourceKind::Application)
    }

    /// Audit operation name for a mutation of this kind.
    pub fn operation(self, mutation: Mutation) -> OperationName {
        match (self, mutation) {
            (ResourceKind::Application, Mutation::Add) => OperationName::ApplicationAdd,
            (ResourceKind::Application, Mutation::Update) => OperationName::ApplicationUpdate,
            (ResourceKind::Application, Mutation::Delete) => OperationName::ApplicationDelete,
            (ResourceKind::Webhook, Mutation::Add) => OperationName::WebhookAdd,
            (ResourceKind::Webhook, Mutation::Update) => OperationName::WebhookUpdate,
            (ResourceKind::Webhook, Mutation::Delete) => OperationName::WebhookDelete,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A URL-typed field together with the label used in validation messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrlField<'a> {
    /// Human-readable field label
    pub label: &'static str,
    /// Current value
    pub value: &'a str,
}

impl<'a> UrlField<'a> {
    /// Pairs a label with a value.
    pub fn new(label: &'static str, value: &'a str) -> Self {
        Self { label, value }
    }
}

/// A tenant-scoped resource.
///
/// Implementations decode from JSON with unknown fields ignored and
/// missing fields defaulted.
pub trait Resource:
    Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Kind tag, used for audit and quota lookups.
    const KIND: ResourceKind;

    /// Whether reads by id are served (masked) to callers outside the
    /// resource's organization.
    const PUBLIC_READ: bool = false;

    /// Owning tenant.
    fn owner(&self) -> &str;

    /// Name, unique within the owner.
    fn name(&self) -> &str;

    /// Organization the resource belongs to.
    fn organization(&self) -> &str;

    /// Overwrites the owner.
    fn set_owner(&mut self, owner: &str);

    /// URL-typed fields, in declaration order.
    fn url_fields(&self) -> Vec<UrlField<'_>>;

    /// Blanks every secret-bearing field.
    fn mask_secrets(&mut self);

    /// Global identifier, `owner/name`.
    fn id(&self) -> String {
        resource_id(self.owner(), self.name())
    }
}
