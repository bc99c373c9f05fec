use crate::error::{Error, Result};
use crate::resource::ResourceKind;

/// Per-kind creation limits. `None` means unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuotaConfig {
    /// Maximum number of applications
    pub application: Option<u64>,
    /// Maximum number of webhooks
    pub webhook: Option<u64>,
}

impl QuotaConfig {
    /// Returns the limit configured for `kind`.
    pub fn limit_for(&self, kind: ResourceKind) -> Option<u64> {
        match kind {
            ResourceKind::Application => self.application,
            ResourceKind::Webhook => self.webhook,
        }
    }
}

/// Enforces [`QuotaConfig`] before resource creation.
///
/// The enforcer is a pure check: counting existing resources is the
/// caller's job, so concurrent creates racing past the limit by a small
/// margin are possible and tolerated.
///
/// # Examples
///
/// ```
/// use tenant_pipeline::{QuotaConfig, QuotaEnforcer, ResourceKind};
///
/// let quota = QuotaEnforcer::new(QuotaConfig { application: Some(2), webhook: None });
/// assert!(quota.check_quota(1, ResourceKind::Application).is_ok());
/// assert!(quota.check_quota(2, ResourceKind::Application).is_err());
/// assert!(quota.check_quota(1_000, ResourceKind::Webhook).is_ok());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct QuotaEnforcer {
    config: QuotaConfig,
}

impl QuotaEnforcer {
    /// Creates an enforcer for the given limits.
    pub fn new(config: QuotaConfig) -> Self {
        Self { config }
    }

    /// Returns the configured limits.
    pub fn config(&self) -> &QuotaConfig {
        &self.config
    }

    /// Checks whether one more resource of `kind` may be created.
    ///
    /// # Errors
    ///
    /// Returns `Error::QuotaExceeded` when `current_count` has already reached the limit.
    pub fn check_quota(&self, current_count: u64, kind: ResourceKind) -> Result<()> {
        match self.config.limit_for(kind) {
            Some(limit) if current_count >= limit => {
                tracing::debug!(%kind, current_count, limit, "quota reached");
                Err(Error::QuotaExceeded { kind, limit })
            }
            _ => Ok(()),
        }
    }
}
