use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::quota::QuotaConfig;

/// Environment variable overriding [`PipelineConfig::root_owner`].
pub const ENV_ROOT_OWNER: &str = "TENANT_PIPELINE_ROOT_OWNER";
/// Environment variable holding the application quota.
pub const ENV_QUOTA_APPLICATION: &str = "TENANT_PIPELINE_QUOTA_APPLICATION";
/// Environment variable holding the webhook quota.
pub const ENV_QUOTA_WEBHOOK: &str = "TENANT_PIPELINE_QUOTA_WEBHOOK";
/// Environment variable selecting `pretty` or `json` log output.
pub const ENV_LOG_FORMAT: &str = "TENANT_PIPELINE_LOG_FORMAT";
/// Environment variable holding the default log filter directive.
pub const ENV_LOG_LEVEL: &str = "TENANT_PIPELINE_LOG_LEVEL";

/// Owner forced onto every application record.
pub const DEFAULT_ROOT_OWNER: &str = "admin";

/// Top-level pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Owner every fixed-owner resource (applications) is stored under
    pub root_owner: String,
    /// Per-kind creation limits
    pub quota: QuotaConfig,
    /// Subscriber settings used by [`crate::logging::init_logging`]
    pub logging: LoggingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            root_owner: DEFAULT_ROOT_OWNER.to_string(),
            quota: QuotaConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Loads settings from the process environment on top of the defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when a variable is set to a malformed value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings through an arbitrary variable lookup.
    ///
    /// A quota of `-1` (or any negative number) means unlimited.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(owner) = lookup(ENV_ROOT_OWNER) {
            if owner.trim().is_empty() {
                return Err(Error::Config(format!("{ENV_ROOT_OWNER} must not be empty")));
            }
            config.root_owner = owner.trim().to_string();
        }

        if let Some(raw) = lookup(ENV_QUOTA_APPLICATION) {
            config.quota.application = parse_limit(ENV_QUOTA_APPLICATION, &raw)?;
        }

        if let Some(raw) = lookup(ENV_QUOTA_WEBHOOK) {
            config.quota.webhook = parse_limit(ENV_QUOTA_WEBHOOK, &raw)?;
        }

        if let Some(raw) = lookup(ENV_LOG_FORMAT) {
            config.logging.format = raw.parse()?;
        }

        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            config.logging.level = level;
        }

        Ok(config)
    }
}

fn parse_limit(key: &str, raw: &str) -> Result<Option<u64>> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("Invalid {key}: {e}")))?;
    Ok(u64::try_from(value).ok())
}

/// Log subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Output format
    pub format: LogFormat,
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            level: "info".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(Error::Config(format!(
                "Invalid {ENV_LOG_FORMAT}: expected `pretty` or `json`, got `{other}`"
            ))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
        }
    }
}
