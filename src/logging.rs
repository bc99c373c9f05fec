use std::fmt;

use tracing_subscriber::{fmt as subscriber_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

/// A request-scoped logging handle.
///
/// `RequestLog` is obtained from `RequestContext::log()` and is
/// lifetime-bound to the context. Every line carries the request's
/// correlation id so log output can be joined with audit records.
#[derive(Debug)]
pub struct RequestLog<'a> {
    correlation_id: &'a str,
}

impl<'a> RequestLog<'a> {
    /// This is `pub(crate)`: only `RequestContext` creates it.
    pub(crate) fn new(correlation_id: &'a str) -> Self {
        Self { correlation_id }
    }

    /// Returns the correlation id attached to every line.
    pub fn correlation_id(&self) -> &str {
        self.correlation_id
    }

    /// Logs an info-level message.
    ///
    /// Use with `format_args!`:
    /// ```no_run
    /// # use tenant_pipeline::RequestContext;
    /// let ctx = RequestContext::init(None);
    /// ctx.log().info(format_args!("listing {} applications", 3));
    /// ```
    pub fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(correlation_id = %self.correlation_id, "{}", args);
    }

    /// Logs a warning-level message.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(correlation_id = %self.correlation_id, "{}", args);
    }

    /// Logs an error-level message.
    pub fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!(correlation_id = %self.correlation_id, "{}", args);
    }

    /// Logs a debug-level message.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(correlation_id = %self.correlation_id, "{}", args);
    }
}

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`. Returns `false` when a
/// global subscriber was already installed (for example by a test harness or
/// an embedding server); the existing one is left in place.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.format {
        LogFormat::Pretty => registry
            .with(subscriber_fmt::layer().with_target(true))
            .try_init()
            .is_ok(),
        LogFormat::Json => registry
            .with(subscriber_fmt::layer().json().with_target(true))
            .try_init()
            .is_ok(),
    };

    if installed {
        tracing::debug!(format = %config.format, level = %config.level, "logging initialized");
    } else {
        tracing::debug!("global tracing subscriber already initialized");
    }
    installed
}
