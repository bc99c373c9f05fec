use std::fmt;

use thiserror::Error;

use crate::resource::ResourceKind;
use crate::sanitizer::ValidationError;
use crate::store::StoreError;

/// Result alias used throughout the pipeline.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Message returned to callers in place of storage internals.
pub const GENERIC_PERSISTENCE_MESSAGE: &str = "the operation could not be completed";

/// Errors that can occur while handling a tenant-scoped request.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller identity is insufficient for the operation class.
    #[error("Unauthorized operation: {0}")]
    Unauthorized(String),

    /// The caller is authenticated but has no rights over this organization.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A field of the payload failed validation.
    #[error(transparent)]
    ValidationFailed(#[from] ValidationError),

    /// The request body could not be decoded into the resource type.
    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    /// Creating another resource of this kind would exceed the configured maximum.
    #[error("quota exceeded for {kind}: limit is {limit}")]
    QuotaExceeded {
        /// Resource kind whose quota was hit
        kind: ResourceKind,
        /// Configured maximum
        limit: u64,
    },

    /// The target does not exist, or is not visible to the caller.
    #[error("{0} doesn't exist")]
    NotFound(String),

    /// Opaque failure reported by the storage collaborator.
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// The server failed on its own, for example while rendering a response.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Unauthorized(_) => ErrorKind::Unauthorized,
            Error::Forbidden(_) => ErrorKind::Forbidden,
            Error::ValidationFailed(_) | Error::InvalidPayload(_) => ErrorKind::ValidationFailed,
            Error::QuotaExceeded { .. } => ErrorKind::QuotaExceeded,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Persistence(_) => ErrorKind::Persistence,
            Error::Config(_) => ErrorKind::Config,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Message safe to hand back to the caller.
    ///
    /// Storage, configuration and internal failures are replaced with a
    /// generic message; the full error is kept in the audit record and the logs.
    pub fn user_message(&self) -> String {
        match self {
            Error::Persistence(_) | Error::Config(_) | Error::Internal(_) => {
                GENERIC_PERSISTENCE_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }
}

/// The kind of failure, independent of its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller identity insufficient
    Unauthorized,
    /// Caller lacks rights over the specific organization
    Forbidden,
    /// Malformed field or payload
    ValidationFailed,
    /// Resource quota reached
    QuotaExceeded,
    /// Target not found (or hidden)
    NotFound,
    /// Storage collaborator failure
    Persistence,
    /// Bad configuration
    Config,
    /// Server-side failure unrelated to the request
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::ValidationFailed => "validation_failed",
            ErrorKind::QuotaExceeded => "quota_exceeded",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Persistence => "persistence",
            ErrorKind::Config => "config",
            ErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}
