use std::fmt;

use thiserror::Error;

use crate::resource::Resource;
use crate::validation::{is_allowed_for_policy_storage, is_valid_url};
use crate::{Tainted, Verified};

/// Error returned when a payload fails validation.
///
/// Carries the label of the offending field and a message that is safe to
/// show the caller; the rejected value itself is not included.
///
/// # Examples
///
/// ```
/// use tenant_pipeline::{ValidationError, ValidationErrorKind};
///
/// let error = ValidationError::new(ValidationErrorKind::InvalidUrl, "Logo", "Logo field is not valid URL");
/// assert_eq!(error.kind(), ValidationErrorKind::InvalidUrl);
/// assert_eq!(error.field(), "Logo");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    kind: ValidationErrorKind,
    field: String,
    message: String,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(
        kind: ValidationErrorKind,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for the URL rule, with the standard message.
    pub fn invalid_url(field: &str) -> Self {
        Self::new(
            ValidationErrorKind::InvalidUrl,
            field,
            format!("{field} field is not valid URL"),
        )
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ValidationErrorKind {
        self.kind
    }

    /// Returns the label of the rejected field.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Kind of validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Not a URL, or a script-executing URL.
    InvalidUrl,
    /// Contains characters the policy-rule store cannot hold.
    IllegalPolicySymbols,
    /// A sort or filter field name outside the identifier whitelist.
    InvalidIdentifier,
    /// The payload tries to change the identifier of an existing resource.
    ImmutableIdentifier,
    /// A required field is empty.
    Empty,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl => write!(f, "invalid url"),
            Self::IllegalPolicySymbols => write!(f, "illegal policy symbols"),
            Self::InvalidIdentifier => write!(f, "invalid identifier"),
            Self::ImmutableIdentifier => write!(f, "immutable identifier"),
            Self::Empty => write!(f, "empty"),
        }
    }
}

/// Trait for turning tainted payloads into verified ones.
///
/// # Invariants
///
/// Implementations MUST:
/// - Check every rule before calling `Verified::new_unchecked`
/// - Reject the whole payload on the first failure (no partial application)
/// - Not echo the rejected value in the error
pub trait Sanitizer<T> {
    /// Validates a tainted value, returning a verified value on success.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` describing the first rule that failed.
    fn sanitize(&self, input: Tainted<T>) -> Result<Verified<T>, ValidationError>;
}

/// Sanitizer for add and update payloads.
///
/// Checks, in this order:
/// 1. the name is non-empty
/// 2. the name can be written to the policy-rule store
/// 3. every URL field, in the order the resource declares them
///
/// The first failing rule wins, so when several URL fields are invalid the
/// reported one is always the earliest declared.
///
/// # Examples
///
/// ```
/// use tenant_pipeline::{Application, ResourceSanitizer, Sanitizer, Tainted, ValidationErrorKind};
///
/// let app = Application {
///     name: "app1".into(),
///     logo: "javascript:alert(1)".into(),
///     ..Default::default()
/// };
/// let err = ResourceSanitizer.sanitize(Tainted::new(app)).unwrap_err();
/// assert_eq!(err.kind(), ValidationErrorKind::InvalidUrl);
/// assert_eq!(err.field(), "Logo");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceSanitizer;

impl<R: Resource> Sanitizer<R> for ResourceSanitizer {
    fn sanitize(&self, input: Tainted<R>) -> Result<Verified<R>, ValidationError> {
        let resource = input.into_inner();

        if resource.name().is_empty() {
            return Err(ValidationError::new(
                ValidationErrorKind::Empty,
                "Name",
                "Name field is required",
            ));
        }

        if !is_allowed_for_policy_storage(resource.name()) {
            return Err(ValidationError::new(
                ValidationErrorKind::IllegalPolicySymbols,
                "Name",
                "Name field contains characters that are not allowed",
            ));
        }

        if let Some(field) = resource
            .url_fields()
            .into_iter()
            .find(|f| !is_valid_url(f.value))
        {
            return Err(ValidationError::invalid_url(field.label));
        }

        Ok(Verified::new_unchecked(resource))
    }
}
