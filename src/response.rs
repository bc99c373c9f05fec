use serde::Serialize;

use crate::error::Error;
use crate::pipeline::MutationOutcome;
use crate::store::Page;

/// Status field of a successful response.
pub const STATUS_OK: &str = "ok";
/// Status field of a failed response.
pub const STATUS_ERROR: &str = "error";

/// The response envelope returned by every endpoint.
///
/// ```json
/// {"status": "ok", "data": [...], "totalCount": 12}
/// {"status": "error", "message": "Logo field is not valid URL"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response<T> {
    /// `ok` or `error`
    pub status: &'static str,
    /// Caller-safe failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Unpaginated total for list endpoints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

impl<T> Response<T> {
    /// A successful response carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            status: STATUS_OK,
            message: None,
            data: Some(data),
            total_count: None,
        }
    }

    /// A failed response. Storage internals are replaced by a generic message.
    pub fn error(error: &Error) -> Self {
        Self {
            status: STATUS_ERROR,
            message: Some(error.user_message()),
            data: None,
            total_count: None,
        }
    }

    /// Whether the status is `ok`.
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Converts the payload.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        Response {
            status: self.status,
            message: self.message,
            data: self.data.map(f),
            total_count: self.total_count,
        }
    }
}

impl<T> Response<Vec<T>> {
    /// A successful list response.
    pub fn ok_page(page: Page<T>) -> Self {
        Self {
            total_count: Some(page.total),
            ..Self::ok(page.items)
        }
    }
}

impl Response<&'static str> {
    /// Renders a mutation result as `Affected` or `Unaffected`.
    pub fn action(result: Result<MutationOutcome, Error>) -> Self {
        match result {
            Ok(MutationOutcome::Affected) => Self::ok("Affected"),
            Ok(MutationOutcome::NotAffected) => Self::ok("Unaffected"),
            Err(e) => Self::error(&e),
        }
    }
}

impl<T> From<Result<T, Error>> for Response<T> {
    fn from(result: Result<T, Error>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::error(&e),
        }
    }
}
