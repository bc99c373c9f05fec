//! Extraction boundary traits for web integration.

use crate::request::{RequestMeta, RequestParams};

/// Extracts request metadata from a framework-specific request.
///
/// Implementations only map framework types to [`RequestMeta`]. They do
/// not authorize anything; the authorization gate does that.
///
/// # Examples
///
/// ```
/// use tenant_pipeline::web::ExtractMetadata;
/// use tenant_pipeline::{Principal, RequestMeta};
///
/// struct MyFrameworkRequest {
///     peer: String,
///     session_user: Option<(String, String)>,
/// }
///
/// impl ExtractMetadata for MyFrameworkRequest {
///     fn extract_metadata(&self) -> RequestMeta {
///         RequestMeta {
///             remote_addr: Some(self.peer.clone()),
///             principal: self
///                 .session_user
///                 .as_ref()
///                 .map(|(owner, name)| Principal::new(owner.clone(), name.clone())),
///         }
///     }
/// }
/// ```
pub trait ExtractMetadata {
    /// Extracts the caller's origin and principal.
    fn extract_metadata(&self) -> RequestMeta;
}

/// Extracts the shared query parameters from a framework-specific request.
///
/// The values stay untrusted: the gate checks owner and organization, and
/// the pipeline checks filter and sort columns.
pub trait ExtractParams {
    /// Extracts the query parameters.
    fn extract_params(&self) -> RequestParams;
}
