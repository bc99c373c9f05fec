//! Request adapter for mapping HTTP requests to pipeline types.

use std::collections::HashMap;

use crate::request::{Principal, RequestMeta, RequestParams};

use super::{ExtractMetadata, ExtractParams};

/// Header an upstream proxy may use to pass along its own request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Framework-agnostic view of an incoming HTTP request.
///
/// Framework integrations fill one of these from their own request type
/// (typically through a `From` impl) after session handling has resolved
/// the principal.
///
/// # Examples
///
/// ```
/// use tenant_pipeline::web::{ExtractMetadata, ExtractParams, RequestAdapter};
/// use tenant_pipeline::Principal;
///
/// let mut adapter = RequestAdapter::new();
/// adapter.set_remote_addr("10.0.0.1");
/// adapter.set_principal(Some(Principal::new("org-a", "alice")));
/// adapter.add_query_param("organization", "org-a");
///
/// let meta = adapter.extract_metadata();
/// assert_eq!(meta.remote_addr.as_deref(), Some("10.0.0.1"));
/// assert_eq!(adapter.extract_params().organization, "org-a");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestAdapter {
    remote_addr: Option<String>,
    principal: Option<Principal>,
    query_params: HashMap<String, String>,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl RequestAdapter {
    /// Creates an empty adapter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the caller's network origin.
    pub fn set_remote_addr(&mut self, addr: impl Into<String>) {
        self.remote_addr = Some(addr.into());
    }

    /// Sets the principal resolved by session or token middleware.
    pub fn set_principal(&mut self, principal: Option<Principal>) {
        self.principal = principal;
    }

    /// Adds a query parameter.
    pub fn add_query_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query_params.insert(key.into(), value.into());
    }

    /// Adds a header. Names are case-insensitive.
    pub fn add_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers
            .insert(key.into().to_ascii_lowercase(), value.into());
    }

    /// Sets the raw request body.
    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = body.into();
    }

    /// Returns the principal, if present.
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Returns a query parameter.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query_params.get(key).map(String::as_str)
    }

    /// Returns a header, looked up case-insensitively.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Returns the raw body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Request id supplied by an upstream proxy, if any.
    pub fn upstream_request_id(&self) -> Option<&str> {
        self.header(REQUEST_ID_HEADER).filter(|id| !id.trim().is_empty())
    }
}

impl ExtractMetadata for RequestAdapter {
    fn extract_metadata(&self) -> RequestMeta {
        RequestMeta {
            remote_addr: self.remote_addr.clone(),
            principal: self.principal.clone(),
        }
    }
}

impl ExtractParams for RequestAdapter {
    fn extract_params(&self) -> RequestParams {
        RequestParams::from_pairs(
            self.query_params
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        )
    }
}
