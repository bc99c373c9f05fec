//! Builds request contexts from adapted HTTP requests.
//!
//! ```text
//! HTTP request
//!   -> framework code fills a RequestAdapter
//!   -> extract_unauthed() / extract_authed()
//!   -> (RequestContext, RequestParams)
//!   -> ResourcePipeline operation
//!   -> Response
//! ```
//!
//! Nothing here authorizes a request; it only establishes who is calling.

use crate::context::{RequestContext, ITEM_UPSTREAM_REQUEST_ID};
use crate::error::Result;
use crate::request::RequestParams;
use crate::state::{Authed, Unauthed};

use super::{ExtractMetadata, ExtractParams, RequestAdapter};

/// An unauthenticated context paired with the request's parameters.
#[derive(Debug)]
pub struct UnauthenticatedExtraction {
    /// Context without a principal
    pub context: RequestContext<Unauthed>,
    /// Untrusted query parameters
    pub params: RequestParams,
}

/// An authenticated context paired with the request's parameters.
///
/// # Examples
///
/// ```
/// use tenant_pipeline::web::{extract_authed, RequestAdapter};
/// use tenant_pipeline::Principal;
///
/// let mut adapter = RequestAdapter::new();
/// adapter.add_header("X-Request-Id", "req-002");
/// adapter.set_principal(Some(Principal::new("org-a", "alice")));
///
/// let extraction = extract_authed(&adapter).expect("principal present");
/// assert_ne!(extraction.context.correlation_id(), "req-002");
/// assert_eq!(extraction.context.item_str("upstream_request_id"), Some("req-002"));
/// assert_eq!(extraction.context.principal().name, "alice");
/// ```
#[derive(Debug)]
pub struct AuthenticatedExtraction {
    /// Context carrying the principal
    pub context: RequestContext<Authed>,
    /// Untrusted query parameters
    pub params: RequestParams,
}

/// Creates the request context with a fresh correlation id.
///
/// An upstream `X-Request-Id` is kept as the `upstream_request_id` item and
/// never becomes the correlation id.
pub fn extract_unauthed(adapter: &RequestAdapter) -> UnauthenticatedExtraction {
    let meta = adapter.extract_metadata();
    let mut context = RequestContext::init(meta.remote_addr);
    if let Some(id) = adapter.upstream_request_id() {
        context.set_item(ITEM_UPSTREAM_REQUEST_ID, id);
    }

    UnauthenticatedExtraction {
        context,
        params: adapter.extract_params(),
    }
}

/// Creates the request context and authenticates it.
///
/// # Errors
///
/// Returns `Error::Unauthorized` if the adapter has no usable principal.
pub fn extract_authed(adapter: &RequestAdapter) -> Result<AuthenticatedExtraction> {
    let UnauthenticatedExtraction { context, params } = extract_unauthed(adapter);
    let context = context.authenticate(adapter.extract_metadata().principal)?;

    Ok(AuthenticatedExtraction { context, params })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ITEM_IP, ITEM_REQUEST_ID};
    use crate::error::ErrorKind;
    use crate::request::Principal;

    #[test]
    fn unauthed_extraction_generates_correlation_id() {
        let extraction = extract_unauthed(&RequestAdapter::new());
        assert!(!extraction.context.correlation_id().is_empty());
    }

    #[test]
    fn upstream_request_id_does_not_become_correlation_id() {
        let mut adapter = RequestAdapter::new();
        adapter.add_header("X-Request-Id", "victim-req");

        let first = extract_unauthed(&adapter);
        let second = extract_unauthed(&adapter);

        assert_ne!(first.context.correlation_id(), "victim-req");
        assert_ne!(first.context.correlation_id(), second.context.correlation_id());
        assert_eq!(
            first.context.item_str(ITEM_UPSTREAM_REQUEST_ID),
            Some("victim-req")
        );
        assert_eq!(
            first.context.item_str(ITEM_REQUEST_ID),
            Some(first.context.correlation_id())
        );
    }

    #[test]
    fn unauthed_extraction_keeps_remote_addr() {
        let mut adapter = RequestAdapter::new();
        adapter.set_remote_addr("192.168.1.20");

        let extraction = extract_unauthed(&adapter);
        assert_eq!(extraction.context.item_str(ITEM_IP), Some("192.168.1.20"));
    }

    #[test]
    fn authed_extraction_requires_principal() {
        let err = extract_authed(&RequestAdapter::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn authed_extraction_carries_params() {
        let mut adapter = RequestAdapter::new();
        adapter.set_principal(Some(Principal::new("org-a", "alice")));
        adapter.add_query_param("organization", "org-a");

        let extraction = extract_authed(&adapter).unwrap();
        assert_eq!(extraction.params.organization, "org-a");
        assert_eq!(extraction.context.principal().owner, "org-a");
    }
}
