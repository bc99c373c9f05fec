//! Web framework integration surface.
//!
//! This module sits between an HTTP framework and the pipeline. It holds no
//! framework code. Integrations fill a [`RequestAdapter`] from their own
//! request type and hand it to a handler.
//!
//! # Design Principles
//!
//! 1. **No Framework Dependencies**: everything here is plain data and traits.
//!
//! 2. **Untrusted Until Checked**: query parameters stay plain strings until the
//!    authorization gate and the identifier whitelist have seen them. Request
//!    bodies are wrapped in `Tainted<T>` when decoded.
//!
//! 3. **No Authorization**: extraction only establishes who is calling.
//!    Scope checks happen inside the pipeline.
//!
//! 4. **Explicit Context**: no global state. The request context is created
//!    per request and passed by reference.
//!
//! # Example Flow
//!
//! ```ignore
//! // In a framework-specific integration (e.g., axum, actix):
//! let mut adapter = RequestAdapter::new();
//! adapter.set_remote_addr(peer.to_string());
//! adapter.set_principal(session.principal());
//! for (k, v) in query { adapter.add_query_param(k, v); }
//! adapter.set_body(body);
//!
//! let response = api.dispatch(route, &adapter).unwrap_or_else(not_found);
//! Json(response)
//! ```

mod adapter;
mod extract;
mod handlers;
mod middleware;

pub use adapter::{RequestAdapter, REQUEST_ID_HEADER};
pub use extract::{ExtractMetadata, ExtractParams};
pub use handlers::{handle_add, handle_delete, handle_get, handle_list, handle_update, AdminApi};
pub use middleware::{
    extract_authed, extract_unauthed, AuthenticatedExtraction, UnauthenticatedExtraction,
};
