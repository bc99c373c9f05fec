//! Type-state markers for request context progression.
//!
//! `RequestContext<Unauthed>` is what the ingress boundary creates;
//! `RequestContext<Authed>` is what every pipeline operation requires.

/// Marker for a context created at ingress, before authentication.
#[derive(Debug, Clone, Copy)]
pub struct Unauthed {
    _private: (),
}

/// Marker for a context carrying a verified principal.
#[derive(Debug, Clone, Copy)]
pub struct Authed {
    _private: (),
}
