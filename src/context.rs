use std::collections::HashMap;
use std::marker::PhantomData;

use serde_json::Value;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::logging::RequestLog;
use crate::request::Principal;
use crate::state::{Authed, Unauthed};

/// Item key holding the caller's network origin.
pub const ITEM_IP: &str = "ip";
/// Item key holding the request correlation id.
pub const ITEM_REQUEST_ID: &str = "request_id";
/// Item key holding the request id an upstream proxy sent, kept for tracing only.
pub const ITEM_UPSTREAM_REQUEST_ID: &str = "upstream_request_id";
/// Item key holding the target object's identifier.
pub const ITEM_OBJECT: &str = "obj";
/// Item key holding the acting user's `owner/name`.
pub const ITEM_USER: &str = "usr";
/// Item key holding the resource kind.
pub const ITEM_OBJECT_TYPE: &str = "obj-type";

/// Per-request state threaded through every pipeline stage.
///
/// `RequestContext<S>` is generic over its authentication state:
/// - `RequestContext<Unauthed>`: created at ingress, no principal
/// - `RequestContext<Authed>`: carries a verified principal
///
/// ```text
/// RequestContext<Unauthed> --authenticate--> RequestContext<Authed>
/// ```
///
/// Pipeline operations only accept `RequestContext<Authed>`, so an
/// unauthenticated request cannot reach the gate, the store, or the audit log.
///
/// The context also carries a bag of request-scoped items. The pipeline
/// writes the target object, actor, and resource kind into it as it goes, and
/// the audit logger reads them back when the outcome is recorded.
///
/// # Examples
///
/// ```
/// use tenant_pipeline::{Principal, RequestContext};
///
/// let ctx = RequestContext::init(Some("10.0.0.1".into()));
/// let ctx = ctx
///     .authenticate(Some(Principal::new("org-a", "alice")))
///     .expect("valid principal");
///
/// assert_eq!(ctx.principal().owner, "org-a");
/// assert_eq!(ctx.item_str("ip"), Some("10.0.0.1"));
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext<S = Authed> {
    correlation_id: String,
    remote_addr: Option<String>,
    principal: Option<Principal>,
    items: HashMap<String, Value>,
    _state: PhantomData<S>,
}

impl<S> RequestContext<S> {
    /// Returns the correlation id shared by every log line and audit record of this request.
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Returns the caller's network origin, if known.
    pub fn remote_addr(&self) -> Option<&str> {
        self.remote_addr.as_deref()
    }

    /// Sets a request-scoped item, replacing any previous value.
    pub fn set_item(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.items.insert(key.into(), value.into());
    }

    /// Removes a request-scoped item, returning its previous value.
    pub fn remove_item(&mut self, key: &str) -> Option<Value> {
        self.items.remove(key)
    }

    /// Returns a request-scoped item.
    pub fn item(&self, key: &str) -> Option<&Value> {
        self.items.get(key)
    }

    /// Returns a request-scoped item if it is a string.
    pub fn item_str(&self, key: &str) -> Option<&str> {
        self.items.get(key).and_then(Value::as_str)
    }

    /// Returns every request-scoped item.
    pub fn items(&self) -> &HashMap<String, Value> {
        &self.items
    }

    /// Returns a logger that tags every line with this request's correlation id.
    pub fn log(&self) -> RequestLog<'_> {
        RequestLog::new(&self.correlation_id)
    }
}

impl RequestContext<Unauthed> {
    /// Creates the context for a new request with a fresh correlation id.
    ///
    /// Seeds the `ip` and `request_id` items. The correlation id is always
    /// generated here; callers cannot choose it.
    pub fn init(remote_addr: Option<String>) -> Self {
        let correlation_id = Uuid::new_v4().to_string();
        let mut items = HashMap::new();
        items.insert(ITEM_REQUEST_ID.to_string(), Value::from(correlation_id.clone()));
        if let Some(addr) = &remote_addr {
            items.insert(ITEM_IP.to_string(), Value::from(addr.clone()));
        }

        Self {
            correlation_id,
            remote_addr,
            principal: None,
            items,
            _state: PhantomData,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_correlation_id(correlation_id: &str, remote_addr: Option<String>) -> Self {
        let mut ctx = Self::init(remote_addr);
        ctx.correlation_id = correlation_id.to_string();
        ctx.set_item(ITEM_REQUEST_ID, correlation_id);
        ctx
    }

    /// Attaches a verified principal.
    ///
    /// # Errors
    ///
    /// Returns `Error::Unauthorized` if no principal is given or if its owner
    /// or name is empty.
    pub fn authenticate(self, principal: Option<Principal>) -> Result<RequestContext<Authed>> {
        let principal = match principal {
            Some(p) if !p.owner.is_empty() && !p.name.is_empty() => p,
            Some(_) => {
                return Err(Error::Unauthorized(
                    "Please login first: incomplete principal".to_string(),
                ))
            }
            None => return Err(Error::Unauthorized("Please login first".to_string())),
        };

        Ok(RequestContext {
            correlation_id: self.correlation_id,
            remote_addr: self.remote_addr,
            principal: Some(principal),
            items: self.items,
            _state: PhantomData,
        })
    }
}

impl RequestContext<Authed> {
    /// Returns the authenticated principal.
    pub fn principal(&self) -> &Principal {
        // `authenticate` is the only constructor for this state and always sets it
        self.principal
            .as_ref()
            .unwrap_or_else(|| unreachable!("Authed context without principal"))
    }
}
