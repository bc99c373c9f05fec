//! Authorization, validation, quota and audit pipeline for tenant-scoped
//! admin resources.
//!
//! Every mutation of an [`Application`] or a [`Webhook`] goes through the
//! same stages:
//!
//! - **Authorization**: [`AuthorizationGate`] checks the caller's
//!   organization scope before anything else is read.
//! - **Taint tracking**: request bodies decode into [`Tainted<T>`] and only
//!   a [`Sanitizer`] turns them into the [`Verified<T>`] the store accepts.
//! - **Quota**: [`QuotaEnforcer`] caps the number of records of a kind.
//! - **Audit**: [`AuditLogger`] writes exactly one record per mutation,
//!   whatever the outcome.
//!
//! # Core Types
//!
//! - [`RequestContext`]: per-request context, unauthenticated until a
//!   principal is attached
//! - [`ResourcePipeline`]: list, get, add, update and delete for one kind
//! - [`ResourceStore`]: the persistence seam, with [`MemoryStore`] as the
//!   in-process implementation
//! - [`Response`]: the envelope every endpoint returns
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use tenant_pipeline::audit::AuditTrail;
//! use tenant_pipeline::{
//!     ApplicationPipeline, AuditLogger, MemoryStore, MutationOutcome, PipelineConfig, Principal,
//!     RequestContext, RequestParams, ResourceStore,
//! };
//!
//! let trail = Arc::new(AuditTrail::new());
//! let pipeline = ApplicationPipeline::new(
//!     Arc::new(MemoryStore::new()),
//!     AuditLogger::new(trail.clone()),
//!     &PipelineConfig::default(),
//! );
//!
//! let mut ctx = RequestContext::init(Some("10.0.0.1".into()))
//!     .authenticate(Some(Principal::global_admin("built-in", "admin")))
//!     .expect("principal present");
//!
//! let body = br#"{"name":"app1","organization":"org-a","homepageUrl":"https://x.io"}"#;
//! let outcome = pipeline
//!     .add(&mut ctx, &RequestParams::default(), body)
//!     .expect("valid payload");
//!
//! assert_eq!(outcome, MutationOutcome::Affected);
//! assert_eq!(trail.len(), 1);
//! assert!(pipeline.store().get("admin/app1").unwrap().is_some());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
mod config;
mod context;
mod error;
mod gate;
mod logging;
mod pipeline;
mod policy;
mod quota;
mod request;
mod resource;
mod response;
mod sanitizer;
mod state;
mod store;
mod tainted;
pub mod validation;
mod verified;
pub mod web;

pub use audit::AuditLogger;
pub use config::{LogFormat, LoggingConfig, PipelineConfig};
pub use context::RequestContext;
pub use error::{Error, ErrorKind, Result, GENERIC_PERSISTENCE_MESSAGE};
pub use gate::{authorize_request, AuthorizationDecision, AuthorizationGate};
pub use logging::{init_logging, RequestLog};
pub use pipeline::{ApplicationPipeline, MutationOutcome, ResourcePipeline, WebhookPipeline};
pub use policy::{Authenticated, OrganizationScope, OwnerScope, PolicyReq};
pub use quota::{QuotaConfig, QuotaEnforcer};
pub use request::{Principal, RequestMeta, RequestParams};
pub use resource::{Application, Mutation, Resource, ResourceKind, Webhook, WebhookHeader, MASKED_VALUE};
pub use response::Response;
pub use sanitizer::{ResourceSanitizer, Sanitizer, ValidationError, ValidationErrorKind};
pub use state::{Authed, Unauthed};
pub use store::{
    Cert, CertStore, ListFilter, MemoryDirectory, MemoryStore, Page, PageQuery, ResourceStore,
    SortOrder, StoreError, User, UserStore,
};
pub use tainted::Tainted;
pub use verified::Verified;
