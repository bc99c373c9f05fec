//! The request pipeline shared by every resource kind.
//!
//! Mutations move through
//! `Received -> Authorized -> Validated -> (Quota-Checked) -> Persisted -> Logged`
//! and short-circuit on the first failure. Every mutation outcome, including
//! rejections before the payload was even decoded, produces exactly one
//! audit record. Reads skip the audit log and mask what the viewer may not see.

mod application;

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;

use crate::audit::{AuditDetail, AuditLogger, OperationResult};
use crate::config::PipelineConfig;
use crate::context::{RequestContext, ITEM_OBJECT, ITEM_OBJECT_TYPE, ITEM_USER};
use crate::error::{Error, Result};
use crate::gate::{authorize_request, AuthorizationDecision, AuthorizationGate};
use crate::policy::Authenticated;
use crate::quota::QuotaEnforcer;
use crate::request::RequestParams;
use crate::resource::{Application, Mutation, Resource, Webhook};
use crate::sanitizer::{ResourceSanitizer, Sanitizer, ValidationError, ValidationErrorKind};
use crate::store::{ListFilter, Page, PageQuery, ResourceStore, SortOrder};
use crate::validation::is_allowed_db_identifier;
use crate::Tainted;

/// Pipeline for applications.
pub type ApplicationPipeline<S> = ResourcePipeline<Application, S>;

/// Pipeline for webhooks.
pub type WebhookPipeline<S> = ResourcePipeline<Webhook, S>;

/// Whether a mutation changed stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MutationOutcome {
    /// The store reported a change
    Affected,
    /// The target did not exist or nothing changed
    NotAffected,
}

impl MutationOutcome {
    fn from_affected(affected: bool) -> Self {
        if affected {
            MutationOutcome::Affected
        } else {
            MutationOutcome::NotAffected
        }
    }

    /// Whether the store reported a change.
    pub fn is_affected(self) -> bool {
        self == MutationOutcome::Affected
    }
}

/// A failed mutation: what gets audited, and what the caller sees.
///
/// Requests that touch another tenant's record are reported to the caller
/// as missing, while the audit record keeps the authorization failure.
enum Failure {
    Visible(Error),
    Concealed { reason: Error, shown: Error },
}

impl From<Error> for Failure {
    fn from(error: Error) -> Self {
        Failure::Visible(error)
    }
}

impl From<ValidationError> for Failure {
    fn from(error: ValidationError) -> Self {
        Failure::Visible(error.into())
    }
}

impl From<crate::store::StoreError> for Failure {
    fn from(error: crate::store::StoreError) -> Self {
        Failure::Visible(error.into())
    }
}

impl From<serde_json::Error> for Failure {
    fn from(error: serde_json::Error) -> Self {
        Failure::Visible(error.into())
    }
}

/// Runs list, get, add, update and delete for one resource kind.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use tenant_pipeline::{
///     AuditLogger, MemoryStore, MutationOutcome, PipelineConfig, Principal, RequestContext,
///     RequestParams, WebhookPipeline,
/// };
///
/// let pipeline = WebhookPipeline::new(
///     Arc::new(MemoryStore::new()),
///     AuditLogger::tracing(),
///     &PipelineConfig::default(),
/// );
///
/// let mut ctx = RequestContext::init(None)
///     .authenticate(Some(Principal::new("org-a", "alice")))
///     .unwrap();
///
/// let body = br#"{"owner":"org-a","name":"h1","organization":"org-a","url":"https://hooks.example.com"}"#;
/// let outcome = pipeline
///     .add(&mut ctx, &RequestParams::for_organization("org-a"), body)
///     .unwrap();
/// assert_eq!(outcome, MutationOutcome::Affected);
/// ```
pub struct ResourcePipeline<R, S> {
    store: Arc<S>,
    audit: AuditLogger,
    quota: QuotaEnforcer,
    sanitizer: ResourceSanitizer,
    root_owner: String,
    _resource: PhantomData<fn() -> R>,
}

impl<R, S> ResourcePipeline<R, S>
where
    R: Resource,
    S: ResourceStore<R>,
{
    /// Creates a pipeline over `store`.
    pub fn new(store: Arc<S>, audit: AuditLogger, config: &PipelineConfig) -> Self {
        Self {
            store,
            audit,
            quota: QuotaEnforcer::new(config.quota),
            sanitizer: ResourceSanitizer,
            root_owner: config.root_owner.clone(),
            _resource: PhantomData,
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Lists resources inside the caller's organization scope.
    ///
    /// # Errors
    ///
    /// - `Error::Unauthorized` when the scope check fails
    /// - `Error::ValidationFailed` when `field` or `sort_field` is not a plain identifier
    /// - `Error::Persistence` when the store fails
    pub fn list(&self, ctx: &RequestContext, params: &RequestParams) -> Result<Page<R>> {
        let decision = authorize_request(ctx, &params.owner, &params.organization)?;

        for (label, value) in [("field", &params.field), ("sortField", &params.sort_field)] {
            if !value.is_empty() && !is_allowed_db_identifier(value) {
                return Err(ValidationError::new(
                    ValidationErrorKind::InvalidIdentifier,
                    label,
                    format!("{label} is not a valid identifier"),
                )
                .into());
            }
        }

        let owner = if R::KIND.has_fixed_owner() {
            self.root_owner.clone()
        } else {
            params.owner.clone()
        };
        let filter = ListFilter {
            owner,
            organization: params.organization.clone(),
            field: params.field.clone(),
            value: params.value.clone(),
        };

        let total = self.store.count(&filter)?;
        let offset = match (params.page, params.limit) {
            (Some(page), Some(limit)) => page.saturating_sub(1).saturating_mul(limit),
            _ => 0,
        };
        let items = self.store.paginate(&PageQuery {
            filter,
            offset,
            limit: params.limit,
            sort_field: params.sort_field.clone(),
            sort_order: SortOrder::parse(&params.sort_order),
        })?;

        ctx.log().debug(format_args!(
            "listed {} of {total} {} records",
            items.len(),
            R::KIND
        ));

        Ok(Page {
            items: decision.mask_all(items),
            total,
        })
    }

    /// Loads one resource by `params.id`.
    ///
    /// Public-read kinds are returned to any authenticated caller, masked.
    /// Other kinds require organization authorization and come back as
    /// `None` when the record belongs to another organization.
    ///
    /// # Errors
    ///
    /// - `Error::Unauthorized` when the scope check fails (non-public kinds)
    /// - `Error::Persistence` when the store fails
    pub fn get(&self, ctx: &RequestContext, params: &RequestParams) -> Result<Option<R>> {
        let decision = if R::PUBLIC_READ {
            AuthorizationGate::new(ctx).require(Authenticated).build()?
        } else {
            authorize_request(ctx, &params.owner, &params.organization)?
        };

        let Some(resource) = self.store.get(&params.id)? else {
            return Ok(None);
        };

        if !R::PUBLIC_READ
            && decision
                .validate_organization_ownership(resource.organization())
                .is_err()
        {
            ctx.log().debug(format_args!(
                "hiding {} {} from a foreign organization",
                R::KIND,
                params.id
            ));
            return Ok(None);
        }

        Ok(Some(decision.mask_for_viewer(resource)))
    }

    /// Replaces the resource stored under `params.id` with the decoded `body`.
    ///
    /// # Errors
    ///
    /// - `Error::Unauthorized` when the scope check fails
    /// - `Error::InvalidPayload` / `Error::ValidationFailed` for a bad body,
    ///   including an attempt to change the identifier
    /// - `Error::Forbidden` when the body names an organization outside the scope
    /// - `Error::NotFound` when the stored record belongs to another organization
    /// - `Error::Persistence` when the store fails
    pub fn update(
        &self,
        ctx: &mut RequestContext,
        params: &RequestParams,
        body: &[u8],
    ) -> Result<MutationOutcome> {
        self.audited(ctx, Mutation::Update, &params.id, |ctx| {
            let decision = authorize_request(ctx, &params.owner, &params.organization)?;
            let payload = self.decode(ctx, body)?;

            decision.validate_organization_ownership(payload.peek().organization())?;

            let Some(stored) = self.store.get(&params.id)? else {
                return Ok(MutationOutcome::NotAffected);
            };
            self.check_stored_scope(&decision, &stored)?;

            if payload.peek().id() != params.id {
                return Err(ValidationError::new(
                    ValidationErrorKind::ImmutableIdentifier,
                    "Name",
                    format!("the identifier of {} cannot be changed", params.id),
                )
                .into());
            }

            let verified = self.sanitizer.sanitize(payload)?;
            Ok(MutationOutcome::from_affected(
                self.store.upsert(&params.id, &verified)?,
            ))
        })
    }

    /// Creates a resource from the decoded `body`.
    ///
    /// # Errors
    ///
    /// - `Error::Unauthorized` when the scope check fails
    /// - `Error::InvalidPayload` / `Error::ValidationFailed` for a bad body
    /// - `Error::Forbidden` when the body names an organization outside the scope
    /// - `Error::QuotaExceeded` when the kind's limit is reached
    /// - `Error::Persistence` when the store fails
    pub fn add(
        &self,
        ctx: &mut RequestContext,
        params: &RequestParams,
        body: &[u8],
    ) -> Result<MutationOutcome> {
        self.audited(ctx, Mutation::Add, "", |ctx| {
            let decision = authorize_request(ctx, &params.owner, &params.organization)?;
            let payload = self.decode(ctx, body)?;

            decision.validate_organization_ownership(payload.peek().organization())?;
            let verified = self.sanitizer.sanitize(payload)?;

            let count = self.store.count(&ListFilter::default())?;
            self.quota.check_quota(count, R::KIND)?;

            Ok(MutationOutcome::from_affected(self.store.insert(&verified)?))
        })
    }

    /// Removes the stored resource whose identifier the decoded `body` names.
    ///
    /// # Errors
    ///
    /// - `Error::Unauthorized` when the scope check fails
    /// - `Error::InvalidPayload` for an undecodable body
    /// - `Error::NotFound` when the stored record belongs to another organization
    /// - `Error::Persistence` when the store fails
    pub fn delete(
        &self,
        ctx: &mut RequestContext,
        params: &RequestParams,
        body: &[u8],
    ) -> Result<MutationOutcome> {
        self.audited(ctx, Mutation::Delete, "", |ctx| {
            let decision = authorize_request(ctx, &params.owner, &params.organization)?;
            let payload = self.decode(ctx, body)?;

            let Some(stored) = self.store.get(&payload.peek().id())? else {
                return Ok(MutationOutcome::NotAffected);
            };
            self.check_stored_scope(&decision, &stored)?;

            Ok(MutationOutcome::from_affected(self.store.delete(&stored)?))
        })
    }

    /// Decodes the body, records the object id unless the target is already
    /// known, and pins the owner for fixed-owner kinds.
    fn decode(&self, ctx: &mut RequestContext, body: &[u8]) -> Result<Tainted<R>, Failure> {
        let resource: R = serde_json::from_slice(body)?;
        let root_owner = &self.root_owner;
        let payload = Tainted::new(resource).map(|mut r| {
            if R::KIND.has_fixed_owner() {
                r.set_owner(root_owner);
            }
            r
        });
        if ctx.item(ITEM_OBJECT).is_none() {
            ctx.set_item(ITEM_OBJECT, payload.peek().id());
        }
        Ok(payload)
    }

    fn check_stored_scope(&self, decision: &AuthorizationDecision, stored: &R) -> Result<(), Failure> {
        decision
            .validate_organization_ownership(stored.organization())
            .map_err(|reason| Failure::Concealed {
                reason,
                shown: Error::NotFound(format!("The {}: {}", R::KIND, stored.id())),
            })
    }

    /// Runs a mutation and records its outcome exactly once.
    ///
    /// A non-empty `target` is the object id recorded even when `run` fails
    /// before the body is decoded.
    fn audited(
        &self,
        ctx: &mut RequestContext,
        mutation: Mutation,
        target: &str,
        run: impl FnOnce(&mut RequestContext) -> Result<MutationOutcome, Failure>,
    ) -> Result<MutationOutcome> {
        let operation = R::KIND.operation(mutation);
        ctx.remove_item(ITEM_OBJECT);
        if !target.is_empty() {
            ctx.set_item(ITEM_OBJECT, target);
        }
        ctx.set_item(ITEM_OBJECT_TYPE, R::KIND.as_str());
        let actor = ctx.principal().owner_and_name();
        ctx.set_item(ITEM_USER, actor);

        let outcome = run(ctx);
        match outcome {
            Ok(MutationOutcome::Affected) => {
                self.audit.record(
                    ctx,
                    operation,
                    OperationResult::Success,
                    AuditDetail::none().with(
                        "message",
                        format!("{} has been successfully {}", R::KIND, past_tense(mutation)),
                    ),
                );
                Ok(MutationOutcome::Affected)
            }
            Ok(MutationOutcome::NotAffected) => {
                self.audit.record(
                    ctx,
                    operation,
                    OperationResult::Failure,
                    AuditDetail::error("not affected"),
                );
                Ok(MutationOutcome::NotAffected)
            }
            Err(Failure::Visible(error)) => {
                self.report(ctx, &error);
                self.audit
                    .record(ctx, operation, OperationResult::Failure, AuditDetail::from_error(&error));
                Err(error)
            }
            Err(Failure::Concealed { reason, shown }) => {
                self.report(ctx, &reason);
                self.audit
                    .record(ctx, operation, OperationResult::Failure, AuditDetail::from_error(&reason));
                Err(shown)
            }
        }
    }

    fn report(&self, ctx: &RequestContext, error: &Error) {
        match error {
            Error::Persistence(_) | Error::Config(_) | Error::Internal(_) => {
                ctx.log().error(format_args!("{} mutation failed: {error}", R::KIND))
            }
            _ => ctx.log().debug(format_args!("{} mutation rejected: {error}", R::KIND)),
        }
    }
}

fn past_tense(mutation: Mutation) -> &'static str {
    match mutation {
        Mutation::Add => "added",
        Mutation::Update => "updated",
        Mutation::Delete => "deleted",
    }
}
