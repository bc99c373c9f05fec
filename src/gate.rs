use crate::context::RequestContext;
use crate::error::{Error, Result};
use crate::policy::{Authenticated, OrganizationScope, OwnerScope, PolicyReq};
use crate::request::Principal;
use crate::resource::Resource;

/// The authorization gate.
///
/// `AuthorizationGate` is the only way to obtain an [`AuthorizationDecision`].
/// Every pipeline operation builds one before it touches the store.
///
/// # Examples
///
/// ```
/// use tenant_pipeline::{AuthorizationGate, Authenticated, OrganizationScope, Principal, RequestContext};
///
/// let ctx = RequestContext::init(None)
///     .authenticate(Some(Principal::new("org-a", "alice")))
///     .unwrap();
///
/// let decision = AuthorizationGate::new(&ctx)
///     .require(Authenticated)
///     .require(OrganizationScope::of("org-a"))
///     .build()
///     .expect("alice may act inside org-a");
///
/// assert_eq!(decision.scope(), Some("org-a"));
/// ```
pub struct AuthorizationGate<'a> {
    principal: &'a Principal,
    requirements: Vec<PolicyReq>,
}

impl<'a> AuthorizationGate<'a> {
    /// Creates a gate for the caller of `ctx`.
    pub fn new(ctx: &'a RequestContext) -> Self {
        Self {
            principal: ctx.principal(),
            requirements: Vec::new(),
        }
    }

    /// Adds a requirement, ignoring it if an identical one is already present.
    pub fn require(mut self, policy: impl Into<PolicyReq>) -> Self {
        let req = policy.into();
        if !self.requirements.contains(&req) {
            self.requirements.push(req);
        }
        self
    }

    /// Evaluates every requirement in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `Error::Unauthorized` for the first requirement that fails.
    pub fn build(self) -> Result<AuthorizationDecision> {
        for req in &self.requirements {
            self.validate_one(req)?;
        }

        let is_global_admin = self.principal.is_global_admin();
        Ok(AuthorizationDecision {
            allowed: true,
            is_global_admin,
            is_organization_admin: self.principal.organization_admin,
            visible_owner_and_name: Some(self.principal.owner_and_name()),
            scope: (!is_global_admin).then(|| self.principal.owner.clone()),
        })
    }

    fn validate_one(&self, req: &PolicyReq) -> Result<()> {
        let principal = self.principal;
        match req {
            PolicyReq::Authenticated => {
                if principal.owner.is_empty() || principal.name.is_empty() {
                    return Err(Error::Unauthorized("Please login first".to_string()));
                }
            }
            PolicyReq::OrganizationScope { organization } => {
                if principal.is_global_admin() {
                    return Ok(());
                }
                if organization.is_empty() {
                    return Err(Error::Unauthorized(format!(
                        "the user: {} is not a global admin and must specify an organization",
                        principal.owner_and_name()
                    )));
                }
                if *organization != principal.owner {
                    return Err(Error::Unauthorized(format!(
                        "the user: {} has no rights over organization: {organization}",
                        principal.owner_and_name()
                    )));
                }
            }
            PolicyReq::OwnerScope { owner } => {
                if principal.is_global_admin() || owner.is_empty() {
                    return Ok(());
                }
                if *owner != principal.owner {
                    return Err(Error::Unauthorized(format!(
                        "the user: {} has no rights over owner: {owner}",
                        principal.owner_and_name()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Authorizes a request against the owner and organization it names.
///
/// Global admins are always allowed. Anyone else must name their own
/// tenant as the organization, and if they name an owner it must be their
/// own tenant too.
///
/// # Errors
///
/// Returns `Error::Unauthorized` when the scope check fails.
pub fn authorize_request(
    ctx: &RequestContext,
    requested_owner: &str,
    requested_organization: &str,
) -> Result<AuthorizationDecision> {
    AuthorizationGate::new(ctx)
        .require(Authenticated)
        .require(OrganizationScope::of(requested_organization))
        .require(OwnerScope::of(requested_owner))
        .build()
}

/// The outcome of a successful gate evaluation.
///
/// Only the gate constructs it, and it lives for a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationDecision {
    allowed: bool,
    is_global_admin: bool,
    is_organization_admin: bool,
    visible_owner_and_name: Option<String>,
    scope: Option<String>,
}

impl AuthorizationDecision {
    /// Always `true` for a decision returned by the gate.
    pub fn allowed(&self) -> bool {
        self.allowed
    }

    /// Whether the caller is exempt from organization scoping.
    pub fn is_global_admin(&self) -> bool {
        self.is_global_admin
    }

    /// `owner/name` of the viewer, used for masking decisions.
    pub fn visible_owner_and_name(&self) -> Option<&str> {
        self.visible_owner_and_name.as_deref()
    }

    /// Organization the caller is confined to; `None` for global admins.
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Checks that `organization` lies inside the caller's scope.
    ///
    /// # Errors
    ///
    /// Returns `Error::Forbidden` for an organization outside the scope.
    pub fn validate_organization_ownership(&self, organization: &str) -> Result<()> {
        match &self.scope {
            Some(scope) if scope != organization => Err(Error::Forbidden(format!(
                "the organization: {organization} is outside the caller's scope"
            ))),
            _ => Ok(()),
        }
    }

    /// Masks secret-bearing fields unless the viewer is a global admin or
    /// owns the resource.
    ///
    /// Kinds with a fixed owner share the root owner across every tenant, so
    /// for them only an organization admin of the record's organization
    /// counts as the owner.
    pub fn mask_for_viewer<R: Resource>(&self, mut resource: R) -> R {
        if !self.may_see_secrets_of(&resource) {
            resource.mask_secrets();
        }
        resource
    }

    /// Applies [`Self::mask_for_viewer`] to every element.
    pub fn mask_all<R: Resource>(&self, resources: Vec<R>) -> Vec<R> {
        resources
            .into_iter()
            .map(|r| self.mask_for_viewer(r))
            .collect()
    }

    fn may_see_secrets_of<R: Resource>(&self, resource: &R) -> bool {
        if self.is_global_admin {
            return true;
        }
        let Some((viewer, _)) = self
            .visible_owner_and_name
            .as_deref()
            .and_then(|id| id.split_once('/'))
        else {
            return false;
        };

        if R::KIND.has_fixed_owner() {
            self.is_organization_admin && viewer == resource.organization()
        } else {
            viewer == resource.owner()
        }
    }
}
