/// A requirement the authorization gate checks against the caller.
///
/// Requirements are evaluated in the order they were added during
/// `AuthorizationGate::build()`; the first failure wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyReq {
    /// Requires an authenticated principal
    Authenticated,
    /// Requires the caller to act inside this organization
    OrganizationScope {
        /// Requested organization, possibly empty
        organization: String,
    },
    /// Requires the caller to act on records of this owner
    OwnerScope {
        /// Requested owner, possibly empty
        owner: String,
    },
}

/// Policy requiring authentication.
pub struct Authenticated;

/// Policy requiring the caller to be a member of the requested organization.
///
/// Global admins satisfy it for any organization, including the empty one.
pub struct OrganizationScope {
    organization: String,
}

impl OrganizationScope {
    /// Creates the requirement for `organization`.
    pub fn of(organization: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
        }
    }
}

/// Policy requiring the requested owner, when given, to be the caller's own tenant.
pub struct OwnerScope {
    owner: String,
}

impl OwnerScope {
    /// Creates the requirement for `owner`.
    pub fn of(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
        }
    }
}

impl From<Authenticated> for PolicyReq {
    fn from(_: Authenticated) -> Self {
        PolicyReq::Authenticated
    }
}

impl From<OrganizationScope> for PolicyReq {
    fn from(scope: OrganizationScope) -> Self {
        PolicyReq::OrganizationScope {
            organization: scope.organization,
        }
    }
}

impl From<OwnerScope> for PolicyReq {
    fn from(scope: OwnerScope) -> Self {
        PolicyReq::OwnerScope { owner: scope.owner }
    }
}
