/// Organization whose members are global administrators.
pub const BUILT_IN_ORGANIZATION: &str = "built-in";

/// Metadata about an incoming request, as seen by the web boundary.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    /// Network origin of the caller, if known
    pub remote_addr: Option<String>,
    /// Authenticated caller, if any
    pub principal: Option<Principal>,
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Tenant the caller belongs to
    pub owner: String,
    /// Caller name, unique within the tenant
    pub name: String,
    /// Explicit global-admin grant
    pub global_admin: bool,
    /// Administers its own tenant, but not others
    pub organization_admin: bool,
}

impl Principal {
    /// Creates a regular (organization-scoped) principal.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            global_admin: false,
            organization_admin: false,
        }
    }

    /// Creates a principal that administers its own tenant.
    pub fn organization_admin(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            organization_admin: true,
            ..Self::new(owner, name)
        }
    }

    /// Creates a principal with the global-admin grant.
    pub fn global_admin(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            global_admin: true,
            ..Self::new(owner, name)
        }
    }

    /// Members of the built-in organization are global admins even without the flag.
    pub fn is_global_admin(&self) -> bool {
        self.global_admin || self.owner == BUILT_IN_ORGANIZATION
    }

    /// Returns `owner/name`.
    pub fn owner_and_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Query parameters shared by every resource endpoint.
///
/// Values are untrusted; `field` and `sort_field` are checked against the
/// identifier whitelist before they reach the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    /// Requested owner scope
    pub owner: String,
    /// Requested organization scope
    pub organization: String,
    /// Target identifier, `owner/name`
    pub id: String,
    /// Page size; `None` lists everything
    pub limit: Option<usize>,
    /// 1-based page number
    pub page: Option<usize>,
    /// Filter column
    pub field: String,
    /// Filter value (substring match)
    pub value: String,
    /// Sort column
    pub sort_field: String,
    /// `ascend` or `descend`
    pub sort_order: String,
}

impl RequestParams {
    /// Builds params from raw query pairs. Unknown keys are ignored and
    /// unparsable numbers are treated as absent.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            match key {
                "owner" => params.owner = value.to_string(),
                "organization" => params.organization = value.to_string(),
                "id" => params.id = value.to_string(),
                "pageSize" | "limit" => params.limit = value.parse().ok(),
                "p" | "page" => params.page = value.parse().ok(),
                "field" => params.field = value.to_string(),
                "value" => params.value = value.to_string(),
                "sortField" => params.sort_field = value.to_string(),
                "sortOrder" => params.sort_order = value.to_string(),
                _ => {}
            }
        }
        params
    }

    /// Params scoped to one organization.
    pub fn for_organization(organization: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            ..Self::default()
        }
    }

    /// Params addressing one resource by id.
    pub fn for_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}
