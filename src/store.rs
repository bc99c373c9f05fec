//! Persistence collaborators.
//!
//! The pipeline talks to storage only through these traits. Mutations take
//! `&Verified<R>`, so a payload that skipped the sanitizer cannot be written.

mod memory;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resource::Resource;
use crate::Verified;

pub use memory::{MemoryDirectory, MemoryStore};

/// Failure reported by a storage collaborator.
///
/// The text may contain backend internals; it is logged and audited but
/// never returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backend could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// The backend did not answer in time.
    #[error("store timed out")]
    Timeout,
    /// The backend rejected the operation.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Row filter shared by counting and listing.
///
/// Empty strings mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Exact owner match
    pub owner: String,
    /// Exact organization match
    pub organization: String,
    /// Column for the substring filter; must already be a whitelisted identifier
    pub field: String,
    /// Substring the column must contain
    pub value: String,
}

impl ListFilter {
    /// Filter on organization only.
    pub fn organization(organization: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            ..Self::default()
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Smallest first
    #[default]
    Ascend,
    /// Largest first
    Descend,
}

impl SortOrder {
    /// Parses `ascend`/`descend`; anything else is ascending.
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("descend") {
            SortOrder::Descend
        } else {
            SortOrder::Ascend
        }
    }
}

/// A page request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    /// Rows to include
    pub filter: ListFilter,
    /// Rows to skip
    pub offset: usize,
    /// Page size; `None` returns everything after `offset`
    pub limit: Option<usize>,
    /// Sort column; empty keeps the store's natural order
    pub sort_field: String,
    /// Sort direction
    pub sort_order: SortOrder,
}

/// One page of results plus the unpaginated total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<R> {
    /// The rows on this page
    pub items: Vec<R>,
    /// Rows matching the filter across all pages
    pub total: u64,
}

/// Storage for one resource kind.
pub trait ResourceStore<R: Resource>: Send + Sync {
    /// Loads a resource by `owner/name`.
    fn get(&self, id: &str) -> Result<Option<R>, StoreError>;

    /// Loads the first resource of `owner` whose `field` equals `value`.
    fn get_by_owner_field(&self, owner: &str, field: &str, value: &str)
        -> Result<Option<R>, StoreError>;

    /// Counts rows matching `filter`.
    fn count(&self, filter: &ListFilter) -> Result<u64, StoreError>;

    /// Returns one page of rows.
    fn paginate(&self, query: &PageQuery) -> Result<Vec<R>, StoreError>;

    /// Replaces the row stored under `id`. Returns whether a row changed.
    fn upsert(&self, id: &str, resource: &Verified<R>) -> Result<bool, StoreError>;

    /// Inserts a new row. Returns `false` if the identifier is taken.
    fn insert(&self, resource: &Verified<R>) -> Result<bool, StoreError>;

    /// Removes the row with the resource's identifier. Returns whether one existed.
    fn delete(&self, resource: &R) -> Result<bool, StoreError>;
}

/// A signing certificate.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Cert {
    pub owner: String,
    pub name: String,
    /// PEM-encoded public certificate
    pub certificate: String,
}

/// Read access to certificates.
pub trait CertStore: Send + Sync {
    /// Loads a certificate by `owner/name`.
    fn get_cert(&self, id: &str) -> Result<Option<Cert>, StoreError>;
}

/// The subset of a user record the pipeline needs.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    pub owner: String,
    pub name: String,
    /// Application the user signed up through, if any
    pub signup_application: String,
}

/// Read access to users.
pub trait UserStore: Send + Sync {
    /// Loads a user by `owner/name`.
    fn get_user(&self, id: &str) -> Result<Option<User>, StoreError>;
}
