use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;
use serde_json::Value;

use super::{Cert, CertStore, ListFilter, PageQuery, ResourceStore, SortOrder, StoreError, User, UserStore};
use crate::resource::Resource;
use crate::Verified;

/// In-memory [`ResourceStore`].
///
/// Rows are kept in identifier order, which is also the listing order when
/// no sort field is given. Column lookups go through the resource's JSON
/// form, so both `display_name` and `displayName` address the same column.
#[derive(Debug)]
pub struct MemoryStore<R> {
    rows: RwLock<BTreeMap<String, R>>,
}

impl<R> Default for MemoryStore<R> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<R: Resource> MemoryStore<R> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `rows`, bypassing validation.
    ///
    /// Meant for fixtures and migrations of data that was validated when
    /// first written.
    pub fn seeded(rows: impl IntoIterator<Item = R>) -> Self {
        let store = Self::new();
        {
            let mut map = store.rows.write();
            for row in rows {
                map.insert(row.id(), row);
            }
        }
        store
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    fn matches(row: &R, filter: &ListFilter) -> bool {
        if !filter.owner.is_empty() && row.owner() != filter.owner {
            return false;
        }
        if !filter.organization.is_empty() && row.organization() != filter.organization {
            return false;
        }
        if filter.field.is_empty() || filter.value.is_empty() {
            return true;
        }
        column(row, &filter.field).is_some_and(|v| v.contains(&filter.value))
    }
}

impl<R: Resource> ResourceStore<R> for MemoryStore<R> {
    fn get(&self, id: &str) -> Result<Option<R>, StoreError> {
        Ok(self.rows.read().get(id).cloned())
    }

    fn get_by_owner_field(
        &self,
        owner: &str,
        field: &str,
        value: &str,
    ) -> Result<Option<R>, StoreError> {
        Ok(self
            .rows
            .read()
            .values()
            .find(|row| row.owner() == owner && column(*row, field).as_deref() == Some(value))
            .cloned())
    }

    fn count(&self, filter: &ListFilter) -> Result<u64, StoreError> {
        let count = self
            .rows
            .read()
            .values()
            .filter(|row| Self::matches(row, filter))
            .count();
        Ok(count as u64)
    }

    fn paginate(&self, query: &PageQuery) -> Result<Vec<R>, StoreError> {
        let mut rows: Vec<R> = self
            .rows
            .read()
            .values()
            .filter(|row| Self::matches(row, &query.filter))
            .cloned()
            .collect();

        if !query.sort_field.is_empty() {
            let key = |row: &R| column(row, &query.sort_field).unwrap_or_default();
            rows.sort_by(|a, b| {
                let ord = compare_columns(&key(a), &key(b));
                match query.sort_order {
                    SortOrder::Ascend => ord,
                    SortOrder::Descend => ord.reverse(),
                }
            });
        }

        let page = rows.into_iter().skip(query.offset);
        Ok(match query.limit {
            Some(limit) => page.take(limit).collect(),
            None => page.collect(),
        })
    }

    fn upsert(&self, id: &str, resource: &Verified<R>) -> Result<bool, StoreError> {
        let mut rows = self.rows.write();
        if rows.remove(id).is_none() {
            return Ok(false);
        }
        let row = resource.as_ref().clone();
        rows.insert(row.id(), row);
        Ok(true)
    }

    fn insert(&self, resource: &Verified<R>) -> Result<bool, StoreError> {
        let row = resource.as_ref();
        let mut rows = self.rows.write();
        if rows.contains_key(&row.id()) {
            return Ok(false);
        }
        rows.insert(row.id(), row.clone());
        Ok(true)
    }

    fn delete(&self, resource: &R) -> Result<bool, StoreError> {
        Ok(self.rows.write().remove(&resource.id()).is_some())
    }
}

/// Renders a column of `row` as a string, or `None` if the row has no such column.
fn column<R: Resource>(row: &R, field: &str) -> Option<String> {
    let json = serde_json::to_value(row).ok()?;
    let value = json.get(field).or_else(|| json.get(snake_to_camel(field)))?;
    Some(match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn compare_columns(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.cmp(b),
    }
}

fn snake_to_camel(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// In-memory [`CertStore`] and [`UserStore`].
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    certs: RwLock<HashMap<String, Cert>>,
    users: RwLock<HashMap<String, User>>,
}

impl MemoryDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a certificate.
    pub fn put_cert(&self, cert: Cert) {
        let id = crate::resource::resource_id(&cert.owner, &cert.name);
        self.certs.write().insert(id, cert);
    }

    /// Adds or replaces a user.
    pub fn put_user(&self, user: User) {
        let id = crate::resource::resource_id(&user.owner, &user.name);
        self.users.write().insert(id, user);
    }
}

impl CertStore for MemoryDirectory {
    fn get_cert(&self, id: &str) -> Result<Option<Cert>, StoreError> {
        Ok(self.certs.read().get(id).cloned())
    }
}

impl UserStore for MemoryDirectory {
    fn get_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Application;

    fn app(name: &str, org: &str, display: &str) -> Application {
        Application {
            owner: "admin".into(),
            name: name.into(),
            organization: org.into(),
            display_name: display.into(),
            ..Default::default()
        }
    }

    fn verified(app: Application) -> Verified<Application> {
        Verified::new_unchecked(app)
    }

    #[test]
    fn insert_then_get() {
        let store = MemoryStore::new();
        assert!(store.insert(&verified(app("a", "org-a", "A"))).unwrap());
        assert_eq!(store.get("admin/a").unwrap().unwrap().display_name, "A");
        assert!(store.get("admin/missing").unwrap().is_none());
    }

    #[test]
    fn insert_duplicate_is_not_affected() {
        let store = MemoryStore::new();
        assert!(store.insert(&verified(app("a", "org-a", "A"))).unwrap());
        assert!(!store.insert(&verified(app("a", "org-a", "B"))).unwrap());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn upsert_requires_existing_row() {
        let store = MemoryStore::new();
        assert!(!store.upsert("admin/a", &verified(app("a", "org-a", "A"))).unwrap());

        store.insert(&verified(app("a", "org-a", "A"))).unwrap();
        assert!(store.upsert("admin/a", &verified(app("a", "org-a", "A2"))).unwrap());
        assert_eq!(store.get("admin/a").unwrap().unwrap().display_name, "A2");
    }

    #[test]
    fn delete_reports_presence() {
        let store = MemoryStore::seeded([app("a", "org-a", "A")]);
        let row = app("a", "org-a", "");
        assert!(store.delete(&row).unwrap());
        assert!(!store.delete(&row).unwrap());
    }

    #[test]
    fn count_and_filter() {
        let store = MemoryStore::seeded([
            app("a", "org-a", "Alpha"),
            app("b", "org-a", "Beta"),
            app("c", "org-b", "Alphabet"),
        ]);

        assert_eq!(store.count(&ListFilter::default()).unwrap(), 3);
        assert_eq!(store.count(&ListFilter::organization("org-a")).unwrap(), 2);

        let filter = ListFilter {
            field: "display_name".into(),
            value: "Alpha".into(),
            ..ListFilter::default()
        };
        assert_eq!(store.count(&filter).unwrap(), 2);
    }

    #[test]
    fn paginate_sorts_and_pages() {
        let store = MemoryStore::seeded([
            app("a", "org-a", "3"),
            app("b", "org-a", "10"),
            app("c", "org-a", "2"),
        ]);

        let query = PageQuery {
            sort_field: "displayName".into(),
            sort_order: SortOrder::Descend,
            limit: Some(2),
            ..PageQuery::default()
        };
        let names: Vec<_> = store
            .paginate(&query)
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, ["b", "a"]);

        let next = PageQuery { offset: 2, ..query };
        assert_eq!(store.paginate(&next).unwrap()[0].name, "c");
    }

    #[test]
    fn get_by_owner_field() {
        let store = MemoryStore::seeded([app("a", "org-a", "A"), app("b", "org-b", "B")]);

        let found = store
            .get_by_owner_field("admin", "organization", "org-b")
            .unwrap()
            .unwrap();
        assert_eq!(found.name, "b");
        assert!(store
            .get_by_owner_field("other", "organization", "org-b")
            .unwrap()
            .is_none());
    }

    #[test]
    fn snake_case_columns_resolve() {
        assert_eq!(snake_to_camel("homepage_url"), "homepageUrl");
        assert_eq!(snake_to_camel("name"), "name");
    }

    #[test]
    fn directory_lookups() {
        let dir = MemoryDirectory::new();
        dir.put_cert(Cert {
            owner: "admin".into(),
            name: "cert-1".into(),
            certificate: "PEM".into(),
        });
        dir.put_user(User {
            owner: "org-a".into(),
            name: "alice".into(),
            signup_application: "app1".into(),
        });

        assert_eq!(dir.get_cert("admin/cert-1").unwrap().unwrap().certificate, "PEM");
        assert_eq!(
            dir.get_user("org-a/alice").unwrap().unwrap().signup_application,
            "app1"
        );
        assert!(dir.get_user("org-a/bob").unwrap().is_none());
    }
}
