//! End-to-end pipeline behavior across authorization, validation, quota
//! and audit.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tenant_pipeline::audit::{AuditTrail, OperationName, OperationResult};
use tenant_pipeline::{
    Application, ApplicationPipeline, AuditLogger, ErrorKind, ListFilter, MemoryStore,
    MutationOutcome, PageQuery, PipelineConfig, Principal, QuotaConfig, RequestContext,
    RequestParams, Resource, ResourceStore, Response, StoreError, Verified, Webhook,
    WebhookPipeline, GENERIC_PERSISTENCE_MESSAGE, MASKED_VALUE,
};

/// Wraps a memory store and counts every call that reaches it.
struct CountingStore<R> {
    inner: MemoryStore<R>,
    calls: AtomicUsize,
}

impl<R: Resource> CountingStore<R> {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl<R: Resource> ResourceStore<R> for CountingStore<R> {
    fn get(&self, id: &str) -> Result<Option<R>, StoreError> {
        self.touch();
        self.inner.get(id)
    }

    fn get_by_owner_field(
        &self,
        owner: &str,
        field: &str,
        value: &str,
    ) -> Result<Option<R>, StoreError> {
        self.touch();
        self.inner.get_by_owner_field(owner, field, value)
    }

    fn count(&self, filter: &ListFilter) -> Result<u64, StoreError> {
        self.touch();
        self.inner.count(filter)
    }

    fn paginate(&self, query: &PageQuery) -> Result<Vec<R>, StoreError> {
        self.touch();
        self.inner.paginate(query)
    }

    fn upsert(&self, id: &str, resource: &Verified<R>) -> Result<bool, StoreError> {
        self.touch();
        self.inner.upsert(id, resource)
    }

    fn insert(&self, resource: &Verified<R>) -> Result<bool, StoreError> {
        self.touch();
        self.inner.insert(resource)
    }

    fn delete(&self, resource: &R) -> Result<bool, StoreError> {
        self.touch();
        self.inner.delete(resource)
    }
}

/// Reads from a memory store; every write fails the way a lost database
/// connection would.
struct FailingStore<R> {
    inner: MemoryStore<R>,
}

const BACKEND_FAILURE: &str = "pq: connection reset by peer";

impl<R: Resource> ResourceStore<R> for FailingStore<R> {
    fn get(&self, id: &str) -> Result<Option<R>, StoreError> {
        self.inner.get(id)
    }

    fn get_by_owner_field(
        &self,
        owner: &str,
        field: &str,
        value: &str,
    ) -> Result<Option<R>, StoreError> {
        self.inner.get_by_owner_field(owner, field, value)
    }

    fn count(&self, filter: &ListFilter) -> Result<u64, StoreError> {
        self.inner.count(filter)
    }

    fn paginate(&self, query: &PageQuery) -> Result<Vec<R>, StoreError> {
        self.inner.paginate(query)
    }

    fn upsert(&self, _id: &str, _resource: &Verified<R>) -> Result<bool, StoreError> {
        Err(StoreError::Backend(BACKEND_FAILURE.into()))
    }

    fn insert(&self, _resource: &Verified<R>) -> Result<bool, StoreError> {
        Err(StoreError::Backend(BACKEND_FAILURE.into()))
    }

    fn delete(&self, _resource: &R) -> Result<bool, StoreError> {
        Err(StoreError::Backend(BACKEND_FAILURE.into()))
    }
}

fn ctx(principal: Principal) -> RequestContext {
    RequestContext::init(Some("10.1.2.3".into()))
        .authenticate(Some(principal))
        .expect("principal present")
}

fn alice() -> RequestContext {
    ctx(Principal::new("org-a", "alice"))
}

fn admin() -> RequestContext {
    ctx(Principal::global_admin("built-in", "admin"))
}

fn webhook_body(owner: &str, name: &str, org: &str, url: &str) -> Vec<u8> {
    serde_json::json!({
        "owner": owner,
        "name": name,
        "organization": org,
        "url": url,
        "headers": [{"name": "Authorization", "value": "Bearer t0k3n"}],
    })
    .to_string()
    .into_bytes()
}

fn webhook(owner: &str, name: &str, org: &str) -> Webhook {
    Webhook {
        owner: owner.into(),
        name: name.into(),
        organization: org.into(),
        url: "https://hooks.example.com/in".into(),
        ..Default::default()
    }
}

#[test]
fn non_admin_without_organization_never_reaches_the_store() {
    let store = Arc::new(CountingStore::<Webhook>::new());
    let trail = Arc::new(AuditTrail::new());
    let pipeline = WebhookPipeline::new(
        store.clone(),
        AuditLogger::new(trail.clone()),
        &PipelineConfig::default(),
    );

    let mut ctx = alice();
    let params = RequestParams::default();

    let err = pipeline.list(&ctx, &params).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let err = pipeline
        .add(&mut ctx, &params, &webhook_body("org-a", "h1", "org-a", "https://x.io"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    assert_eq!(store.calls(), 0);

    // Only the mutation is audited; reads never are.
    let records = trail.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].operation(), OperationName::WebhookAdd);
    assert_eq!(records[0].result(), OperationResult::Failure);
    assert_eq!(records[0].detail().get("kind"), Some("unauthorized"));
}

#[test]
fn cross_tenant_update_and_delete_leave_the_record_alone() {
    let original = webhook("org-b", "h1", "org-b");
    let store = Arc::new(MemoryStore::seeded([original.clone()]));
    let trail = Arc::new(AuditTrail::new());
    let pipeline = WebhookPipeline::new(
        store.clone(),
        AuditLogger::new(trail.clone()),
        &PipelineConfig::default(),
    );

    let mut ctx = alice();
    let params = RequestParams {
        id: "org-b/h1".into(),
        ..RequestParams::for_organization("org-a")
    };
    let body = webhook_body("org-b", "h1", "org-a", "https://attacker.example.com");

    let err = pipeline.update(&mut ctx, &params, &body).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = pipeline.delete(&mut ctx, &params, &body).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert_eq!(store.get("org-b/h1").unwrap(), Some(original));

    // The caller sees "not found"; the audit trail keeps the real reason.
    let records = trail.by_object_id("org-b/h1");
    assert_eq!(records.len(), 2);
    for record in records {
        assert_eq!(record.result(), OperationResult::Failure);
        assert_eq!(record.detail().get("kind"), Some("forbidden"));
    }
}

#[test]
fn payload_for_foreign_organization_is_forbidden() {
    let store = Arc::new(MemoryStore::<Webhook>::new());
    let pipeline = WebhookPipeline::new(
        store.clone(),
        AuditLogger::tracing(),
        &PipelineConfig::default(),
    );

    let err = pipeline
        .add(
            &mut alice(),
            &RequestParams::for_organization("org-a"),
            &webhook_body("org-a", "h1", "org-b", "https://x.io"),
        )
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert!(store.is_empty());
}

#[test]
fn delete_twice_reports_not_affected_the_second_time() {
    let store = Arc::new(MemoryStore::seeded([webhook("org-a", "h1", "org-a")]));
    let trail = Arc::new(AuditTrail::new());
    let pipeline = WebhookPipeline::new(
        store.clone(),
        AuditLogger::new(trail.clone()),
        &PipelineConfig::default(),
    );

    let mut ctx = alice();
    let params = RequestParams::for_organization("org-a");
    let body = webhook_body("org-a", "h1", "org-a", "");

    assert_eq!(
        pipeline.delete(&mut ctx, &params, &body).unwrap(),
        MutationOutcome::Affected
    );
    assert_eq!(
        pipeline.delete(&mut ctx, &params, &body).unwrap(),
        MutationOutcome::NotAffected
    );

    let results: Vec<_> = trail
        .by_operation(OperationName::WebhookDelete)
        .iter()
        .map(|r| r.result())
        .collect();
    assert_eq!(results, [OperationResult::Success, OperationResult::Failure]);
    assert!(store.is_empty());
}

#[test]
fn quota_blocks_creation_until_a_record_is_removed() {
    let config = PipelineConfig {
        quota: QuotaConfig {
            webhook: Some(2),
            ..QuotaConfig::default()
        },
        ..PipelineConfig::default()
    };
    let store = Arc::new(MemoryStore::<Webhook>::new());
    let trail = Arc::new(AuditTrail::new());
    let pipeline = WebhookPipeline::new(store.clone(), AuditLogger::new(trail.clone()), &config);

    let mut ctx = alice();
    let params = RequestParams::for_organization("org-a");
    let add = |ctx: &mut RequestContext, name: &str| {
        pipeline.add(
            ctx,
            &params,
            &webhook_body("org-a", name, "org-a", "https://x.io"),
        )
    };

    assert!(add(&mut ctx, "h1").unwrap().is_affected());
    assert!(add(&mut ctx, "h2").unwrap().is_affected());

    let err = add(&mut ctx, "h3").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::QuotaExceeded);
    assert_eq!(store.len(), 2);

    let rejected = trail.by_object_id("org-a/h3");
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].result(), OperationResult::Failure);

    pipeline
        .delete(&mut ctx, &params, &webhook_body("org-a", "h1", "org-a", ""))
        .unwrap();
    assert!(add(&mut ctx, "h3").unwrap().is_affected());

    let successes = trail
        .by_operation(OperationName::WebhookAdd)
        .into_iter()
        .filter(|r| r.result() == OperationResult::Success)
        .count();
    assert_eq!(successes, 3);
}

#[test]
fn admin_created_application_is_listed_masked_for_the_organization() {
    let store = Arc::new(MemoryStore::<Application>::new());
    let pipeline = ApplicationPipeline::new(
        store.clone(),
        AuditLogger::tracing(),
        &PipelineConfig::default(),
    );

    let body = serde_json::json!({
        "owner": "org-a",
        "name": "portal",
        "organization": "org-a",
        "clientSecret": "s3cr3t",
        "homepageUrl": "https://portal.example.com",
    })
    .to_string();
    let outcome = pipeline
        .add(&mut admin(), &RequestParams::default(), body.as_bytes())
        .unwrap();
    assert_eq!(outcome, MutationOutcome::Affected);

    // The owner is pinned to the root tenant whatever the payload said.
    let stored = store.get("admin/portal").unwrap().unwrap();
    assert_eq!(stored.client_secret, "s3cr3t");

    let page = pipeline
        .list(&alice(), &RequestParams::for_organization("org-a"))
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].name, "portal");
    assert_eq!(page.items[0].client_secret, MASKED_VALUE);

    let page = pipeline.list(&admin(), &RequestParams::default()).unwrap();
    assert_eq!(page.items[0].client_secret, "s3cr3t");
}

#[test]
fn identifier_cannot_change_on_update() {
    let store = Arc::new(MemoryStore::seeded([webhook("org-a", "h1", "org-a")]));
    let pipeline = WebhookPipeline::new(
        store.clone(),
        AuditLogger::tracing(),
        &PipelineConfig::default(),
    );

    let params = RequestParams {
        id: "org-a/h1".into(),
        ..RequestParams::for_organization("org-a")
    };
    let err = pipeline
        .update(
            &mut alice(),
            &params,
            &webhook_body("org-a", "renamed", "org-a", "https://x.io"),
        )
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    assert!(store.get("org-a/renamed").unwrap().is_none());
    assert!(store.get("org-a/h1").unwrap().is_some());
}

#[test]
fn invalid_url_rejects_the_whole_update() {
    let original = webhook("org-a", "h1", "org-a");
    let store = Arc::new(MemoryStore::seeded([original.clone()]));
    let trail = Arc::new(AuditTrail::new());
    let pipeline = WebhookPipeline::new(
        store.clone(),
        AuditLogger::new(trail.clone()),
        &PipelineConfig::default(),
    );

    let params = RequestParams {
        id: "org-a/h1".into(),
        ..RequestParams::for_organization("org-a")
    };
    let err = pipeline
        .update(
            &mut alice(),
            &params,
            &webhook_body("org-a", "h1", "org-a", "javascript:alert(document.cookie)"),
        )
        .unwrap_err();

    assert_eq!(err.user_message(), "Url field is not valid URL");
    assert_eq!(store.get("org-a/h1").unwrap(), Some(original));

    let records = trail.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].operation(), OperationName::WebhookUpdate);
    assert_eq!(records[0].detail().get("kind"), Some("validation_failed"));
}

#[test]
fn audit_record_carries_request_items() {
    let trail = Arc::new(AuditTrail::new());
    let pipeline = WebhookPipeline::new(
        Arc::new(MemoryStore::new()),
        AuditLogger::new(trail.clone()),
        &PipelineConfig::default(),
    );

    let mut ctx = alice();
    let correlation_id = ctx.correlation_id().to_string();
    pipeline
        .add(
            &mut ctx,
            &RequestParams::for_organization("org-a"),
            &webhook_body("org-a", "h1", "org-a", "https://x.io"),
        )
        .unwrap();

    let records = trail.by_correlation_id(&correlation_id);
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.actor(), "org-a/alice");
    assert_eq!(record.object_type(), "webhook");
    assert_eq!(record.object_id(), "org-a/h1");
    assert_eq!(record.fields()["ip"], "10.1.2.3");
}

#[test]
fn webhook_reads_hide_foreign_records_and_mask_headers() {
    // Stored under the root tenant, so members of org-a see it masked.
    let mut hook = webhook("admin", "h1", "org-a");
    hook.headers = vec![tenant_pipeline::WebhookHeader {
        name: "Authorization".into(),
        value: "Bearer t0k3n".into(),
    }];
    let pipeline = WebhookPipeline::new(
        Arc::new(MemoryStore::seeded([hook, webhook("org-b", "h2", "org-b")])),
        AuditLogger::tracing(),
        &PipelineConfig::default(),
    );

    let foreign = RequestParams {
        id: "org-b/h2".into(),
        ..RequestParams::for_organization("org-a")
    };
    assert!(pipeline.get(&alice(), &foreign).unwrap().is_none());

    let own = RequestParams {
        id: "admin/h1".into(),
        ..RequestParams::for_organization("org-a")
    };
    let fetched = pipeline.get(&alice(), &own).unwrap().unwrap();
    assert_eq!(fetched.headers[0].value, MASKED_VALUE);

    let page = pipeline.list(&admin(), &RequestParams::default()).unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items[0].headers[0].value, "Bearer t0k3n");
}

#[test]
fn store_failure_is_audited_once_and_hidden_from_the_caller() {
    let store = Arc::new(FailingStore {
        inner: MemoryStore::seeded([webhook("org-a", "h1", "org-a")]),
    });
    let trail = Arc::new(AuditTrail::new());
    let pipeline = WebhookPipeline::new(
        store,
        AuditLogger::new(trail.clone()),
        &PipelineConfig::default(),
    );
    let params = RequestParams {
        id: "org-a/h1".into(),
        ..RequestParams::for_organization("org-a")
    };

    let attempts = [
        pipeline.add(
            &mut alice(),
            &params,
            &webhook_body("org-a", "h2", "org-a", "https://x.io"),
        ),
        pipeline.update(
            &mut alice(),
            &params,
            &webhook_body("org-a", "h1", "org-a", "https://y.io"),
        ),
        pipeline.delete(
            &mut alice(),
            &params,
            &webhook_body("org-a", "h1", "org-a", ""),
        ),
    ];

    for result in attempts {
        let err = result.as_ref().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Persistence);

        let response = Response::action(result);
        assert_eq!(response.status, "error");
        assert_eq!(response.message.as_deref(), Some(GENERIC_PERSISTENCE_MESSAGE));
    }

    let records = trail.records();
    assert_eq!(records.len(), 3);
    for record in &records {
        assert_eq!(record.result(), OperationResult::Failure);
        assert_eq!(record.detail().get("kind"), Some("persistence"));
        assert!(record
            .detail()
            .get("error")
            .is_some_and(|e| e.contains(BACKEND_FAILURE)));
    }
    let operations: Vec<_> = records.iter().map(|r| r.operation()).collect();
    assert_eq!(
        operations,
        [
            OperationName::WebhookAdd,
            OperationName::WebhookUpdate,
            OperationName::WebhookDelete,
        ]
    );
}

#[test]
fn tenant_named_like_the_root_owner_cannot_read_application_secrets() {
    let app = Application {
        owner: "admin".into(),
        name: "app1".into(),
        organization: "org-b".into(),
        client_secret: "s3cr3t".into(),
        ..Default::default()
    };
    let pipeline = ApplicationPipeline::new(
        Arc::new(MemoryStore::seeded([app])),
        AuditLogger::tracing(),
        &PipelineConfig::default(),
    );
    let params = RequestParams {
        id: "admin/app1".into(),
        ..Default::default()
    };

    let mallory = ctx(Principal::new("admin", "mallory"));
    let seen = pipeline.get(&mallory, &params).unwrap().unwrap();
    assert_eq!(seen.client_secret, MASKED_VALUE);

    let org_admin = ctx(Principal::organization_admin("org-b", "bea"));
    let seen = pipeline.get(&org_admin, &params).unwrap().unwrap();
    assert_eq!(seen.client_secret, "s3cr3t");
}
