//! Endpoint handlers for the application and webhook admin API.
//!
//! Each handler takes an adapted request, runs one pipeline operation with
//! an explicitly passed context, and renders the response envelope. There
//! is no framework code here; an integration maps its router onto
//! [`AdminApi::dispatch`] or onto the individual handlers.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::Error;
use crate::pipeline::{ApplicationPipeline, WebhookPipeline};
use crate::resource::Resource;
use crate::response::Response;
use crate::store::{CertStore, ResourceStore, UserStore};
use crate::{Application, ResourcePipeline, Webhook};

use super::{extract_authed, RequestAdapter};

/// The admin API over one application store and one webhook store.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use tenant_pipeline::web::{AdminApi, RequestAdapter};
/// use tenant_pipeline::{
///     ApplicationPipeline, AuditLogger, MemoryDirectory, MemoryStore, PipelineConfig, Principal,
///     WebhookPipeline,
/// };
///
/// let config = PipelineConfig::default();
/// let directory = Arc::new(MemoryDirectory::new());
/// let api = AdminApi::new(
///     ApplicationPipeline::new(Arc::new(MemoryStore::new()), AuditLogger::tracing(), &config),
///     WebhookPipeline::new(Arc::new(MemoryStore::new()), AuditLogger::tracing(), &config),
///     directory.clone(),
///     directory,
/// );
///
/// let mut request = RequestAdapter::new();
/// request.set_principal(Some(Principal::new("org-a", "alice")));
/// request.add_query_param("organization", "org-a");
///
/// let response = api.dispatch("get-applications", &request).unwrap();
/// assert_eq!(response.status, "ok");
/// assert_eq!(response.total_count, Some(0));
/// ```
pub struct AdminApi<A, W> {
    applications: ApplicationPipeline<A>,
    webhooks: WebhookPipeline<W>,
    certs: Arc<dyn CertStore>,
    users: Arc<dyn UserStore>,
}

impl<A, W> AdminApi<A, W>
where
    A: ResourceStore<Application>,
    W: ResourceStore<Webhook>,
{
    /// Wires the handlers to their pipelines and lookup stores.
    pub fn new(
        applications: ApplicationPipeline<A>,
        webhooks: WebhookPipeline<W>,
        certs: Arc<dyn CertStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            applications,
            webhooks,
            certs,
            users,
        }
    }

    /// Routes a request by endpoint name. Returns `None` for unknown routes.
    pub fn dispatch(&self, route: &str, request: &RequestAdapter) -> Option<Response<Value>> {
        let response = match route {
            "get-applications" => into_json(handle_list(&self.applications, request)),
            "get-application" => into_json(self.get_application(request)),
            "get-user-application" => into_json(self.get_user_application(request)),
            "update-application" => into_json(handle_update(&self.applications, request)),
            "add-application" => into_json(handle_add(&self.applications, request)),
            "delete-application" => into_json(handle_delete(&self.applications, request)),
            "get-webhooks" => into_json(handle_list(&self.webhooks, request)),
            "get-webhook" => into_json(handle_get(&self.webhooks, request)),
            "update-webhook" => into_json(handle_update(&self.webhooks, request)),
            "add-webhook" => into_json(handle_add(&self.webhooks, request)),
            "delete-webhook" => into_json(handle_delete(&self.webhooks, request)),
            _ => return None,
        };
        Some(response)
    }

    /// `GET get-application?id=owner/name[&withKey=1]`
    pub fn get_application(&self, request: &RequestAdapter) -> Response<Option<Application>> {
        let with_key = request
            .query_param("withKey")
            .is_some_and(|v| !v.is_empty());

        extract_authed(request)
            .and_then(|ex| {
                self.applications
                    .get_application(&ex.context, &ex.params, self.certs.as_ref(), with_key)
            })
            .into()
    }

    /// `GET get-user-application?id=owner/name`
    pub fn get_user_application(&self, request: &RequestAdapter) -> Response<Option<Application>> {
        extract_authed(request)
            .and_then(|ex| {
                self.applications
                    .get_user_application(&ex.context, self.users.as_ref(), &ex.params.id)
            })
            .into()
    }
}

/// `GET get-<kind>s`
pub fn handle_list<R, S>(pipeline: &ResourcePipeline<R, S>, request: &RequestAdapter) -> Response<Vec<R>>
where
    R: Resource,
    S: ResourceStore<R>,
{
    match extract_authed(request).and_then(|ex| pipeline.list(&ex.context, &ex.params)) {
        Ok(page) => Response::ok_page(page),
        Err(e) => Response::error(&e),
    }
}

/// `GET get-<kind>?id=owner/name`
pub fn handle_get<R, S>(pipeline: &ResourcePipeline<R, S>, request: &RequestAdapter) -> Response<Option<R>>
where
    R: Resource,
    S: ResourceStore<R>,
{
    extract_authed(request)
        .and_then(|ex| pipeline.get(&ex.context, &ex.params))
        .into()
}

/// `POST update-<kind>?id=owner/name` with the new record as body.
pub fn handle_update<R, S>(pipeline: &ResourcePipeline<R, S>, request: &RequestAdapter) -> Response<&'static str>
where
    R: Resource,
    S: ResourceStore<R>,
{
    Response::action(extract_authed(request).and_then(|mut ex| {
        pipeline.update(&mut ex.context, &ex.params, request.body())
    }))
}

/// `POST add-<kind>` with the record as body.
pub fn handle_add<R, S>(pipeline: &ResourcePipeline<R, S>, request: &RequestAdapter) -> Response<&'static str>
where
    R: Resource,
    S: ResourceStore<R>,
{
    Response::action(extract_authed(request).and_then(|mut ex| {
        pipeline.add(&mut ex.context, &ex.params, request.body())
    }))
}

/// `POST delete-<kind>` with the record (at least owner and name) as body.
pub fn handle_delete<R, S>(pipeline: &ResourcePipeline<R, S>, request: &RequestAdapter) -> Response<&'static str>
where
    R: Resource,
    S: ResourceStore<R>,
{
    Response::action(extract_authed(request).and_then(|mut ex| {
        pipeline.delete(&mut ex.context, &ex.params, request.body())
    }))
}

fn into_json<T: Serialize>(response: Response<T>) -> Response<Value> {
    let Response {
        status,
        message,
        data,
        total_count,
    } = response;

    match data.map(serde_json::to_value).transpose() {
        Ok(data) => Response {
            status,
            message,
            data,
            total_count,
        },
        Err(e) => {
            let error = Error::Internal(format!("response serialization failed: {e}"));
            tracing::error!(%error, "could not render response");
            Response::error(&error)
        }
    }
}
