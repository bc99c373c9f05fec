use super::ApplicationPipeline;
use crate::context::RequestContext;
use crate::error::{Error, Result};
use crate::gate::AuthorizationGate;
use crate::policy::Authenticated;
use crate::request::RequestParams;
use crate::resource::{resource_id, Application, Resource};
use crate::store::{CertStore, ResourceStore, UserStore};

impl<S: ResourceStore<Application>> ApplicationPipeline<S> {
    /// Loads an application by `params.id`, optionally attaching the public
    /// key of its signing certificate.
    ///
    /// The certificate is looked up under the application's owner first and
    /// under its organization second. A missing certificate is not an error.
    /// The result is masked for the caller.
    ///
    /// # Errors
    ///
    /// Returns `Error::Persistence` when a store fails.
    pub fn get_application(
        &self,
        ctx: &RequestContext,
        params: &RequestParams,
        certs: &dyn CertStore,
        with_key: bool,
    ) -> Result<Option<Application>> {
        let decision = AuthorizationGate::new(ctx).require(Authenticated).build()?;

        let Some(mut application) = self.store.get(&params.id)? else {
            return Ok(None);
        };

        if with_key && !application.cert.is_empty() {
            let cert = match certs.get_cert(&resource_id(&application.owner, &application.cert))? {
                Some(cert) => Some(cert),
                None => certs.get_cert(&resource_id(&application.organization, &application.cert))?,
            };
            match cert {
                Some(cert) => application.cert_public_key = cert.certificate,
                None => ctx.log().debug(format_args!(
                    "certificate {} of {} not found",
                    application.cert,
                    application.id()
                )),
            }
        }

        Ok(Some(decision.mask_for_viewer(application)))
    }

    /// Resolves the application a user belongs to.
    ///
    /// Uses the user's sign-up application when set, otherwise the first
    /// application of the user's organization. The result is masked for the
    /// caller, not for the looked-up user.
    ///
    /// # Errors
    ///
    /// - `Error::NotFound` when the user does not exist
    /// - `Error::Persistence` when a store fails
    pub fn get_user_application(
        &self,
        ctx: &RequestContext,
        users: &dyn UserStore,
        user_id: &str,
    ) -> Result<Option<Application>> {
        let decision = AuthorizationGate::new(ctx).require(Authenticated).build()?;

        let user = users
            .get_user(user_id)?
            .ok_or_else(|| Error::NotFound(format!("The user: {user_id}")))?;

        let application = if user.signup_application.is_empty() {
            self.store
                .get_by_owner_field(&self.root_owner, "organization", &user.owner)?
        } else {
            self.store
                .get(&resource_id(&self.root_owner, &user.signup_application))?
        };

        Ok(application.map(|app| decision.mask_for_viewer(app)))
    }
}
