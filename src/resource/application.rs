use serde::{Deserialize, Serialize};

use super::{Resource, ResourceKind, UrlField, MASKED_VALUE};

/// A client application registered with the identity service.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Application {
    pub owner: String,
    pub name: String,
    pub created_time: String,
    pub display_name: String,
    pub logo: String,
    pub homepage_url: String,
    pub description: String,
    pub organization: String,
    pub cert: String,
    pub enable_password: bool,
    pub enable_sign_up: bool,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uris: Vec<String>,
    pub token_format: String,
    pub expire_in_hours: i64,
    pub saml_reply_url: String,
    pub signup_url: String,
    pub signin_url: String,
    pub forget_url: String,
    pub affiliation_url: String,
    pub form_background_url: String,
    /// Filled on demand from the application's certificate; never stored.
    pub cert_public_key: String,
}

impl Resource for Application {
    const KIND: ResourceKind = ResourceKind::Application;

    // The sign-in page needs the application before the user has a session.
    const PUBLIC_READ: bool = true;

    fn owner(&self) -> &str {
        &self.owner
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn organization(&self) -> &str {
        &self.organization
    }

    fn set_owner(&mut self, owner: &str) {
        self.owner = owner.to_string();
    }

    fn url_fields(&self) -> Vec<UrlField<'_>> {
        vec![
            UrlField::new("Logo", &self.logo),
            UrlField::new("HomepageUrl", &self.homepage_url),
            UrlField::new("SamlReplyUrl", &self.saml_reply_url),
            UrlField::new("SignupUrl", &self.signup_url),
            UrlField::new("SigninUrl", &self.signin_url),
            UrlField::new("ForgetUrl", &self.forget_url),
            UrlField::new("AffiliationUrl", &self.affiliation_url),
            UrlField::new("FormBackgroundUrl", &self.form_background_url),
        ]
    }

    fn mask_secrets(&mut self) {
        if !self.client_secret.is_empty() {
            self.client_secret = MASKED_VALUE.to_string();
        }
    }
}
