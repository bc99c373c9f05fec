use serde::{Deserialize, Serialize};

use super::{Resource, ResourceKind, UrlField, MASKED_VALUE};

/// Extra HTTP header sent with every webhook delivery.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookHeader {
    pub name: String,
    pub value: String,
}

/// An outbound webhook that receives organization events.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Webhook {
    pub owner: String,
    pub name: String,
    pub created_time: String,
    pub organization: String,
    pub url: String,
    pub method: String,
    pub content_type: String,
    /// Header values often carry delivery credentials.
    pub headers: Vec<WebhookHeader>,
    pub events: Vec<String>,
    pub is_user_extended: bool,
    pub is_enabled: bool,
}

impl Resource for Webhook {
    const KIND: ResourceKind = ResourceKind::Webhook;

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
        vec![UrlField::new("Url", &self.url)]
    }

    fn mask_secrets(&mut self) {
        for header in &mut self.headers {
            header.value = MASKED_VALUE.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_decodes_camel_case() {
        let hook: Webhook = serde_json::from_str(
            r#"{"owner":"org-a","name":"h1","organization":"org-a",
                "url":"https://hooks.example.com","contentType":"application/json",
                "isEnabled":true}"#,
        )
        .unwrap();

        assert_eq!(hook.id(), "org-a/h1");
        assert_eq!(hook.content_type, "application/json");
        assert!(hook.is_enabled);
    }

    #[test]
    fn mask_hides_header_values() {
        let mut hook = Webhook {
            headers: vec![WebhookHeader {
                name: "Authorization".into(),
                value: "Bearer abc".into(),
            }],
            ..Default::default()
        };
        hook.mask_secrets();

        assert_eq!(hook.headers[0].name, "Authorization");
        assert_eq!(hook.headers[0].value, MASKED_VALUE);
    }
}
