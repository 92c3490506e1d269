use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::sso::SsoSession;
use crate::auth::namespace_access::NamespaceAuthorizer;
use crate::auth::session_validity::validate_session;
use crate::auth::{AuthBackends, AuthMethod, AuthMethodKind, AuthMethodResolver, RequestCredentials};
use crate::models::session::keys;
use crate::models::{AuthenticationType, SessionRecord};

/// Group names from the asserted attribute. Attributes may carry a list of
/// values or a single value.
pub fn saml_groups(user_data: &serde_json::Map<String, Value>, attribute: &str) -> Vec<String> {
    match user_data.get(attribute) {
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(value)) => vec![value.clone()],
        _ => Vec::new(),
    }
}

pub struct SamlSessionResolver {
    backends: AuthBackends,
}

impl SamlSessionResolver {
    pub fn new(backends: AuthBackends) -> Self {
        Self { backends }
    }

    fn build(&self, session: SessionRecord) -> Option<Arc<dyn AuthMethod>> {
        let user_data = session
            .get(keys::SAML_USER_DATA)
            .and_then(Value::as_object)
            .filter(|data| !data.is_empty())?;

        let groups = saml_groups(user_data, &self.backends.settings.saml.group_attribute);
        let username = session
            .get_str(keys::SAML_NAME_ID)
            .unwrap_or_default()
            .to_string();

        Some(Arc::new(SsoSession::new(
            AuthMethodKind::SamlSession,
            username,
            NamespaceAuthorizer::new(&self.backends, groups),
        )))
    }
}

#[async_trait]
impl AuthMethodResolver for SamlSessionResolver {
    fn kind(&self) -> AuthMethodKind {
        AuthMethodKind::SamlSession
    }

    fn is_enabled(&self) -> bool {
        self.backends.settings.saml.is_enabled()
    }

    async fn resolve(&self, credentials: &RequestCredentials) -> Option<Arc<dyn AuthMethod>> {
        validate_session(
            &self.backends,
            credentials,
            AuthMethodKind::SamlSession,
            AuthenticationType::SessionSaml,
            |session| self.build(session),
        )
        .await
    }
}
