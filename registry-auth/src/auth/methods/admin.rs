//! The deployment's built-in administrator: admin API key or password session.

use async_trait::async_trait;
use registry_core::utils::secrets_match;
use std::sync::Arc;

use crate::auth::session_validity::validate_session;
use crate::auth::{
    AuthBackends, AuthError, AuthMethod, AuthMethodKind, AuthMethodResolver,
    NamespacePermissionMap, RequestCredentials,
};
use crate::models::{AuthenticationType, PermissionLevel};

pub const BUILT_IN_ADMIN_USERNAME: &str = "Built-in admin";

/// Unrestricted identity. Only the session flavour is browser-driven and
/// therefore needs CSRF protection.
#[derive(Debug, Clone, Copy)]
pub struct BuiltInAdmin {
    kind: AuthMethodKind,
}

impl BuiltInAdmin {
    pub fn api_key() -> Self {
        Self {
            kind: AuthMethodKind::AdminApiKey,
        }
    }

    pub fn session() -> Self {
        Self {
            kind: AuthMethodKind::AdminSession,
        }
    }
}

#[async_trait]
impl AuthMethod for BuiltInAdmin {
    fn kind(&self) -> AuthMethodKind {
        self.kind
    }

    fn is_built_in_admin(&self) -> bool {
        true
    }

    fn is_authenticated(&self) -> bool {
        true
    }

    async fn is_admin(&self) -> Result<bool, AuthError> {
        Ok(true)
    }

    fn can_access_read_api(&self) -> bool {
        true
    }

    fn can_access_terraform_api(&self) -> bool {
        true
    }

    async fn can_publish_module_version(&self, _namespace: &str) -> Result<bool, AuthError> {
        Ok(true)
    }

    async fn can_upload_module_version(&self, _namespace: &str) -> Result<bool, AuthError> {
        Ok(true)
    }

    async fn check_namespace_access(
        &self,
        _level: PermissionLevel,
        _namespace: &str,
    ) -> Result<bool, AuthError> {
        Ok(true)
    }

    async fn get_all_namespace_permissions(&self) -> Result<NamespacePermissionMap, AuthError> {
        Ok(NamespacePermissionMap::new())
    }

    fn get_username(&self) -> String {
        BUILT_IN_ADMIN_USERNAME.to_string()
    }

    fn requires_csrf_tokens(&self) -> bool {
        self.kind == AuthMethodKind::AdminSession
    }

    fn should_record_terraform_analytics(&self) -> bool {
        false
    }
}

pub struct AdminApiKeyResolver {
    backends: AuthBackends,
}

impl AdminApiKeyResolver {
    pub fn new(backends: AuthBackends) -> Self {
        Self { backends }
    }
}

#[async_trait]
impl AuthMethodResolver for AdminApiKeyResolver {
    fn kind(&self) -> AuthMethodKind {
        AuthMethodKind::AdminApiKey
    }

    fn is_enabled(&self) -> bool {
        self.backends.settings.admin_token_enabled()
    }

    async fn resolve(&self, credentials: &RequestCredentials) -> Option<Arc<dyn AuthMethod>> {
        let expected = &self.backends.settings.admin_authentication_token;
        let presented = credentials.api_key.as_deref().unwrap_or_default();
        if expected.is_empty() || presented.is_empty() || !secrets_match(expected, presented) {
            return None;
        }
        Some(Arc::new(BuiltInAdmin::api_key()))
    }
}

pub struct AdminSessionResolver {
    backends: AuthBackends,
}

impl AdminSessionResolver {
    pub fn new(backends: AuthBackends) -> Self {
        Self { backends }
    }
}

#[async_trait]
impl AuthMethodResolver for AdminSessionResolver {
    fn kind(&self) -> AuthMethodKind {
        AuthMethodKind::AdminSession
    }

    fn is_enabled(&self) -> bool {
        self.backends.settings.admin_token_enabled()
    }

    async fn resolve(&self, credentials: &RequestCredentials) -> Option<Arc<dyn AuthMethod>> {
        validate_session(
            &self.backends,
            credentials,
            AuthMethodKind::AdminSession,
            AuthenticationType::SessionPassword,
            |_| Some(Arc::new(BuiltInAdmin::session()) as Arc<dyn AuthMethod>),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthSettings;
    use crate::models::session::keys;
    use crate::models::SessionRecord;
    use crate::services::{InMemoryPermissionStore, MockSessionStore, StaticTokenValidator};
    use chrono::Duration;

    fn backends(store: MockSessionStore) -> AuthBackends {
        AuthBackends::new(
            AuthSettings {
                admin_authentication_token: "admin-token".to_string(),
                secret_key: "secret".to_string(),
                ..AuthSettings::default()
            },
            Arc::new(store),
            Arc::new(InMemoryPermissionStore::new()),
            Arc::new(StaticTokenValidator(false)),
        )
    }

    #[tokio::test]
    async fn test_admin_api_key() {
        let resolver = AdminApiKeyResolver::new(backends(MockSessionStore::new()));
        assert!(resolver.is_enabled());

        let method = resolver
            .resolve(&RequestCredentials::default().with_api_key("admin-token"))
            .await
            .unwrap();
        assert_eq!(method.kind(), AuthMethodKind::AdminApiKey);
        assert!(method.is_built_in_admin());
        assert!(!method.requires_csrf_tokens());
        assert!(!method.should_record_terraform_analytics());
        assert!(method
            .check_namespace_access(PermissionLevel::Full, "any")
            .await
            .unwrap());

        assert!(resolver
            .resolve(&RequestCredentials::default().with_api_key("wrong"))
            .await
            .is_none());
        assert!(resolver.resolve(&RequestCredentials::default()).await.is_none());
    }

    #[tokio::test]
    async fn test_admin_session_requires_password_tag() {
        let store = MockSessionStore::new()
            .with_session(
                SessionRecord::new("pw", Duration::minutes(5))
                    .with(keys::IS_ADMIN_AUTHENTICATED, true)
                    .with(keys::AUTHENTICATION_TYPE, "SESSION_PASSWORD"),
            )
            .with_session(
                SessionRecord::new("sso", Duration::minutes(5))
                    .with(keys::IS_ADMIN_AUTHENTICATED, true)
                    .with(keys::AUTHENTICATION_TYPE, "SESSION_SAML"),
            );
        let resolver = AdminSessionResolver::new(backends(store));

        let method = resolver
            .resolve(&RequestCredentials::default().with_session_id("pw"))
            .await
            .unwrap();
        assert_eq!(method.kind(), AuthMethodKind::AdminSession);
        assert!(method.requires_csrf_tokens());
        assert_eq!(method.get_username(), BUILT_IN_ADMIN_USERNAME);

        assert!(resolver
            .resolve(&RequestCredentials::default().with_session_id("sso"))
            .await
            .is_none());
    }
}
