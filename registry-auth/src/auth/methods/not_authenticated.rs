use async_trait::async_trait;
use std::sync::Arc;

use crate::auth::namespace_access::{
    publish_requires_namespace_access, upload_requires_namespace_access,
};
use crate::auth::{
    AuthBackends, AuthError, AuthMethod, AuthMethodKind, AuthMethodResolver,
    NamespacePermissionMap, RequestCredentials,
};
use crate::config::AuthSettings;
use crate::models::PermissionLevel;

pub const UNAUTHENTICATED_USERNAME: &str = "Unauthenticated User";

/// Anonymous caller. Always resolvable; terminates the priority list.
pub struct NotAuthenticated {
    settings: Arc<AuthSettings>,
}

impl NotAuthenticated {
    pub fn new(settings: Arc<AuthSettings>) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl AuthMethod for NotAuthenticated {
    fn kind(&self) -> AuthMethodKind {
        AuthMethodKind::NotAuthenticated
    }

    fn is_authenticated(&self) -> bool {
        false
    }

    async fn is_admin(&self) -> Result<bool, AuthError> {
        Ok(false)
    }

    fn can_access_read_api(&self) -> bool {
        self.settings.allow_unauthenticated_access
    }

    fn can_access_terraform_api(&self) -> bool {
        self.settings.allow_unauthenticated_access
    }

    async fn can_publish_module_version(&self, _namespace: &str) -> Result<bool, AuthError> {
        Ok(!publish_requires_namespace_access(&self.settings))
    }

    async fn can_upload_module_version(&self, _namespace: &str) -> Result<bool, AuthError> {
        Ok(!upload_requires_namespace_access(&self.settings))
    }

    async fn check_namespace_access(
        &self,
        _level: PermissionLevel,
        _namespace: &str,
    ) -> Result<bool, AuthError> {
        Ok(false)
    }

    async fn get_all_namespace_permissions(&self) -> Result<NamespacePermissionMap, AuthError> {
        Ok(NamespacePermissionMap::new())
    }

    fn get_username(&self) -> String {
        UNAUTHENTICATED_USERNAME.to_string()
    }

    fn requires_csrf_tokens(&self) -> bool {
        false
    }

    fn should_record_terraform_analytics(&self) -> bool {
        true
    }
}

pub struct NotAuthenticatedResolver {
    settings: Arc<AuthSettings>,
}

impl NotAuthenticatedResolver {
    pub fn new(backends: &AuthBackends) -> Self {
        Self {
            settings: backends.settings.clone(),
        }
    }
}

#[async_trait]
impl AuthMethodResolver for NotAuthenticatedResolver {
    fn kind(&self) -> AuthMethodKind {
        AuthMethodKind::NotAuthenticated
    }

    fn is_enabled(&self) -> bool {
        true
    }

    async fn resolve(&self, _credentials: &RequestCredentials) -> Option<Arc<dyn AuthMethod>> {
        Some(Arc::new(NotAuthenticated::new(self.settings.clone())))
    }
}
