//! Upload and publish API keys. Each key grants its own scope everywhere. The
//! other scope is only available while its allow-list is empty.

use async_trait::async_trait;
use registry_core::utils::matches_any;
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyScope {
    Upload,
    Publish,
}

impl ApiKeyScope {
    fn kind(self) -> AuthMethodKind {
        match self {
            ApiKeyScope::Upload => AuthMethodKind::UploadApiKey,
            ApiKeyScope::Publish => AuthMethodKind::PublishApiKey,
        }
    }

    fn allowed_keys(self, settings: &AuthSettings) -> &[String] {
        match self {
            ApiKeyScope::Upload => &settings.upload_api_keys,
            ApiKeyScope::Publish => &settings.publish_api_keys,
        }
    }

    fn username(self) -> &'static str {
        match self {
            ApiKeyScope::Upload => "Upload API Key",
            ApiKeyScope::Publish => "Publish API Key",
        }
    }
}

pub struct ApiKeyMethod {
    scope: ApiKeyScope,
    settings: Arc<AuthSettings>,
}

#[async_trait]
impl AuthMethod for ApiKeyMethod {
    fn kind(&self) -> AuthMethodKind {
        self.scope.kind()
    }

    fn is_authenticated(&self) -> bool {
        true
    }

    async fn is_admin(&self) -> Result<bool, AuthError> {
        Ok(false)
    }

    fn can_access_read_api(&self) -> bool {
        true
    }

    fn can_access_terraform_api(&self) -> bool {
        true
    }

    async fn can_publish_module_version(&self, _namespace: &str) -> Result<bool, AuthError> {
        Ok(self.scope == ApiKeyScope::Publish
            || !publish_requires_namespace_access(&self.settings))
    }

    async fn can_upload_module_version(&self, _namespace: &str) -> Result<bool, AuthError> {
        Ok(self.scope == ApiKeyScope::Upload || !upload_requires_namespace_access(&self.settings))
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
        self.scope.username().to_string()
    }

    fn requires_csrf_tokens(&self) -> bool {
        false
    }

    fn should_record_terraform_analytics(&self) -> bool {
        false
    }
}

pub struct ApiKeyResolver {
    scope: ApiKeyScope,
    backends: AuthBackends,
}

impl ApiKeyResolver {
    pub fn upload(backends: AuthBackends) -> Self {
        Self {
            scope: ApiKeyScope::Upload,
            backends,
        }
    }

    pub fn publish(backends: AuthBackends) -> Self {
        Self {
            scope: ApiKeyScope::Publish,
            backends,
        }
    }
}

#[async_trait]
impl AuthMethodResolver for ApiKeyResolver {
    fn kind(&self) -> AuthMethodKind {
        self.scope.kind()
    }

    fn is_enabled(&self) -> bool {
        match self.scope {
            ApiKeyScope::Upload => self.backends.settings.upload_keys_enabled(),
            ApiKeyScope::Publish => self.backends.settings.publish_keys_enabled(),
        }
    }

    async fn resolve(&self, credentials: &RequestCredentials) -> Option<Arc<dyn AuthMethod>> {
        let presented = credentials.api_key.as_deref()?;
        if !matches_any(self.scope.allowed_keys(&self.backends.settings), presented) {
            return None;
        }
        Some(Arc::new(ApiKeyMethod {
            scope: self.scope,
            settings: self.backends.settings.clone(),
        }))
    }
}
