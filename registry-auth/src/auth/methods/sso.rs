use async_trait::async_trait;

use crate::auth::namespace_access::NamespaceAuthorizer;
use crate::auth::{AuthError, AuthMethod, AuthMethodKind, NamespacePermissionMap};
use crate::models::PermissionLevel;

/// Identity established through an external SSO login whose rights come
/// entirely from its group memberships.
pub struct SsoSession {
    kind: AuthMethodKind,
    username: String,
    authorizer: NamespaceAuthorizer,
}

impl SsoSession {
    pub fn new(kind: AuthMethodKind, username: String, authorizer: NamespaceAuthorizer) -> Self {
        Self {
            kind,
            username,
            authorizer,
        }
    }

    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.authorizer.groups().iter().map(String::as_str)
    }
}

#[async_trait]
impl AuthMethod for SsoSession {
    fn kind(&self) -> AuthMethodKind {
        self.kind
    }

    fn is_authenticated(&self) -> bool {
        true
    }

    async fn is_admin(&self) -> Result<bool, AuthError> {
        self.authorizer.is_admin().await
    }

    fn can_access_read_api(&self) -> bool {
        true
    }

    fn can_access_terraform_api(&self) -> bool {
        true
    }

    async fn can_publish_module_version(&self, namespace: &str) -> Result<bool, AuthError> {
        self.authorizer.can_publish_module_version(namespace).await
    }

    async fn can_upload_module_version(&self, namespace: &str) -> Result<bool, AuthError> {
        self.authorizer.can_upload_module_version(namespace).await
    }

    async fn check_namespace_access(
        &self,
        level: PermissionLevel,
        namespace: &str,
    ) -> Result<bool, AuthError> {
        self.authorizer.check_namespace_access(level, namespace).await
    }

    async fn get_all_namespace_permissions(&self) -> Result<NamespacePermissionMap, AuthError> {
        self.authorizer.get_all_namespace_permissions().await
    }

    fn get_username(&self) -> String {
        self.username.clone()
    }

    fn requires_csrf_tokens(&self) -> bool {
        true
    }

    fn should_record_terraform_analytics(&self) -> bool {
        true
    }
}
