//! The capability interface every authentication method exposes, and the
//! closed set of method kinds in resolution priority order.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;

use super::{AuthError, RequestCredentials};
use crate::models::PermissionLevel;

/// Namespace name -> highest level held.
pub type NamespacePermissionMap = BTreeMap<String, PermissionLevel>;

/// Authentication method kinds. Declaration order is resolution priority:
/// earlier kinds win when several are valid for the same request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthMethodKind {
    AdminApiKey,
    AdminSession,
    UploadApiKey,
    PublishApiKey,
    SamlSession,
    OpenidConnectSession,
    GithubSession,
    NotAuthenticated,
}

impl AuthMethodKind {
    pub const PRIORITY: [AuthMethodKind; 8] = [
        AuthMethodKind::AdminApiKey,
        AuthMethodKind::AdminSession,
        AuthMethodKind::UploadApiKey,
        AuthMethodKind::PublishApiKey,
        AuthMethodKind::SamlSession,
        AuthMethodKind::OpenidConnectSession,
        AuthMethodKind::GithubSession,
        AuthMethodKind::NotAuthenticated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethodKind::AdminApiKey => "ADMIN_API_KEY",
            AuthMethodKind::AdminSession => "ADMIN_SESSION",
            AuthMethodKind::UploadApiKey => "UPLOAD_API_KEY",
            AuthMethodKind::PublishApiKey => "PUBLISH_API_KEY",
            AuthMethodKind::SamlSession => "SAML_SESSION",
            AuthMethodKind::OpenidConnectSession => "OPENID_CONNECT_SESSION",
            AuthMethodKind::GithubSession => "GITHUB_SESSION",
            AuthMethodKind::NotAuthenticated => "NOT_AUTHENTICATED",
        }
    }
}

impl std::fmt::Display for AuthMethodKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the acting identity of a request may do.
///
/// Instances are built per request and only reflect the credential they
/// were resolved from. Boolean `false` is a denial, never an error; `Err`
/// means a collaborator lookup failed.
#[async_trait]
pub trait AuthMethod: Send + Sync {
    fn kind(&self) -> AuthMethodKind;

    /// The deployment's built-in administrator (admin token or password).
    fn is_built_in_admin(&self) -> bool {
        false
    }

    fn is_authenticated(&self) -> bool;

    async fn is_admin(&self) -> Result<bool, AuthError>;

    fn can_access_read_api(&self) -> bool;

    fn can_access_terraform_api(&self) -> bool;

    async fn can_publish_module_version(&self, namespace: &str) -> Result<bool, AuthError>;

    async fn can_upload_module_version(&self, namespace: &str) -> Result<bool, AuthError>;

    async fn check_namespace_access(
        &self,
        level: PermissionLevel,
        namespace: &str,
    ) -> Result<bool, AuthError>;

    /// Highest level held per namespace, for presentation.
    async fn get_all_namespace_permissions(&self) -> Result<NamespacePermissionMap, AuthError>;

    fn get_username(&self) -> String;

    fn requires_csrf_tokens(&self) -> bool;

    fn should_record_terraform_analytics(&self) -> bool;

    fn get_terraform_auth_token(&self) -> Option<String> {
        None
    }
}

/// One candidate in the factory's priority list.
#[async_trait]
pub trait AuthMethodResolver: Send + Sync {
    fn kind(&self) -> AuthMethodKind;

    /// Whether the mechanism is configured at all.
    fn is_enabled(&self) -> bool;

    /// Validity probe: build the method when the request carries a currently
    /// valid credential for it. Any failed check yields `None`.
    async fn resolve(&self, credentials: &RequestCredentials) -> Option<Arc<dyn AuthMethod>>;
}
