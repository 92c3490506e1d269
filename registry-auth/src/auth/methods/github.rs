//! GitHub SSO sessions.
//!
//! Organisations recorded at login act as groups. With auto-provisioning
//! enabled on the provider source, every recorded organisation (including
//! the user's own account) also grants FULL on the namespace of the same
//! name. Creating those namespaces is a separate, explicit step.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::auth::namespace_access::{
    merge_permission, publish_requires_namespace_access, upload_requires_namespace_access,
    NamespaceAuthorizer,
};
use crate::auth::session_validity::validate_session;
use crate::auth::{
    AuthBackends, AuthError, AuthMethod, AuthMethodKind, AuthMethodResolver,
    NamespacePermissionMap, RequestCredentials,
};
use crate::models::session::keys;
use crate::models::{
    AuthenticationType, Namespace, OrganisationType, PermissionLevel, ProviderSource,
    SessionRecord,
};
use crate::services::{metrics, PermissionStore};

pub struct GithubSession {
    username: String,
    organisations: BTreeMap<String, OrganisationType>,
    provider_source: ProviderSource,
    authorizer: NamespaceAuthorizer,
    permissions: Arc<dyn PermissionStore>,
}

impl GithubSession {
    pub fn new(
        backends: &AuthBackends,
        username: String,
        organisations: BTreeMap<String, OrganisationType>,
        provider_source: ProviderSource,
    ) -> Self {
        let groups: Vec<String> = organisations
            .iter()
            .filter(|(_, kind)| **kind == OrganisationType::Organisation)
            .map(|(name, _)| name.clone())
            .collect();

        Self {
            username,
            organisations,
            provider_source,
            authorizer: NamespaceAuthorizer::new(backends, groups),
            permissions: backends.permissions.clone(),
        }
    }

    /// Organisation-type entries only; the user's own account is not a group.
    pub fn group_memberships(&self) -> impl Iterator<Item = &str> {
        self.authorizer.groups().iter().map(String::as_str)
    }

    pub fn provider_source(&self) -> &ProviderSource {
        &self.provider_source
    }

    /// Namespaces this session is implicitly granted FULL on. Pure.
    pub fn organisation_namespaces(&self) -> Vec<&str> {
        if !self.provider_source.auto_generate_github_organisation_namespaces {
            return Vec::new();
        }
        self.organisations.keys().map(String::as_str).collect()
    }

    fn implicitly_grants(&self, namespace: &str) -> bool {
        self.provider_source.auto_generate_github_organisation_namespaces
            && self.organisations.contains_key(namespace)
    }

    /// Make sure a namespace exists for every implicitly granted organisation.
    pub async fn provision_organisation_namespaces(&self) -> Result<Vec<Namespace>, AuthError> {
        let mut provisioned = Vec::new();
        for name in self.organisation_namespaces() {
            provisioned.push(self.permissions.ensure_namespace(name).await?);
        }
        if !provisioned.is_empty() {
            tracing::debug!(
                username = %self.username,
                count = provisioned.len(),
                "Provisioned GitHub organisation namespaces"
            );
        }
        Ok(provisioned)
    }
}

#[async_trait]
impl AuthMethod for GithubSession {
    fn kind(&self) -> AuthMethodKind {
        AuthMethodKind::GithubSession
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
        if !publish_requires_namespace_access(self.authorizer.settings()) {
            return Ok(true);
        }
        self.check_namespace_access(PermissionLevel::Modify, namespace)
            .await
    }

    async fn can_upload_module_version(&self, namespace: &str) -> Result<bool, AuthError> {
        if !upload_requires_namespace_access(self.authorizer.settings()) {
            return Ok(true);
        }
        self.check_namespace_access(PermissionLevel::Modify, namespace)
            .await
    }

    async fn check_namespace_access(
        &self,
        level: PermissionLevel,
        namespace: &str,
    ) -> Result<bool, AuthError> {
        if self.implicitly_grants(namespace) {
            metrics::record_access_check(level.as_str(), true);
            return Ok(true);
        }
        self.authorizer.check_namespace_access(level, namespace).await
    }

    async fn get_all_namespace_permissions(&self) -> Result<NamespacePermissionMap, AuthError> {
        self.provision_organisation_namespaces().await?;

        let mut permissions = self.authorizer.get_all_namespace_permissions().await?;
        for name in self.organisation_namespaces() {
            merge_permission(&mut permissions, name.to_string(), PermissionLevel::Full);
        }
        Ok(permissions)
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

pub struct GithubSessionResolver {
    backends: AuthBackends,
}

impl GithubSessionResolver {
    pub fn new(backends: AuthBackends) -> Self {
        Self { backends }
    }

    fn build(&self, session: SessionRecord) -> Option<GithubSession> {
        let username = session
            .get_str(keys::GITHUB_USERNAME)
            .filter(|name| !name.is_empty())?;

        // A source removed or disabled since login fails closed.
        let source = session
            .get_str(keys::PROVIDER_SOURCE)
            .and_then(|name| self.backends.settings.provider_sources.github_source(name))?;

        Some(GithubSession::new(
            &self.backends,
            username.to_string(),
            session.organisations(),
            source.clone(),
        ))
    }

    /// Resolve to the concrete session type, for callers that provision.
    pub async fn resolve_session(&self, credentials: &RequestCredentials) -> Option<GithubSession> {
        validate_session(
            &self.backends,
            credentials,
            AuthMethodKind::GithubSession,
            AuthenticationType::SessionGithub,
            |session| self.build(session),
        )
        .await
    }
}

#[async_trait]
impl AuthMethodResolver for GithubSessionResolver {
    fn kind(&self) -> AuthMethodKind {
        AuthMethodKind::GithubSession
    }

    fn is_enabled(&self) -> bool {
        self.backends.settings.provider_sources.has_github_sources()
    }

    async fn resolve(&self, credentials: &RequestCredentials) -> Option<Arc<dyn AuthMethod>> {
        self.resolve_session(credentials)
            .await
            .map(|session| Arc::new(session) as Arc<dyn AuthMethod>)
    }
}
