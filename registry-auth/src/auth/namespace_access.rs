//! Group-based namespace authorization shared by the SSO methods.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::{AuthBackends, AuthError, NamespacePermissionMap};
use crate::config::AuthSettings;
use crate::models::PermissionLevel;
use crate::services::{metrics, PermissionStore};

/// Publishing is namespace-gated only once publish keys are configured.
pub fn publish_requires_namespace_access(settings: &AuthSettings) -> bool {
    settings.publish_keys_enabled()
}

/// Uploading is namespace-gated only once upload keys are configured.
pub fn upload_requires_namespace_access(settings: &AuthSettings) -> bool {
    settings.upload_keys_enabled()
}

/// Answers namespace questions for one identity's group set.
#[derive(Clone)]
pub struct NamespaceAuthorizer {
    settings: Arc<AuthSettings>,
    permissions: Arc<dyn PermissionStore>,
    groups: BTreeSet<String>,
}

impl NamespaceAuthorizer {
    pub fn new<I, S>(backends: &AuthBackends, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            settings: backends.settings.clone(),
            permissions: backends.permissions.clone(),
            groups: groups
                .into_iter()
                .map(Into::into)
                .filter(|g: &String| !g.is_empty())
                .collect(),
        }
    }

    pub fn groups(&self) -> &BTreeSet<String> {
        &self.groups
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    /// Open mode, or any held group is a site admin.
    pub async fn is_admin(&self) -> Result<bool, AuthError> {
        if !self.settings.enable_access_controls {
            return Ok(true);
        }

        for group in &self.groups {
            if self.permissions.is_site_admin(group).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub async fn check_namespace_access(
        &self,
        level: PermissionLevel,
        namespace: &str,
    ) -> Result<bool, AuthError> {
        let allowed = self.evaluate(level, namespace).await?;
        metrics::record_access_check(level.as_str(), allowed);
        Ok(allowed)
    }

    async fn evaluate(&self, level: PermissionLevel, namespace: &str) -> Result<bool, AuthError> {
        if self.is_admin().await? {
            return Ok(true);
        }

        for group in &self.groups {
            if let Some(held) = self.permissions.permission(group, namespace).await? {
                if held.satisfies(level) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Highest level per namespace across every held group.
    pub async fn get_all_namespace_permissions(&self) -> Result<NamespacePermissionMap, AuthError> {
        let mut result = NamespacePermissionMap::new();
        for group in &self.groups {
            for row in self.permissions.permissions_for_group(group).await? {
                merge_permission(&mut result, row.namespace, row.permission_type);
            }
        }
        Ok(result)
    }

    pub async fn can_publish_module_version(&self, namespace: &str) -> Result<bool, AuthError> {
        if !publish_requires_namespace_access(&self.settings) {
            return Ok(true);
        }
        self.check_namespace_access(PermissionLevel::Modify, namespace)
            .await
    }

    pub async fn can_upload_module_version(&self, namespace: &str) -> Result<bool, AuthError> {
        if !upload_requires_namespace_access(&self.settings) {
            return Ok(true);
        }
        self.check_namespace_access(PermissionLevel::Modify, namespace)
            .await
    }
}

/// Keep the more permissive of the existing and incoming level.
pub fn merge_permission(map: &mut NamespacePermissionMap, namespace: String, level: PermissionLevel) {
    map.entry(namespace)
        .and_modify(|held| *held = (*held).max(level))
        .or_insert(level);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{InMemoryPermissionStore, MockSessionStore, StaticTokenValidator};

    fn backends(enable_access_controls: bool, store: InMemoryPermissionStore) -> AuthBackends {
        AuthBackends::new(
            AuthSettings {
                enable_access_controls,
                ..AuthSettings::default()
            },
            Arc::new(MockSessionStore::new()),
            Arc::new(store),
            Arc::new(StaticTokenValidator(false)),
        )
    }

    fn seeded_store() -> InMemoryPermissionStore {
        let store = InMemoryPermissionStore::new();
        store.add_group("modifyonly", false);
        store.add_group("fullaccess", false);
        store.add_group("siteadmins", true);
        store.grant("modifyonly", "first-namespace", PermissionLevel::Modify);
        store.grant("fullaccess", "first-namespace", PermissionLevel::Full);
        store
    }

    #[tokio::test]
    async fn test_modify_only_group() {
        let backends = backends(true, seeded_store());
        let authorizer = NamespaceAuthorizer::new(&backends, ["modifyonly"]);

        assert!(!authorizer.is_admin().await.unwrap());
        assert!(!authorizer
            .check_namespace_access(PermissionLevel::Full, "first-namespace")
            .await
            .unwrap());
        assert!(authorizer
            .check_namespace_access(PermissionLevel::Modify, "first-namespace")
            .await
            .unwrap());
        assert!(!authorizer
            .check_namespace_access(PermissionLevel::Modify, "second-namespace")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_site_admin_needs_no_rows() {
        let backends = backends(true, seeded_store());
        let authorizer = NamespaceAuthorizer::new(&backends, ["siteadmins"]);

        assert!(authorizer.is_admin().await.unwrap());
        for level in [PermissionLevel::Modify, PermissionLevel::Full] {
            assert!(authorizer
                .check_namespace_access(level, "anything")
                .await
                .unwrap());
        }
    }

    #[tokio::test]
    async fn test_open_mode_grants_everything() {
        let backends = backends(false, InMemoryPermissionStore::new());
        let authorizer = NamespaceAuthorizer::new(&backends, Vec::<String>::new());

        assert!(authorizer.is_admin().await.unwrap());
        assert!(authorizer
            .check_namespace_access(PermissionLevel::Full, "second-namespace")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_most_permissive_wins() {
        let backends = backends(true, seeded_store());
        let authorizer = NamespaceAuthorizer::new(&backends, ["modifyonly", "fullaccess"]);

        let permissions = authorizer.get_all_namespace_permissions().await.unwrap();
        assert_eq!(
            permissions.get("first-namespace"),
            Some(&PermissionLevel::Full)
        );
        assert_eq!(permissions.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_groups_are_ignored() {
        let backends = backends(true, seeded_store());
        let authorizer = NamespaceAuthorizer::new(&backends, ["ghosts", "", "ghosts"]);

        assert_eq!(authorizer.groups().len(), 1);
        assert!(!authorizer.is_admin().await.unwrap());
        assert!(authorizer
            .get_all_namespace_permissions()
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_publish_bypass_without_keys() {
        let backends = backends(true, seeded_store());
        let authorizer = NamespaceAuthorizer::new(&backends, ["modifyonly"]);
        assert!(authorizer
            .can_publish_module_version("second-namespace")
            .await
            .unwrap());
        assert!(authorizer
            .can_upload_module_version("second-namespace")
            .await
            .unwrap());
    }

    #[test]
    fn test_merge_permission_keeps_highest() {
        let mut map = NamespacePermissionMap::new();
        merge_permission(&mut map, "ns".to_string(), PermissionLevel::Full);
        merge_permission(&mut map, "ns".to_string(), PermissionLevel::Modify);
        assert_eq!(map.get("ns"), Some(&PermissionLevel::Full));
    }
}
