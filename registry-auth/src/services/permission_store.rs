//! Group and namespace permission storage.
//!
//! The auth core only reads groups and permissions. The single write it
//! performs is [`PermissionStore::ensure_namespace`], an idempotent upsert
//! used by GitHub organisation auto-provisioning.

use async_trait::async_trait;
use dashmap::DashMap;
use sqlx::postgres::PgPool;

use super::ServiceError;
use crate::models::{Namespace, NamespacePermission, PermissionLevel, UserGroup};

#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Look up a group by name. Unknown names are `None`.
    async fn find_group(&self, name: &str) -> Result<Option<UserGroup>, ServiceError>;

    /// Permission held by `group` on `namespace`, if any.
    async fn permission(
        &self,
        group: &str,
        namespace: &str,
    ) -> Result<Option<PermissionLevel>, ServiceError>;

    /// Every namespace permission row held by `group`.
    async fn permissions_for_group(
        &self,
        group: &str,
    ) -> Result<Vec<NamespacePermission>, ServiceError>;

    async fn find_namespace(&self, name: &str) -> Result<Option<Namespace>, ServiceError>;

    /// Create the namespace if missing. "Already exists" is success.
    async fn ensure_namespace(&self, name: &str) -> Result<Namespace, ServiceError>;

    async fn health_check(&self) -> Result<(), ServiceError>;

    async fn is_site_admin(&self, group: &str) -> Result<bool, ServiceError> {
        Ok(self
            .find_group(group)
            .await?
            .is_some_and(|group| group.site_admin))
    }
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgPermissionStore {
    pool: PgPool,
}

impl PgPermissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl PermissionStore for PgPermissionStore {
    async fn find_group(&self, name: &str) -> Result<Option<UserGroup>, ServiceError> {
        let group = sqlx::query_as::<_, UserGroup>(
            "SELECT name, site_admin FROM user_groups WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(group)
    }

    async fn permission(
        &self,
        group: &str,
        namespace: &str,
    ) -> Result<Option<PermissionLevel>, ServiceError> {
        let row = sqlx::query_as::<_, NamespacePermission>(
            r#"
            SELECT group_name, namespace, permission_type
            FROM user_group_namespace_permissions
            WHERE group_name = $1 AND namespace = $2
            "#,
        )
        .bind(group)
        .bind(namespace)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|p| p.permission_type))
    }

    async fn permissions_for_group(
        &self,
        group: &str,
    ) -> Result<Vec<NamespacePermission>, ServiceError> {
        let rows = sqlx::query_as::<_, NamespacePermission>(
            r#"
            SELECT group_name, namespace, permission_type
            FROM user_group_namespace_permissions
            WHERE group_name = $1
            "#,
        )
        .bind(group)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_namespace(&self, name: &str) -> Result<Option<Namespace>, ServiceError> {
        let namespace = sqlx::query_as::<_, Namespace>(
            "SELECT name, display_name FROM namespaces WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(namespace)
    }

    async fn ensure_namespace(&self, name: &str) -> Result<Namespace, ServiceError> {
        // Concurrent provisioning of the same organisation collapses on the
        // unique name; the follow-up read returns whichever row won.
        sqlx::query("INSERT INTO namespaces (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
            .bind(name)
            .execute(&self.pool)
            .await?;

        self.find_namespace(name).await?.ok_or_else(|| {
            ServiceError::Internal(anyhow::anyhow!(
                "Namespace {} missing after upsert",
                name
            ))
        })
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// In-process store for development and tests.
#[derive(Default)]
pub struct InMemoryPermissionStore {
    groups: DashMap<String, UserGroup>,
    /// group name -> (namespace -> level)
    permissions: DashMap<String, DashMap<String, PermissionLevel>>,
    namespaces: DashMap<String, Namespace>,
}

impl InMemoryPermissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_group(&self, name: &str, site_admin: bool) {
        self.groups
            .insert(name.to_string(), UserGroup::new(name, site_admin));
    }

    /// Set the permission for (group, namespace), replacing any existing row.
    pub fn grant(&self, group: &str, namespace: &str, level: PermissionLevel) {
        self.permissions
            .entry(group.to_string())
            .or_default()
            .insert(namespace.to_string(), level);
    }

    pub fn namespace_count(&self) -> usize {
        self.namespaces.len()
    }
}

#[async_trait]
impl PermissionStore for InMemoryPermissionStore {
    async fn find_group(&self, name: &str) -> Result<Option<UserGroup>, ServiceError> {
        Ok(self.groups.get(name).map(|g| g.value().clone()))
    }

    async fn permission(
        &self,
        group: &str,
        namespace: &str,
    ) -> Result<Option<PermissionLevel>, ServiceError> {
        Ok(self
            .permissions
            .get(group)
            .and_then(|rows| rows.get(namespace).map(|level| *level.value())))
    }

    async fn permissions_for_group(
        &self,
        group: &str,
    ) -> Result<Vec<NamespacePermission>, ServiceError> {
        Ok(self
            .permissions
            .get(group)
            .map(|rows| {
                rows.iter()
                    .map(|row| NamespacePermission::new(group, row.key(), *row.value()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_namespace(&self, name: &str) -> Result<Option<Namespace>, ServiceError> {
        Ok(self.namespaces.get(name).map(|n| n.value().clone()))
    }

    async fn ensure_namespace(&self, name: &str) -> Result<Namespace, ServiceError> {
        let namespace = self
            .namespaces
            .entry(name.to_string())
            .or_insert_with(|| Namespace::new(name));
        Ok(namespace.value().clone())
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_grant_replaces_existing_row() {
        let store = InMemoryPermissionStore::new();
        store.grant("devs", "first-namespace", PermissionLevel::Modify);
        store.grant("devs", "first-namespace", PermissionLevel::Full);

        let rows = store.permissions_for_group("devs").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].permission_type, PermissionLevel::Full);
    }

    #[tokio::test]
    async fn test_unknown_group() {
        let store = InMemoryPermissionStore::new();
        assert!(store.find_group("nobody").await.unwrap().is_none());
        assert!(!store.is_site_admin("nobody").await.unwrap());
        assert!(store
            .permissions_for_group("nobody")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_ensure_namespace_is_idempotent() {
        let store = InMemoryPermissionStore::new();
        store.ensure_namespace("acme").await.unwrap();
        store.ensure_namespace("acme").await.unwrap();
        assert_eq!(store.namespace_count(), 1);
        assert!(store.find_namespace("acme").await.unwrap().is_some());
    }

    #[tokio::test]
    #[ignore] // Requires running PostgreSQL
    async fn test_pg_ensure_namespace_is_idempotent() {
        let pool = PgPool::connect("postgres://localhost/registry_test")
            .await
            .unwrap();
        let store = PgPermissionStore::new(pool);
        let first = store.ensure_namespace("acme").await.unwrap();
        let second = store.ensure_namespace("acme").await.unwrap();
        assert_eq!(first, second);
    }
}
