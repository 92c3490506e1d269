use registry_core::error::AppError;
use std::sync::Arc;
use tokio::sync::OnceCell;

use super::{AuthError, AuthFactory, AuthMethod, RequestCredentials};
use crate::models::PermissionLevel;

/// Per-request handle on the acting identity.
///
/// The identity is resolved on first use and reused for the rest of the
/// request, so every check in one request sees the same answer even if
/// the backing session changes meanwhile.
pub struct AuthContext {
    factory: Arc<AuthFactory>,
    credentials: RequestCredentials,
    resolved: OnceCell<Arc<dyn AuthMethod>>,
}

impl AuthContext {
    pub fn new(factory: Arc<AuthFactory>, credentials: RequestCredentials) -> Self {
        Self {
            factory,
            credentials,
            resolved: OnceCell::new(),
        }
    }

    pub fn credentials(&self) -> &RequestCredentials {
        &self.credentials
    }

    pub async fn current_auth_method(&self) -> Result<Arc<dyn AuthMethod>, AuthError> {
        let method = self
            .resolved
            .get_or_try_init(|| async {
                let method = self.factory.resolve(&self.credentials).await?;
                tracing::Span::current().record("auth_method", method.kind().as_str());
                Ok::<_, AuthError>(method)
            })
            .await?;
        Ok(method.clone())
    }

    /// Forbidden unless the identity holds `level` on `namespace`.
    pub async fn require_namespace_access(
        &self,
        level: PermissionLevel,
        namespace: &str,
    ) -> Result<Arc<dyn AuthMethod>, AppError> {
        let method = self.current_auth_method().await?;
        if !method.check_namespace_access(level, namespace).await? {
            tracing::info!(
                method = %method.kind(),
                username = %method.get_username(),
                namespace,
                level = %level,
                "Namespace access denied"
            );
            return Err(AppError::Forbidden(anyhow::anyhow!(
                "{} access to namespace {} required",
                level,
                namespace
            )));
        }
        Ok(method)
    }

    pub async fn require_authenticated(&self) -> Result<Arc<dyn AuthMethod>, AppError> {
        let method = self.current_auth_method().await?;
        if !method.is_authenticated() {
            return Err(AppError::Unauthorized(anyhow::anyhow!(
                "Authentication required"
            )));
        }
        Ok(method)
    }

    pub async fn require_admin(&self) -> Result<Arc<dyn AuthMethod>, AppError> {
        let method = self.require_authenticated().await?;
        if !method.is_admin().await? {
            return Err(AppError::Forbidden(anyhow::anyhow!("Admin access required")));
        }
        Ok(method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthBackends;
    use crate::config::AuthSettings;
    use crate::services::{InMemoryPermissionStore, MockSessionStore, StaticTokenValidator};
    use registry_core::axum::http::StatusCode;

    fn factory(settings: AuthSettings) -> Arc<AuthFactory> {
        let backends = AuthBackends::new(
            settings,
            Arc::new(MockSessionStore::new()),
            Arc::new(InMemoryPermissionStore::new()),
            Arc::new(StaticTokenValidator(false)),
        );
        Arc::new(AuthFactory::new(&backends))
    }

    #[tokio::test]
    async fn test_resolves_once_per_request() {
        let ctx = AuthContext::new(factory(AuthSettings::default()), RequestCredentials::default());
        let first = ctx.current_auth_method().await.unwrap();
        let second = ctx.current_auth_method().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_anonymous_is_denied_namespace_access() {
        let ctx = AuthContext::new(factory(AuthSettings::default()), RequestCredentials::default());
        let err = ctx
            .require_namespace_access(PermissionLevel::Modify, "first-namespace")
            .await
            .err()
            .unwrap();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        let err = ctx.require_authenticated().await.err().unwrap();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_key_passes_every_gate() {
        let settings = AuthSettings {
            admin_authentication_token: "admin-token".to_string(),
            ..AuthSettings::default()
        };
        let ctx = AuthContext::new(
            factory(settings),
            RequestCredentials::default().with_api_key("admin-token"),
        );
        assert!(ctx.require_admin().await.is_ok());
        assert!(ctx
            .require_namespace_access(PermissionLevel::Full, "anything")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_broken_factory_is_service_unavailable() {
        let ctx = AuthContext::new(
            Arc::new(AuthFactory::from_resolvers(Vec::new())),
            RequestCredentials::default(),
        );
        let err = ctx.require_authenticated().await.err().unwrap();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
