//! Picks the acting identity for a request from the priority list.

use std::sync::Arc;

use super::methods::default_resolvers;
use super::{AuthBackends, AuthError, AuthMethod, AuthMethodKind, AuthMethodResolver, RequestCredentials};
use crate::services::metrics;

#[derive(Clone)]
pub struct AuthFactory {
    resolvers: Vec<Arc<dyn AuthMethodResolver>>,
}

impl AuthFactory {
    pub fn new(backends: &AuthBackends) -> Self {
        Self::from_resolvers(default_resolvers(backends))
    }

    /// Build from arbitrary resolvers. They are tried in kind priority order
    /// regardless of the order given.
    pub fn from_resolvers(mut resolvers: Vec<Arc<dyn AuthMethodResolver>>) -> Self {
        resolvers.sort_by_key(|resolver| resolver.kind());
        Self { resolvers }
    }

    pub fn kinds(&self) -> Vec<AuthMethodKind> {
        self.resolvers.iter().map(|r| r.kind()).collect()
    }

    /// First enabled candidate whose probe accepts the request.
    ///
    /// `NotAuthenticated` always accepts, so an `Err` here means the
    /// resolver list itself is broken.
    pub async fn resolve(
        &self,
        credentials: &RequestCredentials,
    ) -> Result<Arc<dyn AuthMethod>, AuthError> {
        for resolver in &self.resolvers {
            let kind = resolver.kind();
            if !resolver.is_enabled() {
                tracing::trace!(method = %kind, "Auth method disabled");
                continue;
            }

            if let Some(method) = resolver.resolve(credentials).await {
                tracing::debug!(method = %kind, "Resolved auth method");
                metrics::record_resolution(kind.as_str());
                return Ok(method);
            }

            tracing::debug!(method = %kind, "Auth method not valid for request");
        }

        tracing::error!(
            candidates = ?self.kinds(),
            "No authentication method resolved; access control configuration is unusable"
        );
        Err(AuthError::NoAuthMethodResolved)
    }
}
