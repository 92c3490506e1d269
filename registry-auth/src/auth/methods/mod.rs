//! Concrete authentication methods and their resolvers.

pub mod admin;
pub mod api_key;
pub mod github;
pub mod not_authenticated;
pub mod openid_connect;
pub mod saml;
pub mod sso;

use std::sync::Arc;

pub use admin::{AdminApiKeyResolver, AdminSessionResolver, BuiltInAdmin};
pub use api_key::{ApiKeyMethod, ApiKeyResolver, ApiKeyScope};
pub use github::{GithubSession, GithubSessionResolver};
pub use not_authenticated::{NotAuthenticated, NotAuthenticatedResolver};
pub use openid_connect::OpenidConnectSessionResolver;
pub use saml::SamlSessionResolver;
pub use sso::SsoSession;

use super::{AuthBackends, AuthMethodResolver};

/// One resolver per method kind, in priority order.
pub fn default_resolvers(backends: &AuthBackends) -> Vec<Arc<dyn AuthMethodResolver>> {
    vec![
        Arc::new(AdminApiKeyResolver::new(backends.clone())),
        Arc::new(AdminSessionResolver::new(backends.clone())),
        Arc::new(ApiKeyResolver::upload(backends.clone())),
        Arc::new(ApiKeyResolver::publish(backends.clone())),
        Arc::new(SamlSessionResolver::new(backends.clone())),
        Arc::new(OpenidConnectSessionResolver::new(backends.clone())),
        Arc::new(GithubSessionResolver::new(backends.clone())),
        Arc::new(NotAuthenticatedResolver::new(backends)),
    ]
}
