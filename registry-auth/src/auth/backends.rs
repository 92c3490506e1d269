use std::sync::Arc;

use crate::config::AuthSettings;
use crate::services::{PermissionStore, SessionStore, TokenValidator};

/// Credentials presented by one request, already lifted off the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestCredentials {
    pub api_key: Option<String>,
    pub session_id: Option<String>,
}

impl RequestCredentials {
    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    pub fn with_session_id(mut self, session_id: &str) -> Self {
        self.session_id = Some(session_id.to_string());
        self
    }
}

/// Configuration and external collaborators shared by every auth method.
#[derive(Clone)]
pub struct AuthBackends {
    pub settings: Arc<AuthSettings>,
    pub sessions: Arc<dyn SessionStore>,
    pub permissions: Arc<dyn PermissionStore>,
    pub oidc_tokens: Arc<dyn TokenValidator>,
}

impl AuthBackends {
    pub fn new(
        settings: AuthSettings,
        sessions: Arc<dyn SessionStore>,
        permissions: Arc<dyn PermissionStore>,
        oidc_tokens: Arc<dyn TokenValidator>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            sessions,
            permissions,
            oidc_tokens,
        }
    }
}
