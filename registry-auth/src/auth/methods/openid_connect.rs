use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

use super::sso::SsoSession;
use crate::auth::namespace_access::NamespaceAuthorizer;
use crate::auth::session_validity::validate_session;
use crate::auth::{AuthBackends, AuthMethod, AuthMethodKind, AuthMethodResolver, RequestCredentials};
use crate::models::session::keys;
use crate::models::{AuthenticationType, SessionRecord};

/// Unix seconds, stored either as a number or a numeric string.
fn parse_expires_at(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(seconds_from_float)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(seconds_from_float))
        }
        _ => None,
    }
}

/// Truncates to whole seconds. Non-finite or out of range values do not parse.
fn seconds_from_float(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
    if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

pub struct OpenidConnectSessionResolver {
    backends: AuthBackends,
}

impl OpenidConnectSessionResolver {
    pub fn new(backends: AuthBackends) -> Self {
        Self { backends }
    }

    fn probe(&self, session: &SessionRecord) -> bool {
        let Some(expires_at) = session
            .get(keys::OPENID_CONNECT_EXPIRES_AT)
            .and_then(parse_expires_at)
        else {
            return false;
        };
        if expires_at <= Utc::now().timestamp() {
            return false;
        }

        session
            .get_str(keys::OPENID_CONNECT_ID_TOKEN)
            .is_some_and(|token| self.backends.oidc_tokens.validate_token(token))
    }

    fn build(&self, session: SessionRecord) -> Option<Arc<dyn AuthMethod>> {
        if !self.probe(&session) {
            return None;
        }

        let username = session
            .get_str(keys::OPENID_USERNAME)
            .unwrap_or_default()
            .to_string();
        let groups = session.get_string_list(keys::OPENID_GROUPS);

        Some(Arc::new(SsoSession::new(
            AuthMethodKind::OpenidConnectSession,
            username,
            NamespaceAuthorizer::new(&self.backends, groups),
        )))
    }
}

#[async_trait]
impl AuthMethodResolver for OpenidConnectSessionResolver {
    fn kind(&self) -> AuthMethodKind {
        AuthMethodKind::OpenidConnectSession
    }

    fn is_enabled(&self) -> bool {
        self.backends.settings.openid_connect.is_enabled()
    }

    async fn resolve(&self, credentials: &RequestCredentials) -> Option<Arc<dyn AuthMethod>> {
        validate_session(
            &self.backends,
            credentials,
            AuthMethodKind::OpenidConnectSession,
            AuthenticationType::SessionOpenidConnect,
            |session| self.build(session),
        )
        .await
    }
}
