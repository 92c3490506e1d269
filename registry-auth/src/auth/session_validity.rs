//! Session validity chain shared by every session-backed method.
//!
//! A session is valid for a method only when, in order:
//! 1. session secret material is configured,
//! 2. the request names a session that exists and has not expired,
//! 3. `is_admin_authenticated` is literally `true`,
//! 4. `authentication_type` is the method's own tag,
//! 5. the method's probe accepts the session.
//!
//! The first failing step ends the chain. Failure only means "not this
//! method"; it is never surfaced as an error.

use super::{AuthBackends, AuthMethodKind, RequestCredentials};
use crate::models::{AuthenticationType, SessionRecord};

/// Outcome of steps 1-4 of the chain.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCheck {
    Valid(SessionRecord),
    SessionsDisabled,
    NoSessionId,
    SessionNotFound,
    SessionExpired,
    StoreUnavailable,
    NotAdminAuthenticated,
    WrongAuthenticationType(Option<AuthenticationType>),
}

impl SessionCheck {
    pub fn reason(&self) -> &'static str {
        match self {
            SessionCheck::Valid(_) => "valid",
            SessionCheck::SessionsDisabled => "sessions_disabled",
            SessionCheck::NoSessionId => "no_session_id",
            SessionCheck::SessionNotFound => "session_not_found",
            SessionCheck::SessionExpired => "session_expired",
            SessionCheck::StoreUnavailable => "store_unavailable",
            SessionCheck::NotAdminAuthenticated => "not_admin_authenticated",
            SessionCheck::WrongAuthenticationType(_) => "wrong_authentication_type",
        }
    }
}

/// Run steps 1-4 for a method owning `expected`.
pub async fn check_session(
    backends: &AuthBackends,
    credentials: &RequestCredentials,
    expected: AuthenticationType,
) -> SessionCheck {
    if !backends.settings.sessions_enabled() {
        return SessionCheck::SessionsDisabled;
    }

    let Some(session_id) = credentials
        .session_id
        .as_deref()
        .filter(|id| !id.is_empty())
    else {
        return SessionCheck::NoSessionId;
    };

    // One read gives a consistent snapshot for the remaining steps.
    let session = match backends.sessions.load(session_id).await {
        Ok(Some(session)) => session,
        Ok(None) => return SessionCheck::SessionNotFound,
        Err(e) => {
            tracing::warn!(error = %e, "Session store lookup failed; treating session as invalid");
            return SessionCheck::StoreUnavailable;
        }
    };

    if session.is_expired() {
        return SessionCheck::SessionExpired;
    }

    if !session.is_admin_authenticated() {
        return SessionCheck::NotAdminAuthenticated;
    }

    match session.authentication_type() {
        Some(found) if found == expected => SessionCheck::Valid(session),
        found => SessionCheck::WrongAuthenticationType(found),
    }
}

/// Run the full chain: steps 1-4, then `probe` as step 5.
pub async fn validate_session<T, F>(
    backends: &AuthBackends,
    credentials: &RequestCredentials,
    kind: AuthMethodKind,
    expected: AuthenticationType,
    probe: F,
) -> Option<T>
where
    F: FnOnce(SessionRecord) -> Option<T>,
{
    match check_session(backends, credentials, expected).await {
        SessionCheck::Valid(session) => {
            let outcome = probe(session);
            if outcome.is_none() {
                tracing::debug!(method = %kind, reason = "probe_failed", "Session rejected");
            }
            outcome
        }
        failed => {
            tracing::debug!(method = %kind, reason = failed.reason(), "Session rejected");
            None
        }
    }
}
