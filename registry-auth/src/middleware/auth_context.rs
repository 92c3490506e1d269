use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use registry_core::error::AppError;
use std::sync::Arc;

use crate::auth::{AuthContext, RequestCredentials};
use crate::AppState;

pub const API_KEY_HEADER: &str = "x-registry-apikey";
pub const SESSION_COOKIE: &str = "registry_session";

/// Lift the API key header and session cookie off a request.
pub fn extract_credentials(headers: &HeaderMap) -> RequestCredentials {
    let api_key = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    let session_id = CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty());

    RequestCredentials {
        api_key,
        session_id,
    }
}

/// Attach a fresh [`AuthContext`] to every request. Resolution itself is
/// deferred until a handler asks for the identity.
pub async fn auth_context_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let credentials = extract_credentials(req.headers());
    let context = AuthContext::new(state.factory.clone(), credentials);
    req.extensions_mut().insert(Arc::new(context));
    next.run(req).await
}

/// Extractor for the request's [`AuthContext`].
pub struct CurrentAuth(pub Arc<AuthContext>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let context = parts
            .extensions
            .get::<Arc<AuthContext>>()
            .cloned()
            .ok_or_else(|| {
                AppError::InternalError(anyhow::anyhow!(
                    "Auth context missing from request extensions"
                ))
            })?;

        Ok(CurrentAuth(context))
    }
}
