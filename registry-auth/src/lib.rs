pub mod auth;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Json, Router,
};
use registry_core::error::AppError;
use registry_core::middleware::request_id_middleware;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{AuthBackends, AuthFactory};
use crate::config::{AuthConfig, Environment};
use crate::middleware::auth_context::{auth_context_middleware, API_KEY_HEADER, SESSION_COOKIE};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::identity::get_identity,
        handlers::namespaces::get_namespace_access,
    ),
    components(
        schemas(
            handlers::identity::IdentityResponse,
            handlers::namespaces::NamespaceAccessResponse,
            auth::AuthMethodKind,
            models::PermissionLevel,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Resolved identity and namespace authorization"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Registry-ApiKey"))),
            );
            components.add_security_scheme(
                "session",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE))),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: AuthConfig,
    pub backends: AuthBackends,
    pub factory: Arc<AuthFactory>,
}

impl AppState {
    pub fn new(config: AuthConfig, backends: AuthBackends) -> Self {
        let factory = Arc::new(AuthFactory::new(&backends));
        Self {
            config,
            backends,
            factory,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics::metrics));

    if state.config.environment == Environment::Dev {
        app = app.merge(SwaggerUi::new("/docs").url("/.well-known/openapi.json", ApiDoc::openapi()));
    } else {
        app = app.route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );
    }

    let auth_routes = Router::new()
        .route("/v1/auth/identity", get(handlers::get_identity))
        .route(
            "/v1/auth/namespaces/:namespace",
            get(handlers::get_namespace_access),
        )
        .layer(from_fn_with_state(state.clone(), auth_context_middleware));

    let origins: Vec<HeaderValue> = state
        .config
        .cors
        .allowed_origins
        .iter()
        .filter(|origin| origin.as_str() != "*")
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    app.merge(auth_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                    auth_method = tracing::field::Empty,
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::OPTIONS])
                .allow_headers([
                    header::CONTENT_TYPE,
                    HeaderName::from_static(API_KEY_HEADER),
                ]),
        )
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "Service is unhealthy")
    ),
    tag = "Observability"
)]
pub async fn health_check(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    state.backends.sessions.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Session store health check failed");
        AppError::ServiceUnavailable(anyhow::anyhow!("Session store unavailable: {}", e))
    })?;

    state.backends.permissions.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Permission store health check failed");
        AppError::ServiceUnavailable(anyhow::anyhow!("Permission store unavailable: {}", e))
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "auth_methods": state.factory.kinds(),
        "checks": {
            "session_store": "up",
            "permission_store": "up"
        }
    })))
}
