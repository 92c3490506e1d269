use registry_auth::{
    auth::AuthBackends,
    build_router,
    config::AuthConfig,
    services::{
        database, metrics, OidcTokenValidator, PgPermissionStore, RedisSessionStore,
        StaticTokenValidator, TokenValidator,
    },
    AppState,
};
use registry_core::error::AppError;
use registry_core::observability::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = AuthConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    metrics::init_metrics().map_err(|e| AppError::InternalError(anyhow::Error::new(e)))?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        access_controls = config.auth.enable_access_controls,
        "Starting registry auth service"
    );

    let sessions = RedisSessionStore::new(&config.redis).await?;

    let pool = database::create_pool(&config.database)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::Error::new(e)))?;
    database::run_migrations(&pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::Error::new(e)))?;

    let oidc_tokens: Arc<dyn TokenValidator> = if config.auth.openid_connect.is_enabled() {
        Arc::new(OidcTokenValidator::new(&config.auth.openid_connect))
    } else {
        Arc::new(StaticTokenValidator(false))
    };

    let backends = AuthBackends::new(
        config.auth.clone(),
        Arc::new(sessions),
        Arc::new(PgPermissionStore::new(pool)),
        oidc_tokens,
    );
    let state = AppState::new(config.clone(), backends);

    tracing::info!(
        methods = ?state.factory.kinds(),
        "Authentication methods registered"
    );

    let app = build_router(state);

    let addr = config.common.socket_addr();
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    registry_core::axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
