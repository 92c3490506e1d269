use axum::{extract::Path, Json};
use registry_core::error::AppError;
use serde::Serialize;
use utoipa::ToSchema;

use crate::middleware::CurrentAuth;
use crate::models::PermissionLevel;

#[derive(Debug, Serialize, ToSchema)]
pub struct NamespaceAccessResponse {
    pub namespace: String,
    pub modify: bool,
    pub full: bool,
    pub can_publish_module_version: bool,
    pub can_upload_module_version: bool,
}

/// Access the current identity holds on one namespace. Denials are
/// reported in the body, not as errors; the namespace need not exist.
#[utoipa::path(
    get,
    path = "/v1/auth/namespaces/{namespace}",
    params(("namespace" = String, Path, description = "Namespace name")),
    responses(
        (status = 200, description = "Namespace access", body = NamespaceAccessResponse),
        (status = 503, description = "Access control misconfigured")
    ),
    security(("api_key" = []), ("session" = [])),
    tag = "Auth"
)]
pub async fn get_namespace_access(
    CurrentAuth(ctx): CurrentAuth,
    Path(namespace): Path<String>,
) -> Result<Json<NamespaceAccessResponse>, AppError> {
    let method = ctx.current_auth_method().await?;

    let modify = method
        .check_namespace_access(PermissionLevel::Modify, &namespace)
        .await?;
    let full = method
        .check_namespace_access(PermissionLevel::Full, &namespace)
        .await?;
    let can_publish_module_version = method.can_publish_module_version(&namespace).await?;
    let can_upload_module_version = method.can_upload_module_version(&namespace).await?;

    Ok(Json(NamespaceAccessResponse {
        namespace,
        modify,
        full,
        can_publish_module_version,
        can_upload_module_version,
    }))
}
