use axum::Json;
use registry_core::error::AppError;
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::auth::AuthMethodKind;
use crate::middleware::CurrentAuth;
use crate::models::PermissionLevel;

/// Summary of the identity acting on the request.
#[derive(Debug, Serialize, ToSchema)]
pub struct IdentityResponse {
    pub auth_method: AuthMethodKind,
    pub username: String,
    pub is_authenticated: bool,
    pub is_admin: bool,
    pub is_built_in_admin: bool,
    pub can_access_read_api: bool,
    pub can_access_terraform_api: bool,
    pub requires_csrf_tokens: bool,
    /// Highest level held per namespace.
    pub namespace_permissions: BTreeMap<String, PermissionLevel>,
}

#[utoipa::path(
    get,
    path = "/v1/auth/identity",
    responses(
        (status = 200, description = "Resolved identity", body = IdentityResponse),
        (status = 503, description = "Access control misconfigured")
    ),
    security(("api_key" = []), ("session" = [])),
    tag = "Auth"
)]
pub async fn get_identity(
    CurrentAuth(ctx): CurrentAuth,
) -> Result<Json<IdentityResponse>, AppError> {
    let method = ctx.current_auth_method().await?;

    Ok(Json(IdentityResponse {
        auth_method: method.kind(),
        username: method.get_username(),
        is_authenticated: method.is_authenticated(),
        is_admin: method.is_admin().await?,
        is_built_in_admin: method.is_built_in_admin(),
        can_access_read_api: method.can_access_read_api(),
        can_access_terraform_api: method.can_access_terraform_api(),
        requires_csrf_tokens: method.requires_csrf_tokens(),
        namespace_permissions: method.get_all_namespace_permissions().await?,
    }))
}
