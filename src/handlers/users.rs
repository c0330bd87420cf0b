// src/handlers/users.rs

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermManageUsers, RequirePermission},
    },
    models::{
        auth::UserProfile,
        rbac::{ChangeRolePayload, Permissions},
    },
};

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    responses(
        (status = 200, description = "Todos os usuários, mais novos primeiro", body = Vec<UserProfile>),
        (status = 403, description = "Requer can_manage_users")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermManageUsers>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    let users = app_state
        .rbac_service
        .list_users()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(users))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}/role",
    tag = "Users",
    params(("id" = i64, Path, description = "ID do usuário")),
    request_body = ChangeRolePayload,
    responses(
        (status = 200, description = "Papel alterado", body = UserProfile),
        (status = 404, description = "Usuário não encontrado"),
        (status = 409, description = "Último admin ou auto-rebaixamento")
    ),
    security(("api_jwt" = []))
)]
pub async fn change_role(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequirePermission<PermManageUsers>,
    Path(id): Path<i64>,
    Json(payload): Json<ChangeRolePayload>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = app_state
        .rbac_service
        .change_role(&actor, id, payload.role)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(user))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}/permissions",
    tag = "Users",
    params(("id" = i64, Path, description = "ID do usuário")),
    request_body = Permissions,
    responses(
        (status = 200, description = "Permissões customizadas gravadas", body = UserProfile),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_permissions(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequirePermission<PermManageUsers>,
    Path(id): Path<i64>,
    Json(permissions): Json<Permissions>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = app_state
        .rbac_service
        .set_permissions(&actor, id, permissions)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(user))
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/permissions/reset",
    tag = "Users",
    params(("id" = i64, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Permissões voltaram aos padrões do papel", body = UserProfile),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn reset_permissions(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequirePermission<PermManageUsers>,
    Path(id): Path<i64>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = app_state
        .rbac_service
        .reset_permissions(&actor, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(user))
}
