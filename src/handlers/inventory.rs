// src/handlers/inventory.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use validator::Validate;

// Importa os nossos extratores e erros
use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermAdd, PermApprove, PermView, RequirePermission},
    },
    models::inventory::{CreateItemPayload, InventoryItemView, ItemFilter, UpdateItemPayload},
};

#[utoipa::path(
    get,
    path = "/api/inventory",
    tag = "Inventory",
    params(ItemFilter),
    responses(
        (status = 200, description = "Itens visíveis para o usuário", body = Vec<InventoryItemView>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_items(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermView>,
    Query(filter): Query<ItemFilter>,
) -> Result<Json<Vec<InventoryItemView>>, ApiError> {
    let items = app_state
        .inventory_service
        .list_items(&user, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(items))
}

#[utoipa::path(
    get,
    path = "/api/inventory/pending",
    tag = "Inventory",
    responses(
        (status = 200, description = "Fila de aprovação, mais novos primeiro", body = Vec<InventoryItemView>),
        (status = 403, description = "Requer can_approve")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_pending(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermApprove>,
) -> Result<Json<Vec<InventoryItemView>>, ApiError> {
    let items = app_state
        .inventory_service
        .list_pending(&user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(items))
}

#[utoipa::path(
    get,
    path = "/api/inventory/{id}",
    tag = "Inventory",
    params(("id" = i64, Path, description = "ID do item")),
    responses(
        (status = 200, description = "Item", body = InventoryItemView),
        (status = 403, description = "Item de outro usuário ainda não aprovado"),
        (status = 404, description = "Item não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_item(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermView>,
    Path(id): Path<i64>,
) -> Result<Json<InventoryItemView>, ApiError> {
    let item = app_state
        .inventory_service
        .get_item(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(item))
}

#[utoipa::path(
    post,
    path = "/api/inventory",
    tag = "Inventory",
    request_body = CreateItemPayload,
    responses(
        (status = 201, description = "Item criado como pendente", body = InventoryItemView),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_item(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermAdd>,
    Json(payload): Json<CreateItemPayload>,
) -> Result<(StatusCode, Json<InventoryItemView>), ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let item = app_state
        .inventory_service
        .create_item(&user, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(item)))
}

// Sem guard de permissão: dono de item pendente edita sem `can_edit`; o serviço decide
#[utoipa::path(
    put,
    path = "/api/inventory/{id}",
    tag = "Inventory",
    params(("id" = i64, Path, description = "ID do item")),
    request_body = UpdateItemPayload,
    responses(
        (status = 200, description = "Item atualizado", body = InventoryItemView),
        (status = 403, description = "Sem permissão para editar este item"),
        (status = 404, description = "Item não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_item(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateItemPayload>,
) -> Result<Json<InventoryItemView>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let item = app_state
        .inventory_service
        .update_item(&user, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(item))
}

#[utoipa::path(
    post,
    path = "/api/inventory/{id}/approve",
    tag = "Inventory",
    params(("id" = i64, Path, description = "ID do item")),
    responses(
        (status = 200, description = "Item aprovado", body = InventoryItemView),
        (status = 409, description = "Item rejeitado não pode ser aprovado")
    ),
    security(("api_jwt" = []))
)]
pub async fn approve_item(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermApprove>,
    Path(id): Path<i64>,
) -> Result<Json<InventoryItemView>, ApiError> {
    let item = app_state
        .inventory_service
        .approve_item(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(item))
}

#[utoipa::path(
    post,
    path = "/api/inventory/{id}/reject",
    tag = "Inventory",
    params(("id" = i64, Path, description = "ID do item")),
    responses(
        (status = 200, description = "Item rejeitado"),
        (status = 404, description = "Item não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn reject_item(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermApprove>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let item = app_state
        .inventory_service
        .reject_item(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "item_rejected", &[]);
    Ok(Json(json!({ "message": message, "item": item })))
}

#[utoipa::path(
    delete,
    path = "/api/inventory/{id}",
    tag = "Inventory",
    params(("id" = i64, Path, description = "ID do item")),
    responses(
        (status = 200, description = "Item removido"),
        (status = 403, description = "Sem permissão para remover este item"),
        (status = 409, description = "Item possui vendas")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_item(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    app_state
        .inventory_service
        .delete_item(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "item_deleted", &[]);
    Ok(Json(json!({ "message": message })))
}
