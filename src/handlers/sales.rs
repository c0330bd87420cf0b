// src/handlers/sales.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermDelete, PermView, RequirePermission},
    },
    models::{
        sales::{BulkDeletePayload, BulkDeleteResult, CreateSalePayload, RecentSalesFilter, SaleDetail, SaleFilter},
        stats::{SalesStats, StatsQuery},
    },
};

/// Resposta da exclusão em lote: mensagem + contadores
#[derive(Debug, Serialize, ToSchema)]
pub struct BulkDeleteResponse {
    pub message: String,
    #[serde(flatten)]
    pub result: BulkDeleteResult,
}

#[utoipa::path(
    post,
    path = "/api/sales",
    tag = "Sales",
    request_body = CreateSalePayload,
    responses(
        (status = 201, description = "Venda registrada e estoque debitado", body = SaleDetail),
        (status = 400, description = "Quantidade/preço inválido, item rejeitado ou estoque insuficiente"),
        (status = 404, description = "Item não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermView>,
    Json(payload): Json<CreateSalePayload>,
) -> Result<(StatusCode, Json<SaleDetail>), ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let sale = app_state
        .sales_service
        .create_sale(&user, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(sale)))
}

#[utoipa::path(
    get,
    path = "/api/sales",
    tag = "Sales",
    params(SaleFilter),
    responses(
        (status = 200, description = "Vendas em ordem cronológica", body = Vec<SaleDetail>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_sales(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermView>,
    Query(filter): Query<SaleFilter>,
) -> Result<Json<Vec<SaleDetail>>, ApiError> {
    let sales = app_state
        .sales_service
        .list_sales(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(sales))
}

#[utoipa::path(
    get,
    path = "/api/sales/recent",
    tag = "Sales",
    params(RecentSalesFilter),
    responses(
        (status = 200, description = "Vendas mais recentes primeiro", body = Vec<SaleDetail>)
    ),
    security(("api_jwt" = []))
)]
pub async fn recent_sales(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermView>,
    Query(filter): Query<RecentSalesFilter>,
) -> Result<Json<Vec<SaleDetail>>, ApiError> {
    let sales = app_state
        .sales_service
        .recent_sales(filter.limit)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(sales))
}

#[utoipa::path(
    get,
    path = "/api/sales/stats",
    tag = "Sales",
    params(StatsQuery),
    responses(
        (status = 200, description = "Agregados do período", body = SalesStats),
        (status = 400, description = "Intervalo de datas inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn sales_stats(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermView>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<SalesStats>, ApiError> {
    let stats = app_state
        .stats_service
        .compute(&query, Utc::now())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(stats))
}

#[utoipa::path(
    get,
    path = "/api/sales/{id}",
    tag = "Sales",
    params(("id" = i64, Path, description = "ID da venda")),
    responses(
        (status = 200, description = "Venda", body = SaleDetail),
        (status = 404, description = "Venda não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermView>,
    Path(id): Path<i64>,
) -> Result<Json<SaleDetail>, ApiError> {
    let sale = app_state
        .sales_service
        .get_sale(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(sale))
}

#[utoipa::path(
    delete,
    path = "/api/sales/{id}",
    tag = "Sales",
    params(("id" = i64, Path, description = "ID da venda")),
    responses(
        (status = 200, description = "Venda removida e estoque restaurado"),
        (status = 403, description = "Requer can_delete"),
        (status = 404, description = "Venda não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermDelete>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let sale = app_state
        .sales_service
        .delete_sale(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "sale_deleted", &[]);
    Ok(Json(json!({
        "message": message,
        "restored_quantity": sale.quantity_sold,
        "inventory_item_id": sale.inventory_item_id,
    })))
}

#[utoipa::path(
    delete,
    path = "/api/sales/bulk",
    tag = "Sales",
    request_body = BulkDeletePayload,
    responses(
        (status = 200, description = "Vendas encontradas removidas; IDs inexistentes ignorados", body = BulkDeleteResponse),
        (status = 400, description = "Lista de IDs vazia"),
        (status = 403, description = "Requer can_delete")
    ),
    security(("api_jwt" = []))
)]
pub async fn bulk_delete_sales(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermDelete>,
    Json(payload): Json<BulkDeletePayload>,
) -> Result<Json<BulkDeleteResponse>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result = app_state
        .sales_service
        .bulk_delete_sales(&user, &payload.ids)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(
        &locale.0,
        "sales_bulk_deleted",
        &[("count", result.deleted_count.to_string())],
    );
    Ok(Json(BulkDeleteResponse { message, result }))
}
