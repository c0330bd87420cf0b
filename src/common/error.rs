// src/common/error.rs

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{
    common::i18n::I18nStore,
    middleware::i18n::Locale,
    models::inventory::ItemStatus,
};

// O erro de domínio da aplicação. Os handlers nunca devolvem AppError diretamente:
// ele é traduzido para ApiError com `to_api_error`, já no idioma do cliente.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Entrada inválida: {0}")]
    InvalidInput(String),

    #[error("Quantidade ou preço inválido")]
    InvalidQuantityOrPrice,

    #[error("Item com status '{0}' não pode ser vendido")]
    InvalidStatus(ItemStatus),

    #[error("Estoque insuficiente (disponível {available}, solicitado {requested})")]
    InsufficientStock { available: i32, requested: i32 },

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Permissão '{0}' necessária")]
    PermissionDenied(&'static str),

    #[error("Apenas o dono pode alterar itens pendentes")]
    OwnPendingItemsOnly,

    #[error("Alteração direta de status não permitida")]
    StatusOverrideForbidden,

    #[error("Item {0} não encontrado")]
    ItemNotFound(i64),

    #[error("Venda {0} não encontrada")]
    SaleNotFound(i64),

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Operação deixaria o sistema sem administradores")]
    LastAdmin,

    #[error("Administrador não pode rebaixar a si mesmo")]
    SelfDemotion,

    #[error("Operação deixaria o sistema sem ninguém para gerenciar usuários")]
    LastUserManager,

    #[error("Usuário não pode retirar de si mesmo a gestão de usuários")]
    SelfRevocation,

    #[error("Transição de status inválida: {from} -> {to}")]
    InvalidStatusTransition { from: ItemStatus, to: ItemStatus },

    #[error("Item {0} possui vendas")]
    ItemHasSales(i64),

    #[error("Nome de usuário ou e-mail já existe")]
    UsernameOrEmailTaken,

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidInput(_)
            | AppError::InvalidQuantityOrPrice
            | AppError::InvalidStatus(_)
            | AppError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,

            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,

            AppError::PermissionDenied(_)
            | AppError::OwnPendingItemsOnly
            | AppError::StatusOverrideForbidden => StatusCode::FORBIDDEN,

            AppError::ItemNotFound(_) | AppError::SaleNotFound(_) | AppError::UserNotFound => {
                StatusCode::NOT_FOUND
            }

            AppError::LastAdmin
            | AppError::SelfDemotion
            | AppError::LastUserManager
            | AppError::SelfRevocation
            | AppError::InvalidStatusTransition { .. }
            | AppError::ItemHasSales(_)
            | AppError::UsernameOrEmailTaken => StatusCode::CONFLICT,

            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // Chave do catálogo em locales/*.json + argumentos dos placeholders
    fn message(&self) -> (&'static str, Vec<(&'static str, String)>) {
        match self {
            AppError::ValidationError(_) => ("validation_failed", vec![]),
            AppError::InvalidInput(detail) => ("invalid_input", vec![("detail", detail.clone())]),
            AppError::InvalidQuantityOrPrice => ("invalid_quantity_or_price", vec![]),
            AppError::InvalidStatus(status) => ("invalid_status", vec![("status", status.to_string())]),
            AppError::InsufficientStock { available, requested } => (
                "insufficient_stock",
                vec![("available", available.to_string()), ("requested", requested.to_string())],
            ),
            AppError::InvalidCredentials => ("invalid_credentials", vec![]),
            AppError::InvalidToken => ("invalid_token", vec![]),
            AppError::PermissionDenied(perm) => ("permission_denied", vec![("permission", perm.to_string())]),
            AppError::OwnPendingItemsOnly => ("own_pending_items_only", vec![]),
            AppError::StatusOverrideForbidden => ("status_override_forbidden", vec![]),
            AppError::ItemNotFound(id) => ("item_not_found", vec![("id", id.to_string())]),
            AppError::SaleNotFound(id) => ("sale_not_found", vec![("id", id.to_string())]),
            AppError::UserNotFound => ("user_not_found", vec![]),
            AppError::LastAdmin => ("last_admin", vec![]),
            AppError::SelfDemotion => ("self_demotion", vec![]),
            AppError::LastUserManager => ("last_user_manager", vec![]),
            AppError::SelfRevocation => ("self_revocation", vec![]),
            AppError::InvalidStatusTransition { from, to } => (
                "invalid_status_transition",
                vec![("from", from.to_string()), ("to", to.to_string())],
            ),
            AppError::ItemHasSales(id) => ("item_has_sales", vec![("id", id.to_string())]),
            AppError::UsernameOrEmailTaken => ("username_or_email_taken", vec![]),
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => ("internal_error", vec![]),
        }
    }

    /// Converte o erro de domínio na resposta HTTP, traduzida para o idioma do cliente.
    pub fn to_api_error(self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status_code();
        let (key, args) = self.message();
        let error = store.translate(&locale.0, key, &args);

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Detalhes técnicos só vão para o log
            tracing::error!("🔥 Erro Interno do Servidor: {}", self);
        }

        let details = match &self {
            AppError::ValidationError(errors) => Some(validation_details(errors)),
            AppError::InsufficientStock { available, requested } => {
                Some(json!({ "available": available, "requested": requested }))
            }
            _ => None,
        };

        ApiError { status, error, details }
    }
}

fn validation_details(errors: &validator::ValidationErrors) -> Value {
    let mut details = HashMap::new();
    for (field, field_errors) in errors.field_errors() {
        let messages: Vec<String> = field_errors
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string())
            })
            .collect();
        details.insert(field.to_string(), messages);
    }
    json!(details)
}

// O que efetivamente vai para o cliente
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> I18nStore {
        I18nStore::load().unwrap()
    }

    #[test]
    fn taxonomy_maps_to_status_codes() {
        assert_eq!(AppError::ItemNotFound(1).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::SaleNotFound(1).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::OwnPendingItemsOnly.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::InvalidQuantityOrPrice.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::InsufficientStock { available: 7, requested: 8 }.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::LastAdmin.status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::SelfDemotion.status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::LastUserManager.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::InternalServerError(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn insufficient_stock_reports_available_quantity() {
        let api = AppError::InsufficientStock { available: 7, requested: 8 }
            .to_api_error(&Locale("en".into()), &store());
        assert_eq!(api.error, "Insufficient quantity. Available: 7, Requested: 8");
        assert_eq!(api.details, Some(json!({ "available": 7, "requested": 8 })));
    }

    #[test]
    fn internal_errors_hide_details_from_client() {
        let api = AppError::InternalServerError(anyhow::anyhow!("senha do banco: 1234"))
            .to_api_error(&Locale("pt".into()), &store());
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.error, "Ocorreu um erro inesperado.");
        assert!(api.details.is_none());
    }

    #[test]
    fn status_values_are_rendered_in_messages() {
        let api = AppError::InvalidStatus(ItemStatus::Rejected)
            .to_api_error(&Locale("en".into()), &store());
        assert!(api.error.contains("'rejected'"));
    }
}
