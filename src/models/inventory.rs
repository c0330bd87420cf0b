// src/models/inventory.rs

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    common::error::AppError,
    models::{
        auth::User,
        money::{to_cents, within_price_range, MAX_UNIT_PRICE},
    },
};

// --- 1. Status do item (enum `item_status` no banco) ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "item_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Approved => "approved",
            ItemStatus::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

impl ItemStatus {
    /// Itens rejeitados são terminais: não aceitam vendas nem movimentação de estoque.
    pub fn ensure_sellable(self) -> Result<(), AppError> {
        match self {
            ItemStatus::Pending | ItemStatus::Approved => Ok(()),
            ItemStatus::Rejected => Err(AppError::InvalidStatus(self)),
        }
    }
}

// --- 2. Item de estoque ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct InventoryItem {
    #[schema(example = 42)]
    pub id: i64,
    #[schema(example = "Mint Ice 50ml")]
    pub product_name: String,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    #[schema(example = 10)]
    pub quantity: i32,
    #[schema(example = 5.0)]
    pub unit_price: Option<Decimal>,
    pub status: ItemStatus,
    pub created_by: i64,
    pub approved_by: Option<i64>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Quem enxerga o item: aprovadores veem tudo; os demais veem os aprovados
    /// e os próprios pendentes.
    pub fn is_visible_to(&self, user: &User) -> bool {
        user.effective_permissions().can_approve
            || self.status == ItemStatus::Approved
            || (self.status == ItemStatus::Pending && self.created_by == user.id)
    }

    /// Regra de edição/exclusão: quem tem a permissão elevada (`can_edit` ou
    /// `can_delete`, conforme a operação) pode tudo; os demais só mexem nos
    /// próprios itens ainda pendentes.
    pub fn ensure_modifiable_by(&self, user: &User, elevated: bool) -> Result<(), AppError> {
        if elevated {
            return Ok(());
        }
        if self.created_by == user.id && self.status == ItemStatus::Pending {
            return Ok(());
        }
        Err(AppError::OwnPendingItemsOnly)
    }

    /// pending -> approved. Aprovar um item já aprovado não altera nada
    /// (approved_by/approved_at originais são preservados).
    pub fn approve(mut self, approver_id: i64, now: DateTime<Utc>) -> Result<Self, AppError> {
        match self.status {
            ItemStatus::Approved => Ok(self),
            ItemStatus::Pending => {
                self.status = ItemStatus::Approved;
                self.approved_by = Some(approver_id);
                self.approved_at = Some(now);
                Ok(self)
            }
            ItemStatus::Rejected => Err(AppError::InvalidStatusTransition {
                from: ItemStatus::Rejected,
                to: ItemStatus::Approved,
            }),
        }
    }

    /// pending|approved -> rejected. Rejeitar de novo é no-op.
    pub fn reject(mut self) -> Self {
        self.status = ItemStatus::Rejected;
        self
    }

    /// Aplica uma edição e devolve o novo estado do item, sem tocar no banco.
    /// `can_edit` libera a troca explícita de status (a "porta dos fundos" do admin).
    pub fn apply_changes(
        mut self,
        changes: &UpdateItemPayload,
        editor_id: i64,
        can_edit: bool,
        now: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        if let Some(status) = changes.status {
            if status != self.status {
                if !can_edit {
                    return Err(AppError::StatusOverrideForbidden);
                }
                if status == ItemStatus::Approved && self.approved_at.is_none() {
                    self.approved_by = Some(editor_id);
                    self.approved_at = Some(now);
                }
                self.status = status;
            }
        }

        if let Some(quantity) = changes.quantity {
            if quantity < 0 {
                return Err(AppError::InvalidInput("quantity must be >= 0".into()));
            }
            if quantity != self.quantity && self.status == ItemStatus::Rejected {
                return Err(AppError::InvalidStatus(ItemStatus::Rejected));
            }
            self.quantity = quantity;
        }

        if let Some(price) = changes.unit_price {
            self.unit_price = Some(normalize_item_price(price)?);
        }
        if let Some(name) = &changes.product_name {
            self.product_name =
                non_empty(name).ok_or_else(|| AppError::InvalidInput("product_name must not be blank".into()))?;
        }
        if let Some(category) = &changes.category {
            self.category = non_empty(category);
        }
        if let Some(brand) = &changes.brand {
            self.brand = non_empty(brand);
        }
        if let Some(sku) = &changes.sku {
            self.sku = non_empty(sku);
        }
        if let Some(description) = &changes.description {
            self.description = non_empty(description);
        }

        Ok(self)
    }
}

/// Preço de cadastro: pode ser zero (brinde), nunca negativo nem maior que a coluna.
pub fn normalize_item_price(price: Decimal) -> Result<Decimal, AppError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(AppError::InvalidInput("unit_price must be >= 0".into()));
    }
    let price = to_cents(price);
    if !within_price_range(price) {
        return Err(AppError::InvalidInput(format!("unit_price must be <= {}", MAX_UNIT_PRICE)));
    }
    Ok(price)
}

// "" vira NULL, como no cadastro
pub(crate) fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// --- 3. Item + nomes dos usuários (o que a tela consome) ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct InventoryItemView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub item: InventoryItem,
    pub created_by_name: Option<String>,
    pub approved_by_name: Option<String>,
}

// --- 4. Payloads ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateItemPayload {
    #[validate(length(min = 1, max = 255, message = "O nome do produto é obrigatório."))]
    #[schema(example = "Mint Ice 50ml")]
    pub product_name: String,

    #[validate(range(min = 0, message = "A quantidade não pode ser negativa."))]
    #[schema(example = 10)]
    pub quantity: i32,

    #[schema(example = 5.0)]
    pub unit_price: Option<Decimal>,

    #[validate(length(max = 255))]
    pub category: Option<String>,
    #[validate(length(max = 255))]
    pub brand: Option<String>,
    #[validate(length(max = 255))]
    pub sku: Option<String>,
    pub description: Option<String>,
}

/// Edição parcial: campos ausentes permanecem como estão.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateItemPayload {
    #[validate(length(min = 1, max = 255, message = "O nome do produto não pode ficar vazio."))]
    pub product_name: Option<String>,

    #[validate(range(min = 0, message = "A quantidade não pode ser negativa."))]
    pub quantity: Option<i32>,

    pub unit_price: Option<Decimal>,

    #[validate(length(max = 255))]
    pub category: Option<String>,
    #[validate(length(max = 255))]
    pub brand: Option<String>,
    #[validate(length(max = 255))]
    pub sku: Option<String>,
    pub description: Option<String>,

    /// Só aceito de quem tem `can_edit`
    pub status: Option<ItemStatus>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ItemFilter {
    pub status: Option<ItemStatus>,
    /// Busca em product_name, brand e sku (sem diferenciar maiúsculas)
    pub search: Option<String>,
}
