// src/models/sales.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    common::error::AppError,
    models::{
        inventory::InventoryItem,
        money::{checked_total, to_cents, within_price_range},
    },
};

// --- 1. Venda (linha da tabela `sales`) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Sale {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = 42)]
    pub inventory_item_id: i64,
    #[schema(example = 3)]
    pub quantity_sold: i32,
    /// Preço no momento da venda (não acompanha mudanças no cadastro)
    #[schema(example = 5.0)]
    pub unit_price: Decimal,
    #[schema(example = 15.0)]
    pub total_amount: Decimal,
    pub sold_by: i64,
    pub customer_name: Option<String>,
    #[schema(example = "cash")]
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

// --- 2. Venda + dados de exibição (produto, marca, vendedor) ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct SaleDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub sale: Sale,
    pub product_name: String,
    pub brand: Option<String>,
    pub sku: Option<String>,
    pub sold_by_name: String,
}

// --- 3. Regras de preço ---

/// Cadeia de fallback do preço: preço informado -> preço do cadastro -> padrão configurado.
/// Com `require_price` ligado a venda sem preço é recusada.
#[derive(Debug, Clone, Copy)]
pub struct PricePolicy {
    pub default_unit_price: Decimal,
    pub require_price: bool,
}

/// De onde veio o preço efetivamente usado
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    Request,
    Item,
    Default,
}

pub fn resolve_unit_price(
    requested: Option<Decimal>,
    item_price: Option<Decimal>,
    policy: &PricePolicy,
) -> Result<(Decimal, PriceSource), AppError> {
    match requested {
        Some(price) => {
            let price = to_cents(price);
            if price <= Decimal::ZERO || !within_price_range(price) {
                return Err(AppError::InvalidQuantityOrPrice);
            }
            Ok((price, PriceSource::Request))
        }
        None if policy.require_price => Err(AppError::InvalidQuantityOrPrice),
        None => match item_price.map(to_cents).filter(|p| *p > Decimal::ZERO) {
            Some(price) => Ok((price, PriceSource::Item)),
            None => Ok((to_cents(policy.default_unit_price), PriceSource::Default)),
        },
    }
}

// --- 4. Payload e rascunho da venda ---
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSalePayload {
    #[schema(example = 42)]
    pub inventory_item_id: i64,
    #[schema(example = 3)]
    pub quantity_sold: i32,
    #[schema(example = 5.0)]
    pub unit_price: Option<Decimal>,
    #[validate(length(max = 255))]
    pub customer_name: Option<String>,
    #[validate(length(max = 50))]
    #[schema(example = "cash")]
    pub payment_method: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl CreateSalePayload {
    /// Checagens que não dependem do item (feitas antes de abrir a transação).
    pub fn check_amounts(&self, policy: &PricePolicy) -> Result<(), AppError> {
        if self.quantity_sold < 1 {
            return Err(AppError::InvalidQuantityOrPrice);
        }
        match self.unit_price {
            Some(price) if to_cents(price) <= Decimal::ZERO || !within_price_range(to_cents(price)) => {
                Err(AppError::InvalidQuantityOrPrice)
            }
            None if policy.require_price => Err(AppError::InvalidQuantityOrPrice),
            _ => Ok(()),
        }
    }
}

/// Venda validada contra o item travado, pronta para ser gravada.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleDraft {
    pub inventory_item_id: i64,
    pub quantity_sold: i32,
    pub unit_price: Decimal,
    pub total_amount: Decimal,
    pub price_source: PriceSource,
    pub customer_name: Option<String>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

impl SaleDraft {
    pub fn prepare(
        payload: &CreateSalePayload,
        item: &InventoryItem,
        policy: &PricePolicy,
    ) -> Result<Self, AppError> {
        payload.check_amounts(policy)?;
        item.status.ensure_sellable()?;

        // Sem clamp: vender mais do que existe é erro
        if item.quantity < payload.quantity_sold {
            return Err(AppError::InsufficientStock {
                available: item.quantity,
                requested: payload.quantity_sold,
            });
        }

        let (unit_price, price_source) = resolve_unit_price(payload.unit_price, item.unit_price, policy)?;
        let total_amount =
            checked_total(payload.quantity_sold, unit_price).ok_or(AppError::InvalidQuantityOrPrice)?;

        Ok(Self {
            inventory_item_id: item.id,
            quantity_sold: payload.quantity_sold,
            unit_price,
            total_amount,
            price_source,
            customer_name: payload.customer_name.as_deref().and_then(crate::models::inventory::non_empty),
            payment_method: payload.payment_method.as_deref().and_then(crate::models::inventory::non_empty),
            notes: payload.notes.as_deref().and_then(crate::models::inventory::non_empty),
        })
    }
}

// --- 5. Listagem ---
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SaleFilter {
    /// Data inicial (inclusive), YYYY-MM-DD
    #[serde(rename = "startDate")]
    pub start_date: Option<NaiveDate>,
    /// Data final (inclusive), YYYY-MM-DD
    #[serde(rename = "endDate")]
    pub end_date: Option<NaiveDate>,
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecentSalesFilter {
    pub limit: Option<i64>,
}

/// Limite efetivo: padrão quando ausente, entre 1 e o teto configurado.
pub fn clamp_limit(requested: Option<i64>, default: i64, max: i64) -> i64 {
    requested.unwrap_or(default).clamp(1, max)
}

// --- 6. Exclusão em lote ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BulkDeletePayload {
    #[validate(length(min = 1, max = 10000, message = "Informe ao menos um ID de venda."))]
    #[schema(example = json!([1, 2, 3]))]
    pub ids: Vec<i64>,
}

/// Resultado parcial: IDs que não existem são ignorados e reportados, não derrubam o lote.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct BulkDeleteResult {
    #[serde(rename = "deletedCount")]
    pub deleted_count: u64,
    #[serde(rename = "skippedIds")]
    pub skipped_ids: Vec<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::inventory::ItemStatus;
    use rust_decimal_macros::dec;

    fn policy() -> PricePolicy {
        PricePolicy { default_unit_price: dec!(29.99), require_price: false }
    }

    fn item(quantity: i32, price: Option<Decimal>, status: ItemStatus) -> InventoryItem {
        InventoryItem {
            id: 7,
            product_name: "Mint Ice".into(),
            category: None,
            brand: None,
            sku: None,
            description: None,
            quantity,
            unit_price: price,
            status,
            created_by: 1,
            approved_by: None,
            approved_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn payload(quantity_sold: i32, unit_price: Option<Decimal>) -> CreateSalePayload {
        CreateSalePayload {
            inventory_item_id: 7,
            quantity_sold,
            unit_price,
            customer_name: Some(" Ana ".into()),
            payment_method: Some("".into()),
            notes: None,
        }
    }

    #[test]
    fn oversized_prices_are_rejected_not_multiplied() {
        let huge: CreateSalePayload =
            serde_json::from_str(r#"{"inventory_item_id":7,"quantity_sold":10,"unit_price":1e28}"#).unwrap();
        assert!(matches!(huge.check_amounts(&policy()), Err(AppError::InvalidQuantityOrPrice)));
        assert!(matches!(
            SaleDraft::prepare(&huge, &item(50, None, ItemStatus::Approved), &policy()),
            Err(AppError::InvalidQuantityOrPrice)
        ));

        assert!(matches!(
            resolve_unit_price(Some(dec!(10000000000)), None, &policy()),
            Err(AppError::InvalidQuantityOrPrice)
        ));
        assert!(resolve_unit_price(Some(dec!(9999999999.99)), None, &policy()).is_ok());
    }

    #[test]
    fn totals_beyond_the_column_are_rejected() {
        let stock = item(5000, Some(dec!(9999999999.99)), ItemStatus::Approved);
        assert!(matches!(
            SaleDraft::prepare(&payload(1000, None), &stock, &policy()),
            Err(AppError::InvalidQuantityOrPrice)
        ));
        let draft = SaleDraft::prepare(&payload(100, None), &stock, &policy()).unwrap();
        assert_eq!(draft.total_amount, dec!(999999999999.00));
    }

    #[test]
    fn total_is_quantity_times_price() {
        let draft = SaleDraft::prepare(
            &payload(3, Some(dec!(5.00))),
            &item(10, Some(dec!(5.00)), ItemStatus::Approved),
            &policy(),
        )
        .unwrap();
        assert_eq!(draft.total_amount, dec!(15.00));
        assert_eq!(draft.customer_name.as_deref(), Some("Ana"));
        assert_eq!(draft.payment_method, None);
    }

    #[test]
    fn totals_are_exact_for_prices_that_drift_in_floating_point() {
        let draft = SaleDraft::prepare(
            &payload(3, Some(dec!(0.10))),
            &item(10, None, ItemStatus::Pending),
            &policy(),
        )
        .unwrap();
        assert_eq!(draft.total_amount, dec!(0.30));
        assert_eq!(draft.total_amount, Decimal::from(draft.quantity_sold) * draft.unit_price);
    }

    #[test]
    fn selling_more_than_available_is_rejected_not_clamped() {
        let err = SaleDraft::prepare(
            &payload(8, Some(dec!(5))),
            &item(7, Some(dec!(5)), ItemStatus::Approved),
            &policy(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { available: 7, requested: 8 }));
    }

    #[test]
    fn rejected_items_cannot_be_sold() {
        let err = SaleDraft::prepare(
            &payload(1, Some(dec!(5))),
            &item(7, Some(dec!(5)), ItemStatus::Rejected),
            &policy(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidStatus(ItemStatus::Rejected)));
    }

    #[test]
    fn non_positive_quantity_or_price_is_invalid() {
        assert!(matches!(payload(0, Some(dec!(5))).check_amounts(&policy()), Err(AppError::InvalidQuantityOrPrice)));
        assert!(matches!(payload(1, Some(dec!(0))).check_amounts(&policy()), Err(AppError::InvalidQuantityOrPrice)));
        assert!(matches!(payload(1, Some(dec!(-3))).check_amounts(&policy()), Err(AppError::InvalidQuantityOrPrice)));
        // 0.004 arredonda para 0.00
        assert!(payload(1, Some(dec!(0.004))).check_amounts(&policy()).is_err());
    }

    #[test]
    fn price_fallback_chain() {
        let p = policy();
        assert_eq!(resolve_unit_price(Some(dec!(4.5)), Some(dec!(5)), &p).unwrap(), (dec!(4.50), PriceSource::Request));
        assert_eq!(resolve_unit_price(None, Some(dec!(5)), &p).unwrap(), (dec!(5), PriceSource::Item));
        assert_eq!(resolve_unit_price(None, Some(dec!(0)), &p).unwrap(), (dec!(29.99), PriceSource::Default));
        assert_eq!(resolve_unit_price(None, None, &p).unwrap(), (dec!(29.99), PriceSource::Default));
    }

    #[test]
    fn required_price_disables_fallback() {
        let strict = PricePolicy { require_price: true, ..policy() };
        assert!(resolve_unit_price(None, Some(dec!(5)), &strict).is_err());
        assert!(payload(1, None).check_amounts(&strict).is_err());
        assert!(payload(1, None).check_amounts(&policy()).is_ok());
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(clamp_limit(None, 50, 10000), 50);
        assert_eq!(clamp_limit(Some(0), 50, 10000), 1);
        assert_eq!(clamp_limit(Some(99999), 50, 10000), 10000);
        assert_eq!(clamp_limit(Some(120), 50, 10000), 120);
    }

    #[test]
    fn bulk_result_uses_camel_case_counters() {
        let result = BulkDeleteResult { deleted_count: 2, skipped_ids: vec![99], errors: vec![] };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["deletedCount"], 2);
        assert_eq!(json["skippedIds"][0], 99);
        assert!(json.get("errors").is_none());
    }
}
