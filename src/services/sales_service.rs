// src/services/sales_service.rs

use std::collections::BTreeMap;

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{InventoryRepository, SalesRepository},
    models::{
        auth::User,
        sales::{
            clamp_limit, BulkDeleteResult, CreateSalePayload, PricePolicy, PriceSource, Sale, SaleDetail, SaleDraft,
            SaleFilter,
        },
        stats::DateWindow,
    },
};

const RECENT_SALES_DEFAULT_LIMIT: i64 = 10;

#[derive(Debug, Clone, Copy)]
pub struct SalesSettings {
    pub price_policy: PricePolicy,
    pub default_limit: i64,
    pub max_limit: i64,
}

#[derive(Clone)]
pub struct SalesService {
    sales_repo: SalesRepository,
    inventory_repo: InventoryRepository,
    pool: PgPool,
    settings: SalesSettings,
}

impl SalesService {
    pub fn new(
        sales_repo: SalesRepository,
        inventory_repo: InventoryRepository,
        pool: PgPool,
        settings: SalesSettings,
    ) -> Self {
        Self { sales_repo, inventory_repo, pool, settings }
    }

    // --- CREATE SALE ---
    // Uma transação: trava o item, valida, grava a venda e debita o estoque.
    pub async fn create_sale(&self, seller: &User, payload: &CreateSalePayload) -> Result<SaleDetail, AppError> {
        let policy = &self.settings.price_policy;
        payload.check_amounts(policy)?;

        let mut tx = self.pool.begin().await?;

        let item = self
            .inventory_repo
            .lock_by_id(&mut *tx, payload.inventory_item_id)
            .await?
            .ok_or(AppError::ItemNotFound(payload.inventory_item_id))?;

        let draft = SaleDraft::prepare(payload, &item, policy)?;
        if draft.price_source != PriceSource::Request {
            tracing::warn!(
                item_id = item.id,
                unit_price = %draft.unit_price,
                source = ?draft.price_source,
                "Venda sem preço informado; usando preço de fallback"
            );
        }

        let sale = self.sales_repo.insert(&mut *tx, &draft, seller.id).await?;

        // Com o item travado isto não falha; se falhar, o drop do tx desfaz o INSERT
        let debited = self
            .inventory_repo
            .debit_stock(&mut *tx, item.id, draft.quantity_sold)
            .await?;
        if !debited {
            return Err(AppError::InsufficientStock {
                available: item.quantity,
                requested: draft.quantity_sold,
            });
        }

        let detail = self
            .sales_repo
            .find_detail(&mut *tx, sale.id)
            .await?
            .ok_or(AppError::SaleNotFound(sale.id))?;

        tx.commit().await?;

        tracing::info!(
            sale_id = sale.id,
            item_id = item.id,
            user_id = seller.id,
            quantity = sale.quantity_sold,
            total = %sale.total_amount,
            "Venda registrada"
        );
        tracing::warn!(
            item_id = item.id,
            quantity = sale.quantity_sold,
            remaining = item.quantity - sale.quantity_sold,
            "Estoque debitado"
        );
        Ok(detail)
    }

    // --- DELETE SALE ---
    // Remove a venda e devolve exatamente `quantity_sold` ao item, tudo ou nada.
    pub async fn delete_sale(&self, actor: &User, id: i64) -> Result<Sale, AppError> {
        let mut tx = self.pool.begin().await?;

        let sale = self
            .sales_repo
            .delete_returning(&mut *tx, id)
            .await?
            .ok_or(AppError::SaleNotFound(id))?;

        let restored = self
            .inventory_repo
            .credit_stock(&mut *tx, sale.inventory_item_id, sale.quantity_sold)
            .await?;
        if !restored {
            return Err(AppError::ItemNotFound(sale.inventory_item_id));
        }

        tx.commit().await?;

        tracing::info!(sale_id = id, item_id = sale.inventory_item_id, user_id = actor.id, "Venda removida");
        tracing::warn!(
            item_id = sale.inventory_item_id,
            quantity = sale.quantity_sold,
            "Estoque creditado (estorno de venda)"
        );
        Ok(sale)
    }

    // --- BULK DELETE ---
    // IDs inexistentes são pulados e reportados; o resto é atômico.
    pub async fn bulk_delete_sales(&self, actor: &User, ids: &[i64]) -> Result<BulkDeleteResult, AppError> {
        if ids.is_empty() {
            return Err(AppError::InvalidInput("ids must not be empty".into()));
        }

        let mut requested = ids.to_vec();
        requested.sort_unstable();
        requested.dedup();

        let mut tx = self.pool.begin().await?;

        let found = self.sales_repo.lock_many(&mut *tx, &requested).await?;
        let skipped_ids: Vec<i64> = requested
            .iter()
            .copied()
            .filter(|id| found.binary_search(id).is_err())
            .collect();

        if found.is_empty() {
            tx.rollback().await?;
            tracing::info!(user_id = actor.id, skipped = skipped_ids.len(), "Nenhuma venda do lote encontrada");
            return Ok(BulkDeleteResult { deleted_count: 0, skipped_ids, errors: vec![] });
        }

        let deleted = self.sales_repo.delete_many_returning(&mut *tx, &found).await?;
        if deleted.len() != found.len() {
            tracing::warn!(
                expected = found.len(),
                affected = deleted.len(),
                "Exclusão em lote afetou um número de vendas diferente do esperado"
            );
        }

        // Um crédito por item, em ordem de ID (ordem fixa de locks entre lotes concorrentes)
        let mut per_item: BTreeMap<i64, i64> = BTreeMap::new();
        for sale in &deleted {
            *per_item.entry(sale.inventory_item_id).or_default() += i64::from(sale.quantity_sold);
        }

        let mut errors = Vec::new();
        for (item_id, quantity) in per_item {
            let quantity = i32::try_from(quantity)
                .map_err(|_| anyhow::anyhow!("Estorno do item {} excede o limite de estoque", item_id))?;
            let restored = self.inventory_repo.credit_stock(&mut *tx, item_id, quantity).await?;
            if restored {
                tracing::warn!(item_id, quantity, "Estoque creditado (estorno em lote)");
            } else {
                errors.push(format!("item {item_id} not found; {quantity} units not restored"));
            }
        }

        tx.commit().await?;

        tracing::info!(
            user_id = actor.id,
            deleted = deleted.len(),
            skipped = skipped_ids.len(),
            "Vendas removidas em lote"
        );
        Ok(BulkDeleteResult {
            deleted_count: deleted.len() as u64,
            skipped_ids,
            errors,
        })
    }

    // --- LEITURA ---
    pub async fn list_sales(&self, filter: &SaleFilter) -> Result<Vec<SaleDetail>, AppError> {
        let window = DateWindow::from_dates(filter.start_date, filter.end_date)?;
        let limit = clamp_limit(filter.limit, self.settings.default_limit, self.settings.max_limit);
        self.sales_repo.list(window, limit).await
    }

    pub async fn recent_sales(&self, limit: Option<i64>) -> Result<Vec<SaleDetail>, AppError> {
        let limit = clamp_limit(limit, RECENT_SALES_DEFAULT_LIMIT, self.settings.max_limit);
        self.sales_repo.recent(limit).await
    }

    pub async fn get_sale(&self, id: i64) -> Result<SaleDetail, AppError> {
        self.sales_repo
            .find_detail(&self.pool, id)
            .await?
            .ok_or(AppError::SaleNotFound(id))
    }
}
