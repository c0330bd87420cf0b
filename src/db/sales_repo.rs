// src/db/sales_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::{
        sales::{Sale, SaleDetail, SaleDraft},
        stats::DateWindow,
    },
};

// Venda + produto + vendedor
const DETAIL_SELECT: &str = r#"
    SELECT s.*, i.product_name, i.brand, i.sku, u.username AS sold_by_name
    FROM sales s
    JOIN inventory_items i ON i.id = s.inventory_item_id
    JOIN users u ON u.id = s.sold_by
"#;

#[derive(Clone)]
pub struct SalesRepository {
    pool: PgPool,
}

impl SalesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Leitura
    // ---

    pub async fn find_detail<'e, E>(&self, executor: E, id: i64) -> Result<Option<SaleDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("{DETAIL_SELECT} WHERE s.id = $1");
        let sale = sqlx::query_as::<_, SaleDetail>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(sale)
    }

    /// Ordem cronológica estável (id crescente) dentro da janela `[from, to)`.
    pub async fn list(&self, window: DateWindow, limit: i64) -> Result<Vec<SaleDetail>, AppError> {
        let sql = format!(
            r#"{DETAIL_SELECT}
            WHERE ($1::timestamptz IS NULL OR s.created_at >= $1)
              AND ($2::timestamptz IS NULL OR s.created_at < $2)
            ORDER BY s.id ASC
            LIMIT $3"#
        );
        let sales = sqlx::query_as::<_, SaleDetail>(&sql)
            .bind(window.from)
            .bind(window.to)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(sales)
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<SaleDetail>, AppError> {
        let sql = format!("{DETAIL_SELECT} ORDER BY s.created_at DESC, s.id DESC LIMIT $1");
        let sales = sqlx::query_as::<_, SaleDetail>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(sales)
    }

    // ---
    // Escrita (sempre dentro da transação do serviço)
    // ---

    pub async fn insert<'e, E>(&self, executor: E, draft: &SaleDraft, sold_by: i64) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            INSERT INTO sales
                (inventory_item_id, quantity_sold, unit_price, total_amount,
                 sold_by, customer_name, payment_method, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(draft.inventory_item_id)
        .bind(draft.quantity_sold)
        .bind(draft.unit_price)
        .bind(draft.total_amount)
        .bind(sold_by)
        .bind(&draft.customer_name)
        .bind(&draft.payment_method)
        .bind(&draft.notes)
        .fetch_one(executor)
        .await?;
        Ok(sale)
    }

    /// Remove e devolve a venda apagada (para o estorno usar a quantidade exata).
    pub async fn delete_returning<'e, E>(&self, executor: E, id: i64) -> Result<Option<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>("DELETE FROM sales WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(sale)
    }

    /// Trava as vendas existentes do lote e devolve os IDs que resolveram.
    pub async fn lock_many<'e, E>(&self, executor: E, ids: &[i64]) -> Result<Vec<i64>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let found: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM sales WHERE id = ANY($1) ORDER BY id FOR UPDATE")
                .bind(ids)
                .fetch_all(executor)
                .await?;
        Ok(found)
    }

    /// Um único DELETE para o lote inteiro.
    pub async fn delete_many_returning<'e, E>(&self, executor: E, ids: &[i64]) -> Result<Vec<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let deleted = sqlx::query_as::<_, Sale>("DELETE FROM sales WHERE id = ANY($1) RETURNING *")
            .bind(ids)
            .fetch_all(executor)
            .await?;
        Ok(deleted)
    }
}
