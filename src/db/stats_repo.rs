// src/db/stats_repo.rs

use sqlx::{Executor, Postgres};

use crate::{
    common::error::AppError,
    models::stats::{DateWindow, SalesTotals, TopProduct},
};

// Agregações somente leitura sobre `sales`
#[derive(Clone, Default)]
pub struct StatsRepository;

impl StatsRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn totals<'e, E>(&self, executor: E, window: DateWindow) -> Result<SalesTotals, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let totals = sqlx::query_as::<_, SalesTotals>(
            r#"
            SELECT
                COUNT(*)::BIGINT                            AS total_sales,
                COALESCE(SUM(quantity_sold), 0)::BIGINT     AS total_items_sold,
                COALESCE(SUM(total_amount), 0)::NUMERIC     AS total_revenue,
                COALESCE(MAX(total_amount), 0)::NUMERIC     AS largest_sale,
                COALESCE(MIN(total_amount), 0)::NUMERIC     AS smallest_sale
            FROM sales
            WHERE ($1::timestamptz IS NULL OR created_at >= $1)
              AND ($2::timestamptz IS NULL OR created_at < $2)
            "#,
        )
        .bind(window.from)
        .bind(window.to)
        .fetch_one(executor)
        .await?;
        Ok(totals)
    }

    pub async fn top_products<'e, E>(
        &self,
        executor: E,
        window: DateWindow,
        limit: i64,
    ) -> Result<Vec<TopProduct>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let top = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT
                s.inventory_item_id,
                i.product_name,
                i.brand,
                SUM(s.quantity_sold)::BIGINT AS total_quantity,
                SUM(s.total_amount)::NUMERIC AS total_revenue,
                COUNT(*)::BIGINT             AS sale_count
            FROM sales s
            JOIN inventory_items i ON i.id = s.inventory_item_id
            WHERE ($1::timestamptz IS NULL OR s.created_at >= $1)
              AND ($2::timestamptz IS NULL OR s.created_at < $2)
            GROUP BY s.inventory_item_id, i.product_name, i.brand
            ORDER BY total_quantity DESC, s.inventory_item_id ASC
            LIMIT $3
            "#,
        )
        .bind(window.from)
        .bind(window.to)
        .bind(limit)
        .fetch_all(executor)
        .await?;
        Ok(top)
    }
}
