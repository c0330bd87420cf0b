// src/services/stats_service.rs

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::StatsRepository,
    models::stats::{DateWindow, SalesStats, StatsQuery},
};

const TOP_PRODUCTS_LIMIT: i64 = 10;

#[derive(Clone)]
pub struct StatsService {
    stats_repo: StatsRepository,
    pool: PgPool,
}

impl StatsService {
    pub fn new(stats_repo: StatsRepository, pool: PgPool) -> Self {
        Self { stats_repo, pool }
    }

    pub async fn compute(&self, query: &StatsQuery, now: DateTime<Utc>) -> Result<SalesStats, AppError> {
        let window = DateWindow::resolve(query, now)?;

        // Totais e ranking lidos do mesmo snapshot
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let totals = self.stats_repo.totals(&mut *tx, window).await?;
        let top_products = self
            .stats_repo
            .top_products(&mut *tx, window, TOP_PRODUCTS_LIMIT)
            .await?;
        tx.commit().await?;

        Ok(SalesStats::from_parts(totals, top_products))
    }
}
