// src/db/inventory_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::{
        db_utils::{is_foreign_key_violation, like_pattern},
        error::AppError,
    },
    models::inventory::{InventoryItem, InventoryItemView, ItemStatus},
};

// Item + nome de quem cadastrou/aprovou
const VIEW_SELECT: &str = r#"
    SELECT i.*, cu.username AS created_by_name, au.username AS approved_by_name
    FROM inventory_items i
    LEFT JOIN users cu ON cu.id = i.created_by
    LEFT JOIN users au ON au.id = i.approved_by
"#;

/// Campos de um item novo, já normalizados pelo serviço.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub product_name: String,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
}

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Leitura
    // ---

    /// Lista respeitando a visibilidade: com `see_all` tudo aparece; sem ela só os
    /// aprovados e os pendentes do próprio `viewer_id`.
    pub async fn list(
        &self,
        viewer_id: i64,
        see_all: bool,
        status: Option<ItemStatus>,
        search: Option<&str>,
    ) -> Result<Vec<InventoryItemView>, AppError> {
        let pattern = search.map(str::trim).filter(|s| !s.is_empty()).map(like_pattern);
        let sql = format!(
            r#"{VIEW_SELECT}
            WHERE ($1 OR i.status = 'approved' OR (i.status = 'pending' AND i.created_by = $2))
              AND ($3::item_status IS NULL OR i.status = $3)
              AND ($4::text IS NULL
                   OR i.product_name ILIKE $4 OR i.brand ILIKE $4 OR i.sku ILIKE $4)
            ORDER BY i.created_at DESC, i.id DESC"#
        );

        let items = sqlx::query_as::<_, InventoryItemView>(&sql)
            .bind(see_all)
            .bind(viewer_id)
            .bind(status)
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    pub async fn find_view<'e, E>(&self, executor: E, id: i64) -> Result<Option<InventoryItemView>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("{VIEW_SELECT} WHERE i.id = $1");
        let item = sqlx::query_as::<_, InventoryItemView>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(item)
    }

    // ---
    // Escrita (transacional)
    // ---

    /// Trava o item até o fim da transação; toda alteração de estoque passa por aqui.
    pub async fn lock_by_id<'e, E>(&self, executor: E, id: i64) -> Result<Option<InventoryItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, InventoryItem>("SELECT * FROM inventory_items WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(item)
    }

    /// Todo item nasce pendente, independente do papel de quem cadastra.
    pub async fn insert<'e, E>(&self, executor: E, item: &NewItem, created_by: i64) -> Result<InventoryItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let created = sqlx::query_as::<_, InventoryItem>(
            r#"
            INSERT INTO inventory_items
                (product_name, category, brand, sku, description, quantity, unit_price, status, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', $8)
            RETURNING *
            "#,
        )
        .bind(&item.product_name)
        .bind(&item.category)
        .bind(&item.brand)
        .bind(&item.sku)
        .bind(&item.description)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(created_by)
        .fetch_one(executor)
        .await?;
        Ok(created)
    }

    /// Grava o estado calculado por `InventoryItem::apply_changes`/`approve`/`reject`.
    pub async fn save<'e, E>(&self, executor: E, item: &InventoryItem) -> Result<InventoryItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, InventoryItem>(
            r#"
            UPDATE inventory_items
            SET product_name = $2, category = $3, brand = $4, sku = $5, description = $6,
                quantity = $7, unit_price = $8, status = $9,
                approved_by = $10, approved_at = $11, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(item.id)
        .bind(&item.product_name)
        .bind(&item.category)
        .bind(&item.brand)
        .bind(&item.sku)
        .bind(&item.description)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.status)
        .bind(item.approved_by)
        .bind(item.approved_at)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::ItemNotFound(item.id))
    }

    /// Itens referenciados por vendas não podem sumir (FK RESTRICT).
    pub async fn delete<'e, E>(&self, executor: E, id: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM inventory_items WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    return AppError::ItemHasSales(id);
                }
                e.into()
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::ItemNotFound(id));
        }
        Ok(())
    }

    /// Débito de estoque. A condição `quantity >= $2` é a última barreira contra
    /// estoque negativo; devolve `false` se nenhuma linha foi afetada.
    pub async fn debit_stock<'e, E>(&self, executor: E, id: i64, quantity: i32) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE inventory_items
            SET quantity = quantity - $2, updated_at = NOW()
            WHERE id = $1 AND quantity >= $2
            "#,
        )
        .bind(id)
        .bind(quantity)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Crédito de estoque (estorno de venda). `+=` comuta, então estornos concorrentes não se perdem.
    pub async fn credit_stock<'e, E>(&self, executor: E, id: i64, quantity: i32) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE inventory_items
            SET quantity = quantity + $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(quantity)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
