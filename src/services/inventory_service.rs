// src/services/inventory_service.rs

use chrono::Utc;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{inventory_repo::NewItem, InventoryRepository},
    models::{
        auth::User,
        inventory::{
            non_empty, normalize_item_price, CreateItemPayload, InventoryItemView, ItemFilter, ItemStatus,
            UpdateItemPayload,
        },
    },
};

#[derive(Clone)]
pub struct InventoryService {
    inventory_repo: InventoryRepository,
    pool: PgPool,
}

impl InventoryService {
    pub fn new(inventory_repo: InventoryRepository, pool: PgPool) -> Self {
        Self { inventory_repo, pool }
    }

    // --- LIST ---
    pub async fn list_items(&self, viewer: &User, filter: &ItemFilter) -> Result<Vec<InventoryItemView>, AppError> {
        let see_all = viewer.effective_permissions().can_approve;
        self.inventory_repo
            .list(viewer.id, see_all, filter.status, filter.search.as_deref())
            .await
    }

    /// Fila de aprovação (quem chama já passou pelo gate `can_approve`).
    pub async fn list_pending(&self, viewer: &User) -> Result<Vec<InventoryItemView>, AppError> {
        self.inventory_repo
            .list(viewer.id, true, Some(ItemStatus::Pending), None)
            .await
    }

    pub async fn get_item(&self, viewer: &User, id: i64) -> Result<InventoryItemView, AppError> {
        let view = self
            .inventory_repo
            .find_view(&self.pool, id)
            .await?
            .ok_or(AppError::ItemNotFound(id))?;

        if !view.item.is_visible_to(viewer) {
            return Err(AppError::PermissionDenied("can_approve"));
        }
        Ok(view)
    }

    // --- CREATE ITEM ---
    pub async fn create_item(&self, creator: &User, payload: &CreateItemPayload) -> Result<InventoryItemView, AppError> {
        let new_item = NewItem {
            product_name: non_empty(&payload.product_name)
                .ok_or_else(|| AppError::InvalidInput("product_name must not be blank".into()))?,
            category: payload.category.as_deref().and_then(non_empty),
            brand: payload.brand.as_deref().and_then(non_empty),
            sku: payload.sku.as_deref().and_then(non_empty),
            description: payload.description.as_deref().and_then(non_empty),
            quantity: payload.quantity,
            unit_price: payload.unit_price.map(normalize_item_price).transpose()?,
        };

        let mut tx = self.pool.begin().await?;
        let item = self.inventory_repo.insert(&mut *tx, &new_item, creator.id).await?;
        let view = self
            .inventory_repo
            .find_view(&mut *tx, item.id)
            .await?
            .ok_or(AppError::ItemNotFound(item.id))?;
        tx.commit().await?;

        tracing::info!(item_id = item.id, user_id = creator.id, quantity = item.quantity, "Item cadastrado (pendente)");
        Ok(view)
    }

    // --- UPDATE ITEM ---
    pub async fn update_item(
        &self,
        editor: &User,
        id: i64,
        changes: &UpdateItemPayload,
    ) -> Result<InventoryItemView, AppError> {
        let can_edit = editor.effective_permissions().can_edit;

        let mut tx = self.pool.begin().await?;
        let current = self
            .inventory_repo
            .lock_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::ItemNotFound(id))?;

        current.ensure_modifiable_by(editor, can_edit)?;
        let previous_quantity = current.quantity;
        let edited = current.apply_changes(changes, editor.id, can_edit, Utc::now())?;

        let saved = self.inventory_repo.save(&mut *tx, &edited).await?;
        let view = self
            .inventory_repo
            .find_view(&mut *tx, id)
            .await?
            .ok_or(AppError::ItemNotFound(id))?;
        tx.commit().await?;

        if saved.quantity != previous_quantity {
            tracing::warn!(
                item_id = id,
                user_id = editor.id,
                from = previous_quantity,
                to = saved.quantity,
                "Estoque ajustado manualmente"
            );
        }
        tracing::info!(item_id = id, user_id = editor.id, status = %saved.status, "Item atualizado");
        Ok(view)
    }

    // --- APPROVE / REJECT ---
    pub async fn approve_item(&self, approver: &User, id: i64) -> Result<InventoryItemView, AppError> {
        let mut tx = self.pool.begin().await?;
        let current = self
            .inventory_repo
            .lock_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::ItemNotFound(id))?;

        let already_approved = current.status == ItemStatus::Approved;
        let approved = current.approve(approver.id, Utc::now())?;
        if !already_approved {
            self.inventory_repo.save(&mut *tx, &approved).await?;
        }

        let view = self
            .inventory_repo
            .find_view(&mut *tx, id)
            .await?
            .ok_or(AppError::ItemNotFound(id))?;
        tx.commit().await?;

        tracing::info!(item_id = id, user_id = approver.id, already_approved, "Item aprovado");
        Ok(view)
    }

    pub async fn reject_item(&self, rejecter: &User, id: i64) -> Result<InventoryItemView, AppError> {
        let mut tx = self.pool.begin().await?;
        let current = self
            .inventory_repo
            .lock_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::ItemNotFound(id))?;

        if current.status != ItemStatus::Rejected {
            self.inventory_repo.save(&mut *tx, &current.reject()).await?;
        }

        let view = self
            .inventory_repo
            .find_view(&mut *tx, id)
            .await?
            .ok_or(AppError::ItemNotFound(id))?;
        tx.commit().await?;

        tracing::info!(item_id = id, user_id = rejecter.id, "Item rejeitado");
        Ok(view)
    }

    // --- DELETE ---
    pub async fn delete_item(&self, actor: &User, id: i64) -> Result<(), AppError> {
        let can_delete = actor.effective_permissions().can_delete;

        let mut tx = self.pool.begin().await?;
        let current = self
            .inventory_repo
            .lock_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::ItemNotFound(id))?;

        current.ensure_modifiable_by(actor, can_delete)?;
        self.inventory_repo.delete(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!(item_id = id, user_id = actor.id, "Item removido");
        Ok(())
    }
}
