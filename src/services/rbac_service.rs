// src/services/rbac_service.rs

use sqlx::{types::Json, Acquire, PgPool}; // Acquire é necessário para abrir o savepoint

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::{
        auth::{User, UserProfile},
        rbac::{Permissions, UserRole},
    },
};

/// Admin mudando para um papel que não é admin.
fn demotes_admin(target: &User, new_role: UserRole) -> bool {
    target.is_admin() && new_role != UserRole::Admin
}

/// Um admin não rebaixa a si mesmo. Checado antes da regra do último admin.
pub fn ensure_not_self_demotion(actor_id: i64, target: &User, new_role: UserRole) -> Result<(), AppError> {
    if actor_id == target.id && demotes_admin(target, new_role) {
        return Err(AppError::SelfDemotion);
    }
    Ok(())
}

/// `admin_count` inclui o próprio alvo.
pub fn ensure_admin_remains(target: &User, new_role: UserRole, admin_count: usize) -> Result<(), AppError> {
    if demotes_admin(target, new_role) && admin_count <= 1 {
        return Err(AppError::LastAdmin);
    }
    Ok(())
}

/// A troca de permissões tira `can_manage_users` de quem tinha.
fn revokes_user_management(target: &User, next: &Permissions) -> bool {
    target.effective_permissions().can_manage_users && !next.can_manage_users
}

/// Ninguém retira a própria gestão de usuários, e sempre sobra alguém com ela.
/// `manager_count` inclui o próprio alvo.
pub fn ensure_user_management_kept(
    actor_id: i64,
    target: &User,
    next: &Permissions,
    manager_count: usize,
) -> Result<(), AppError> {
    if !revokes_user_management(target, next) {
        return Ok(());
    }
    if actor_id == target.id {
        return Err(AppError::SelfRevocation);
    }
    if manager_count <= 1 {
        return Err(AppError::LastUserManager);
    }
    Ok(())
}

fn count_managers(privileged: &[User]) -> usize {
    privileged.iter().filter(|u| u.effective_permissions().can_manage_users).count()
}

#[derive(Clone)]
pub struct RbacService {
    repo: UserRepository,
    pool: PgPool,
    cascade_role_defaults: bool,
}

impl RbacService {
    pub fn new(repo: UserRepository, pool: PgPool, cascade_role_defaults: bool) -> Self {
        Self { repo, pool, cascade_role_defaults }
    }

    pub async fn list_users(&self) -> Result<Vec<UserProfile>, AppError> {
        let users = self.repo.list().await?;
        Ok(users.iter().map(UserProfile::from).collect())
    }

    pub async fn change_role(&self, actor: &User, target_id: i64, new_role: UserRole) -> Result<UserProfile, AppError> {
        // 1. Inicia Transação
        let mut tx = self.pool.begin().await?;

        // 2. Trava os privilegiados (ordem fixa), depois o alvo
        let privileged = self.repo.lock_privileged(&mut *tx).await?;
        let target = self
            .repo
            .lock_by_id(&mut *tx, target_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        // Guardas na ordem: auto-rebaixamento, último admin, gestão de usuários
        ensure_not_self_demotion(actor.id, &target, new_role)?;
        let admin_count = privileged.iter().filter(|u| u.is_admin()).count();
        ensure_admin_remains(&target, new_role, admin_count)?;

        let next = match (&target.permissions, self.cascade_role_defaults) {
            (Some(Json(custom)), false) => *custom,
            _ => new_role.default_permissions(),
        };
        ensure_user_management_kept(actor.id, &target, &next, count_managers(&privileged))?;

        // 3. Troca o papel
        let mut updated = self.repo.update_role(&mut *tx, target_id, new_role).await?;

        // 4. Reaplica os padrões do papel num savepoint; falha aqui não desfaz a troca de papel
        if self.cascade_role_defaults {
            let mut savepoint = (&mut *tx).begin().await?;
            match self.repo.set_permissions(&mut *savepoint, target_id, None).await {
                Ok(user) => {
                    savepoint.commit().await?;
                    updated = user;
                }
                Err(e) => {
                    tracing::warn!(
                        user_id = target_id,
                        role = %new_role,
                        error = %e,
                        "Falha ao reaplicar permissões padrão; permissões customizadas mantidas"
                    );
                    savepoint.rollback().await?;
                }
            }
        }

        // 5. Commit
        tx.commit().await?;

        tracing::info!(user_id = target_id, actor_id = actor.id, from = %target.role, to = %new_role, "Papel alterado");
        Ok(UserProfile::from(&updated))
    }

    /// Override explícito: passa a valer no lugar dos padrões do papel.
    pub async fn set_permissions(
        &self,
        actor: &User,
        target_id: i64,
        permissions: Permissions,
    ) -> Result<UserProfile, AppError> {
        let mut tx = self.pool.begin().await?;
        self.lock_and_check(&mut tx, actor, target_id, |_| permissions).await?;
        let user = self.repo.set_permissions(&mut *tx, target_id, Some(permissions)).await?;
        tx.commit().await?;

        tracing::info!(user_id = target_id, actor_id = actor.id, ?permissions, "Permissões customizadas");
        Ok(UserProfile::from(&user))
    }

    /// Descarta o override; o usuário volta a seguir os padrões do papel.
    pub async fn reset_permissions(&self, actor: &User, target_id: i64) -> Result<UserProfile, AppError> {
        let mut tx = self.pool.begin().await?;
        self.lock_and_check(&mut tx, actor, target_id, |target| target.role.default_permissions())
            .await?;
        let user = self.repo.set_permissions(&mut *tx, target_id, None).await?;
        tx.commit().await?;

        tracing::info!(user_id = target_id, actor_id = actor.id, role = %user.role, "Permissões redefinidas");
        Ok(UserProfile::from(&user))
    }

    // Mesma ordem de locks do change_role; `next` recebe o alvo já travado
    async fn lock_and_check(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        actor: &User,
        target_id: i64,
        next: impl FnOnce(&User) -> Permissions,
    ) -> Result<(), AppError> {
        let privileged = self.repo.lock_privileged(&mut **tx).await?;
        let target = self
            .repo
            .lock_by_id(&mut **tx, target_id)
            .await?
            .ok_or(AppError::UserNotFound)?;
        ensure_user_management_kept(actor.id, &target, &next(&target), count_managers(&privileged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::fixtures::user;

    #[test]
    fn admin_cannot_demote_self() {
        let admin = user(1, UserRole::Admin);
        assert!(matches!(
            ensure_not_self_demotion(1, &admin, UserRole::Manager),
            Err(AppError::SelfDemotion)
        ));
        // Reafirmar o próprio papel não é rebaixamento
        assert!(ensure_not_self_demotion(1, &admin, UserRole::Admin).is_ok());
        assert!(ensure_not_self_demotion(2, &admin, UserRole::User).is_ok());
    }

    #[test]
    fn last_admin_cannot_be_demoted() {
        let admin = user(1, UserRole::Admin);
        assert!(matches!(ensure_admin_remains(&admin, UserRole::User, 1), Err(AppError::LastAdmin)));
        assert!(ensure_admin_remains(&admin, UserRole::User, 2).is_ok());
    }

    #[test]
    fn user_management_cannot_be_self_revoked() {
        let admin = user(1, UserRole::Admin);
        let stripped = Permissions { can_manage_users: false, ..UserRole::Admin.default_permissions() };
        assert!(matches!(
            ensure_user_management_kept(1, &admin, &stripped, 5),
            Err(AppError::SelfRevocation)
        ));
        assert!(ensure_user_management_kept(1, &admin, &UserRole::Admin.default_permissions(), 1).is_ok());
    }

    #[test]
    fn last_user_manager_keeps_the_permission() {
        let admin = user(1, UserRole::Admin);
        let stripped = Permissions { can_manage_users: false, ..UserRole::Admin.default_permissions() };
        assert!(matches!(
            ensure_user_management_kept(2, &admin, &stripped, 1),
            Err(AppError::LastUserManager)
        ));
        assert!(ensure_user_management_kept(2, &admin, &stripped, 2).is_ok());

        // Quem nunca teve a permissão não conta
        let clerk = user(3, UserRole::User);
        assert!(ensure_user_management_kept(2, &clerk, &UserRole::User.default_permissions(), 0).is_ok());
    }

    #[test]
    fn non_admin_changes_skip_the_admin_count() {
        let manager = user(3, UserRole::Manager);
        assert!(ensure_admin_remains(&manager, UserRole::User, 0).is_ok());
        assert!(ensure_admin_remains(&manager, UserRole::Admin, 0).is_ok());
    }
}
