// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::rbac::Permissions,
};

/// 1. O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    fn slug() -> &'static str;
    fn granted(permissions: &Permissions) -> bool;
}

/// 2. O Extractor (Guardião). Roda depois do `auth_guard`, que já deixou o usuário
/// (com papel e permissões atuais) nos extensions.
pub struct RequirePermission<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let Ok(locale) = Locale::from_request_parts(parts, state).await;

        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;

        if !T::granted(&user.effective_permissions()) {
            tracing::debug!(user_id = user.id, permission = T::slug(), "Permissão negada");
            return Err(AppError::PermissionDenied(T::slug()).to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

pub struct PermView;
impl PermissionDef for PermView {
    fn slug() -> &'static str { "can_view" }
    fn granted(p: &Permissions) -> bool { p.can_view }
}

pub struct PermAdd;
impl PermissionDef for PermAdd {
    fn slug() -> &'static str { "can_add" }
    fn granted(p: &Permissions) -> bool { p.can_add }
}

pub struct PermApprove;
impl PermissionDef for PermApprove {
    fn slug() -> &'static str { "can_approve" }
    fn granted(p: &Permissions) -> bool { p.can_approve }
}

pub struct PermDelete;
impl PermissionDef for PermDelete {
    fn slug() -> &'static str { "can_delete" }
    fn granted(p: &Permissions) -> bool { p.can_delete }
}

pub struct PermManageUsers;
impl PermissionDef for PermManageUsers {
    fn slug() -> &'static str { "can_manage_users" }
    fn granted(p: &Permissions) -> bool { p.can_manage_users }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rbac::UserRole;

    #[test]
    fn default_roles_reproduce_admin_only_gates() {
        let user = UserRole::User.default_permissions();
        let manager = UserRole::Manager.default_permissions();
        let admin = UserRole::Admin.default_permissions();

        assert!(PermView::granted(&user) && PermAdd::granted(&user));
        assert!(!PermApprove::granted(&user));

        assert!(PermApprove::granted(&manager));
        assert!(!PermDelete::granted(&manager));
        assert!(!PermManageUsers::granted(&manager));

        assert!(PermDelete::granted(&admin) && PermManageUsers::granted(&admin));
    }
}
