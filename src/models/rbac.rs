// src/models/rbac.rs

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Papéis do sistema (enum `user_role` no banco)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Manager,
    User,
}

impl UserRole {
    /// Tabela única papel -> permissões padrão.
    pub fn default_permissions(self) -> Permissions {
        match self {
            UserRole::Admin => Permissions {
                can_view: true,
                can_add: true,
                can_edit: true,
                can_approve: true,
                can_delete: true,
                can_manage_users: true,
            },
            UserRole::Manager => Permissions {
                can_view: true,
                can_add: true,
                can_edit: true,
                can_approve: true,
                can_delete: false,
                can_manage_users: false,
            },
            UserRole::User => Permissions {
                can_view: true,
                can_add: true,
                can_edit: false,
                can_approve: false,
                can_delete: false,
                can_manage_users: false,
            },
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UserRole::Admin => "admin",
            UserRole::Manager => "manager",
            UserRole::User => "user",
        };
        f.write_str(s)
    }
}

/// Capacidades de um usuário. Guardado como JSONB na tabela `users`;
/// `NULL` significa "segue os padrões do papel".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Permissions {
    #[schema(example = true)]
    pub can_view: bool,
    #[schema(example = true)]
    pub can_add: bool,
    #[schema(example = false)]
    pub can_edit: bool,
    #[schema(example = false)]
    pub can_approve: bool,
    #[schema(example = false)]
    pub can_delete: bool,
    #[schema(example = false)]
    pub can_manage_users: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeRolePayload {
    #[schema(example = "manager")]
    pub role: UserRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_has_everything() {
        let p = UserRole::Admin.default_permissions();
        assert!(p.can_view && p.can_add && p.can_edit && p.can_approve && p.can_delete && p.can_manage_users);
    }

    #[test]
    fn manager_cannot_delete_or_manage_users() {
        let p = UserRole::Manager.default_permissions();
        assert!(p.can_view && p.can_add && p.can_edit && p.can_approve);
        assert!(!p.can_delete);
        assert!(!p.can_manage_users);
    }

    #[test]
    fn user_can_only_view_and_add() {
        let p = UserRole::User.default_permissions();
        assert!(p.can_view && p.can_add);
        assert!(!p.can_edit && !p.can_approve && !p.can_delete && !p.can_manage_users);
    }

    #[test]
    fn roles_use_lowercase_on_the_wire() {
        assert_eq!(serde_json::to_string(&UserRole::Manager).unwrap(), "\"manager\"");
        let role: UserRole = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, UserRole::Admin);
    }
}
