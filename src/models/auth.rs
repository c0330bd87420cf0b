// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::rbac::{Permissions, UserRole};

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub password_hash: Option<String>,

    #[serde(skip_serializing)]
    pub firebase_uid: Option<String>,

    pub role: UserRole,

    // Override explícito; None = padrões do papel
    #[serde(skip_serializing)]
    pub permissions: Option<Json<Permissions>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn effective_permissions(&self) -> Permissions {
        match &self.permissions {
            Some(Json(custom)) => *custom,
            None => self.role.default_permissions(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

// O que o frontend recebe sobre um usuário
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserProfile {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "maria")]
    pub username: String,
    #[schema(example = "maria@loja.com")]
    pub email: String,
    pub role: UserRole,
    pub permissions: Permissions,
    /// true quando as permissões foram definidas manualmente por um admin
    pub custom_permissions: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            permissions: user.effective_permissions(),
            custom_permissions: user.permissions.is_some(),
            created_at: user.created_at,
        }
    }
}

// Dados para registro de um novo usuário
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUserPayload {
    #[validate(length(min = 3, max = 50, message = "O nome de usuário deve ter entre 3 e 50 caracteres."))]
    #[schema(example = "maria")]
    pub username: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[schema(example = "maria@loja.com")]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

// Dados para login (username aceita também o e-mail)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(length(min = 1, message = "Informe o usuário ou e-mail."))]
    #[schema(example = "maria")]
    pub username: String,
    #[validate(length(min = 1, message = "Informe a senha."))]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,    // ID do usuário (string, como manda o RFC 7519)
    pub role: UserRole, // Apenas informativo: o papel vigente é relido do banco
    pub exp: usize,
    pub iat: usize,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn user(id: i64, role: UserRole) -> User {
        User {
            id,
            username: format!("user{}", id),
            email: format!("user{}@loja.com", id),
            password_hash: None,
            firebase_uid: None,
            role,
            permissions: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::user;
    use super::*;

    #[test]
    fn role_defaults_apply_until_overridden() {
        let mut manager = user(2, UserRole::Manager);
        assert_eq!(manager.effective_permissions(), UserRole::Manager.default_permissions());

        let custom = Permissions { can_delete: true, ..UserRole::Manager.default_permissions() };
        manager.permissions = Some(Json(custom));
        assert!(manager.effective_permissions().can_delete);

        let profile = UserProfile::from(&manager);
        assert!(profile.custom_permissions);
        assert!(profile.permissions.can_delete);
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let mut u = user(1, UserRole::Admin);
        u.password_hash = Some("$2b$12$segredo".into());
        let json = serde_json::to_string(&u).unwrap();
        assert!(!json.contains("segredo"));
        assert!(!json.contains("password_hash"));
    }
}
