// src/services/auth.rs

use std::sync::Arc;

use async_trait::async_trait;
use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::{
        auth::{AuthResponse, Claims, RegisterUserPayload, User, UserProfile},
        rbac::UserRole,
    },
};

/// Quem emite e confere as credenciais. O guard de autenticação só conhece esta
/// interface; trocar JWT por outro provedor não mexe nos handlers.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn issue(&self, user: &User) -> Result<String, AppError>;

    /// Devolve o ID do usuário dono do token.
    async fn verify(&self, token: &str) -> Result<i64, AppError>;
}

pub struct JwtIdentityProvider {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl JwtIdentityProvider {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    fn issue(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + self.ttl;

        let claims = Claims {
            sub: user.id.to_string(),
            role: user.role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    async fn verify(&self, token: &str) -> Result<i64, AppError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|_| AppError::InvalidToken)?;

        token_data.claims.sub.parse().map_err(|_| AppError::InvalidToken)
    }
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    identity: Arc<dyn IdentityProvider>,
    pool: PgPool,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, identity: Arc<dyn IdentityProvider>, pool: PgPool) -> Self {
        Self { user_repo, identity, pool }
    }

    pub async fn register_user(&self, payload: &RegisterUserPayload) -> Result<AuthResponse, AppError> {
        let hashed_password = hash_password(&payload.password).await?;

        let mut tx = self.pool.begin().await?;
        let user = self
            .user_repo
            .create_user(
                &mut *tx,
                payload.username.trim(),
                payload.email.trim(),
                &hashed_password,
                UserRole::User,
            )
            .await?;
        tx.commit().await?;

        tracing::info!(user_id = user.id, username = %user.username, "Usuário registrado");
        self.respond_with_token(&user)
    }

    pub async fn login_user(&self, login: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_login(login.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        // Contas autenticadas externamente não têm senha local
        let Some(password_hash) = user.password_hash.clone() else {
            return Err(AppError::InvalidCredentials);
        };

        let password_clone = password.to_owned();
        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!(user_id = user.id, "Login efetuado");
        self.respond_with_token(&user)
    }

    /// Token -> usuário atual. Papel e permissões vêm sempre do banco.
    pub async fn authenticate(&self, token: &str) -> Result<User, AppError> {
        let user_id = self.identity.verify(token).await?;
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::InvalidToken)
    }

    /// Cria o admin inicial se ainda não existe nenhum. Devolve `None` quando não havia o que fazer.
    pub async fn seed_admin(&self, username: &str, email: &str, password: &str) -> Result<Option<User>, AppError> {
        if self.user_repo.admin_exists().await? {
            return Ok(None);
        }

        let hashed_password = hash_password(password).await?;
        let mut tx = self.pool.begin().await?;
        let admin = self
            .user_repo
            .create_user(&mut *tx, username, email, &hashed_password, UserRole::Admin)
            .await?;
        tx.commit().await?;

        tracing::info!(user_id = admin.id, username = %admin.username, "Administrador inicial criado");
        Ok(Some(admin))
    }

    fn respond_with_token(&self, user: &User) -> Result<AuthResponse, AppError> {
        Ok(AuthResponse {
            token: self.identity.issue(user)?,
            user: UserProfile::from(user),
        })
    }
}

// bcrypt é caro: roda fora do runtime async
async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::fixtures::user;

    #[tokio::test]
    async fn issued_tokens_verify_to_the_same_user() {
        let provider = JwtIdentityProvider::new("segredo-de-teste", 1);
        let token = provider.issue(&user(42, UserRole::Manager)).unwrap();
        assert_eq!(provider.verify(&token).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn tokens_from_another_secret_are_rejected() {
        let issuer = JwtIdentityProvider::new("um", 1);
        let verifier = JwtIdentityProvider::new("outro", 1);
        let token = issuer.issue(&user(1, UserRole::Admin)).unwrap();
        assert!(matches!(verifier.verify(&token).await, Err(AppError::InvalidToken)));
        assert!(matches!(verifier.verify("lixo").await, Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn expired_tokens_are_rejected() {
        let provider = JwtIdentityProvider::new("segredo", -2);
        let token = provider.issue(&user(1, UserRole::User)).unwrap();
        assert!(matches!(provider.verify(&token).await, Err(AppError::InvalidToken)));
    }
}
