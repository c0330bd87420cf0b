// src/db/user_repo.rs

use sqlx::{types::Json, Executor, PgPool, Postgres};

use crate::{
    common::{db_utils::is_unique_violation, error::AppError},
    models::{
        auth::User,
        rbac::{Permissions, UserRole},
    },
};

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca um usuário pelo seu ID (leitura simples, usa a pool)
    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    // O login aceita tanto o username quanto o e-mail
    pub async fn find_by_login(&self, login: &str) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE username = $1 OR lower(email) = lower($1) LIMIT 1",
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_user)
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    pub async fn admin_exists(&self) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE role = 'admin')")
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    // Cria um novo usuário. Username/e-mail duplicados viram um erro de domínio.
    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        username: &str,
        email: &str,
        password_hash: &str,
        role: UserRole,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return AppError::UsernameOrEmailTaken;
            }
            e.into()
        })
    }

    // ---
    // Funções transacionais (mudança de papel / permissões)
    // ---

    /// Trava a linha do usuário até o fim da transação.
    pub async fn lock_by_id<'e, E>(&self, executor: E, id: i64) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(user)
    }

    /// Trava, em ordem de ID, todos os admins e quem tem `can_manage_users` por override.
    /// Toda escrita de papel/permissão começa por aqui, então elas se serializam sem deadlock.
    pub async fn lock_privileged<'e, E>(&self, executor: E) -> Result<Vec<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE role = 'admin' OR (permissions->>'can_manage_users')::boolean IS TRUE
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .fetch_all(executor)
        .await?;
        Ok(users)
    }

    pub async fn update_role<'e, E>(&self, executor: E, id: i64, role: UserRole) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            "UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(role)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::UserNotFound)
    }

    /// `None` limpa o override e o usuário volta a seguir os padrões do papel.
    pub async fn set_permissions<'e, E>(
        &self,
        executor: E,
        id: i64,
        permissions: Option<Permissions>,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            "UPDATE users SET permissions = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(permissions.map(Json))
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::UserNotFound)
    }
}
