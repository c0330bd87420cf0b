// src/config.rs

use std::{env, net::SocketAddr, str::FromStr, sync::Arc, time::Duration};

use anyhow::{bail, Context};
use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{InventoryRepository, SalesRepository, StatsRepository, UserRepository},
    models::{
        money::{to_cents, within_price_range, MAX_UNIT_PRICE},
        sales::PricePolicy,
    },
    services::{
        auth::{AuthService, JwtIdentityProvider},
        inventory_service::InventoryService,
        rbac_service::RbacService,
        sales_service::{SalesService, SalesSettings},
        stats_service::StatsService,
    },
};

/// Credenciais do admin criado na primeira subida
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub bind_addr: SocketAddr,
    pub db_max_connections: u32,
    pub default_unit_price: Decimal,
    pub require_sale_price: bool,
    pub sales_default_limit: i64,
    pub sales_max_limit: i64,
    pub cascade_role_defaults: bool,
    pub admin_seed: Option<AdminSeed>,
    pub cors_allow_origin: Option<String>,
}

// Lê uma variável opcional; valor presente mas inválido é erro de configuração
fn parse_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} inválida ('{}'): {}", name, raw, e)),
        _ => Ok(default),
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        if jwt_secret.trim().is_empty() {
            bail!("JWT_SECRET não pode ser vazio");
        }

        let config = Self {
            database_url,
            jwt_secret,
            jwt_ttl_hours: parse_or("JWT_TTL_HOURS", 168)?,
            bind_addr: parse_or("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 5)?,
            default_unit_price: parse_or("DEFAULT_UNIT_PRICE", Decimal::new(2999, 2))?,
            require_sale_price: parse_or("REQUIRE_SALE_PRICE", false)?,
            sales_default_limit: parse_or("SALES_DEFAULT_LIMIT", 50)?,
            sales_max_limit: parse_or("SALES_MAX_LIMIT", 10_000)?,
            cascade_role_defaults: parse_or("CASCADE_ROLE_DEFAULTS", true)?,
            admin_seed: optional("ADMIN_PASSWORD").map(|password| AdminSeed {
                username: optional("ADMIN_USERNAME").unwrap_or_else(|| "admin".to_string()),
                email: optional("ADMIN_EMAIL").unwrap_or_else(|| "admin@localhost".to_string()),
                password,
            }),
            cors_allow_origin: optional("CORS_ALLOW_ORIGIN"),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.jwt_ttl_hours <= 0 {
            bail!("JWT_TTL_HOURS deve ser positivo");
        }
        if self.db_max_connections == 0 {
            bail!("DB_MAX_CONNECTIONS deve ser positivo");
        }
        if self.default_unit_price <= Decimal::ZERO {
            bail!("DEFAULT_UNIT_PRICE deve ser maior que zero");
        }
        if !within_price_range(to_cents(self.default_unit_price)) {
            bail!("DEFAULT_UNIT_PRICE não pode passar de {}", MAX_UNIT_PRICE);
        }
        if self.sales_max_limit < 1 || self.sales_default_limit < 1 {
            bail!("SALES_DEFAULT_LIMIT e SALES_MAX_LIMIT devem ser positivos");
        }
        if self.sales_default_limit > self.sales_max_limit {
            bail!("SALES_DEFAULT_LIMIT não pode ser maior que SALES_MAX_LIMIT");
        }
        Ok(())
    }

    pub fn sales_settings(&self) -> SalesSettings {
        SalesSettings {
            price_policy: PricePolicy {
                default_unit_price: self.default_unit_price,
                require_price: self.require_sale_price,
            },
            default_limit: self.sales_default_limit,
            max_limit: self.sales_max_limit,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub i18n_store: Arc<I18nStore>,
    pub auth_service: AuthService,
    pub inventory_service: InventoryService,
    pub sales_service: SalesService,
    pub stats_service: StatsService,
    pub rbac_service: RbacService,
}

impl AppState {
    // A assinatura retorna um Result: falha de conexão não derruba com panic
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Self::from_pool(db_pool, config)
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_pool(db_pool: PgPool, config: Config) -> anyhow::Result<Self> {
        let i18n_store = Arc::new(I18nStore::load()?);

        let user_repo = UserRepository::new(db_pool.clone());
        let inventory_repo = InventoryRepository::new(db_pool.clone());
        let sales_repo = SalesRepository::new(db_pool.clone());

        let identity = Arc::new(JwtIdentityProvider::new(&config.jwt_secret, config.jwt_ttl_hours));
        let auth_service = AuthService::new(user_repo.clone(), identity, db_pool.clone());
        let inventory_service = InventoryService::new(inventory_repo.clone(), db_pool.clone());
        let sales_service =
            SalesService::new(sales_repo, inventory_repo, db_pool.clone(), config.sales_settings());
        let stats_service = StatsService::new(StatsRepository::new(), db_pool.clone());
        let rbac_service = RbacService::new(user_repo, db_pool.clone(), config.cascade_role_defaults);

        Ok(Self {
            db_pool,
            config: Arc::new(config),
            i18n_store,
            auth_service,
            inventory_service,
            sales_service,
            stats_service,
            rbac_service,
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn config() -> Config {
        Config {
            database_url: "postgres://localhost/pos_test".into(),
            jwt_secret: "segredo-de-teste".into(),
            jwt_ttl_hours: 1,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            db_max_connections: 1,
            default_unit_price: Decimal::new(2999, 2),
            require_sale_price: false,
            sales_default_limit: 50,
            sales_max_limit: 10_000,
            cascade_role_defaults: true,
            admin_seed: None,
            cors_allow_origin: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::config;

    #[test]
    fn default_limit_above_ceiling_is_rejected() {
        let mut c = config();
        c.sales_default_limit = 20_000;
        assert!(c.validate().is_err());
    }

    #[test]
    fn default_price_must_be_positive() {
        let mut c = config();
        c.default_unit_price = rust_decimal::Decimal::ZERO;
        assert!(c.validate().is_err());
        assert!(config().validate().is_ok());

        c.default_unit_price = rust_decimal::Decimal::new(1_000_000_000_000, 2);
        assert!(c.validate().is_err());
    }
}
