// tests/common/mod.rs

#![allow(dead_code)]

use std::net::SocketAddr;

use rust_decimal::Decimal;
use sqlx::PgPool;

use pos_backend::{
    config::{AppState, Config},
    db::UserRepository,
    models::{
        auth::User,
        inventory::{CreateItemPayload, InventoryItemView},
        rbac::UserRole,
        sales::CreateSalePayload,
    },
};

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

pub fn app_state(pool: PgPool) -> AppState {
    AppState::from_pool(pool, config()).expect("estado da aplicação")
}

/// Usuário direto no banco (sem bcrypt, os testes não fazem login com senha).
pub async fn user(pool: &PgPool, username: &str, role: UserRole) -> User {
    UserRepository::new(pool.clone())
        .create_user(pool, username, &format!("{username}@loja.test"), "sem-senha", role)
        .await
        .expect("usuário de teste")
}

pub fn item_payload(name: &str, quantity: i32, unit_price: Option<Decimal>) -> CreateItemPayload {
    CreateItemPayload {
        product_name: name.into(),
        quantity,
        unit_price,
        category: None,
        brand: Some("Cloud".into()),
        sku: None,
        description: None,
    }
}

pub async fn approved_item(state: &AppState, admin: &User, quantity: i32, unit_price: Option<Decimal>) -> i64 {
    let created: InventoryItemView = state
        .inventory_service
        .create_item(admin, &item_payload("Mint Ice", quantity, unit_price))
        .await
        .expect("item de teste");
    state
        .inventory_service
        .approve_item(admin, created.item.id)
        .await
        .expect("aprovação");
    created.item.id
}

pub fn sale(item_id: i64, quantity_sold: i32, unit_price: Option<Decimal>) -> CreateSalePayload {
    CreateSalePayload {
        inventory_item_id: item_id,
        quantity_sold,
        unit_price,
        customer_name: None,
        payment_method: Some("cash".into()),
        notes: None,
    }
}

pub async fn stock(pool: &PgPool, item_id: i64) -> i32 {
    sqlx::query_scalar("SELECT quantity FROM inventory_items WHERE id = $1")
        .bind(item_id)
        .fetch_one(pool)
        .await
        .expect("estoque do item")
}
