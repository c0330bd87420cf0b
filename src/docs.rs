// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::users::list_users,
        handlers::users::change_role,
        handlers::users::set_permissions,
        handlers::users::reset_permissions,

        // --- INVENTORY ---
        handlers::inventory::list_items,
        handlers::inventory::list_pending,
        handlers::inventory::get_item,
        handlers::inventory::create_item,
        handlers::inventory::update_item,
        handlers::inventory::approve_item,
        handlers::inventory::reject_item,
        handlers::inventory::delete_item,

        // --- SALES ---
        handlers::sales::create_sale,
        handlers::sales::list_sales,
        handlers::sales::recent_sales,
        handlers::sales::sales_stats,
        handlers::sales::get_sale,
        handlers::sales::delete_sale,
        handlers::sales::bulk_delete_sales,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserProfile,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- RBAC ---
            models::rbac::UserRole,
            models::rbac::Permissions,
            models::rbac::ChangeRolePayload,

            // --- Inventory ---
            models::inventory::ItemStatus,
            models::inventory::InventoryItem,
            models::inventory::InventoryItemView,
            models::inventory::CreateItemPayload,
            models::inventory::UpdateItemPayload,

            // --- Sales ---
            models::sales::Sale,
            models::sales::SaleDetail,
            models::sales::CreateSalePayload,
            models::sales::BulkDeletePayload,
            models::sales::BulkDeleteResult,
            handlers::sales::BulkDeleteResponse,

            // --- Stats ---
            models::stats::StatsPeriod,
            models::stats::SalesStats,
            models::stats::TopProduct,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Usuários, Papéis e Permissões"),
        (name = "Inventory", description = "Cadastro e Aprovação de Itens"),
        (name = "Sales", description = "Vendas, Estornos e Indicadores")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_sales_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in ["/api/sales", "/api/sales/bulk", "/api/sales/stats", "/api/sales/{id}", "/api/users/{id}/role"] {
            assert!(doc.paths.paths.contains_key(path), "{path} ausente do OpenAPI");
        }
    }
}
