// src/router.rs

use axum::{
    http::HeaderValue,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn cors_layer(allow_origin: Option<&str>) -> CorsLayer {
    match allow_origin.and_then(|origin| HeaderValue::from_str(origin).ok()) {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::permissive(),
    }
}

pub fn build_router(app_state: AppState) -> Router {
    // Define as rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Todas as demais passam pelo auth_guard
    let user_routes = Router::new()
        .route("/", get(handlers::users::list_users))
        .route("/me", get(handlers::auth::get_me))
        .route("/{id}/role", put(handlers::users::change_role))
        .route("/{id}/permissions", put(handlers::users::set_permissions))
        .route("/{id}/permissions/reset", post(handlers::users::reset_permissions));

    let inventory_routes = Router::new()
        .route(
            "/",
            get(handlers::inventory::list_items).post(handlers::inventory::create_item),
        )
        .route("/pending", get(handlers::inventory::list_pending))
        .route(
            "/{id}",
            get(handlers::inventory::get_item)
                .put(handlers::inventory::update_item)
                .delete(handlers::inventory::delete_item),
        )
        .route("/{id}/approve", post(handlers::inventory::approve_item))
        .route("/{id}/reject", post(handlers::inventory::reject_item));

    let sales_routes = Router::new()
        .route(
            "/",
            get(handlers::sales::list_sales).post(handlers::sales::create_sale),
        )
        .route("/bulk", delete(handlers::sales::bulk_delete_sales))
        .route("/recent", get(handlers::sales::recent_sales))
        .route("/stats", get(handlers::sales::sales_stats))
        .route(
            "/{id}",
            get(handlers::sales::get_sale).delete(handlers::sales::delete_sale),
        );

    let protected_routes = Router::new()
        .nest("/users", user_routes)
        .nest("/inventory", inventory_routes)
        .nest("/sales", sales_routes)
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let cors = cors_layer(app_state.config.cors_allow_origin.as_deref());

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(health))
        .nest("/api/auth", auth_routes)
        .nest("/api", protected_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}
