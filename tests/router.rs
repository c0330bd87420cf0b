// tests/router.rs
//
// Não tocam o banco: a pool é preguiçosa e as rotas testadas param antes de qualquer query.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use pos_backend::{config::AppState, router::build_router};

fn app() -> Router {
    let config = common::config();
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_lazy(&config.database_url)
        .expect("pool preguiçosa");
    build_router(AppState::from_pool(pool, config).expect("estado da aplicação"))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let response = app()
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn sales_require_a_token() {
    let response = app()
        .oneshot(Request::get("/api/sales").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn garbage_token_is_rejected() {
    let response = app()
        .oneshot(
            Request::delete("/api/sales/bulk")
                .header(header::AUTHORIZATION, "Bearer nao-e-um-jwt")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"ids":[1,2]}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn errors_follow_accept_language() {
    let response = app()
        .oneshot(
            Request::get("/api/inventory")
                .header(header::ACCEPT_LANGUAGE, "pt-BR,pt;q=0.9,en;q=0.5")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await["error"],
        "Token de autenticação inválido ou ausente."
    );
}

#[tokio::test]
async fn openapi_document_is_served() {
    let response = app()
        .oneshot(Request::get("/api-docs/openapi.json").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let doc = body_json(response).await;
    assert!(doc["paths"]["/api/sales/stats"].is_object());
}
