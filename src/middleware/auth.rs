// src/middleware/auth.rs

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::User,
};

/// Credencial por requisição: o token vem do header desta requisição, o usuário é
/// relido do banco e fica nos extensions só enquanto ela durar.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(AppError::InvalidToken)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let user = app_state
        .auth_service
        .authenticate(bearer.token())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(user.clone());
        }

        // Rota sem o auth_guard na frente
        let app_state = AppState::from_ref(state);
        let Ok(locale) = Locale::from_request_parts(parts, state).await;
        Err(AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))
    }
}
