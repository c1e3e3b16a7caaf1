use crate::auth::jwt::TokenVerifier;
use crate::auth::models::AuthenticatedUser;
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tubely_core::AppError;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<dyn TokenVerifier>,
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: Option<&str>) -> Result<&str, AppError> {
    let header =
        header.ok_or_else(|| AppError::Unauthorized("Couldn't find JWT".to_string()))?;
    let token = header
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            AppError::Unauthorized("Authorization header must use the Bearer scheme".to_string())
        })?;
    Ok(token)
}

pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = match bearer_token(header) {
        Ok(token) => token,
        Err(e) => return HttpAppError(e).into_response(),
    };

    let user_id = match auth_state.verifier.verify(token).await {
        Ok(user_id) => user_id,
        Err(e) => return HttpAppError(e).into_response(),
    };

    tracing::debug!(user_id = %user_id, "Request authenticated");
    request
        .extensions_mut()
        .insert(AuthenticatedUser { user_id });

    next.run(request).await
}
