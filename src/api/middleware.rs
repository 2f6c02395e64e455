//! Authentication Middleware
//!
//! Bearer-token gate for the catalog write endpoints.

use crate::models::UserContext;
use crate::service::JwtService;
use crate::utils::error::AppError;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Extension type for storing authenticated user context in request extensions
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserContext);

/// Authentication middleware that validates JWT tokens and extracts user context
///
/// Requests without a valid `Authorization: Bearer <token>` header are
/// answered with 401 before reaching the handler.
pub async fn auth_middleware(
    State(jwt_service): State<Arc<JwtService>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| AppError::Authentication("Missing Authorization header".into()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Authentication("Invalid Authorization header format".into()))?;

    let user_context = jwt_service.validate_access_token(token).map_err(|e| {
        log::debug!("Rejected bearer token: {}", e);
        AppError::Authentication("Invalid token".into())
    })?;

    request.extensions_mut().insert(AuthUser(user_context));

    Ok(next.run(request).await)
}
