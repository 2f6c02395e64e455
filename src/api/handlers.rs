//! HTTP Request Handlers
//!
//! Axum handlers for account and status endpoints, plus the shared state.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::{
    models::requests::*,
    service::{AuthService, CatalogService, JwtService},
    utils::error::{AppError, AppResult, ErrorResponse},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub catalog_service: Arc<CatalogService>,
    pub jwt_service: Arc<JwtService>,
    /// Largest accepted poster, in bytes
    pub max_upload_bytes: usize,
}

/// Liveness check
#[utoipa::path(
    get,
    path = "/server-status",
    responses((status = 200, description = "Service is up", body = MessageResponse))
)]
pub async fn server_status() -> Json<MessageResponse> {
    Json(MessageResponse::new("Server is up and running!"))
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/signup",
    tag = "Authentication",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "Account created", body = SignUpResponse),
        (status = 400, description = "Invalid email or password", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<SignUpRequest>,
) -> AppResult<(StatusCode, Json<SignUpResponse>)> {
    request.validate().map_err(handle_validation_error)?;

    let user = state.auth_service.sign_up(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            message: "user created successfully".to_string(),
            user,
        }),
    ))
}

/// Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/signin",
    tag = "Authentication",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Signed in", body = SignInResponse),
        (status = 400, description = "Invalid email or password", body = ErrorResponse),
        (status = 401, description = "Wrong password", body = ErrorResponse),
        (status = 404, description = "Unknown email", body = ErrorResponse)
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> AppResult<Json<SignInResponse>> {
    request.validate().map_err(handle_validation_error)?;

    let token = state.auth_service.sign_in(request).await?;

    Ok(Json(SignInResponse {
        message: "Sign in Successful".to_string(),
        token,
    }))
}

/// Handle validation errors from request parsing
pub fn handle_validation_error(err: validator::ValidationErrors) -> AppError {
    let mut messages = Vec::new();

    for (field, errors) in err.field_errors() {
        for error in errors {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value for field '{}'", field));
            messages.push(message);
        }
    }

    messages.sort();
    AppError::Validation(messages.join(", "))
}
