//! Auth Service Implementation
//!
//! Sign-up and sign-in over the user repository and the JWT service.

use std::sync::Arc;
use thiserror::Error;
use validator::Validate;

use crate::database::{RepositoryError, UserRepository};
use crate::models::{CredentialsRequest, NewUser, User};
use crate::service::jwt::{JwtService, JwtServiceError};
use crate::utils::{
    error::AppError,
    security::{hash_password_with_cost, verify_password, DEFAULT_BCRYPT_COST},
    validation::normalize_email,
};

/// Custom error types for the auth service
#[derive(Error, Debug)]
pub enum AuthServiceError {
    /// No user is registered under the given email
    #[error("User Not Found")]
    UserNotFound,

    /// Attempted to create a user with an email that already exists
    #[error("User already exists with this email")]
    EmailAlreadyExists,

    /// Password did not match
    #[error("Invalid Credentials")]
    InvalidCredentials,

    /// Input validation failed with detailed error message
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Repository error: {0}")]
    Repository(RepositoryError),

    #[error("Password hashing error: {0}")]
    HashingError(#[from] bcrypt::BcryptError),

    #[error(transparent)]
    Token(#[from] JwtServiceError),
}

impl From<RepositoryError> for AuthServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(_) => AuthServiceError::EmailAlreadyExists,
            other => AuthServiceError::Repository(other),
        }
    }
}

impl From<AuthServiceError> for AppError {
    fn from(err: AuthServiceError) -> Self {
        match err {
            AuthServiceError::UserNotFound => AppError::NotFound(err.to_string()),
            AuthServiceError::EmailAlreadyExists => AppError::Conflict(err.to_string()),
            AuthServiceError::InvalidCredentials => AppError::Authentication(err.to_string()),
            AuthServiceError::ValidationError(msg) => AppError::Validation(msg),
            AuthServiceError::Repository(RepositoryError::Database(e)) => AppError::Database(e),
            AuthServiceError::Repository(e) => AppError::Internal(e.to_string()),
            AuthServiceError::HashingError(e) => AppError::HashingError(e),
            AuthServiceError::Token(e) => e.into(),
        }
    }
}

/// Result type for auth service operations
pub type AuthServiceResult<T> = Result<T, AuthServiceError>;

/// Account registration and credential exchange
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    jwt_service: Arc<JwtService>,
    /// bcrypt cost factor for password hashing
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, jwt_service: Arc<JwtService>) -> Self {
        Self::with_bcrypt_cost(users, jwt_service, DEFAULT_BCRYPT_COST)
    }

    pub fn with_bcrypt_cost(
        users: Arc<dyn UserRepository>,
        jwt_service: Arc<JwtService>,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            users,
            jwt_service,
            bcrypt_cost,
        }
    }

    /// Registers a new account and returns its public view
    pub async fn sign_up(&self, request: CredentialsRequest) -> AuthServiceResult<User> {
        request
            .validate()
            .map_err(|e| AuthServiceError::ValidationError(format!("Invalid sign-up data: {}", e)))?;

        let email = normalize_email(&request.email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthServiceError::EmailAlreadyExists);
        }

        let password_hash = hash_password_with_cost(&request.password, self.bcrypt_cost)?;

        // A concurrent sign-up can still lose the race at the unique index
        let user = self
            .users
            .create(NewUser {
                email,
                password_hash,
            })
            .await?;

        log::info!("Registered user {}", user.id);
        Ok(user.into())
    }

    /// Verifies credentials and issues a bearer token
    pub async fn sign_in(&self, request: CredentialsRequest) -> AuthServiceResult<String> {
        request
            .validate()
            .map_err(|e| AuthServiceError::ValidationError(format!("Invalid sign-in data: {}", e)))?;

        let email = normalize_email(&request.email);
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthServiceError::UserNotFound)?;

        if !verify_password(&request.password, &user.password_hash)? {
            log::debug!("Rejected sign-in for user {}", user.id);
            return Err(AuthServiceError::InvalidCredentials);
        }

        Ok(self.jwt_service.generate_access_token(user.id)?)
    }
}
