//! JWT Authentication Service
//!
//! Issues and validates the HS256 bearer tokens that gate catalog writes.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{AccessTokenClaims, UserContext};
use crate::utils::error::AppError;

/// Token issuance and validation errors
#[derive(Error, Debug)]
pub enum JwtServiceError {
    #[error("Token generation failed: {0}")]
    TokenGeneration(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

pub type JwtServiceResult<T> = Result<T, JwtServiceError>;

impl From<JwtServiceError> for AppError {
    fn from(err: JwtServiceError) -> Self {
        match err {
            JwtServiceError::TokenGeneration(msg) => AppError::Internal(msg),
            JwtServiceError::InvalidToken(msg) => AppError::Authentication(msg),
        }
    }
}

/// JWT authentication service for token management and validation
#[derive(Clone)]
pub struct JwtService {
    /// JWT signing secret
    secret: String,
    /// Access token lifetime (default: 24 hours)
    access_token_expires_in: Duration,
}

impl JwtService {
    /// Create a new JWT service instance with the default one-day lifetime
    pub fn new(secret: String) -> Self {
        Self::with_expiration(secret, Duration::hours(24))
    }

    /// Create a new JWT service with a custom token lifetime
    pub fn with_expiration(secret: String, access_expires_in: Duration) -> Self {
        Self {
            secret,
            access_token_expires_in: access_expires_in,
        }
    }

    /// Issue an access token whose subject is `user_id`
    pub fn generate_access_token(&self, user_id: Uuid) -> JwtServiceResult<String> {
        let now = Utc::now();
        let claims = AccessTokenClaims::new(user_id, now + self.access_token_expires_in, now);
        self.encode_access_token(&claims)
    }

    /// Validate an access token and extract user context
    pub fn validate_access_token(&self, token: &str) -> JwtServiceResult<UserContext> {
        let claims = self.decode_access_token(token)?;
        if claims.token_type != "access" {
            return Err(JwtServiceError::InvalidToken("Wrong token type".into()));
        }
        UserContext::from_access_claims(&claims)
            .ok_or_else(|| JwtServiceError::InvalidToken("Invalid user ID in token".into()))
    }

    /// Lifetime of issued tokens
    pub fn expires_in(&self) -> Duration {
        self.access_token_expires_in
    }

    fn encode_access_token(&self, claims: &AccessTokenClaims) -> JwtServiceResult<String> {
        let header = Header::new(Algorithm::HS256);
        let encoding_key = EncodingKey::from_secret(self.secret.as_ref());

        encode(&header, claims, &encoding_key)
            .map_err(|e| JwtServiceError::TokenGeneration(e.to_string()))
    }

    fn decode_access_token(&self, token: &str) -> JwtServiceResult<AccessTokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.leeway = 0;

        let decoding_key = DecodingKey::from_secret(self.secret.as_ref());

        decode::<AccessTokenClaims>(token, &decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| JwtServiceError::InvalidToken(e.to_string()))
    }
}
