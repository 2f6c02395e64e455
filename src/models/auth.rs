//! Authentication Models
//!
//! Data structures for JWT authentication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims structure for access tokens
///
/// Contains standard JWT claims plus a token type marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject - user ID
    pub sub: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// JWT ID - unique token identifier
    pub jti: String,

    /// Token type (always "access" for access tokens)
    #[serde(rename = "type")]
    pub token_type: String,
}

impl AccessTokenClaims {
    /// Create new access token claims
    pub fn new(user_id: Uuid, expires_at: DateTime<Utc>, issued_at: DateTime<Utc>) -> Self {
        Self {
            sub: user_id.to_string(),
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: "access".to_string(),
        }
    }
}

/// Authenticated caller, inserted into request extensions by the bearer gate
#[derive(Debug, Clone, PartialEq)]
pub struct UserContext {
    pub user_id: Uuid,
}

impl UserContext {
    /// Builds the context from verified claims; `None` if the subject is not a UUID
    pub fn from_access_claims(claims: &AccessTokenClaims) -> Option<Self> {
        Uuid::parse_str(&claims.sub)
            .ok()
            .map(|user_id| Self { user_id })
    }
}
