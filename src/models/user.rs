//! User Model
//!
//! Core user data structures and type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// User representation for external API responses
///
/// Never carries the password hash. Field names follow the wire format the
/// frontend expects (`_id`, `createdAt`, `updatedAt`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Unique identifier for the user
    #[serde(rename = "_id")]
    pub id: Uuid,

    /// User's email address (unique, normalized to lowercase)
    pub email: String,

    /// Timestamp when the user account was created
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    /// Timestamp when the user record was last modified
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Internal user representation including password hash
///
/// Used for credential checks only. It is never serialized.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserWithPassword {
    pub id: Uuid,
    pub email: String,
    /// bcrypt hashed password
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to persist a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
}

impl From<UserWithPassword> for User {
    fn from(user: UserWithPassword) -> Self {
        User {
            id: user.id,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_view_drops_password_hash() {
        let now = Utc::now();
        let record = UserWithPassword {
            id: Uuid::new_v4(),
            email: "viewer@example.com".to_string(),
            password_hash: "$2b$10$hash".to_string(),
            created_at: now,
            updated_at: now,
        };

        let user = User::from(record.clone());
        let json = serde_json::to_value(&user).unwrap();

        assert_eq!(json["_id"], record.id.to_string());
        assert_eq!(json["email"], "viewer@example.com");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("password_hash").is_none());
        assert!(json.get("passwordHash").is_none());
    }
}
