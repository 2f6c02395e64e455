//! Data Models Module
//!
//! Data structures used throughout the movie service: users, movies, token
//! claims and request/response payloads.

pub mod auth;
pub mod movie;
pub mod requests;
pub mod user;

// Re-export commonly used types
pub use auth::*;
pub use movie::*;
pub use requests::*;
pub use user::*;
