//! Service Layer
//!
//! Business logic for accounts, tokens, posters and the movie catalog.

pub mod auth;
pub mod catalog;
pub mod cloudinary;
pub mod image_host;
pub mod jwt;

// Re-export services
pub use auth::{AuthService, AuthServiceError};
pub use catalog::{CatalogService, CatalogServiceError, CatalogSettings};
pub use cloudinary::CloudinaryImageHost;
pub use image_host::{ImageHost, ImageHostError, ImageUpload, InlineImageHost, UploadedImage};
pub use jwt::{JwtService, JwtServiceError};
