//! Movie Service Library
//!
//! A movie catalog REST service: email/password accounts with bearer tokens,
//! CRUD over movies with poster uploads to a remote image host, and a
//! read-through result cache in front of the store.
//!
//! # Features
//!
//! - **Accounts**: bcrypt-hashed passwords and HS256 bearer tokens
//! - **Catalog**: paginated listing, case-insensitive title search, unique titles
//! - **Posters**: validated uploads to Cloudinary, or inline data URLs
//! - **Caching**: per-movie and per-listing entries with TTLs; any write
//!   invalidates every cached listing at once
//! - **Flexible Router**: configurable endpoints via the RouterBuilder pattern
//! - **Storage**: PostgreSQL with connection pooling, or in-memory stores
//! - **Client**: a typed, stateful API client for front-ends and tooling
//! - **API Docs**: OpenAPI JSON and Swagger UI served at `/api-docs`
//!
//! # Quick Start
//!
//! ## As a Web Server Library
//!
//! ```rust,no_run
//! use movie_service::{
//!     api::{create_app, AppState},
//!     cache::LocalCache,
//!     config::{RateLimitConfig, ServerConfig},
//!     database::{InMemoryMovieRepository, InMemoryUserRepository},
//!     service::{AuthService, CatalogService, CatalogSettings, InlineImageHost, JwtService},
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let jwt_service = Arc::new(JwtService::new("a-long-signing-secret".to_string()));
//!
//!     let app_state = AppState {
//!         auth_service: Arc::new(AuthService::new(
//!             Arc::new(InMemoryUserRepository::new()),
//!             jwt_service.clone(),
//!         )),
//!         catalog_service: Arc::new(CatalogService::new(
//!             Arc::new(InMemoryMovieRepository::new()),
//!             Arc::new(InlineImageHost::default()),
//!             Arc::new(LocalCache::new(1000)),
//!             CatalogSettings::default(),
//!         )),
//!         jwt_service,
//!         max_upload_bytes: 5 * 1024 * 1024,
//!     };
//!
//!     let app = create_app(app_state, &ServerConfig::default(), &RateLimitConfig::default());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     axum::serve(listener, app).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## As a Client
//!
//! ```rust,no_run
//! use movie_service::client::MovieApiClient;
//!
//! # async fn run() -> Result<(), movie_service::client::ClientError> {
//! let mut client = MovieApiClient::new("http://localhost:8080/api")?;
//! client.sign_in("critic@example.com", "password123").await?;
//! let movies = client.fetch_movies(1, 10).await?;
//! println!("{} movies on the first page", movies.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Router Builder Examples
//!
//! ```rust,no_run
//! use movie_service::api::{AppState, RouterBuilder};
//!
//! fn mirror(state: AppState) -> axum::Router {
//!     // Public read-only catalog
//!     RouterBuilder::with_readonly_routes()
//!         .build(&state)
//!         .with_state(state)
//! }
//! ```
//!
//! # Architecture
//!
//! - **API Layer**: HTTP handlers, middleware and configurable route definitions
//! - **Service Layer**: accounts, tokens, image hosting and catalog logic
//! - **Cache**: the key-value store behind catalog reads
//! - **Models**: data structures and request/response payloads
//! - **Database**: connection management and repositories
//! - **Utils**: shared error, security and validation helpers

/// HTTP API layer with handlers and configurable routing
pub mod api;

/// Result cache used by the catalog service
pub mod cache;

/// Stateful client for the catalog API
pub mod client;

/// Configuration management for all service settings
pub mod config;

/// Database connection management and repositories
pub mod database;

/// Data models and types
pub mod models;

/// Business logic layer
pub mod service;

/// Utility functions and shared components
pub mod utils;

// Re-export commonly used types for convenience
pub use api::{create_app, create_routes, AppState, RouterBuilder};
pub use client::{ClientError, ClientState, MovieApiClient, MovieForm};
pub use models::{
    auth::{AccessTokenClaims, UserContext},
    movie::{Movie, MoviePage},
    requests::{CredentialsRequest, ListQuery, MovieFields, PageRequest},
    user::User,
};
pub use service::{AuthService, CatalogService, CloudinaryImageHost, InlineImageHost, JwtService};
pub use utils::error::{AppError, AppResult, ErrorResponse};

// Re-export database utilities for configuration
pub use database::DatabasePool;

// Re-export configuration system
pub use config::{env, AppConfig, CloudinaryConfig, JwtConfig, ServerConfig};

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
