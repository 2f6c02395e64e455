//! API Layer
//!
//! HTTP API endpoints and request handling for the movie service.

pub mod doc;
pub mod handlers;
pub mod middleware;
pub mod movie_handlers;
pub mod routes;
pub mod security_middleware;

// Re-export commonly used types
pub use doc::ApiDoc;
pub use handlers::AppState;
pub use middleware::{auth_middleware, AuthUser};
pub use routes::{create_app, create_readonly_routes, create_routes, cors_layer, RouterBuilder};
pub use security_middleware::{rate_limiting_middleware, security_headers_middleware, RateLimiter};
