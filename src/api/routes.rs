//! API Route Definitions
//!
//! HTTP routes and their handlers, assembled with a builder so deployments can
//! expose a subset (for example a read-only catalog mirror), plus the fully
//! layered application served by the binary.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put, MethodRouter},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa_swagger_ui::SwaggerUi;

use super::doc::{api_doc, DOCS_PATH, OPENAPI_JSON_PATH};
use super::handlers::*;
use super::middleware::auth_middleware;
use super::movie_handlers::*;
use super::security_middleware::{
    rate_limiting_middleware, security_headers_middleware, RateLimiter,
};
use crate::config::{RateLimitConfig, ServerConfig};

/// Extra room on top of the poster cap for the other form fields
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Builder for creating API routes with configurable endpoints
#[derive(Default)]
pub struct RouterBuilder {
    /// GET /server-status
    server_status: bool,
    /// POST /signup
    sign_up: bool,
    /// POST /signin
    sign_in: bool,
    /// GET /movies
    list_movies: bool,
    /// GET /movies/search
    search_movies: bool,
    /// GET /movies/{id}
    get_movie: bool,
    /// POST /movies (bearer)
    create_movie: bool,
    /// PUT /movies/{id} (bearer)
    update_movie: bool,
    /// DELETE /movies/{id} (bearer)
    delete_movie: bool,
}

impl RouterBuilder {
    /// Creates a new router builder with all routes disabled by default
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a router builder with every endpoint enabled
    pub fn with_all_routes() -> Self {
        Self {
            server_status: true,
            sign_up: true,
            sign_in: true,
            list_movies: true,
            search_movies: true,
            get_movie: true,
            create_movie: true,
            update_movie: true,
            delete_movie: true,
        }
    }

    /// Creates a router builder exposing only the public catalog reads
    pub fn with_readonly_routes() -> Self {
        Self {
            server_status: true,
            list_movies: true,
            search_movies: true,
            get_movie: true,
            ..Self::default()
        }
    }

    pub fn server_status(mut self, enabled: bool) -> Self {
        self.server_status = enabled;
        self
    }

    pub fn sign_up(mut self, enabled: bool) -> Self {
        self.sign_up = enabled;
        self
    }

    pub fn sign_in(mut self, enabled: bool) -> Self {
        self.sign_in = enabled;
        self
    }

    pub fn list_movies(mut self, enabled: bool) -> Self {
        self.list_movies = enabled;
        self
    }

    pub fn search_movies(mut self, enabled: bool) -> Self {
        self.search_movies = enabled;
        self
    }

    pub fn get_movie(mut self, enabled: bool) -> Self {
        self.get_movie = enabled;
        self
    }

    pub fn create_movie(mut self, enabled: bool) -> Self {
        self.create_movie = enabled;
        self
    }

    pub fn update_movie(mut self, enabled: bool) -> Self {
        self.update_movie = enabled;
        self
    }

    pub fn delete_movie(mut self, enabled: bool) -> Self {
        self.delete_movie = enabled;
        self
    }

    /// Builds the unprefixed router; write routes get the bearer gate and
    /// a body limit sized for the poster cap
    pub fn build(self, state: &AppState) -> Router<AppState> {
        let mut router = Router::new();

        if self.server_status {
            router = router.route("/server-status", get(server_status));
        }

        if self.sign_up {
            router = router.route("/signup", post(sign_up));
        }

        if self.sign_in {
            router = router.route("/signin", post(sign_in));
        }

        if self.list_movies {
            router = router.route("/movies", get(list_movies));
        }

        if self.search_movies {
            router = router.route("/movies/search", get(search_movies));
        }

        if self.get_movie {
            router = router.route("/movies/{id}", get(get_movie));
        }

        // Gated per method so other methods on the same path still get 405
        if self.create_movie {
            router = router.route("/movies", bearer_gated(post(create_movie), state));
        }

        if self.update_movie {
            router = router.route("/movies/{id}", bearer_gated(put(update_movie), state));
        }

        if self.delete_movie {
            router = router.route("/movies/{id}", bearer_gated(delete(delete_movie), state));
        }

        router
    }
}

/// Wraps a write route in the upload body limit and the bearer gate
fn bearer_gated(route: MethodRouter<AppState>, state: &AppState) -> MethodRouter<AppState> {
    route
        .route_layer(DefaultBodyLimit::max(
            state.max_upload_bytes + FORM_OVERHEAD_BYTES,
        ))
        .route_layer(from_fn_with_state(
            state.jwt_service.clone(),
            auth_middleware,
        ))
}

/// All routes, unprefixed and without the outer layers
pub fn create_routes(state: &AppState) -> Router<AppState> {
    RouterBuilder::with_all_routes().build(state)
}

/// Public catalog reads only
pub fn create_readonly_routes(state: &AppState) -> Router<AppState> {
    RouterBuilder::with_readonly_routes().build(state)
}

/// CORS policy from the configured origins; `*` allows any origin
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(allowed))
}

/// The complete application: routes under the API prefix, API docs at
/// `/api-docs`, request tracing, CORS, security headers and rate limiting
pub fn create_app(state: AppState, server: &ServerConfig, rate_limit: &RateLimitConfig) -> Router {
    let routes = create_routes(&state);
    let prefix = server.api_prefix.trim_end_matches('/');

    let router = if prefix.is_empty() {
        routes
    } else {
        Router::new().nest(prefix, routes)
    };

    let router = router.merge(SwaggerUi::new(DOCS_PATH).url(OPENAPI_JSON_PATH, api_doc(prefix)));

    let limiter = Arc::new(RateLimiter::new(rate_limit));

    router.with_state(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(&server.cors_origins))
            .layer(from_fn(security_headers_middleware))
            .layer(from_fn_with_state(limiter, rate_limiting_middleware))
            .into_inner(),
    )
}
