//! OpenAPI Documentation
//!
//! Generated description of the HTTP API, served as JSON at
//! `/api-docs/openapi.json` with Swagger UI at `/api-docs`. Paths are relative
//! to the configured API prefix, which is published as the server URL.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::openapi::server::Server;
use utoipa::{Modify, OpenApi, ToSchema};

use crate::models::requests::{
    CredentialsRequest, MessageResponse, MovieListResponse, MovieResponse, SignInResponse,
    SignUpResponse,
};
use crate::models::{Movie, User};
use crate::utils::error::ErrorResponse;

/// Where Swagger UI is mounted
pub const DOCS_PATH: &str = "/api-docs";

/// Where the OpenAPI JSON is served
pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

/// Registers the bearer scheme used by the catalog write endpoints
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Multipart body of the movie write endpoints
///
/// Create requires all three parts; update accepts any subset.
#[derive(ToSchema)]
pub struct MovieUploadForm {
    #[schema(example = "The Shawshank Redemption")]
    pub title: Option<String>,
    #[schema(example = "1994")]
    pub year: Option<String>,
    /// Image file (jpg, jpeg, png, gif or webp)
    #[schema(value_type = Option<String>, format = Binary)]
    pub poster: Option<Vec<u8>>,
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Movie API",
        description = "Movie API Documentation with Essential Features"
    ),
    paths(
        crate::api::handlers::server_status,
        crate::api::handlers::sign_up,
        crate::api::handlers::sign_in,
        crate::api::movie_handlers::list_movies,
        crate::api::movie_handlers::search_movies,
        crate::api::movie_handlers::get_movie,
        crate::api::movie_handlers::create_movie,
        crate::api::movie_handlers::update_movie,
        crate::api::movie_handlers::delete_movie,
    ),
    components(schemas(
        CredentialsRequest,
        SignUpResponse,
        SignInResponse,
        MessageResponse,
        MovieResponse,
        MovieListResponse,
        MovieUploadForm,
        Movie,
        User,
        ErrorResponse
    )),
    tags(
        (name = "Authentication", description = "User authentication endpoints"),
        (name = "Movies", description = "Movie management endpoints")
    )
)]
pub struct ApiDoc;

/// The document with `prefix` as its server URL
pub fn api_doc(prefix: &str) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    let url = if prefix.is_empty() { "/" } else { prefix };
    doc.servers = Some(vec![Server::new(url)]);
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::openapi::schema::Schema;
    use utoipa::openapi::RefOr;

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[test]
    fn test_every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/server-status",
            "/signup",
            "/signin",
            "/movies",
            "/movies/search",
            "/movies/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.as_ref().expect("components");
        assert!(components.security_schemes.contains_key("bearer"));
    }

    #[test]
    fn test_movie_schema_uses_wire_names() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let movie = schemas.get("Movie").expect("Movie schema");

        assert_object_schema_has_field(movie, "_id");
        assert_object_schema_has_field(movie, "createdAt");
        assert_object_schema_has_field(movie, "posterDeleteHandle");
    }

    #[test]
    fn test_server_url_follows_prefix() {
        let doc = api_doc("/api");
        assert_eq!(doc.servers.expect("servers")[0].url, "/api");

        let doc = api_doc("");
        assert_eq!(doc.servers.expect("servers")[0].url, "/");
    }
}
