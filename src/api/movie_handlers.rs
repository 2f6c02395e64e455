//! Movie Handlers
//!
//! Catalog endpoints. Reads are public; writes sit behind the bearer gate and
//! take `multipart/form-data` with `title`, `year` and a `poster` file.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};

use super::handlers::AppState;
use super::middleware::AuthUser;
use crate::{
    models::requests::*,
    service::{catalog::parse_movie_id, ImageUpload},
    utils::error::{AppError, AppResult, ErrorResponse},
};

use super::doc::MovieUploadForm;

/// List movies, newest first
#[utoipa::path(
    get,
    path = "/movies",
    tag = "Movies",
    params(ListQuery),
    responses((status = 200, description = "One page of movies", body = MovieListResponse))
)]
pub async fn list_movies(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<MovieListResponse>> {
    let page = state
        .catalog_service
        .list(query.page_request())
        .await?;

    Ok(Json(MovieListResponse::from_page(
        "Movies retrieved successfully",
        page,
        None,
    )))
}

/// Search movies by title
#[utoipa::path(
    get,
    path = "/movies/search",
    tag = "Movies",
    params(ListQuery),
    responses((status = 200, description = "One page of matching movies", body = MovieListResponse))
)]
pub async fn search_movies(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<MovieListResponse>> {
    let text = query.search_text();
    let page = state
        .catalog_service
        .search(&text, query.page_request())
        .await?;

    Ok(Json(MovieListResponse::from_page(
        "Movies search completed",
        page,
        Some(text),
    )))
}

/// Fetch one movie
#[utoipa::path(
    get,
    path = "/movies/{id}",
    tag = "Movies",
    params(("id" = String, Path, description = "Movie id")),
    responses(
        (status = 200, description = "The movie", body = MovieResponse),
        (status = 404, description = "No such movie", body = ErrorResponse)
    )
)]
pub async fn get_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MovieResponse>> {
    let id = parse_movie_id(&id)?;
    let movie = state.catalog_service.get_by_id(id).await?;

    Ok(Json(MovieResponse {
        message: "Movie retrieved successfully".to_string(),
        movie,
    }))
}

/// Create a movie with its poster
#[utoipa::path(
    post,
    path = "/movies",
    tag = "Movies",
    security(("bearer" = [])),
    request_body(content = MovieUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Movie created", body = MovieResponse),
        (status = 400, description = "Missing poster or invalid fields", body = ErrorResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 409, description = "Title already exists", body = ErrorResponse),
        (status = 502, description = "Image host failure", body = ErrorResponse)
    )
)]
pub async fn create_movie(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<MovieResponse>)> {
    let (fields, poster) = read_movie_form(multipart).await?;
    let movie = state.catalog_service.create(fields, poster).await?;
    log::info!("User {} created movie {}", user.user_id, movie.id);

    Ok((
        StatusCode::CREATED,
        Json(MovieResponse {
            message: "Movie created successfully".to_string(),
            movie,
        }),
    ))
}

/// Update any of title, year and poster
#[utoipa::path(
    put,
    path = "/movies/{id}",
    tag = "Movies",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Movie id")),
    request_body(content = MovieUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Movie updated", body = MovieResponse),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 404, description = "No such movie", body = ErrorResponse),
        (status = 409, description = "Title already exists", body = ErrorResponse),
        (status = 502, description = "Image host failure", body = ErrorResponse)
    )
)]
pub async fn update_movie(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<Json<MovieResponse>> {
    let id = parse_movie_id(&id)?;
    let (fields, poster) = read_movie_form(multipart).await?;
    let movie = state.catalog_service.update(id, fields, poster).await?;
    log::info!("User {} updated movie {}", user.user_id, id);

    Ok(Json(MovieResponse {
        message: "Movie updated successfully".to_string(),
        movie,
    }))
}

/// Delete a movie and release its poster
#[utoipa::path(
    delete,
    path = "/movies/{id}",
    tag = "Movies",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Movie id")),
    responses(
        (status = 200, description = "Movie deleted", body = MessageResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 404, description = "No such movie", body = ErrorResponse)
    )
)]
pub async fn delete_movie(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_movie_id(&id)?;
    state.catalog_service.delete(id).await?;
    log::info!("User {} deleted movie {}", user.user_id, id);

    Ok(Json(MessageResponse::new("Movie deleted successfully")))
}

/// Collect the movie form; an empty or unnamed `poster` part counts as absent
async fn read_movie_form(
    mut multipart: Multipart,
) -> AppResult<(MovieFields, Option<ImageUpload>)> {
    let mut fields = MovieFields::default();
    let mut poster = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => fields.title = Some(field.text().await.map_err(multipart_error)?),
            "year" => fields.year = Some(field.text().await.map_err(multipart_error)?),
            "poster" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;

                if let Some(file_name) = file_name.filter(|n| !n.is_empty()) {
                    if !bytes.is_empty() {
                        poster = Some(ImageUpload::new(file_name, content_type, bytes.to_vec()));
                    }
                }
            }
            other => log::debug!("Ignoring unexpected form field '{}'", other),
        }
    }

    Ok((fields, poster))
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Invalid form data: {}", err.body_text()))
}
