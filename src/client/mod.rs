//! Catalog API Client
//!
//! Typed client for the movie service that keeps the session state a
//! front-end needs: the bearer token, the last status message, the last
//! error and the currently loaded page of movies.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    CredentialsRequest, MessageResponse, Movie, MovieListResponse, MovieResponse, SignInResponse,
    SignUpResponse, User,
};
use crate::service::ImageUpload;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// The server answered with a non-success status
    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    /// A write was attempted without signing in first
    #[error("Not signed in")]
    NotSignedIn,

    /// Transport or decoding failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Error body produced by the service
#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Session and listing state tracked across calls
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientState {
    pub token: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
    pub movies: Vec<Movie>,
    pub total_pages: u32,
}

/// Fields for creating or editing a movie
#[derive(Debug, Clone, Default)]
pub struct MovieForm {
    pub title: Option<String>,
    pub year: Option<String>,
    pub poster: Option<ImageUpload>,
}

impl MovieForm {
    fn into_multipart(self) -> ClientResult<Form> {
        let mut form = Form::new();
        if let Some(title) = self.title {
            form = form.text("title", title);
        }
        if let Some(year) = self.year {
            form = form.text("year", year);
        }
        if let Some(poster) = self.poster {
            let mime = poster
                .content_type
                .clone()
                .unwrap_or_else(|| poster.mime_type());
            let part = Part::bytes(poster.bytes)
                .file_name(poster.file_name)
                .mime_str(&mime)?;
            form = form.part("poster", part);
        }
        Ok(form)
    }
}

#[derive(Serialize)]
struct PageParams<'a> {
    page: u32,
    #[serde(rename = "perPage")]
    per_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    q: Option<&'a str>,
}

/// Stateful client for the catalog API
pub struct MovieApiClient {
    http: reqwest::Client,
    base_url: String,
    state: ClientState,
}

impl MovieApiClient {
    /// `base_url` includes the API prefix, e.g. `http://localhost:8080/api`
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            state: ClientState::default(),
        })
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn token(&self) -> Option<&str> {
        self.state.token.as_deref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.state.token.is_some()
    }

    pub async fn sign_up(&mut self, email: &str, password: &str) -> ClientResult<User> {
        let request = self
            .http
            .post(self.url("/signup"))
            .json(&credentials(email, password));
        let result = send::<SignUpResponse>(request).await;

        let response = self.track(result)?;
        self.state.message = Some(response.message);
        Ok(response.user)
    }

    /// Signs in and keeps the token for later writes
    pub async fn sign_in(&mut self, email: &str, password: &str) -> ClientResult<()> {
        let request = self
            .http
            .post(self.url("/signin"))
            .json(&credentials(email, password));
        let result = send::<SignInResponse>(request).await;

        let response = self.track(result)?;
        self.state.token = Some(response.token);
        self.state.message = Some(response.message);
        Ok(())
    }

    pub fn sign_out(&mut self) {
        self.state.token = None;
        self.state.message = None;
        self.state.error = None;
    }

    /// Loads a page of the catalog into state
    pub async fn fetch_movies(&mut self, page: u32, per_page: u32) -> ClientResult<&[Movie]> {
        let request = self.http.get(self.url("/movies")).query(&PageParams {
            page,
            per_page,
            q: None,
        });
        let result = send::<MovieListResponse>(request).await;

        let response = self.track(result)?;
        Ok(self.store_page(response))
    }

    /// Loads a page of title matches into state
    pub async fn search_movies(
        &mut self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> ClientResult<&[Movie]> {
        let request = self.http.get(self.url("/movies/search")).query(&PageParams {
            page,
            per_page,
            q: Some(query),
        });
        let result = send::<MovieListResponse>(request).await;

        let response = self.track(result)?;
        Ok(self.store_page(response))
    }

    pub async fn fetch_movie(&mut self, id: Uuid) -> ClientResult<Movie> {
        let request = self.http.get(self.url(&format!("/movies/{}", id)));
        let result = send::<MovieResponse>(request).await;

        Ok(self.track(result)?.movie)
    }

    pub async fn create_movie(&mut self, form: MovieForm) -> ClientResult<Movie> {
        let result = self.send_form(reqwest::Method::POST, "/movies", form).await;

        let response = self.track(result)?;
        self.state.message = Some(response.message);
        Ok(response.movie)
    }

    pub async fn update_movie(&mut self, id: Uuid, form: MovieForm) -> ClientResult<Movie> {
        let result = self
            .send_form(reqwest::Method::PUT, &format!("/movies/{}", id), form)
            .await;

        let response = self.track(result)?;
        self.state.message = Some(response.message);
        if let Some(slot) = self.state.movies.iter_mut().find(|m| m.id == id) {
            *slot = response.movie.clone();
        }
        Ok(response.movie)
    }

    pub async fn delete_movie(&mut self, id: Uuid) -> ClientResult<()> {
        let result = match self.bearer() {
            Ok(token) => {
                let request = self
                    .http
                    .delete(self.url(&format!("/movies/{}", id)))
                    .bearer_auth(token);
                send::<MessageResponse>(request).await
            }
            Err(e) => Err(e),
        };

        let response = self.track(result)?;
        self.state.message = Some(response.message);
        self.state.movies.retain(|m| m.id != id);
        Ok(())
    }

    async fn send_form(
        &self,
        method: reqwest::Method,
        path: &str,
        form: MovieForm,
    ) -> ClientResult<MovieResponse> {
        let token = self.bearer()?;
        let request = self
            .http
            .request(method, self.url(path))
            .bearer_auth(token)
            .multipart(form.into_multipart()?);
        send(request).await
    }

    fn bearer(&self) -> ClientResult<String> {
        self.state.token.clone().ok_or(ClientError::NotSignedIn)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn store_page(&mut self, response: MovieListResponse) -> &[Movie] {
        self.state.message = Some(response.message);
        self.state.total_pages = response.total_pages;
        self.state.movies = response.movies;
        &self.state.movies
    }

    /// Records the outcome of a call in `error`
    fn track<T>(&mut self, result: ClientResult<T>) -> ClientResult<T> {
        match &result {
            Ok(_) => self.state.error = None,
            Err(e) => {
                log::debug!("Catalog request failed: {}", e);
                self.state.error = Some(match e {
                    ClientError::Api { message, .. } => message.clone(),
                    other => other.to_string(),
                });
            }
        }
        result
    }
}

fn credentials(email: &str, password: &str) -> CredentialsRequest {
    CredentialsRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}

async fn send<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> ClientResult<T> {
    let response = request.send().await?;
    let status = response.status();

    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.message,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string(),
    };

    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn movie_json(id: Uuid, title: &str) -> Value {
        json!({
            "_id": id,
            "title": title,
            "year": "1999",
            "poster": "https://img.example.com/poster.png",
            "createdAt": "2024-06-01T00:00:00Z",
            "updatedAt": "2024-06-01T00:00:00Z"
        })
    }

    async fn signed_in(server: &MockServer) -> MovieApiClient {
        Mock::given(method("POST"))
            .and(path("/api/signin"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"message": "Sign in Successful", "token": "tok-123"})),
            )
            .mount(server)
            .await;

        let mut client = MovieApiClient::new(format!("{}/api", server.uri())).unwrap();
        client.sign_in("critic@example.com", "password123").await.unwrap();
        client
    }

    // ============================================================================
    // Session Tests
    // ============================================================================

    #[tokio::test]
    async fn test_sign_in_stores_token_and_sign_out_clears_it() {
        let server = MockServer::start().await;
        let mut client = signed_in(&server).await;

        assert_eq!(client.token(), Some("tok-123"));
        assert_eq!(client.state().message.as_deref(), Some("Sign in Successful"));

        client.sign_out();
        assert!(!client.is_signed_in());
    }

    #[tokio::test]
    async fn test_api_error_is_recorded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/signup"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "error": "CONFLICT",
                "message": "User already exists with this email"
            })))
            .mount(&server)
            .await;

        let mut client = MovieApiClient::new(format!("{}/api", server.uri())).unwrap();
        let err = client
            .sign_up("critic@example.com", "password123")
            .await
            .unwrap_err();

        match err {
            ClientError::Api { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "User already exists with this email");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(
            client.state().error.as_deref(),
            Some("User already exists with this email")
        );
    }

    #[tokio::test]
    async fn test_writes_require_sign_in() {
        let server = MockServer::start().await;
        let mut client = MovieApiClient::new(server.uri()).unwrap();

        let err = client.delete_movie(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ClientError::NotSignedIn));
        assert_eq!(client.state().error.as_deref(), Some("Not signed in"));
    }

    // ============================================================================
    // Catalog Tests
    // ============================================================================

    #[tokio::test]
    async fn test_fetch_movies_stores_page() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path("/api/movies"))
            .and(query_param("page", "2"))
            .and(query_param("perPage", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "Movies retrieved successfully",
                "movies": [movie_json(id, "Alien")],
                "currentPage": 2,
                "totalPages": 3,
                "perPage": 5,
                "totalMovies": 11
            })))
            .mount(&server)
            .await;

        let mut client = MovieApiClient::new(format!("{}/api/", server.uri())).unwrap();
        let movies = client.fetch_movies(2, 5).await.unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(client.state().total_pages, 3);
        assert_eq!(client.state().movies[0].id, id);
        assert!(client.state().error.is_none());
    }

    #[tokio::test]
    async fn test_search_movies_sends_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/movies/search"))
            .and(query_param("q", "alien"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "Movies search completed",
                "movies": [],
                "currentPage": 1,
                "totalPages": 0,
                "perPage": 10,
                "totalMovies": 0,
                "query": "alien"
            })))
            .mount(&server)
            .await;

        let mut client = MovieApiClient::new(format!("{}/api", server.uri())).unwrap();
        let movies = client.search_movies("alien", 1, 10).await.unwrap();
        assert!(movies.is_empty());
        assert_eq!(client.state().total_pages, 0);
    }

    #[tokio::test]
    async fn test_create_movie_sends_bearer_and_form() {
        let server = MockServer::start().await;
        let mut client = signed_in(&server).await;
        let id = Uuid::new_v4();

        Mock::given(method("POST"))
            .and(path("/api/movies"))
            .and(header("authorization", "Bearer tok-123"))
            .and(body_string_contains("name=\"title\""))
            .and(body_string_contains("filename=\"poster.png\""))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "message": "Movie created successfully",
                "movie": movie_json(id, "Alien")
            })))
            .expect(1)
            .mount(&server)
            .await;

        let movie = client
            .create_movie(MovieForm {
                title: Some("Alien".to_string()),
                year: Some("1979".to_string()),
                poster: Some(ImageUpload::new(
                    "poster.png",
                    Some("image/png".to_string()),
                    b"png-bytes".to_vec(),
                )),
            })
            .await
            .unwrap();

        assert_eq!(movie.id, id);
        assert_eq!(
            client.state().message.as_deref(),
            Some("Movie created successfully")
        );
    }

    #[tokio::test]
    async fn test_delete_movie_removes_from_state() {
        let server = MockServer::start().await;
        let mut client = signed_in(&server).await;
        let id = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path("/api/movies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "Movies retrieved successfully",
                "movies": [movie_json(id, "Alien")],
                "currentPage": 1,
                "totalPages": 1,
                "perPage": 10,
                "totalMovies": 1
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(format!("/api/movies/{}", id)))
            .and(header("authorization", "Bearer tok-123"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"message": "Movie deleted successfully"})),
            )
            .mount(&server)
            .await;

        client.fetch_movies(1, 10).await.unwrap();
        client.delete_movie(id).await.unwrap();

        assert!(client.state().movies.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_movie_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
            .mount(&server)
            .await;

        let mut client = MovieApiClient::new(server.uri()).unwrap();
        let err = client.fetch_movie(Uuid::new_v4()).await.unwrap_err();

        match err {
            ClientError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Not Found");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
