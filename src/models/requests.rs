//! Request and Response Models
//!
//! Data structures for API request and response payloads with validation.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::movie::{Movie, MoviePage};
use super::user::User;
use crate::utils::validation::messages;

/// Default page size for listings and searches
pub const DEFAULT_PER_PAGE: u32 = 10;

/// Largest accepted page size
pub const MAX_PER_PAGE: u32 = 100;

/// Credentials payload shared by sign-up and sign-in
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CredentialsRequest {
    /// User's email address
    #[validate(email(message = "Please provide a valid email address"))]
    #[schema(example = "user@example.com")]
    pub email: String,

    /// User's password (8-128 characters)
    #[schema(example = "password123", min_length = 8, max_length = 128)]
    #[validate(length(
        min = 8,
        max = 128,
        message = "Password must be between 8 and 128 characters"
    ))]
    pub password: String,
}

pub type SignUpRequest = CredentialsRequest;
pub type SignInRequest = CredentialsRequest;

/// Response for user creation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignUpResponse {
    pub message: String,
    #[serde(rename = "userFound")]
    pub user: User,
}

/// Response for a successful sign-in
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignInResponse {
    pub message: String,
    pub token: String,
}

/// Response carrying only a message
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response carrying a single movie
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MovieResponse {
    pub message: String,
    pub movie: Movie,
}

/// Paginated listing or search response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovieListResponse {
    pub message: String,
    pub movies: Vec<Movie>,
    pub current_page: u32,
    pub total_pages: u32,
    pub per_page: u32,
    pub total_movies: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl MovieListResponse {
    pub fn from_page(message: &str, page: MoviePage, query: Option<String>) -> Self {
        Self {
            message: message.to_string(),
            movies: page.movies,
            current_page: page.current_page,
            total_pages: page.total_pages,
            per_page: page.per_page,
            total_movies: page.total_movies,
            query,
        }
    }
}

/// Raw listing/search query string
///
/// Values are kept as text so that unparseable numbers fall back to defaults
/// instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// 1-based page number, default 1
    pub page: Option<String>,
    /// Page size, default 10, at most 100
    #[serde(rename = "perPage")]
    pub per_page: Option<String>,
    /// Case-insensitive title fragment (search only)
    pub q: Option<String>,
}

/// Normalized page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    /// Clamps `page` to at least 1 and `per_page` to `1..=100`
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: page.clamp(1, u32::MAX as i64) as u32,
            per_page: per_page.clamp(1, MAX_PER_PAGE as i64) as u32,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl ListQuery {
    pub fn page_request(&self) -> PageRequest {
        let parse = |raw: &Option<String>, default: u32| {
            raw.as_deref()
                .and_then(|v| v.trim().parse::<i64>().ok())
                .unwrap_or(default as i64)
        };

        PageRequest::new(parse(&self.page, 1), parse(&self.per_page, DEFAULT_PER_PAGE))
    }

    /// Search text, empty when absent
    pub fn search_text(&self) -> String {
        self.q.as_deref().unwrap_or_default().trim().to_string()
    }
}

/// Movie form fields as received from a multipart body
#[derive(Debug, Clone, Default)]
pub struct MovieFields {
    pub title: Option<String>,
    pub year: Option<String>,
}

/// Movie fields after validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidMovieFields {
    pub title: Option<String>,
    pub year: Option<String>,
}

impl MovieFields {
    /// Validates whichever fields are present
    pub fn validate_present(&self) -> Result<ValidMovieFields, String> {
        let title = self
            .title
            .as_deref()
            .map(crate::utils::normalize_title)
            .transpose()?;
        let year = self
            .year
            .as_deref()
            .map(crate::utils::parse_release_year)
            .transpose()?
            .map(|year| year.to_string());

        Ok(ValidMovieFields { title, year })
    }

    /// Validates the fields and requires both to be present
    pub fn validate_complete(&self) -> Result<(String, String), String> {
        let valid = self.validate_present()?;
        let title = valid
            .title
            .ok_or_else(|| messages::TITLE_REQUIRED.to_string())?;
        let year = valid.year.ok_or_else(|| messages::INVALID_YEAR.to_string())?;
        Ok((title, year))
    }
}
