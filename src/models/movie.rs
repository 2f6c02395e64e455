//! Movie Model
//!
//! Catalog records and the paginated listing returned by the catalog service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A catalog entry
///
/// `year` is kept as text, the way it is stored. `poster_delete_handle` is
/// present only when the poster lives on a remote image host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[schema(example = "The Shawshank Redemption")]
    pub title: String,
    #[schema(example = "1994")]
    pub year: String,
    /// Poster URL (remote or `data:` URL)
    pub poster: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_delete_handle: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to persist a new movie
#[derive(Debug, Clone)]
pub struct NewMovie {
    pub title: String,
    pub year: String,
    pub poster: String,
    pub poster_delete_handle: Option<String>,
}

/// Partial update of a movie; `None` leaves a column untouched
#[derive(Debug, Clone, Default)]
pub struct MovieChanges {
    pub title: Option<String>,
    pub year: Option<String>,
    /// New poster URL and its handle; both are replaced together
    pub poster: Option<(String, Option<String>)>,
}

/// One page of a listing or search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoviePage {
    pub movies: Vec<Movie>,
    pub current_page: u32,
    pub per_page: u32,
    pub total_pages: u32,
    pub total_movies: u64,
}

impl MoviePage {
    pub fn new(movies: Vec<Movie>, page: u32, per_page: u32, total_movies: u64) -> Self {
        Self {
            movies,
            current_page: page,
            per_page,
            total_pages: total_pages(total_movies, per_page),
            total_movies,
        }
    }
}

/// `ceil(total / per_page)`, zero when there is nothing to page through
pub fn total_pages(total: u64, per_page: u32) -> u32 {
    if per_page == 0 {
        return 0;
    }
    total.div_ceil(per_page as u64) as u32
}
