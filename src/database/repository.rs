//! Repository Interfaces
//!
//! Storage-agnostic access to users and movies. PostgreSQL and in-memory
//! implementations live alongside.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::connection::Pagination;
use crate::models::{Movie, MovieChanges, NewMovie, NewUser, UserWithPassword};

/// Errors raised by repository implementations
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// A unique constraint rejected the write; carries the offending field
    #[error("Duplicate value for {0}")]
    Conflict(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Movie listing filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieFilter {
    /// Case-insensitive literal substring of the title; `None` matches all
    pub title_contains: Option<String>,
}

impl MovieFilter {
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter for a search query; a blank query matches everything
    pub fn title_search(query: &str) -> Self {
        let query = query.trim();
        Self {
            title_contains: (!query.is_empty()).then(|| query.to_string()),
        }
    }
}

/// User persistence
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Lookup by email, ignoring case
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<UserWithPassword>>;

    /// Fails with `Conflict("email")` when the email is taken
    async fn create(&self, user: NewUser) -> RepositoryResult<UserWithPassword>;
}

/// Movie persistence
#[async_trait]
pub trait MovieRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Movie>>;

    /// Newest first, ties broken by id
    async fn find(&self, filter: &MovieFilter, page: Pagination) -> RepositoryResult<Vec<Movie>>;

    async fn count(&self, filter: &MovieFilter) -> RepositoryResult<u64>;

    /// Fails with `Conflict("title")` when the title is taken
    async fn create(&self, movie: NewMovie) -> RepositoryResult<Movie>;

    /// Returns `None` when no movie has this id
    async fn update_by_id(&self, id: Uuid, changes: MovieChanges)
        -> RepositoryResult<Option<Movie>>;

    /// Returns the removed movie, or `None` when no movie has this id
    async fn delete_by_id(&self, id: Uuid) -> RepositoryResult<Option<Movie>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_search_filter() {
        assert_eq!(MovieFilter::title_search("   "), MovieFilter::all());
        assert_eq!(
            MovieFilter::title_search(" star "),
            MovieFilter {
                title_contains: Some("star".to_string())
            }
        );
    }
}
