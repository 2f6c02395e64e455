//! In-Memory Repositories
//!
//! Process-local stores with the same uniqueness and ordering rules as the
//! PostgreSQL tables. Used by tests and by `STORAGE_BACKEND=memory`.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::connection::Pagination;
use super::repository::{
    MovieFilter, MovieRepository, RepositoryError, RepositoryResult, UserRepository,
};
use crate::models::{Movie, MovieChanges, NewMovie, NewUser, UserWithPassword};

fn matches_filter(movie: &Movie, filter: &MovieFilter) -> bool {
    match &filter.title_contains {
        Some(needle) => movie
            .title
            .to_lowercase()
            .contains(&needle.to_lowercase()),
        None => true,
    }
}

/// In-memory user store
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<Uuid, UserWithPassword>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<UserWithPassword>> {
        let users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create(&self, user: NewUser) -> RepositoryResult<UserWithPassword> {
        let mut users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        if users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(RepositoryError::Conflict("email"));
        }

        let now = Utc::now();
        let record = UserWithPassword {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        users.insert(record.id, record.clone());
        Ok(record)
    }
}

/// In-memory movie store
#[derive(Default)]
pub struct InMemoryMovieRepository {
    movies: Mutex<HashMap<Uuid, Movie>>,
}

impl InMemoryMovieRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MovieRepository for InMemoryMovieRepository {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Movie>> {
        let movies = self.movies.lock().unwrap_or_else(|e| e.into_inner());
        Ok(movies.get(&id).cloned())
    }

    async fn find(&self, filter: &MovieFilter, page: Pagination) -> RepositoryResult<Vec<Movie>> {
        let movies = self.movies.lock().unwrap_or_else(|e| e.into_inner());
        let mut matching: Vec<&Movie> = movies
            .values()
            .filter(|m| matches_filter(m, filter))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(matching
            .into_iter()
            .skip(page.offset.max(0) as usize)
            .take(page.limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &MovieFilter) -> RepositoryResult<u64> {
        let movies = self.movies.lock().unwrap_or_else(|e| e.into_inner());
        Ok(movies.values().filter(|m| matches_filter(m, filter)).count() as u64)
    }

    async fn create(&self, movie: NewMovie) -> RepositoryResult<Movie> {
        let mut movies = self.movies.lock().unwrap_or_else(|e| e.into_inner());
        if movies.values().any(|m| m.title == movie.title) {
            return Err(RepositoryError::Conflict("title"));
        }

        let now = Utc::now();
        let record = Movie {
            id: Uuid::new_v4(),
            title: movie.title,
            year: movie.year,
            poster: movie.poster,
            poster_delete_handle: movie.poster_delete_handle,
            created_at: now,
            updated_at: now,
        };
        movies.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_by_id(
        &self,
        id: Uuid,
        changes: MovieChanges,
    ) -> RepositoryResult<Option<Movie>> {
        let mut movies = self.movies.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(title) = &changes.title {
            if movies.values().any(|m| m.id != id && &m.title == title) {
                return Err(RepositoryError::Conflict("title"));
            }
        }

        let Some(movie) = movies.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            movie.title = title;
        }
        if let Some(year) = changes.year {
            movie.year = year;
        }
        if let Some((poster, handle)) = changes.poster {
            movie.poster = poster;
            movie.poster_delete_handle = handle;
        }
        movie.updated_at = Utc::now();

        Ok(Some(movie.clone()))
    }

    async fn delete_by_id(&self, id: Uuid) -> RepositoryResult<Option<Movie>> {
        let mut movies = self.movies.lock().unwrap_or_else(|e| e.into_inner());
        Ok(movies.remove(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_movie(title: &str) -> NewMovie {
        NewMovie {
            title: title.to_string(),
            year: "2001".to_string(),
            poster: "https://img.example.com/p.webp".to_string(),
            poster_delete_handle: None,
        }
    }

    #[tokio::test]
    async fn test_user_email_conflict_ignores_case() {
        let repo = InMemoryUserRepository::new();
        repo.create(NewUser {
            email: "fan@example.com".to_string(),
            password_hash: "hash".to_string(),
        })
        .await
        .unwrap();

        let err = repo
            .create(NewUser {
                email: "FAN@example.com".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict("email")));
        assert!(repo
            .find_by_email("Fan@Example.COM")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_movie_title_conflict_on_create_and_update() {
        let repo = InMemoryMovieRepository::new();
        repo.create(new_movie("Heat")).await.unwrap();
        let other = repo.create(new_movie("Ronin")).await.unwrap();

        assert!(matches!(
            repo.create(new_movie("Heat")).await,
            Err(RepositoryError::Conflict("title"))
        ));

        let rename = MovieChanges {
            title: Some("Heat".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            repo.update_by_id(other.id, rename).await,
            Err(RepositoryError::Conflict("title"))
        ));

        let same_title = MovieChanges {
            title: Some("Ronin".to_string()),
            ..Default::default()
        };
        assert!(repo.update_by_id(other.id, same_title).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_movie_search_is_case_insensitive_literal() {
        let repo = InMemoryMovieRepository::new();
        for title in ["Star Wars", "Lone Star", "Alien"] {
            repo.create(new_movie(title)).await.unwrap();
        }

        let filter = MovieFilter::title_search("STAR");
        assert_eq!(repo.count(&filter).await.unwrap(), 2);
        assert_eq!(
            repo.count(&MovieFilter::title_search("st.r")).await.unwrap(),
            0
        );
        assert_eq!(repo.count(&MovieFilter::all()).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_movie_paging() {
        let repo = InMemoryMovieRepository::new();
        for i in 0..15 {
            repo.create(new_movie(&format!("Movie {}", i))).await.unwrap();
        }

        let all = MovieFilter::all();
        assert_eq!(repo.find(&all, Pagination::new(1, 10)).await.unwrap().len(), 10);
        assert_eq!(repo.find(&all, Pagination::new(2, 10)).await.unwrap().len(), 5);
        assert!(repo.find(&all, Pagination::new(3, 10)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete_missing() {
        let repo = InMemoryMovieRepository::new();
        let missing = Uuid::new_v4();
        assert!(repo
            .update_by_id(missing, MovieChanges::default())
            .await
            .unwrap()
            .is_none());
        assert!(repo.delete_by_id(missing).await.unwrap().is_none());
    }
}
