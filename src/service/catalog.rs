//! Catalog Service Implementation
//!
//! Movie CRUD and search over the movie repository, with posters kept on the
//! image host and reads served through the result cache.
//!
//! Single movies are cached under `movie:{id}`. Listing and search pages are
//! cached under keys that embed a listing generation; every write bumps the
//! generation, so pages cached before the write are never served after it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::cache::CacheStore;
use crate::config::CacheConfig;
use crate::database::{MovieFilter, MovieRepository, Pagination, RepositoryError};
use crate::models::{Movie, MovieChanges, MovieFields, MoviePage, NewMovie, PageRequest};
use crate::service::image_host::{ImageHost, ImageHostError, ImageUpload};
use crate::utils::{error::AppError, validation::messages};

/// Custom error types for the catalog service
#[derive(Error, Debug)]
pub enum CatalogServiceError {
    #[error("Movie not found")]
    MovieNotFound,

    #[error("Poster image is required")]
    PosterRequired,

    #[error("A movie with this title already exists")]
    TitleAlreadyExists,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Image(#[from] ImageHostError),

    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for CatalogServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(_) => CatalogServiceError::TitleAlreadyExists,
            other => CatalogServiceError::Repository(other),
        }
    }
}

impl From<CatalogServiceError> for AppError {
    fn from(err: CatalogServiceError) -> Self {
        match err {
            CatalogServiceError::MovieNotFound => AppError::NotFound(err.to_string()),
            CatalogServiceError::PosterRequired => {
                AppError::Validation(messages::POSTER_REQUIRED.to_string())
            }
            CatalogServiceError::TitleAlreadyExists => AppError::Conflict(err.to_string()),
            CatalogServiceError::ValidationError(msg) => AppError::Validation(msg),
            CatalogServiceError::Image(e) => e.into(),
            CatalogServiceError::Repository(RepositoryError::Database(e)) => AppError::Database(e),
            CatalogServiceError::Repository(e) => AppError::Internal(e.to_string()),
        }
    }
}

/// Result type for catalog service operations
pub type CatalogServiceResult<T> = Result<T, CatalogServiceError>;

/// Cache lifetimes and the poster folder
#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub movie_ttl: Duration,
    pub list_ttl: Duration,
    pub poster_folder: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            movie_ttl: Duration::from_secs(300),
            list_ttl: Duration::from_secs(120),
            poster_folder: "movies".to_string(),
        }
    }
}

impl CatalogSettings {
    pub fn from_cache_config(cache: &CacheConfig, poster_folder: impl Into<String>) -> Self {
        Self {
            movie_ttl: cache.movie_ttl,
            list_ttl: cache.list_ttl,
            poster_folder: poster_folder.into(),
        }
    }
}

/// Movie ids arrive as path text; anything that is not a UUID cannot exist
pub fn parse_movie_id(raw: &str) -> CatalogServiceResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| CatalogServiceError::MovieNotFound)
}

fn movie_key(id: Uuid) -> String {
    format!("movie:{}", id)
}

/// Catalog operations
pub struct CatalogService {
    movies: Arc<dyn MovieRepository>,
    images: Arc<dyn ImageHost>,
    cache: Arc<dyn CacheStore>,
    settings: CatalogSettings,
    list_generation: AtomicU64,
}

impl CatalogService {
    pub fn new(
        movies: Arc<dyn MovieRepository>,
        images: Arc<dyn ImageHost>,
        cache: Arc<dyn CacheStore>,
        settings: CatalogSettings,
    ) -> Self {
        Self {
            movies,
            images,
            cache,
            settings,
            list_generation: AtomicU64::new(0),
        }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Fetch a single movie, read-through `movie:{id}`
    pub async fn get_by_id(&self, id: Uuid) -> CatalogServiceResult<Movie> {
        let key = movie_key(id);
        if let Some(movie) = self.cached::<Movie>(&key).await {
            return Ok(movie);
        }

        let movie = self
            .movies
            .find_by_id(id)
            .await?
            .ok_or(CatalogServiceError::MovieNotFound)?;

        self.remember(&key, &movie, self.settings.movie_ttl).await;
        Ok(movie)
    }

    /// Newest-first page of every movie
    pub async fn list(&self, page: PageRequest) -> CatalogServiceResult<MoviePage> {
        let key = format!(
            "movies:list:g{}:p{}:n{}",
            self.generation(),
            page.page,
            page.per_page
        );
        self.page_through(&key, &MovieFilter::all(), page).await
    }

    /// Newest-first page of movies whose title contains `query`, ignoring case
    pub async fn search(&self, query: &str, page: PageRequest) -> CatalogServiceResult<MoviePage> {
        let filter = MovieFilter::title_search(query);
        let normalized = filter
            .title_contains
            .as_deref()
            .unwrap_or_default()
            .to_lowercase();
        // Query goes last so it cannot collide with the other key parts
        let key = format!(
            "movies:search:g{}:p{}:n{}:q={}",
            self.generation(),
            page.page,
            page.per_page,
            normalized
        );
        self.page_through(&key, &filter, page).await
    }

    async fn page_through(
        &self,
        key: &str,
        filter: &MovieFilter,
        page: PageRequest,
    ) -> CatalogServiceResult<MoviePage> {
        if let Some(cached) = self.cached::<MoviePage>(key).await {
            return Ok(cached);
        }

        let total = self.movies.count(filter).await?;
        let movies = self.movies.find(filter, Pagination::from(page)).await?;
        let result = MoviePage::new(movies, page.page, page.per_page, total);

        self.remember(key, &result, self.settings.list_ttl).await;
        Ok(result)
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Upload the poster, then persist the movie
    pub async fn create(
        &self,
        fields: MovieFields,
        poster: Option<ImageUpload>,
    ) -> CatalogServiceResult<Movie> {
        let poster = poster.ok_or(CatalogServiceError::PosterRequired)?;
        let (title, year) = fields
            .validate_complete()
            .map_err(CatalogServiceError::ValidationError)?;

        let uploaded = self
            .images
            .upload(poster, &self.settings.poster_folder)
            .await?;

        let created = self
            .movies
            .create(NewMovie {
                title,
                year,
                poster: uploaded.url,
                poster_delete_handle: uploaded.delete_handle.clone(),
            })
            .await;

        let movie = match created {
            Ok(movie) => movie,
            Err(e) => {
                self.release_poster(uploaded.delete_handle.as_deref()).await;
                return Err(e.into());
            }
        };

        self.invalidate_listings();
        log::info!("Created movie {} ({})", movie.id, movie.title);
        Ok(movie)
    }

    /// Apply supplied fields; a new poster replaces the old one only once stored
    pub async fn update(
        &self,
        id: Uuid,
        fields: MovieFields,
        poster: Option<ImageUpload>,
    ) -> CatalogServiceResult<Movie> {
        let valid = fields
            .validate_present()
            .map_err(CatalogServiceError::ValidationError)?;

        let existing = self
            .movies
            .find_by_id(id)
            .await?
            .ok_or(CatalogServiceError::MovieNotFound)?;

        let uploaded = match poster {
            Some(image) => Some(
                self.images
                    .upload(image, &self.settings.poster_folder)
                    .await?,
            ),
            None => None,
        };
        let new_handle = uploaded.as_ref().and_then(|u| u.delete_handle.clone());

        let changes = MovieChanges {
            title: valid.title,
            year: valid.year,
            poster: uploaded.map(|u| (u.url, u.delete_handle)),
        };
        let replaced_poster = changes.poster.is_some();

        let updated = match self.movies.update_by_id(id, changes).await {
            Ok(Some(movie)) => movie,
            Ok(None) => {
                self.release_poster(new_handle.as_deref()).await;
                return Err(CatalogServiceError::MovieNotFound);
            }
            Err(e) => {
                self.release_poster(new_handle.as_deref()).await;
                return Err(e.into());
            }
        };

        self.cache.delete(&movie_key(id)).await;
        self.invalidate_listings();

        if replaced_poster && existing.poster_delete_handle != new_handle {
            self.release_poster(existing.poster_delete_handle.as_deref())
                .await;
        }

        log::info!("Updated movie {}", id);
        Ok(updated)
    }

    /// Remove the movie, then its poster
    pub async fn delete(&self, id: Uuid) -> CatalogServiceResult<()> {
        let removed = self
            .movies
            .delete_by_id(id)
            .await?
            .ok_or(CatalogServiceError::MovieNotFound)?;

        self.cache.delete(&movie_key(id)).await;
        self.invalidate_listings();
        self.release_poster(removed.poster_delete_handle.as_deref())
            .await;

        log::info!("Deleted movie {}", id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn generation(&self) -> u64 {
        self.list_generation.load(Ordering::Acquire)
    }

    fn invalidate_listings(&self) {
        self.list_generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Best-effort poster cleanup; failures are logged, never returned
    async fn release_poster(&self, handle: Option<&str>) {
        let Some(handle) = handle else {
            return;
        };
        if let Err(e) = self.images.delete(handle).await {
            log::warn!("Failed to delete poster image {}: {}", handle, e);
        }
    }

    async fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.cache.get(key).await?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                log::debug!("cache hit {}", key);
                Some(value)
            }
            Err(e) => {
                log::warn!("Discarding undecodable cache entry {}: {}", key, e);
                self.cache.delete(key).await;
                None
            }
        }
    }

    async fn remember<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.cache.set(key, bytes, ttl).await,
            Err(e) => log::warn!("Skipping cache write for {}: {}", key, e),
        }
    }
}
