//! PostgreSQL Repositories
//!
//! SQLx-backed implementations of the user and movie repositories.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::connection::Pagination;
use super::repository::{
    MovieFilter, MovieRepository, RepositoryError, RepositoryResult, UserRepository,
};
use crate::models::{Movie, MovieChanges, NewMovie, NewUser, UserWithPassword};

const USER_COLUMNS: &str = "id, email, password_hash, created_at, updated_at";
const MOVIE_COLUMNS: &str = "id, title, year, poster, poster_delete_handle, created_at, updated_at";

/// Maps unique violations onto `Conflict`, naming the field by constraint
fn map_write_error(err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::Database(db_err) => match db_err.constraint() {
            Some("users_email_key") => RepositoryError::Conflict("email"),
            Some("movies_title_key") => RepositoryError::Conflict("title"),
            _ => RepositoryError::Database(sqlx::Error::Database(db_err)),
        },
        e => RepositoryError::Database(e),
    }
}

/// `ILIKE` pattern matching `needle` literally anywhere in the value
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn title_pattern(filter: &MovieFilter) -> Option<String> {
    filter.title_contains.as_deref().map(contains_pattern)
}

/// User repository backed by the `users` table
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<UserWithPassword>> {
        let sql = format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, UserWithPassword>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create(&self, user: NewUser) -> RepositoryResult<UserWithPassword> {
        let sql = format!(
            "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, UserWithPassword>(&sql)
            .bind(&user.email)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }
}

/// Movie repository backed by the `movies` table
#[derive(Clone)]
pub struct PgMovieRepository {
    pool: PgPool,
}

impl PgMovieRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MovieRepository for PgMovieRepository {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Movie>> {
        let sql = format!("SELECT {} FROM movies WHERE id = $1", MOVIE_COLUMNS);
        let movie = sqlx::query_as::<_, Movie>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(movie)
    }

    async fn find(&self, filter: &MovieFilter, page: Pagination) -> RepositoryResult<Vec<Movie>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM movies
            WHERE ($1::text IS NULL OR title ILIKE $1 ESCAPE '\')
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
            MOVIE_COLUMNS
        );
        let movies = sqlx::query_as::<_, Movie>(&sql)
            .bind(title_pattern(filter))
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(movies)
    }

    async fn count(&self, filter: &MovieFilter) -> RepositoryResult<u64> {
        let total: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM movies WHERE ($1::text IS NULL OR title ILIKE $1 ESCAPE '\')"#,
        )
        .bind(title_pattern(filter))
        .fetch_one(&self.pool)
        .await?;
        Ok(total.max(0) as u64)
    }

    async fn create(&self, movie: NewMovie) -> RepositoryResult<Movie> {
        let sql = format!(
            r#"
            INSERT INTO movies (title, year, poster, poster_delete_handle)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            MOVIE_COLUMNS
        );
        sqlx::query_as::<_, Movie>(&sql)
            .bind(&movie.title)
            .bind(&movie.year)
            .bind(&movie.poster)
            .bind(&movie.poster_delete_handle)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn update_by_id(
        &self,
        id: Uuid,
        changes: MovieChanges,
    ) -> RepositoryResult<Option<Movie>> {
        let replace_poster = changes.poster.is_some();
        let (poster, handle) = match changes.poster {
            Some((url, handle)) => (Some(url), handle),
            None => (None, None),
        };

        let sql = format!(
            r#"
            UPDATE movies
            SET title = COALESCE($2, title),
                year = COALESCE($3, year),
                poster = CASE WHEN $4 THEN $5 ELSE poster END,
                poster_delete_handle = CASE WHEN $4 THEN $6 ELSE poster_delete_handle END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            MOVIE_COLUMNS
        );
        sqlx::query_as::<_, Movie>(&sql)
            .bind(id)
            .bind(&changes.title)
            .bind(&changes.year)
            .bind(replace_poster)
            .bind(poster)
            .bind(handle)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn delete_by_id(&self, id: Uuid) -> RepositoryResult<Option<Movie>> {
        let sql = format!("DELETE FROM movies WHERE id = $1 RETURNING {}", MOVIE_COLUMNS);
        let movie = sqlx::query_as::<_, Movie>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(movie)
    }
}
