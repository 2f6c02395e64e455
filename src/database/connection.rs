//! Database Connection Management
//!
//! Utilities for managing PostgreSQL connections with SQLx.

use sqlx::PgPool;
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::models::PageRequest;

/// Database connection pool type alias for convenience
pub type DatabasePool = PgPool;

/// Create a database connection pool from configuration
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
        .max_lifetime(Duration::from_secs(config.max_lifetime_seconds))
        .connect(&config.url)
        .await
}

/// Apply pending schema migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Simple pagination helper for database queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    pub fn new(page: u32, per_page: u32) -> Self {
        let per_page = per_page.clamp(1, 100) as i64;
        let page = page.max(1) as i64;
        let offset = (page - 1) * per_page;

        Self {
            limit: per_page,
            offset,
        }
    }
}

impl From<PageRequest> for Pagination {
    fn from(request: PageRequest) -> Self {
        Self::new(request.page, request.per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_creation() {
        let pagination = Pagination::new(1, 10);
        assert_eq!(pagination.limit, 10);
        assert_eq!(pagination.offset, 0);

        let pagination = Pagination::new(3, 10);
        assert_eq!(pagination.limit, 10);
        assert_eq!(pagination.offset, 20);
    }

    #[test]
    fn test_pagination_clamping() {
        let pagination = Pagination::new(1, 200);
        assert_eq!(pagination.limit, 100);

        let pagination = Pagination::new(0, 10);
        assert_eq!(pagination.offset, 0);

        let pagination = Pagination::new(2, 0);
        assert_eq!(pagination.limit, 1);
        assert_eq!(pagination.offset, 1);
    }

    #[test]
    fn test_from_page_request() {
        let pagination = Pagination::from(PageRequest::new(2, 25));
        assert_eq!(
            pagination,
            Pagination {
                limit: 25,
                offset: 25
            }
        );
    }
}
