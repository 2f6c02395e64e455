//! Database Module
//!
//! Connection management and the user/movie repositories.

pub mod connection;
pub mod memory;
pub mod postgres;
pub mod repository;

// Re-export commonly used types
pub use connection::{create_pool, run_migrations, DatabasePool, Pagination};
pub use memory::{InMemoryMovieRepository, InMemoryUserRepository};
pub use postgres::{PgMovieRepository, PgUserRepository};
pub use repository::{
    MovieFilter, MovieRepository, RepositoryError, RepositoryResult, UserRepository,
};
