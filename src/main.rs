//! Movie Service Server
//!
//! Loads configuration from the environment, wires the stores, image host,
//! cache and services together, and serves the catalog API.

use std::net::SocketAddr;
use std::sync::Arc;

use dotenv::dotenv;

use movie_service::{
    api::{create_app, AppState},
    cache::LocalCache,
    config::{AppConfig, StorageBackend},
    database::{
        create_pool, run_migrations, InMemoryMovieRepository, InMemoryUserRepository,
        MovieRepository, PgMovieRepository, PgUserRepository, UserRepository,
    },
    service::{
        AuthService, CatalogService, CatalogSettings, CloudinaryImageHost, ImageHost,
        InlineImageHost, JwtService,
    },
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv().ok();

    env_logger::init();

    log::info!("Starting Movie Service v{}", movie_service::VERSION);

    let config = AppConfig::from_env()?;
    config.validate()?;

    log::info!("Configuration loaded and validated");

    // Stores
    let (users, movies): (Arc<dyn UserRepository>, Arc<dyn MovieRepository>) =
        match (&config.storage, &config.database) {
            (StorageBackend::Postgres, Some(db_config)) => {
                let pool = create_pool(db_config).await?;

                log::info!("Running database migrations...");
                run_migrations(&pool).await?;
                log::info!("Database migrations completed");

                (
                    Arc::new(PgUserRepository::new(pool.clone())) as Arc<dyn UserRepository>,
                    Arc::new(PgMovieRepository::new(pool)) as Arc<dyn MovieRepository>,
                )
            }
            _ => {
                log::warn!("Using in-memory storage; data is lost on restart");
                (
                    Arc::new(InMemoryUserRepository::new()) as Arc<dyn UserRepository>,
                    Arc::new(InMemoryMovieRepository::new()) as Arc<dyn MovieRepository>,
                )
            }
        };

    // Image host
    let (images, poster_folder): (Arc<dyn ImageHost>, String) = match &config.cloudinary {
        Some(cloudinary) => {
            log::info!("Posters are stored on Cloudinary ({})", cloudinary.cloud_name);
            let folder = cloudinary.folder.clone();
            (
                Arc::new(CloudinaryImageHost::new(
                    cloudinary.clone(),
                    config.upload.max_bytes,
                )?) as Arc<dyn ImageHost>,
                folder,
            )
        }
        None => {
            log::warn!("Cloudinary not configured; posters are stored inline as data URLs");
            (
                Arc::new(InlineImageHost::new(config.upload.max_bytes)) as Arc<dyn ImageHost>,
                "movies".to_string(),
            )
        }
    };

    let cache = Arc::new(LocalCache::new(config.cache.max_entries));

    let jwt_service = Arc::new(JwtService::with_expiration(
        config.jwt.secret.clone(),
        chrono::Duration::hours(config.jwt.expires_hours),
    ));
    let auth_service = Arc::new(AuthService::with_bcrypt_cost(
        users,
        jwt_service.clone(),
        config.jwt.bcrypt_cost,
    ));
    let catalog_service = Arc::new(CatalogService::new(
        movies,
        images,
        cache,
        CatalogSettings::from_cache_config(&config.cache, poster_folder),
    ));

    log::info!("Services initialized");
    log::info!(
        "   - Cache: {} entries, movie TTL {}s, list TTL {}s",
        config.cache.max_entries,
        config.cache.movie_ttl.as_secs(),
        config.cache.list_ttl.as_secs()
    );
    log::info!(
        "   - Rate limit: {} requests per {}s",
        config.rate_limit.max_requests,
        config.rate_limit.window.as_secs()
    );

    let app_state = AppState {
        auth_service,
        catalog_service,
        jwt_service,
        max_upload_bytes: config.upload.max_bytes,
    };

    let app = create_app(app_state, &config.server, &config.rate_limit);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    log::info!(
        "Listening on {} with API prefix '{}'",
        bind_addr,
        config.server.api_prefix
    );

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
