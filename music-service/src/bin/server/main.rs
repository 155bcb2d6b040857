use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use music_service::config::CacheBackend;
use music_service::config::Config;
use music_service::domain::auth::ports::AuthServicePort;
use music_service::domain::auth::service::AuthService;
use music_service::domain::user::ports::UserServicePort;
use music_service::domain::user::service::UserService;
use music_service::inbound::http::router::cors_layer;
use music_service::inbound::http::router::create_router;
use music_service::inbound::http::router::AppState;
use music_service::outbound::cache::spawn_cleanup_task;
use music_service::outbound::cache::InMemoryTokenCache;
use music_service::outbound::cache::PostgresTokenCache;
use music_service::outbound::repositories::PostgresUserRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "music_service=debug,auth=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "music-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        config = ?config,
        http_port = config.server.http_port,
        cache_backend = ?config.cache.backend,
        environment = ?config.app.environment,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = 5,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let authenticator = Arc::new(Authenticator::new(config.jwt.signing_config()?));
    let user_repository = Arc::new(PostgresUserRepository::new(pg_pool.clone()));

    let user_service: Arc<dyn UserServicePort> =
        Arc::new(UserService::new(Arc::clone(&user_repository)));

    let cleanup_interval = Duration::from_secs(config.cache.cleanup_interval_secs);
    let auth_service: Arc<dyn AuthServicePort> = match config.cache.backend {
        CacheBackend::Postgres => {
            let cache = Arc::new(PostgresTokenCache::new(pg_pool.clone()));
            spawn_cleanup_task(Arc::clone(&cache), cleanup_interval);
            Arc::new(AuthService::new(
                Arc::clone(&user_repository),
                cache,
                Arc::clone(&authenticator),
            ))
        }
        CacheBackend::Memory => {
            tracing::warn!("In-memory token cache: revocations are lost on restart");
            let cache = Arc::new(InMemoryTokenCache::new());
            spawn_cleanup_task(Arc::clone(&cache), cleanup_interval);
            Arc::new(AuthService::new(
                Arc::clone(&user_repository),
                cache,
                Arc::clone(&authenticator),
            ))
        }
    };
    tracing::info!(
        backend = ?config.cache.backend,
        cleanup_interval_secs = config.cache.cleanup_interval_secs,
        "Token cache ready"
    );

    let state = AppState::new(auth_service, user_service)
        .with_internal_errors_exposed(config.app.expose_internal_errors());
    let http_application = create_router(state, cors_layer(&config.app.cors_origin_list()));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    if let Err(e) = axum::serve(http_listener, http_application).await {
        tracing::error!(error = %e, "Server error");
        return Err(e.into());
    }

    tracing::info!("Server exited successfully");
    Ok(())
}
