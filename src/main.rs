use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use auth_service::controllers::auth::AuthController;
use auth_service::domain::auth::{AuthService, JwtManager, RefreshTokenGenerator, RefreshTokenHasher};
use auth_service::infrastructure::config::{Config, LogFormat};
use auth_service::infrastructure::db::{check_connection, create_pool, run_migrations};
use auth_service::infrastructure::http::{build_router, start_http_server};
use auth_service::infrastructure::repositories::RefreshTokenRepository;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        environment = ?config.environment,
        "Starting auth service on {}:{}",
        config.host,
        config.port
    );

    // Create database connection pool
    let pool = create_pool(&config.database_url).await?;
    tracing::info!("Database connection pool created");

    // Verify database connection
    check_connection(&pool).await?;
    tracing::info!("Database connection verified");

    run_migrations(&pool).await?;
    tracing::info!("Database migrations applied");

    let pool = Arc::new(pool);
    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Credential store (inject db pool)
    let refresh_token_repo = Arc::new(RefreshTokenRepository::new(
        pool.clone(),
        RefreshTokenHasher::default(),
        config.refresh_token_ttl(),
    ));

    // 2. Rotation service (inject store, signer and generator)
    let auth_service = Arc::new(AuthService::new(
        refresh_token_repo,
        JwtManager::new(config.jwt_secret.clone(), config.access_token_ttl()),
        RefreshTokenGenerator::default(),
        config.store_timeout(),
    ));

    // 3. Controllers (inject services)
    let auth_controller = Arc::new(AuthController::new(auth_service));

    let app = build_router(pool, auth_controller, config.request_timeout());
    start_http_server(config, app).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    let default_filter = if config.is_development() {
        "auth_service=debug,tower_http=debug"
    } else {
        "auth_service=info,tower_http=info"
    };

    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| default_filter.into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| default_filter.into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
