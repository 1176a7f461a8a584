use anyhow::Result;
use argon2::Params;
use auth_service::{
    controllers::auth::AuthController,
    domain::auth::{AuthService, JwtManager, RefreshTokenGenerator, RefreshTokenHasher},
    infrastructure::{
        config::{Config, Environment, LogFormat},
        http::build_router,
        repositories::RefreshTokenRepository,
    },
};
use axum::Router;
use once_cell::sync::Lazy;
use sqlx::PgPool;
use std::sync::Arc;
use test_context::AsyncTestContext;
use testcontainers::{clients::Cli, Container};
use testcontainers_modules::postgres::Postgres;
use tokio::net::TcpListener;


use api_client::TestClient;
use db_pool::{DatabasePool, PooledDatabase};
use fixtures::TestFixtures;

// Docker client for test containers
static DOCKER: Lazy<Cli> = Lazy::new(Cli::default);

// Shared PostgreSQL container for all tests
static SHARED_CONTAINER: Lazy<SharedContainer> = Lazy::new(SharedContainer::new);

// Global database pool
static DB_POOL: Lazy<DatabasePool> = Lazy::new(|| DatabasePool::new(SHARED_CONTAINER.port));

/// Shared container that lives for the duration of all tests
struct SharedContainer {
    _container: Container<'static, Postgres>,
    port: u16,
}

impl SharedContainer {
    fn new() -> Self {
        let container = DOCKER.run(Postgres::default());
        let port = container.get_host_port_ipv4(5432);

        println!("Started shared PostgreSQL container on port {}", port);

        Self {
            _container: container,
            port,
        }
    }
}

pub struct TestContext {
    pub client: TestClient,
    pub config: Config,
    pub fixtures: TestFixtures,
    _db: PooledDatabase,
}

impl TestContext {
    /// Verifier for access tokens issued by the server under test
    pub fn jwt(&self) -> JwtManager {
        JwtManager::new(self.config.jwt_secret.clone(), self.config.access_token_ttl())
    }
}

impl AsyncTestContext for TestContext {
    fn setup() -> impl std::future::Future<Output = Self> + Send {
        async {
            // Get a database from the shared pool
            let pooled_db = DB_POOL
                .get_database()
                .await
                .expect("Failed to get database from pool");

            let config = Config {
                database_url: pooled_db.database_url.clone(),
                host: "127.0.0.1".to_string(),
                port: 0, // Will be assigned by the OS
                jwt_secret: "test-jwt-secret-key-for-testing-only".to_string(),
                access_token_ttl_seconds: 900,
                refresh_token_expiration_days: 30,
                store_timeout_ms: 5000,
                request_timeout_seconds: 10,
                environment: Environment::Development,
                log_format: LogFormat::Pretty,
            };

            let app = create_app(config.clone(), pooled_db.pool.clone());

            // Start server
            let listener = TcpListener::bind("127.0.0.1:0")
                .await
                .expect("Failed to bind listener");
            let addr = listener.local_addr().expect("Failed to get local addr");
            let base_url = format!("http://{}", addr);

            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });

            // Wait for server to be ready
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

            Self {
                client: TestClient::new(&base_url),
                config,
                fixtures: TestFixtures::new(pooled_db.pool.clone()),
                _db: pooled_db,
            }
        }
    }

    fn teardown(self) -> impl std::future::Future<Output = ()> + Send {
        async {
            // Database cleanup happens automatically via Drop on PooledDatabase
        }
    }
}

fn create_app(config: Config, pool: PgPool) -> Router {
    let pool = Arc::new(pool);

    // Cheap Argon2 parameters keep the suite fast; the schema and flow are unchanged.
    let hasher = RefreshTokenHasher::with_params(
        Params::new(64, 1, 1, None).expect("valid argon2 params"),
    );
    let refresh_token_repo = Arc::new(RefreshTokenRepository::new(
        pool.clone(),
        hasher,
        config.refresh_token_ttl(),
    ));
    let auth_service = Arc::new(AuthService::new(
        refresh_token_repo,
        JwtManager::new(config.jwt_secret.clone(), config.access_token_ttl()),
        RefreshTokenGenerator::default(),
        config.store_timeout(),
    ));
    let auth_controller = Arc::new(AuthController::new(auth_service));

    build_router(pool, auth_controller, config.request_timeout())
}

/// Issue a token pair through the API and return `(access_token, refresh_token)`
pub async fn issue_tokens(ctx: &TestContext, guid: &str) -> Result<(String, String)> {
    let response = ctx
        .client
        .post("/auth", &serde_json::json!({ "guid": guid }))
        .await?;
    response.assert_status(hyper::StatusCode::OK);

    Ok(response.token_pair())
}
