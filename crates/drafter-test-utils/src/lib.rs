//! Shared PostgreSQL harness for drafter integration tests.
//!
//! One server instance is shared across a test binary; every test carves out
//! its own database inside it via [`TestDb::create`].
//!
//! Two modes:
//! - **`DRAFTER_TEST_PG_URL`** set (nextest setup script): point at that
//!   external server directly, no per-process container startup.
//! - **No env var** (`cargo test`): start a container through testcontainers
//!   on first use and keep it alive for the rest of the binary.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use testcontainers::ContainerAsync;
use testcontainers::ImageExt;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use drafter_db::pool;

struct SharedPg {
    base_url: String,
    /// Held so the container outlives the first test. `None` with an
    /// external server.
    _container: Option<ContainerAsync<Postgres>>,
}

static SHARED_PG: OnceCell<SharedPg> = OnceCell::const_new();

async fn init_shared_pg() -> SharedPg {
    if let Ok(url) = std::env::var("DRAFTER_TEST_PG_URL") {
        return SharedPg {
            base_url: url,
            _container: None,
        };
    }

    let container = Postgres::default()
        .with_tag("18")
        .start()
        .await
        .expect("failed to start PostgreSQL container");

    let host = container.get_host().await.expect("failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("failed to get mapped port");

    SharedPg {
        base_url: format!("postgresql://postgres:postgres@{host}:{port}"),
        _container: Some(container),
    }
}

/// Server-root URL of the shared PostgreSQL (no database name appended).
///
/// Starts the container on first call unless `DRAFTER_TEST_PG_URL` is set.
pub async fn pg_url() -> &'static str {
    let shared = SHARED_PG.get_or_init(init_shared_pg).await;
    &shared.base_url
}

async fn maintenance_pool(base_url: &str) -> PgPool {
    PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&format!("{base_url}/postgres"))
        .await
        .expect("failed to connect to maintenance database")
}

/// A throwaway database inside the shared instance, migrations applied.
///
/// Async drop does not exist, so cleanup is explicit: call
/// [`TestDb::teardown`] at the end of the test. A leaked database is
/// harmless, the instance itself is discarded with the container.
pub struct TestDb {
    pub pool: PgPool,
    pub name: String,
}

impl TestDb {
    /// Create a uniquely-named database and run migrations against it.
    pub async fn create() -> Self {
        let base_url = pg_url().await;
        let name = format!("drafter_test_{}", Uuid::new_v4().simple());

        let maint = maintenance_pool(base_url).await;
        maint
            .execute(format!("CREATE DATABASE {name}").as_str())
            .await
            .unwrap_or_else(|e| panic!("failed to create test database {name}: {e}"));
        maint.close().await;

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&format!("{base_url}/{name}"))
            .await
            .unwrap_or_else(|e| panic!("failed to connect to test database {name}: {e}"));

        pool::run_migrations(&pool)
            .await
            .expect("migrations should succeed");

        Self { pool, name }
    }

    /// Close the pool and drop the database, kicking off any connections
    /// still attached to it.
    pub async fn teardown(self) {
        self.pool.close().await;

        let maint = maintenance_pool(pg_url().await).await;
        let terminate = format!(
            "SELECT pg_terminate_backend(pid) \
             FROM pg_stat_activity \
             WHERE datname = '{}' AND pid <> pg_backend_pid()",
            self.name
        );
        let _ = maint.execute(terminate.as_str()).await;
        let _ = maint
            .execute(format!("DROP DATABASE IF EXISTS {}", self.name).as_str())
            .await;
        maint.close().await;
    }
}
