//! Throwaway `PostgreSQL` databases for integration tests.
//!
//! Each test gets its own database, created from the `postgres` maintenance
//! database and dropped again when the test is done.

use std::sync::Arc;

use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Statement};
use sea_orm_migration::MigratorTrait;
use tracing::info;

/// Where the test server lives, read from `TEST_DB_*` variables.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Database the tests run against.
    pub database: String,
}

impl Default for TestDbConfig {
    fn default() -> Self {
        let var = |name: &str, fallback: &str| {
            std::env::var(name).unwrap_or_else(|_| fallback.to_string())
        };

        Self {
            host: var("TEST_DB_HOST", "localhost"),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: var("TEST_DB_USER", "foodgram_test"),
            password: var("TEST_DB_PASSWORD", "foodgram_test"),
            database: var("TEST_DB_NAME", "foodgram_test"),
        }
    }
}

impl TestDbConfig {
    /// URL of the test database itself.
    #[must_use]
    pub fn database_url(&self) -> String {
        self.url_for(&self.database)
    }

    /// URL of the maintenance database used to create and drop test databases.
    #[must_use]
    pub fn postgres_url(&self) -> String {
        self.url_for("postgres")
    }

    fn url_for(&self, database: &str) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{database}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// A connected test database.
pub struct TestDatabase {
    /// Shared handle, ready to pass to repository constructors.
    pub conn: Arc<DatabaseConnection>,
    pub config: TestDbConfig,
}

impl TestDatabase {
    /// Connect to an existing database.
    pub async fn with_config(config: TestDbConfig) -> Result<Self, DbErr> {
        let conn = Database::connect(&config.database_url()).await?;
        info!(database = %config.database, "Connected to test database");

        Ok(Self {
            conn: Arc::new(conn),
            config,
        })
    }

    /// Create a fresh, empty database with a random name.
    pub async fn create_unique() -> Result<Self, DbErr> {
        let mut config = TestDbConfig::default();
        config.database = format!("foodgram_test_{}", uuid::Uuid::new_v4().simple());

        run_on_postgres(
            &config,
            &[format!("CREATE DATABASE \"{}\"", config.database)],
        )
        .await?;
        info!(database = %config.database, "Created test database");

        Self::with_config(config).await
    }

    /// Create a fresh database with all migrations applied.
    pub async fn create_migrated() -> Result<Self, DbErr> {
        let db = Self::create_unique().await?;
        crate::migrations::Migrator::up(db.conn.as_ref(), None).await?;
        Ok(db)
    }

    /// Drop the database, disconnecting any sessions still attached to it.
    ///
    /// Repositories may still hold clones of `conn`; their sessions are
    /// terminated server-side.
    pub async fn drop_database(self) -> Result<(), DbErr> {
        let name = self.config.database.clone();
        drop(self.conn);

        run_on_postgres(
            &self.config,
            &[
                format!(
                    "SELECT pg_terminate_backend(pid) FROM pg_stat_activity \
                     WHERE datname = '{name}' AND pid <> pg_backend_pid()"
                ),
                format!("DROP DATABASE IF EXISTS \"{name}\""),
            ],
        )
        .await?;

        info!(database = %name, "Dropped test database");
        Ok(())
    }
}

async fn run_on_postgres(config: &TestDbConfig, statements: &[String]) -> Result<(), DbErr> {
    let conn = Database::connect(&config.postgres_url()).await?;
    for sql in statements {
        conn.execute(Statement::from_string(DatabaseBackend::Postgres, sql.clone()))
            .await?;
    }
    conn.close().await
}
