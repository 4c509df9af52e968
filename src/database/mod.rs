//! SeaORM-based persistence layer (spec §4.1, "Store").
//!
//! Opens a single embedded database (SQLite by default), applies migrations
//! exactly once, runs additive back-fills for any column missing from a
//! pre-existing installation, and exposes transactional helpers plus the
//! flat read projections the Generator consumes.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use sea_orm::{ConnectOptions, Database as SeaOrmDatabase, DatabaseConnection, DatabaseTransaction, TransactionTrait};
use sea_orm_migration::MigratorTrait;
use tracing::{info, warn};

use crate::config::DatabaseConfig;
use crate::errors::{AppError, RepositoryError};

pub mod backfill;
pub mod maintenance;
pub mod migrations;
pub mod repositories;

pub use repositories::{MiddlewareRepository, ResourceRepository, ServiceRepository};

/// Database connection manager. A single `DatabaseConnection` is shared by
/// all repositories; SQLite's WAL mode serializes writers internally so no
/// additional application-level locking is required (spec §5).
#[derive(Clone)]
pub struct Store {
    pub connection: Arc<DatabaseConnection>,
    pub middlewares: MiddlewareRepository,
    pub services: ServiceRepository,
    pub resources: ResourceRepository,
}

impl Store {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let mut options = ConnectOptions::new(config.url.clone());
        options
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(5))
            .acquire_timeout(Duration::from_secs(config.busy_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .sqlx_logging(false);

        info!("connecting to store at {}", redact_url(&config.url));
        let connection = SeaOrmDatabase::connect(options).await?;

        if connection.get_database_backend() == sea_orm::DatabaseBackend::Sqlite {
            apply_sqlite_pragmas(&connection, config).await?;
        }

        migrations::Migrator::up(&connection, None).await?;

        let connection = Arc::new(connection);

        if let Err(err) = backfill::run(&connection).await {
            warn!("post-migration back-fill failed (best-effort, continuing): {err}");
        }

        Ok(Self {
            middlewares: MiddlewareRepository::new(connection.clone()),
            services: ServiceRepository::new(connection.clone()),
            resources: ResourceRepository::new(connection.clone()),
            connection,
        })
    }

    /// Runs `callback` inside a transaction; commits on `Ok`, rolls back on
    /// `Err` or on a panic unwinding through it (spec §4.1 `WithTransaction`).
    /// Thin wrapper over SeaORM's own `TransactionTrait::transaction`, which
    /// already implements exactly this commit/rollback discipline.
    pub async fn with_transaction<F, T>(&self, callback: F) -> Result<T, AppError>
    where
        F: for<'c> FnOnce(
                &'c DatabaseTransaction,
            ) -> std::pin::Pin<Box<dyn Future<Output = Result<T, AppError>> + Send + 'c>>
            + Send,
        T: Send,
    {
        self.connection
            .transaction::<_, T, AppError>(callback)
            .await
            .map_err(|err| match err {
                sea_orm::TransactionError::Connection(db_err) => AppError::Database(db_err),
                sea_orm::TransactionError::Transaction(app_err) => app_err,
            })
    }

    /// Same as `with_transaction` but abandons the transaction if `deadline`
    /// elapses before `callback` finishes (spec §4.1 `WithTimeoutTransaction`).
    /// On timeout the transaction future is dropped; rollback is therefore
    /// best-effort, matching the spec's documented semantics.
    pub async fn with_timeout_transaction<F, T>(
        &self,
        deadline: Duration,
        callback: F,
    ) -> Result<T, AppError>
    where
        F: for<'c> FnOnce(
                &'c DatabaseTransaction,
            ) -> std::pin::Pin<Box<dyn Future<Output = Result<T, AppError>> + Send + 'c>>
            + Send,
        T: Send,
    {
        match tokio::time::timeout(deadline, self.with_transaction(callback)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Repository(RepositoryError::TransactionTimeout {
                millis: deadline.as_millis() as u64,
            })),
        }
    }

    /// Runs each operation in `ops` in sequence inside one transaction;
    /// aborts (rolling back everything) on the first failing operation
    /// (spec §4.1 `BatchTransaction`).
    pub async fn batch_transaction<F>(&self, ops: Vec<F>) -> Result<(), AppError>
    where
        F: for<'c> FnOnce(
                &'c DatabaseTransaction,
            )
                -> std::pin::Pin<Box<dyn Future<Output = Result<(), AppError>> + Send + 'c>>
            + Send
            + 'static,
    {
        self.with_transaction(move |txn| {
            Box::pin(async move {
                for op in ops {
                    op(txn).await?;
                }
                Ok(())
            })
        })
        .await
    }
}

async fn apply_sqlite_pragmas(
    connection: &DatabaseConnection,
    config: &DatabaseConfig,
) -> Result<(), AppError> {
    use sea_orm::ConnectionTrait;
    connection
        .execute_unprepared("PRAGMA journal_mode=WAL;")
        .await?;
    connection
        .execute_unprepared(&format!(
            "PRAGMA busy_timeout={};",
            config.busy_timeout_secs * 1000
        ))
        .await?;
    connection
        .execute_unprepared("PRAGMA foreign_keys=ON;")
        .await?;
    Ok(())
}

fn redact_url(url: &str) -> String {
    match url.find('@') {
        Some(_) => "<redacted>".to_string(),
        None => url.to_string(),
    }
}
