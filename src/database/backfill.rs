//! Additive, idempotent column back-fills run once after migrations
//! (spec §4.1: "upgrades never require operator intervention").
//!
//! Each entry names a table, a column, and the `ALTER TABLE ... ADD COLUMN`
//! to run if that column is absent from the catalog. Failures here are
//! logged and swallowed (spec §7: "best-effort; a back-fill failure is
//! logged but does not abort startup").

use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, Statement};
use tracing::{debug, warn};

struct BackfillColumn {
    table: &'static str,
    column: &'static str,
    add_column_sql: &'static str,
}

const BACKFILLS: &[BackfillColumn] = &[
    BackfillColumn {
        table: "services",
        column: "protocol_hint",
        add_column_sql: "ALTER TABLE services ADD COLUMN protocol_hint TEXT",
    },
    // Pre-existing rows predate the operator/upstream distinction; they
    // default to "operator" so the Generator keeps emitting them rather
    // than silently dropping service definitions on upgrade.
    BackfillColumn {
        table: "services",
        column: "origin",
        add_column_sql: "ALTER TABLE services ADD COLUMN origin TEXT NOT NULL DEFAULT 'operator'",
    },
];

pub async fn run(connection: &DatabaseConnection) -> Result<(), sea_orm::DbErr> {
    for backfill in BACKFILLS {
        match column_exists(connection, backfill.table, backfill.column).await {
            Ok(true) => debug!(
                "back-fill: {}.{} already present, skipping",
                backfill.table, backfill.column
            ),
            Ok(false) => {
                debug!(
                    "back-fill: adding {}.{} to existing installation",
                    backfill.table, backfill.column
                );
                if let Err(err) = connection
                    .execute_unprepared(backfill.add_column_sql)
                    .await
                {
                    warn!(
                        "back-fill of {}.{} failed: {err} (continuing)",
                        backfill.table, backfill.column
                    );
                }
            }
            Err(err) => {
                warn!(
                    "back-fill introspection of {}.{} failed: {err} (continuing)",
                    backfill.table, backfill.column
                );
            }
        }
    }
    Ok(())
}

async fn column_exists(
    connection: &DatabaseConnection,
    table: &str,
    column: &str,
) -> Result<bool, sea_orm::DbErr> {
    match connection.get_database_backend() {
        DbBackend::Sqlite => {
            let rows = connection
                .query_all(Statement::from_string(
                    DbBackend::Sqlite,
                    format!("PRAGMA table_info({table})"),
                ))
                .await?;
            Ok(rows.iter().any(|row| {
                row.try_get::<String>("", "name")
                    .map(|name| name == column)
                    .unwrap_or(false)
            }))
        }
        backend => {
            let rows = connection
                .query_all(Statement::from_sql_and_values(
                    backend,
                    "SELECT column_name FROM information_schema.columns WHERE table_name = $1 AND column_name = $2",
                    [table.into(), column.into()],
                ))
                .await?;
            Ok(!rows.is_empty())
        }
    }
}
