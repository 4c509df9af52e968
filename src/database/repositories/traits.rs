//! Common helpers shared across repository implementations, grounded on the
//! teacher's `database/repositories/traits.rs` `ConversionUtils`.

use chrono::Utc;
use std::sync::Arc;

use sea_orm::DatabaseConnection;

/// Base SeaORM repository struct that all repositories extend.
#[derive(Clone)]
pub struct BaseSeaOrmRepository {
    pub connection: Arc<DatabaseConnection>,
}

impl BaseSeaOrmRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }
}

pub fn now() -> chrono::DateTime<Utc> {
    Utc::now()
}
