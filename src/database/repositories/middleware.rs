//! SeaORM-based Middleware repository (spec §3, §4.1).

use std::sync::Arc;

use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use tracing::warn;
use uuid::Uuid;

use crate::entities::{middlewares, prelude::Middlewares};
use crate::errors::AppError;
use crate::models::Middleware;

use super::traits::{now, BaseSeaOrmRepository};

#[derive(Clone)]
pub struct MiddlewareRepository {
    base: BaseSeaOrmRepository,
}

impl MiddlewareRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseSeaOrmRepository::new(connection),
        }
    }

    pub async fn create(
        &self,
        name: String,
        r#type: String,
        config: serde_json::Value,
    ) -> Result<Middleware, AppError> {
        let now = now();
        let active = middlewares::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            r#type: Set(r#type),
            config: Set(config.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let model = active.insert(&*self.base.connection).await?;
        Ok(to_domain(model))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Middleware>, AppError> {
        let model = Middlewares::find_by_id(id)
            .one(&*self.base.connection)
            .await?;
        Ok(model.map(to_domain))
    }

    pub async fn update(
        &self,
        id: Uuid,
        name: Option<String>,
        config: Option<serde_json::Value>,
    ) -> Result<Middleware, AppError> {
        let model = Middlewares::find_by_id(id)
            .one(&*self.base.connection)
            .await?
            .ok_or_else(|| AppError::not_found("middleware", id.to_string()))?;
        let mut active: middlewares::ActiveModel = model.into();
        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(config) = config {
            active.config = Set(config.to_string());
        }
        active.updated_at = Set(now());
        let model = active.update(&*self.base.connection).await?;
        Ok(to_domain(model))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        Middlewares::delete_by_id(id)
            .exec(&*self.base.connection)
            .await?;
        Ok(())
    }

    /// `GetMiddlewares()` (spec §4.1): parsed JSON `config`s, falling back to
    /// the raw string if parsing fails.
    pub async fn get_all(&self) -> Result<Vec<Middleware>, AppError> {
        let models = Middlewares::find().all(&*self.base.connection).await?;
        Ok(models.into_iter().map(to_domain).collect())
    }
}

fn to_domain(model: middlewares::Model) -> Middleware {
    let config = serde_json::from_str(&model.config).unwrap_or_else(|err| {
        warn!(
            "middleware {} has malformed config JSON, falling back to raw string: {err}",
            model.id
        );
        serde_json::Value::String(model.config.clone())
    });
    Middleware {
        id: model.id,
        name: model.name,
        r#type: model.r#type,
        config,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::migrations::Migrator;
    use sea_orm_migration::MigratorTrait;
    use serde_json::json;

    async fn test_repo() -> MiddlewareRepository {
        let connection = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&connection, None).await.unwrap();
        MiddlewareRepository::new(Arc::new(connection))
    }

    #[tokio::test]
    async fn create_then_find_round_trips_config() {
        let repo = test_repo().await;
        let created = repo
            .create("auth".to_string(), "basicAuth".to_string(), json!({"users": ["a:b"]}))
            .await
            .unwrap();

        let found = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found.name, "auth");
        assert_eq!(found.config, json!({"users": ["a:b"]}));
    }

    #[tokio::test]
    async fn update_applies_only_supplied_fields() {
        let repo = test_repo().await;
        let created = repo
            .create("rl".to_string(), "rateLimit".to_string(), json!({"average": 10}))
            .await
            .unwrap();

        let updated = repo
            .update(created.id, None, Some(json!({"average": 20})))
            .await
            .unwrap();
        assert_eq!(updated.name, "rl");
        assert_eq!(updated.config, json!({"average": 20}));
    }

    #[tokio::test]
    async fn update_missing_id_returns_not_found() {
        let repo = test_repo().await;
        let err = repo.update(Uuid::new_v4(), Some("x".to_string()), None).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn delete_removes_row() {
        let repo = test_repo().await;
        let created = repo
            .create("tmp".to_string(), "headers".to_string(), json!({}))
            .await
            .unwrap();
        repo.delete(created.id).await.unwrap();
        assert!(repo.find_by_id(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_config_falls_back_to_raw_string() {
        let repo = test_repo().await;
        let created = repo
            .create("m".to_string(), "headers".to_string(), json!({}))
            .await
            .unwrap();
        let active = middlewares::ActiveModel {
            id: Set(created.id),
            config: Set("not json".to_string()),
            ..Default::default()
        };
        active.update(&*repo.base.connection).await.unwrap();

        let found = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found.config, serde_json::Value::String("not json".to_string()));
    }
}
