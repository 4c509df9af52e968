//! SeaORM-based Service repository (spec §3, §4.1).

use std::sync::Arc;

use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use tracing::warn;
use uuid::Uuid;

use crate::entities::{prelude::Services, services};
use crate::errors::AppError;
use crate::models::{ProtocolHint, Service, SERVICE_ORIGIN_OPERATOR};

use super::traits::{now, BaseSeaOrmRepository};

#[derive(Clone)]
pub struct ServiceRepository {
    base: BaseSeaOrmRepository,
}

impl ServiceRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseSeaOrmRepository::new(connection),
        }
    }

    /// Creates an operator-defined service with a freshly generated id.
    /// Watcher-discovered services go through [`Self::upsert`] instead,
    /// keyed on their upstream id.
    pub async fn create(
        &self,
        name: String,
        r#type: String,
        config: serde_json::Value,
        protocol_hint: Option<ProtocolHint>,
    ) -> Result<Service, AppError> {
        let now = now();
        let active = services::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            name: Set(name),
            r#type: Set(r#type),
            config: Set(config.to_string()),
            protocol_hint: Set(protocol_hint.map(|hint| hint_to_str(hint).to_string())),
            origin: Set(SERVICE_ORIGIN_OPERATOR.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let model = active.insert(&*self.base.connection).await?;
        Ok(to_domain(model))
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Service>, AppError> {
        let model = Services::find_by_id(id.to_string())
            .one(&*self.base.connection)
            .await?;
        Ok(model.map(to_domain))
    }

    pub async fn update(
        &self,
        id: &str,
        name: Option<String>,
        config: Option<serde_json::Value>,
        protocol_hint: Option<Option<ProtocolHint>>,
    ) -> Result<Service, AppError> {
        let model = Services::find_by_id(id.to_string())
            .one(&*self.base.connection)
            .await?
            .ok_or_else(|| AppError::not_found("service", id.to_string()))?;
        let mut active: services::ActiveModel = model.into();
        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(config) = config {
            active.config = Set(config.to_string());
        }
        if let Some(protocol_hint) = protocol_hint {
            active.protocol_hint = Set(protocol_hint.map(|hint| hint_to_str(hint).to_string()));
        }
        active.updated_at = Set(now());
        let model = active.update(&*self.base.connection).await?;
        Ok(to_domain(model))
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        Services::delete_by_id(id.to_string())
            .exec(&*self.base.connection)
            .await?;
        Ok(())
    }

    /// Inserts or refreshes a service discovered upstream, keyed on its raw
    /// (possibly `@provider`-suffixed) id.
    pub async fn upsert(&self, service: Service) -> Result<Service, AppError> {
        let active = services::ActiveModel {
            id: Set(service.id),
            name: Set(service.name),
            r#type: Set(service.r#type),
            config: Set(service.config.to_string()),
            protocol_hint: Set(service.protocol_hint.map(|hint| hint_to_str(hint).to_string())),
            origin: Set(service.origin),
            created_at: Set(service.created_at),
            updated_at: Set(service.updated_at),
        };
        let model = Services::insert(active)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(services::Column::Id)
                    .update_columns([
                        services::Column::Name,
                        services::Column::Type,
                        services::Column::Config,
                        services::Column::ProtocolHint,
                        services::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_with_returning(&*self.base.connection)
            .await?;
        Ok(to_domain(model))
    }

    /// `GetServices()` (spec §4.1): parsed JSON `config`s, falling back to
    /// the raw string if parsing fails.
    pub async fn get_all(&self) -> Result<Vec<Service>, AppError> {
        let models = Services::find().all(&*self.base.connection).await?;
        Ok(models.into_iter().map(to_domain).collect())
    }
}

fn hint_to_str(hint: ProtocolHint) -> &'static str {
    match hint {
        ProtocolHint::Tcp => "tcp",
        ProtocolHint::Udp => "udp",
    }
}

fn to_domain(model: services::Model) -> Service {
    let config = serde_json::from_str(&model.config).unwrap_or_else(|err| {
        warn!(
            "service {} has malformed config JSON, falling back to raw string: {err}",
            model.id
        );
        serde_json::Value::String(model.config.clone())
    });
    let protocol_hint = model.protocol_hint.as_deref().and_then(|hint| match hint {
        "tcp" => Some(ProtocolHint::Tcp),
        "udp" => Some(ProtocolHint::Udp),
        other => {
            warn!("service {} has unknown protocol_hint '{other}', ignoring", model.id);
            None
        }
    });
    Service {
        id: model.id,
        name: model.name,
        r#type: model.r#type,
        config,
        protocol_hint,
        origin: model.origin,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::maintenance::normalize_id;
    use crate::database::migrations::Migrator;
    use sea_orm_migration::MigratorTrait;
    use serde_json::json;

    async fn test_repo() -> ServiceRepository {
        let connection = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&connection, None).await.unwrap();
        ServiceRepository::new(Arc::new(connection))
    }

    fn discovered_service(id: &str) -> Service {
        let now = now();
        Service {
            id: id.to_string(),
            name: "svc".to_string(),
            r#type: "loadBalancer".to_string(),
            config: json!({"servers": [{"url": "http://10.0.0.1:80"}]}),
            protocol_hint: None,
            origin: "platform".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn create_tags_origin_as_operator() {
        let repo = test_repo().await;
        let created = repo
            .create("web".to_string(), "loadBalancer".to_string(), json!({}), None)
            .await
            .unwrap();
        assert_eq!(created.origin, SERVICE_ORIGIN_OPERATOR);
    }

    #[tokio::test]
    async fn upsert_preserves_discovered_origin_on_refresh() {
        let repo = test_repo().await;
        let id = "web@platform";
        repo.upsert(discovered_service(id)).await.unwrap();

        let mut refreshed = discovered_service(id);
        refreshed.config = json!({"servers": [{"url": "http://10.0.0.2:80"}]});
        let updated = repo.upsert(refreshed).await.unwrap();

        assert_eq!(updated.origin, "platform");
        assert_eq!(normalize_id(&updated.id), "web");
    }

    #[tokio::test]
    async fn update_replaces_protocol_hint() {
        let repo = test_repo().await;
        let created = repo
            .create(
                "lb".to_string(),
                "loadBalancer".to_string(),
                json!({}),
                Some(ProtocolHint::Tcp),
            )
            .await
            .unwrap();

        let updated = repo
            .update(&created.id, None, None, Some(Some(ProtocolHint::Udp)))
            .await
            .unwrap();
        assert_eq!(updated.protocol_hint, Some(ProtocolHint::Udp));

        let cleared = repo.update(&created.id, None, None, Some(None)).await.unwrap();
        assert_eq!(cleared.protocol_hint, None);
    }

    #[tokio::test]
    async fn unknown_protocol_hint_in_storage_is_ignored() {
        let repo = test_repo().await;
        let created = repo
            .create("x".to_string(), "loadBalancer".to_string(), json!({}), None)
            .await
            .unwrap();
        let active = services::ActiveModel {
            id: Set(created.id.clone()),
            protocol_hint: Set(Some("sctp".to_string())),
            ..Default::default()
        };
        active.update(&*repo.base.connection).await.unwrap();

        let found = repo.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(found.protocol_hint, None);
    }
}
