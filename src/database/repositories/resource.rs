//! SeaORM-based Resource repository (spec §3, §4.1).
//!
//! `get_resources()` returns the denormalized read projection the Generator
//! consumes: each resource joined with its attached middlewares (as
//! `"id:name:priority"` triples, spec §4.1) and, if present, its custom
//! service override.

use std::collections::HashMap;
use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{
    middlewares, prelude::*, resource_middlewares, resource_services, resources,
};
use crate::errors::AppError;
use crate::models::{AttachedMiddlewareRef, Resource, ResourceProjection, ResourceStatus};

use super::traits::{now, BaseSeaOrmRepository};

#[derive(Clone)]
pub struct ResourceRepository {
    base: BaseSeaOrmRepository,
}

impl ResourceRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseSeaOrmRepository::new(connection),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Resource>, AppError> {
        let model = Resources::find_by_id(id.to_string())
            .one(&*self.base.connection)
            .await?;
        Ok(model.map(to_domain))
    }

    pub async fn find_by_host(&self, host: &str) -> Result<Vec<Resource>, AppError> {
        let models = Resources::find()
            .filter(resources::Column::Host.eq(host))
            .all(&*self.base.connection)
            .await?;
        Ok(models.into_iter().map(to_domain).collect())
    }

    pub async fn upsert(&self, resource: Resource) -> Result<Resource, AppError> {
        let active = from_domain(resource);
        let model = Resources::insert(active)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(resources::Column::Id)
                    .update_columns([
                        resources::Column::Host,
                        resources::Column::ServiceId,
                        resources::Column::OrgId,
                        resources::Column::SiteId,
                        resources::Column::Status,
                        resources::Column::SourceType,
                        resources::Column::Entrypoints,
                        resources::Column::TlsDomains,
                        resources::Column::TcpEnabled,
                        resources::Column::TcpEntrypoints,
                        resources::Column::TcpSniRule,
                        resources::Column::CustomHeaders,
                        resources::Column::RouterPriority,
                        resources::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_with_returning(&*self.base.connection)
            .await?;
        Ok(to_domain(model))
    }

    pub async fn set_status(&self, id: &str, status: ResourceStatus) -> Result<(), AppError> {
        let model = Resources::find_by_id(id.to_string())
            .one(&*self.base.connection)
            .await?
            .ok_or_else(|| AppError::not_found("resource", id.to_string()))?;
        let mut active: resources::ActiveModel = model.into();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(now());
        active.update(&*self.base.connection).await?;
        Ok(())
    }

    /// Deletes a resource. Invariant (spec §3): only while `disabled` — a
    /// resource the upstream still reports must go through the Watcher's
    /// own disable path first.
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        let model = Resources::find_by_id(id.to_string())
            .one(&*self.base.connection)
            .await?
            .ok_or_else(|| AppError::not_found("resource", id.to_string()))?;
        if model.status != ResourceStatus::Disabled.as_str() {
            return Err(AppError::conflict(format!(
                "resource {id} must be disabled before it can be deleted"
            )));
        }
        Resources::delete_by_id(id.to_string())
            .exec(&*self.base.connection)
            .await?;
        Ok(())
    }

    /// Partial update of the operator-owned override columns (spec §6:
    /// "update per-config-section override blobs"). Only the columns the
    /// caller supplies are touched; everything else, including the
    /// Watcher-owned columns, is left alone.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_overrides(
        &self,
        id: &str,
        entrypoints: Option<Vec<String>>,
        tls_domains: Option<Vec<String>>,
        tcp_enabled: Option<bool>,
        tcp_entrypoints: Option<Vec<String>>,
        tcp_sni_rule: Option<String>,
        custom_headers: Option<serde_json::Value>,
        router_priority: Option<i32>,
    ) -> Result<Resource, AppError> {
        let model = Resources::find_by_id(id.to_string())
            .one(&*self.base.connection)
            .await?
            .ok_or_else(|| AppError::not_found("resource", id.to_string()))?;
        let mut active: resources::ActiveModel = model.into();
        if let Some(entrypoints) = entrypoints {
            active.entrypoints = Set(entrypoints.join(","));
        }
        if let Some(tls_domains) = tls_domains {
            active.tls_domains = Set(tls_domains.join(","));
        }
        if let Some(tcp_enabled) = tcp_enabled {
            active.tcp_enabled = Set(tcp_enabled);
        }
        if let Some(tcp_entrypoints) = tcp_entrypoints {
            active.tcp_entrypoints = Set(tcp_entrypoints.join(","));
        }
        if let Some(tcp_sni_rule) = tcp_sni_rule {
            active.tcp_sni_rule = Set(tcp_sni_rule);
        }
        if let Some(custom_headers) = custom_headers {
            active.custom_headers = Set(custom_headers.to_string());
        }
        if let Some(router_priority) = router_priority {
            active.router_priority = Set(router_priority);
        }
        active.updated_at = Set(now());
        let model = active.update(&*self.base.connection).await?;
        Ok(to_domain(model))
    }

    pub async fn attach_middleware(
        &self,
        resource_id: &str,
        middleware_id: Uuid,
        priority: i32,
    ) -> Result<(), AppError> {
        let active = resource_middlewares::ActiveModel {
            resource_id: Set(resource_id.to_string()),
            middleware_id: Set(middleware_id),
            priority: Set(priority),
        };
        resource_middlewares::Entity::insert(active)
            .on_conflict(
                sea_orm::sea_query::OnConflict::columns([
                    resource_middlewares::Column::ResourceId,
                    resource_middlewares::Column::MiddlewareId,
                ])
                .update_column(resource_middlewares::Column::Priority)
                .to_owned(),
            )
            .exec(&*self.base.connection)
            .await?;
        Ok(())
    }

    pub async fn detach_middleware(
        &self,
        resource_id: &str,
        middleware_id: Uuid,
    ) -> Result<(), AppError> {
        resource_middlewares::Entity::delete_many()
            .filter(resource_middlewares::Column::ResourceId.eq(resource_id))
            .filter(resource_middlewares::Column::MiddlewareId.eq(middleware_id))
            .exec(&*self.base.connection)
            .await?;
        Ok(())
    }

    pub async fn set_custom_service(
        &self,
        resource_id: &str,
        service_id: &str,
    ) -> Result<(), AppError> {
        let active = resource_services::ActiveModel {
            resource_id: Set(resource_id.to_string()),
            service_id: Set(service_id.to_string()),
        };
        resource_services::Entity::insert(active)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(resource_services::Column::ResourceId)
                    .update_column(resource_services::Column::ServiceId)
                    .to_owned(),
            )
            .exec(&*self.base.connection)
            .await?;
        Ok(())
    }

    pub async fn clear_custom_service(&self, resource_id: &str) -> Result<(), AppError> {
        resource_services::Entity::delete_by_id(resource_id.to_string())
            .exec(&*self.base.connection)
            .await?;
        Ok(())
    }

    /// `GetResources()` (spec §4.1): the flat projection consumed by the
    /// Generator. One query per table, joined in memory — cheaper than a
    /// fan-out join against `resources` for the common case of few
    /// middlewares per resource.
    pub async fn get_resources(&self) -> Result<Vec<ResourceProjection>, AppError> {
        let resources = Resources::find()
            .order_by_asc(resources::Column::Id)
            .all(&*self.base.connection)
            .await?;

        let attachments = resource_middlewares::Entity::find()
            .order_by_asc(resource_middlewares::Column::Priority)
            .all(&*self.base.connection)
            .await?;
        let middleware_names: HashMap<Uuid, String> = Middlewares::find()
            .all(&*self.base.connection)
            .await?
            .into_iter()
            .map(|m: middlewares::Model| (m.id, m.name))
            .collect();

        let mut by_resource: HashMap<String, Vec<AttachedMiddlewareRef>> = HashMap::new();
        for attachment in attachments {
            let Some(name) = middleware_names.get(&attachment.middleware_id).cloned() else {
                continue;
            };
            by_resource
                .entry(attachment.resource_id.clone())
                .or_default()
                .push(AttachedMiddlewareRef {
                    id: attachment.middleware_id,
                    name,
                    priority: attachment.priority,
                });
        }

        let overrides: HashMap<String, String> = resource_services::Entity::find()
            .all(&*self.base.connection)
            .await?
            .into_iter()
            .map(|r| (r.resource_id, r.service_id))
            .collect();

        Ok(resources
            .into_iter()
            .map(|model| {
                let id = model.id.clone();
                let custom_service_id = overrides.get(&id).cloned();
                let middlewares = by_resource.remove(&id).unwrap_or_default();
                ResourceProjection {
                    resource: to_domain(model),
                    middlewares,
                    custom_service_id,
                }
            })
            .collect())
    }
}

fn to_domain(model: resources::Model) -> Resource {
    let status = match model.status.as_str() {
        "disabled" => ResourceStatus::Disabled,
        _ => ResourceStatus::Active,
    };
    let custom_headers = serde_json::from_str(&model.custom_headers)
        .unwrap_or_else(|_| serde_json::Value::Object(Default::default()));
    Resource {
        id: model.id,
        host: model.host,
        service_id: model.service_id,
        org_id: model.org_id,
        site_id: model.site_id,
        status,
        source_type: model.source_type,
        entrypoints: model.entrypoints,
        tls_domains: model.tls_domains,
        tcp_enabled: model.tcp_enabled,
        tcp_entrypoints: model.tcp_entrypoints,
        tcp_sni_rule: model.tcp_sni_rule,
        custom_headers,
        router_priority: model.router_priority,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn from_domain(resource: Resource) -> resources::ActiveModel {
    resources::ActiveModel {
        id: Set(resource.id),
        host: Set(resource.host),
        service_id: Set(resource.service_id),
        org_id: Set(resource.org_id),
        site_id: Set(resource.site_id),
        status: Set(resource.status.as_str().to_string()),
        source_type: Set(resource.source_type),
        entrypoints: Set(resource.entrypoints),
        tls_domains: Set(resource.tls_domains),
        tcp_enabled: Set(resource.tcp_enabled),
        tcp_entrypoints: Set(resource.tcp_entrypoints),
        tcp_sni_rule: Set(resource.tcp_sni_rule),
        custom_headers: Set(resource.custom_headers.to_string()),
        router_priority: Set(resource.router_priority),
        created_at: Set(resource.created_at),
        updated_at: Set(resource.updated_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::migrations::Migrator;
    use sea_orm_migration::MigratorTrait;
    use serde_json::json;

    async fn test_repo() -> ResourceRepository {
        let connection = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&connection, None).await.unwrap();
        ResourceRepository::new(Arc::new(connection))
    }

    fn sample_resource(id: &str, host: &str) -> Resource {
        let now = now();
        Resource {
            id: id.to_string(),
            host: host.to_string(),
            service_id: "web".to_string(),
            org_id: Some("org-1".to_string()),
            site_id: Some("site-1".to_string()),
            status: ResourceStatus::Active,
            source_type: "platform".to_string(),
            entrypoints: "websecure".to_string(),
            tls_domains: String::new(),
            tcp_enabled: false,
            tcp_entrypoints: String::new(),
            tcp_sni_rule: String::new(),
            custom_headers: json!({}),
            router_priority: crate::models::DEFAULT_ROUTER_PRIORITY,
            created_at: now,
            updated_at: now,
        }
    }

    async fn seed_middleware(repo: &ResourceRepository, name: &str) -> Uuid {
        let active = middlewares::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            r#type: Set("headers".to_string()),
            config: Set("{}".to_string()),
            created_at: Set(now()),
            updated_at: Set(now()),
        };
        let model = active.insert(&*repo.base.connection).await.unwrap();
        model.id
    }

    #[tokio::test]
    async fn upsert_then_find_by_host() {
        let repo = test_repo().await;
        repo.upsert(sample_resource("res-1", "a.example.com")).await.unwrap();

        let found = repo.find_by_host("a.example.com").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "res-1");
    }

    #[tokio::test]
    async fn set_status_updates_only_status() {
        let repo = test_repo().await;
        repo.upsert(sample_resource("res-1", "a.example.com")).await.unwrap();
        repo.set_status("res-1", ResourceStatus::Disabled).await.unwrap();

        let found = repo.find_by_id("res-1").await.unwrap().unwrap();
        assert_eq!(found.status, ResourceStatus::Disabled);
        assert_eq!(found.host, "a.example.com");
    }

    #[tokio::test]
    async fn get_resources_projects_middlewares_in_priority_order() {
        let repo = test_repo().await;
        repo.upsert(sample_resource("res-1", "a.example.com")).await.unwrap();
        let low = seed_middleware(&repo, "low").await;
        let high = seed_middleware(&repo, "high").await;
        repo.attach_middleware("res-1", low, 1).await.unwrap();
        repo.attach_middleware("res-1", high, 10).await.unwrap();

        let projections = repo.get_resources().await.unwrap();
        assert_eq!(projections.len(), 1);
        let names: Vec<&str> = projections[0]
            .middlewares
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(names, vec!["low", "high"]);
    }

    #[tokio::test]
    async fn custom_service_override_surfaces_in_projection() {
        let repo = test_repo().await;
        repo.upsert(sample_resource("res-1", "a.example.com")).await.unwrap();
        repo.set_custom_service("res-1", "custom-svc").await.unwrap();

        let projections = repo.get_resources().await.unwrap();
        assert_eq!(projections[0].custom_service_id.as_deref(), Some("custom-svc"));

        repo.clear_custom_service("res-1").await.unwrap();
        let projections = repo.get_resources().await.unwrap();
        assert_eq!(projections[0].custom_service_id, None);
    }

    #[tokio::test]
    async fn detach_middleware_removes_attachment() {
        let repo = test_repo().await;
        repo.upsert(sample_resource("res-1", "a.example.com")).await.unwrap();
        let mid = seed_middleware(&repo, "only").await;
        repo.attach_middleware("res-1", mid, 1).await.unwrap();
        repo.detach_middleware("res-1", mid).await.unwrap();

        let projections = repo.get_resources().await.unwrap();
        assert!(projections[0].middlewares.is_empty());
    }

    #[tokio::test]
    async fn delete_removes_disabled_resource() {
        let repo = test_repo().await;
        repo.upsert(sample_resource("res-1", "a.example.com")).await.unwrap();
        repo.set_status("res-1", ResourceStatus::Disabled).await.unwrap();
        repo.delete("res-1").await.unwrap();
        assert!(repo.find_by_id("res-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_rejects_active_resource() {
        let repo = test_repo().await;
        repo.upsert(sample_resource("res-1", "a.example.com")).await.unwrap();
        let err = repo.delete("res-1").await;
        assert!(err.is_err());
        assert!(repo.find_by_id("res-1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_overrides_touches_only_supplied_columns() {
        let repo = test_repo().await;
        repo.upsert(sample_resource("res-1", "a.example.com")).await.unwrap();

        let updated = repo
            .update_overrides(
                "res-1",
                Some(vec!["web".to_string(), "websecure".to_string()]),
                None,
                Some(true),
                Some(vec!["tcp".to_string()]),
                Some("HostSNI(`a.example.com`)".to_string()),
                None,
                Some(500),
            )
            .await
            .unwrap();

        assert_eq!(updated.entrypoints, "web,websecure");
        assert_eq!(updated.tls_domains, "");
        assert!(updated.tcp_enabled);
        assert_eq!(updated.tcp_entrypoints, "tcp");
        assert_eq!(updated.tcp_sni_rule, "HostSNI(`a.example.com`)");
        assert_eq!(updated.router_priority, 500);
        assert_eq!(updated.host, "a.example.com", "non-override columns untouched");
    }
}
