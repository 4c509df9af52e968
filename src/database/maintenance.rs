//! Duplicate sweep (spec §4.6). A maintenance operation, runnable on demand,
//! that collapses services and resources accumulated through upstream id
//! churn. Grounded on the teacher's repository-level bulk delete/update
//! patterns (`repositories/*.rs`); both sweeps run under a single
//! transaction so a dry run can be simulated by simply not committing.

use std::collections::HashMap;

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};
use tracing::info;

use crate::database::Store;
use crate::entities::{prelude::*, resource_services, resources, services};
use crate::errors::AppError;
use crate::models::ResourceStatus;

/// Configurable substrings that rank a resource id as preferred when
/// multiple `active` rows share a `host` (spec §9 resolution #3). Defaults
/// to the one upstream integration the original ranking hardcoded.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub priority_markers: Vec<String>,
    /// When sweeping resources that are all `disabled`, physically delete
    /// the non-canonical rows after promoting one to `active`. Left `false`
    /// unless the operator opts in (spec §4.6).
    pub delete_disabled_duplicates: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            priority_markers: vec!["-router-auth".to_string()],
            delete_disabled_duplicates: false,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct SweepReport {
    pub services_removed: Vec<String>,
    pub resources_disabled: Vec<String>,
    pub resources_deleted: Vec<String>,
    pub resources_promoted: Vec<String>,
}

/// Strips any `@provider` suffix (spec §4.6 "normalized id").
pub fn normalize_id(raw: &str) -> &str {
    raw.split('@').next().unwrap_or(raw)
}

/// `(has_priority_marker, len)` — lower sorts first, i.e. wins. Used both
/// for the service suffix-preference order and the resource
/// `-router-auth`-style ranking.
fn rank_service_id(id: &str, config: &SweepConfig) -> (u8, usize) {
    let suffix_rank = match id.split_once('@') {
        None => 0,
        Some((_, "file")) => 1,
        Some(_) => 2,
    };
    let _ = config;
    (suffix_rank, id.len())
}

fn rank_resource_id(id: &str, config: &SweepConfig) -> (u8, usize) {
    let has_marker = config
        .priority_markers
        .iter()
        .any(|marker| id.contains(marker.as_str()));
    (if has_marker { 0 } else { 1 }, id.len())
}

/// Runs the full sweep (services, then resources) inside one transaction.
/// In dry-run mode the planned changes are logged but the transaction is
/// never committed — SeaORM has no explicit "savepoint and discard" hook, so
/// a dry run instead computes the plan against a read-only snapshot and
/// returns it without issuing any mutating statement.
pub async fn run(store: &Store, config: &SweepConfig, dry_run: bool) -> Result<SweepReport, AppError> {
    if dry_run {
        return plan(store, config).await;
    }

    let report = store
        .with_transaction(|txn| {
            let config = config.clone();
            Box::pin(async move {
                let mut report = SweepReport::default();
                sweep_services(txn, &config, &mut report).await?;
                sweep_resources(txn, &config, &mut report).await?;
                Ok(report)
            })
        })
        .await?;

    info!(
        services_removed = report.services_removed.len(),
        resources_disabled = report.resources_disabled.len(),
        resources_deleted = report.resources_deleted.len(),
        resources_promoted = report.resources_promoted.len(),
        "duplicate sweep complete"
    );
    Ok(report)
}

async fn plan(store: &Store, config: &SweepConfig) -> Result<SweepReport, AppError> {
    let mut report = SweepReport::default();

    let all_services = Services::find().all(&*store.connection).await?;
    let mut by_normalized: HashMap<String, Vec<services::Model>> = HashMap::new();
    for model in all_services {
        by_normalized
            .entry(normalize_id(&model.id).to_string())
            .or_default()
            .push(model);
    }
    for (_, mut group) in by_normalized {
        if group.len() < 2 {
            continue;
        }
        group.sort_by(|a, b| rank_service_id(&a.id, config).cmp(&rank_service_id(&b.id, config)));
        for duplicate in &group[1..] {
            report.services_removed.push(duplicate.id.clone());
        }
    }

    let all_resources = Resources::find().all(&*store.connection).await?;
    let mut by_host: HashMap<String, Vec<resources::Model>> = HashMap::new();
    for model in all_resources {
        by_host.entry(model.host.clone()).or_default().push(model);
    }
    for (_, group) in by_host {
        plan_resource_group(group, config, &mut report);
    }

    info!(
        services_removed = report.services_removed.len(),
        resources_disabled = report.resources_disabled.len(),
        resources_deleted = report.resources_deleted.len(),
        resources_promoted = report.resources_promoted.len(),
        "duplicate sweep dry run"
    );
    Ok(report)
}

fn plan_resource_group(mut group: Vec<resources::Model>, config: &SweepConfig, report: &mut SweepReport) {
    if group.len() < 2 {
        return;
    }
    let active: Vec<&resources::Model> = group
        .iter()
        .filter(|r| r.status == ResourceStatus::Active.as_str())
        .collect();

    if active.len() > 1 {
        let mut ranked: Vec<&resources::Model> = active;
        ranked.sort_by(|a, b| rank_resource_id(&a.id, config).cmp(&rank_resource_id(&b.id, config)));
        for duplicate in &ranked[1..] {
            report.resources_disabled.push(duplicate.id.clone());
        }
        return;
    }

    if active.is_empty() && group.len() > 1 {
        group.sort_by(|a, b| a.id.len().cmp(&b.id.len()));
        let canonical = group[0].id.clone();
        report.resources_promoted.push(canonical);
        if config.delete_disabled_duplicates {
            for duplicate in &group[1..] {
                report.resources_deleted.push(duplicate.id.clone());
            }
        }
    }
}

async fn sweep_services(
    txn: &sea_orm::DatabaseTransaction,
    config: &SweepConfig,
    report: &mut SweepReport,
) -> Result<(), AppError> {
    let all_services = Services::find().all(txn).await?;
    let mut by_normalized: HashMap<String, Vec<services::Model>> = HashMap::new();
    for model in all_services {
        by_normalized
            .entry(normalize_id(&model.id).to_string())
            .or_default()
            .push(model);
    }

    for (_, mut group) in by_normalized {
        if group.len() < 2 {
            continue;
        }
        group.sort_by(|a, b| rank_service_id(&a.id, config).cmp(&rank_service_id(&b.id, config)));
        let canonical_id = group[0].id.clone();
        for duplicate in &group[1..] {
            resource_services::Entity::update_many()
                .col_expr(
                    resource_services::Column::ServiceId,
                    sea_orm::sea_query::Expr::value(canonical_id.clone()),
                )
                .filter(resource_services::Column::ServiceId.eq(duplicate.id.clone()))
                .exec(txn)
                .await?;
            Services::delete_by_id(duplicate.id.clone()).exec(txn).await?;
            report.services_removed.push(duplicate.id.clone());
        }
    }
    Ok(())
}

async fn sweep_resources(
    txn: &sea_orm::DatabaseTransaction,
    config: &SweepConfig,
    report: &mut SweepReport,
) -> Result<(), AppError> {
    let all_resources = Resources::find().all(txn).await?;
    let mut by_host: HashMap<String, Vec<resources::Model>> = HashMap::new();
    for model in all_resources {
        by_host.entry(model.host.clone()).or_default().push(model);
    }

    for (_, mut group) in by_host {
        if group.len() < 2 {
            continue;
        }
        let active_count = group
            .iter()
            .filter(|r| r.status == ResourceStatus::Active.as_str())
            .count();

        if active_count > 1 {
            let mut active: Vec<resources::Model> = group
                .iter()
                .filter(|r| r.status == ResourceStatus::Active.as_str())
                .cloned()
                .collect();
            active.sort_by(|a, b| rank_resource_id(&a.id, config).cmp(&rank_resource_id(&b.id, config)));
            for duplicate in &active[1..] {
                let model = resources::ActiveModel {
                    id: Set(duplicate.id.clone()),
                    status: Set(ResourceStatus::Disabled.as_str().to_string()),
                    ..Default::default()
                };
                sea_orm::ActiveModelTrait::update(model, txn).await?;
                report.resources_disabled.push(duplicate.id.clone());
            }
            continue;
        }

        if active_count == 0 {
            group.sort_by(|a, b| a.id.len().cmp(&b.id.len()));
            let canonical = group[0].id.clone();
            let model = resources::ActiveModel {
                id: Set(canonical.clone()),
                status: Set(ResourceStatus::Active.as_str().to_string()),
                ..Default::default()
            };
            sea_orm::ActiveModelTrait::update(model, txn).await?;
            report.resources_promoted.push(canonical);

            if config.delete_disabled_duplicates {
                for duplicate in &group[1..] {
                    Resources::delete_by_id(duplicate.id.clone()).exec(txn).await?;
                    report.resources_deleted.push(duplicate.id.clone());
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::migrations::Migrator;
    use crate::database::repositories::{MiddlewareRepository, ResourceRepository, ServiceRepository};
    use crate::models::{ProtocolHint, Resource};
    use sea_orm_migration::MigratorTrait;
    use serde_json::json;

    async fn test_store() -> Store {
        let connection = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&connection, None).await.unwrap();
        let connection = std::sync::Arc::new(connection);
        Store {
            middlewares: MiddlewareRepository::new(connection.clone()),
            services: ServiceRepository::new(connection.clone()),
            resources: ResourceRepository::new(connection.clone()),
            connection,
        }
    }

    fn sample_resource(id: &str, host: &str, status: ResourceStatus) -> Resource {
        let now = chrono::Utc::now();
        Resource {
            id: id.to_string(),
            host: host.to_string(),
            service_id: "web".to_string(),
            org_id: Some("org-1".to_string()),
            site_id: Some("site-1".to_string()),
            status,
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

    #[test]
    fn normalize_id_strips_provider_suffix() {
        assert_eq!(normalize_id("web@http"), "web");
        assert_eq!(normalize_id("web@file"), "web");
        assert_eq!(normalize_id("web"), "web");
    }

    #[test]
    fn rank_service_id_prefers_unsuffixed_then_file_then_others() {
        let config = SweepConfig::default();
        let mut ids = vec!["web@http", "web@file", "web"];
        ids.sort_by(|a, b| rank_service_id(a, &config).cmp(&rank_service_id(b, &config)));
        assert_eq!(ids, vec!["web", "web@file", "web@http"]);
    }

    #[test]
    fn rank_resource_id_prefers_priority_marker() {
        let config = SweepConfig::default();
        let mut ids = vec!["a-router", "a-router-auth"];
        ids.sort_by(|a, b| rank_resource_id(a, &config).cmp(&rank_resource_id(b, &config)));
        assert_eq!(ids, vec!["a-router-auth", "a-router"]);
    }

    #[tokio::test]
    async fn sweep_merges_duplicate_services_and_repoints_references() {
        let store = test_store().await;
        store
            .services
            .upsert(crate::models::Service {
                id: "web@http".to_string(),
                name: "web".to_string(),
                r#type: "loadBalancer".to_string(),
                config: json!({}),
                protocol_hint: None::<ProtocolHint>,
                origin: "platform".to_string(),
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            })
            .await
            .unwrap();
        store
            .services
            .upsert(crate::models::Service {
                id: "web@file".to_string(),
                name: "web".to_string(),
                r#type: "loadBalancer".to_string(),
                config: json!({}),
                protocol_hint: None,
                origin: "platform".to_string(),
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            })
            .await
            .unwrap();
        store.resources.upsert(sample_resource("res-1", "a.example.com", ResourceStatus::Active)).await.unwrap();
        store.resources.set_custom_service("res-1", "web@file").await.unwrap();

        let report = run(&store, &SweepConfig::default(), false).await.unwrap();
        // `@file` outranks any other suffix (rank_service_id), so it survives.
        assert_eq!(report.services_removed, vec!["web@http"]);

        let remaining = store.services.get_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "web@file");
    }

    #[tokio::test]
    async fn sweep_disables_all_but_one_active_resource_per_host() {
        let store = test_store().await;
        store.resources.upsert(sample_resource("a-router", "a.example.com", ResourceStatus::Active)).await.unwrap();
        store
            .resources
            .upsert(sample_resource("a-router-auth", "a.example.com", ResourceStatus::Active))
            .await
            .unwrap();

        let report = run(&store, &SweepConfig::default(), false).await.unwrap();
        assert_eq!(report.resources_disabled, vec!["a-router"]);
    }

    #[tokio::test]
    async fn dry_run_computes_plan_without_mutating() {
        let store = test_store().await;
        store.resources.upsert(sample_resource("a-router", "a.example.com", ResourceStatus::Active)).await.unwrap();
        store
            .resources
            .upsert(sample_resource("a-router-auth", "a.example.com", ResourceStatus::Active))
            .await
            .unwrap();

        let report = run(&store, &SweepConfig::default(), true).await.unwrap();
        assert_eq!(report.resources_disabled, vec!["a-router"]);

        let found = store.resources.find_by_id("a-router").await.unwrap().unwrap();
        assert_eq!(found.status, ResourceStatus::Active);
    }
}
