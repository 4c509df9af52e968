//! Cross-module Watcher -> Store -> Generator scenarios (spec §8 A-F).
//! Exercises the reconciliation and generation algorithms through the
//! crate's public boundary rather than mocking a `DataSource` over HTTP —
//! the Watcher's own resource/service ticks are thin wrappers over
//! `watcher::reconcile` (see `watcher::scheduler::Watcher::tick_resources`
//! /`tick_services`), so driving those functions directly is equivalent for
//! these scenarios.

use std::sync::Arc;

use router_sync::config::GeneratorConfig;
use router_sync::database::migrations::Migrator;
use router_sync::database::repositories::{MiddlewareRepository, ResourceRepository, ServiceRepository};
use router_sync::database::{maintenance, Store};
use router_sync::entities::{prelude::Services, services};
use router_sync::generator::Generator;
use router_sync::models::{DiscoveredResource, DiscoveredService};
use router_sync::watcher::reconcile::{reconcile_resources, reconcile_services};

use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use sea_orm_migration::MigratorTrait;
use serde_json::json;

async fn test_store() -> Store {
    let connection = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&connection, None).await.unwrap();
    let connection = Arc::new(connection);
    Store {
        middlewares: MiddlewareRepository::new(connection.clone()),
        services: ServiceRepository::new(connection.clone()),
        resources: ResourceRepository::new(connection.clone()),
        connection,
    }
}

async fn test_generator(store: Store, artifact_dir: &std::path::Path) -> Generator {
    Generator::new(store, GeneratorConfig::default(), artifact_dir.to_path_buf())
        .await
        .unwrap()
}

fn minimal_resource(id: &str, host: &str, service_id: &str) -> DiscoveredResource {
    DiscoveredResource {
        id: id.to_string(),
        host: host.to_string(),
        service_id: service_id.to_string(),
        org_id: None,
        site_id: None,
        entrypoints: vec![],
        tls_sans: vec![],
        tcp_enabled: false,
        tcp_entrypoints: vec![],
        tcp_sni_rule: None,
        router_priority: 0,
        source_type: "platform".to_string(),
    }
}

async fn watch_tick(store: &Store, resources: Vec<DiscoveredResource>, services: Vec<DiscoveredService>, source_type: &str) {
    let source_type = source_type.to_string();
    store
        .with_transaction(move |txn| {
            Box::pin(async move {
                reconcile_resources(txn, resources).await?;
                reconcile_services(txn, services, &source_type).await?;
                Ok(())
            })
        })
        .await
        .unwrap();
}

async fn read_artifact(dir: &std::path::Path) -> serde_yaml::Value {
    let raw = tokio::fs::read_to_string(dir.join("dynamic-config.yaml")).await.unwrap();
    serde_yaml::from_str(&raw).unwrap()
}

/// Scenario A — first-time discovery.
#[tokio::test]
async fn scenario_a_first_time_discovery() {
    let store = test_store().await;
    watch_tick(&store, vec![minimal_resource("r1", "app.example.com", "svc-1")], vec![], "platform").await;

    let row = store.resources.find_by_id("r1").await.unwrap().unwrap();
    assert_eq!(row.host, "app.example.com");
    assert_eq!(row.status, router_sync::models::ResourceStatus::Active);
    assert_eq!(row.entrypoints, "websecure");
    assert_eq!(row.router_priority, 100);

    let artifact_dir = tempfile::tempdir().unwrap();
    let generator = test_generator(store, artifact_dir.path()).await;
    generator.generate_once().await.unwrap();

    let doc = read_artifact(artifact_dir.path()).await;
    let router = &doc["http"]["routers"]["r1-router"];
    assert_eq!(router["rule"], "Host(`app.example.com`)");
    assert_eq!(router["entryPoints"][0], "websecure");
    assert_eq!(router["service"], "svc-1@http");
    assert_eq!(router["priority"], 100);
}

/// Scenario B — operator attaches middleware.
#[tokio::test]
async fn scenario_b_operator_attaches_middleware() {
    let store = test_store().await;
    watch_tick(&store, vec![minimal_resource("r1", "app.example.com", "svc-1")], vec![], "platform").await;

    let middleware = store
        .middlewares
        .create(
            "auth".to_string(),
            "forwardAuth".to_string(),
            json!({"address": "http://a/v", "trustForwardHeader": true}),
        )
        .await
        .unwrap();
    store.resources.attach_middleware("r1", middleware.id, 200).await.unwrap();

    let artifact_dir = tempfile::tempdir().unwrap();
    let generator = test_generator(store, artifact_dir.path()).await;
    generator.generate_once().await.unwrap();

    let doc = read_artifact(artifact_dir.path()).await;
    assert_eq!(
        doc["http"]["middlewares"]["auth"],
        serde_yaml::to_value(json!({"address": "http://a/v", "trustForwardHeader": true})).unwrap()
    );
    assert_eq!(doc["http"]["routers"]["r1-router"]["middlewares"][0], "auth@file");
}

/// Scenario C — upstream disappears, then returns with a different host;
/// operator overrides on the resource are left untouched by recovery.
#[tokio::test]
async fn scenario_c_disappear_then_recover() {
    let store = test_store().await;
    watch_tick(&store, vec![minimal_resource("r1", "app.example.com", "svc-1")], vec![], "platform").await;

    // Operator overrides a router-priority column through the same path the
    // PATCH /api/resources/:id handler calls.
    store
        .resources
        .update_overrides("r1", None, None, None, None, None, None, Some(250))
        .await
        .unwrap();

    // Upstream stops reporting r1.
    watch_tick(&store, vec![], vec![], "platform").await;
    let row = store.resources.find_by_id("r1").await.unwrap().unwrap();
    assert_eq!(row.status, router_sync::models::ResourceStatus::Disabled);

    let artifact_dir = tempfile::tempdir().unwrap();
    let generator = test_generator(store.clone(), artifact_dir.path()).await;
    generator.generate_once().await.unwrap();
    let doc = read_artifact(artifact_dir.path()).await;
    assert!(doc["http"]["routers"].get("r1-router").is_none());

    // Upstream reports it again under a new host.
    watch_tick(&store, vec![minimal_resource("r1", "app2.example.com", "svc-1")], vec![], "platform").await;
    let row = store.resources.find_by_id("r1").await.unwrap().unwrap();
    assert_eq!(row.status, router_sync::models::ResourceStatus::Active);
    assert_eq!(row.host, "app2.example.com");
    assert_eq!(row.router_priority, 250, "operator override must survive recovery");
}

/// Scenario D — regex preservation, byte-for-byte.
#[tokio::test]
async fn scenario_d_regex_preservation() {
    let store = test_store().await;
    let middleware = store
        .middlewares
        .create(
            "rewrite".to_string(),
            "replacePathRegex".to_string(),
            json!({"regex": "^/foo/(.*)$", "replacement": "/bar/$1"}),
        )
        .await
        .unwrap();
    assert_eq!(middleware.config["regex"], "^/foo/(.*)$");
    assert_eq!(middleware.config["replacement"], "/bar/$1");

    let artifact_dir = tempfile::tempdir().unwrap();
    let generator = test_generator(store, artifact_dir.path()).await;
    generator.generate_once().await.unwrap();

    let doc = read_artifact(artifact_dir.path()).await;
    assert_eq!(doc["http"]["middlewares"]["rewrite"]["regex"], "^/foo/(.*)$");
    assert_eq!(doc["http"]["middlewares"]["rewrite"]["replacement"], "/bar/$1");
}

/// Scenario E — header removal, empty-string value preserved.
#[tokio::test]
async fn scenario_e_header_removal() {
    let store = test_store().await;
    store
        .middlewares
        .create(
            "strip-server".to_string(),
            "headers".to_string(),
            json!({"customResponseHeaders": {"Server": "", "X-Frame-Options": "DENY"}}),
        )
        .await
        .unwrap();

    let artifact_dir = tempfile::tempdir().unwrap();
    let generator = test_generator(store, artifact_dir.path()).await;
    generator.generate_once().await.unwrap();

    let doc = read_artifact(artifact_dir.path()).await;
    let headers = &doc["http"]["middlewares"]["strip-server"]["customResponseHeaders"];
    assert_eq!(headers["Server"], "");
    assert_eq!(headers["X-Frame-Options"], "DENY");
}

/// Scenario F — duplicate sweep merges suffixed duplicates and repoints
/// the references that named them.
#[tokio::test]
async fn scenario_f_duplicate_sweep() {
    let store = test_store().await;
    for id in ["svc1", "svc1@file", "svc1@docker"] {
        let now = chrono::Utc::now();
        let active = services::ActiveModel {
            id: Set(id.to_string()),
            name: Set("svc1".to_string()),
            r#type: Set("loadBalancer".to_string()),
            config: Set("{}".to_string()),
            protocol_hint: Set(None),
            origin: Set("platform".to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        active.insert(&*store.connection).await.unwrap();
    }
    watch_tick(&store, vec![minimal_resource("r1", "app.example.com", "svc1@docker")], vec![], "platform").await;
    store.resources.set_custom_service("r1", "svc1@file").await.unwrap();

    let report = maintenance::run(&store, &maintenance::SweepConfig::default(), false).await.unwrap();
    assert_eq!(report.services_removed.len(), 2);

    let remaining = Services::find().all(&*store.connection).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, "svc1");

    let projections = store.resources.get_resources().await.unwrap();
    assert_eq!(projections[0].custom_service_id.as_deref(), Some("svc1"));
}

/// A resource still reported by the upstream cannot be deleted; only once
/// the Watcher has disabled it (upstream stopped reporting it) can an
/// operator remove it (spec §3 lifecycle invariant).
#[tokio::test]
async fn active_resource_cannot_be_deleted_until_disabled() {
    let store = test_store().await;
    watch_tick(&store, vec![minimal_resource("r1", "app.example.com", "svc-1")], vec![], "platform").await;

    assert!(store.resources.delete("r1").await.is_err());

    watch_tick(&store, vec![], vec![], "platform").await;
    store.resources.delete("r1").await.unwrap();
    assert!(store.resources.find_by_id("r1").await.unwrap().is_none());
}
