//! Reconciliation algorithm (spec §4.3). Runs once per tick, entirely under
//! one transaction per upstream batch so a crash mid-sweep leaves the Store
//! consistent with some prior tick. Operates on entities directly against
//! the open `DatabaseTransaction`, the same pattern `database::maintenance`
//! uses, rather than through the `Store`'s connection-bound repositories.

use std::collections::HashMap;

use sea_orm::{ActiveModelTrait, DatabaseTransaction, EntityTrait, Set};
use tracing::debug;

use crate::database::maintenance::normalize_id;
use crate::entities::{prelude::*, resources, services};
use crate::errors::AppError;
use crate::models::{
    DiscoveredResource, DiscoveredService, ResourceStatus, DEFAULT_ENTRYPOINT,
    DEFAULT_ROUTER_PRIORITY, DEFAULT_TCP_ENTRYPOINT,
};

use crate::database::repositories::traits::now;

/// Reconciles the resource table against one fetch of upstream resources
/// (spec §4.3 steps 2-4).
pub async fn reconcile_resources(
    txn: &DatabaseTransaction,
    upstream: Vec<DiscoveredResource>,
) -> Result<(), AppError> {
    let mut upstream_by_id: HashMap<String, DiscoveredResource> = HashMap::new();
    for resource in upstream {
        upstream_by_id.insert(normalize_id(&resource.id).to_string(), resource);
    }

    let local: HashMap<String, resources::Model> = Resources::find()
        .all(txn)
        .await?
        .into_iter()
        .map(|model| (model.id.clone(), model))
        .collect();

    for (id, discovered) in &upstream_by_id {
        match local.get(id) {
            None => {
                insert_resource(txn, id, discovered).await?;
            }
            Some(existing) if existing.status == ResourceStatus::Disabled.as_str() => {
                recover_resource(txn, existing, discovered).await?;
            }
            Some(existing) => {
                refresh_resource(txn, existing, discovered).await?;
            }
        }
    }

    for (id, existing) in &local {
        if !upstream_by_id.contains_key(id) && existing.status == ResourceStatus::Active.as_str() {
            disable_resource(txn, existing).await?;
        }
    }

    Ok(())
}

/// Reconciles the service inventory (spec §4.3 step 5). Services have no
/// disabled status; orphans are left for the duplicate sweep. `source_type`
/// tags newly inserted rows with the data source's origin so the Generator
/// knows not to re-emit them (spec §4.4 step 5 emits operator-defined
/// services only).
pub async fn reconcile_services(
    txn: &DatabaseTransaction,
    upstream: Vec<DiscoveredService>,
    source_type: &str,
) -> Result<(), AppError> {
    let local: HashMap<String, services::Model> = Services::find()
        .all(txn)
        .await?
        .into_iter()
        .map(|model| (model.id.clone(), model))
        .collect();

    for discovered in upstream {
        match local.get(&discovered.id) {
            None => {
                let now = now();
                let active = services::ActiveModel {
                    id: Set(discovered.id),
                    name: Set(discovered.name),
                    r#type: Set(discovered.r#type),
                    config: Set(discovered.config.to_string()),
                    protocol_hint: Set(None),
                    origin: Set(source_type.to_string()),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                active.insert(txn).await?;
            }
            Some(existing) => {
                let config = discovered.config.to_string();
                if existing.name != discovered.name
                    || existing.r#type != discovered.r#type
                    || existing.config != config
                {
                    let mut active: services::ActiveModel = existing.clone().into();
                    active.name = Set(discovered.name);
                    active.r#type = Set(discovered.r#type);
                    active.config = Set(config);
                    active.updated_at = Set(now());
                    active.update(txn).await?;
                }
            }
        }
    }

    Ok(())
}

async fn insert_resource(
    txn: &DatabaseTransaction,
    id: &str,
    discovered: &DiscoveredResource,
) -> Result<(), AppError> {
    debug!(resource_id = id, "inserting newly discovered resource");
    let now = now();
    let active = resources::ActiveModel {
        id: Set(id.to_string()),
        host: Set(discovered.host.clone()),
        service_id: Set(discovered.service_id.clone()),
        org_id: Set(discovered.org_id.clone()),
        site_id: Set(discovered.site_id.clone()),
        status: Set(ResourceStatus::Active.as_str().to_string()),
        source_type: Set(discovered.source_type.clone()),
        entrypoints: Set(if discovered.entrypoints.is_empty() {
            DEFAULT_ENTRYPOINT.to_string()
        } else {
            discovered.entrypoints.join(",")
        }),
        tls_domains: Set(discovered.tls_sans.join(",")),
        tcp_enabled: Set(discovered.tcp_enabled),
        tcp_entrypoints: Set(if discovered.tcp_entrypoints.is_empty() {
            DEFAULT_TCP_ENTRYPOINT.to_string()
        } else {
            discovered.tcp_entrypoints.join(",")
        }),
        tcp_sni_rule: Set(discovered.tcp_sni_rule.clone().unwrap_or_default()),
        custom_headers: Set("{}".to_string()),
        router_priority: Set(if discovered.router_priority == 0 {
            DEFAULT_ROUTER_PRIORITY
        } else {
            discovered.router_priority
        }),
        created_at: Set(now),
        updated_at: Set(now),
    };
    active.insert(txn).await?;
    Ok(())
}

/// Recovers a disabled resource (spec §9 resolution #2): always refreshes
/// `host`/`service_id`; refreshes `org_id`/`site_id` only when `source_type`
/// changed. Operator-owned override columns are never touched.
async fn recover_resource(
    txn: &DatabaseTransaction,
    existing: &resources::Model,
    discovered: &DiscoveredResource,
) -> Result<(), AppError> {
    debug!(resource_id = %existing.id, "recovering disabled resource");
    apply_upstream_fields(txn, existing, discovered, ResourceStatus::Active).await
}

async fn refresh_resource(
    txn: &DatabaseTransaction,
    existing: &resources::Model,
    discovered: &DiscoveredResource,
) -> Result<(), AppError> {
    let source_type_changed = existing.source_type != discovered.source_type;
    let host_changed = existing.host != discovered.host;
    let service_id_changed = existing.service_id != discovered.service_id;
    if !host_changed && !service_id_changed && !source_type_changed {
        return Ok(());
    }
    apply_upstream_fields(txn, existing, discovered, ResourceStatus::Active).await
}

async fn apply_upstream_fields(
    txn: &DatabaseTransaction,
    existing: &resources::Model,
    discovered: &DiscoveredResource,
    status: ResourceStatus,
) -> Result<(), AppError> {
    let source_type_changed = existing.source_type != discovered.source_type;
    let mut active: resources::ActiveModel = existing.clone().into();
    active.host = Set(discovered.host.clone());
    active.service_id = Set(discovered.service_id.clone());
    active.status = Set(status.as_str().to_string());
    active.source_type = Set(discovered.source_type.clone());
    if source_type_changed {
        active.org_id = Set(discovered.org_id.clone());
        active.site_id = Set(discovered.site_id.clone());
    }
    active.updated_at = Set(now());
    active.update(txn).await?;
    Ok(())
}

async fn disable_resource(txn: &DatabaseTransaction, existing: &resources::Model) -> Result<(), AppError> {
    debug!(resource_id = %existing.id, "disabling resource absent from upstream");
    let active = resources::ActiveModel {
        id: Set(existing.id.clone()),
        status: Set(ResourceStatus::Disabled.as_str().to_string()),
        updated_at: Set(now()),
        ..Default::default()
    };
    active.update(txn).await?;
    Ok(())
}
