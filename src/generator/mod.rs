//! Periodic dynamic-config materialization (spec §4.4). Grounded on the
//! teacher's `proxy::generator::ProxyGenerator` shape — read store, build an
//! in-memory document, serialize, write atomically — and on
//! `services::embedded_font`'s `tempfile::NamedTempFile` write-then-persist
//! pattern for the atomicity requirement.

pub mod document;
pub mod suffix;

use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;

use sandboxed_file_manager::SandboxedManager;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::GeneratorConfig;
use crate::database::Store;
use crate::errors::{AppError, GeneratorError};
use crate::models::{AttachedMiddlewareRef, ProtocolHint, Resource, ResourceProjection, ResourceStatus, Service};
use crate::normalizer;

use document::{DynamicConfig, HttpRouter, TcpRouter, TlsBlock, TlsDomain};
use suffix::{suffix_config_refs, suffix_ref};

pub struct Generator {
    store: Store,
    config: GeneratorConfig,
    artifacts: SandboxedManager,
}

impl Generator {
    pub async fn new(
        store: Store,
        config: GeneratorConfig,
        artifact_dir: PathBuf,
    ) -> Result<Self, AppError> {
        let artifacts = SandboxedManager::builder()
            .base_directory(artifact_dir)
            .build()
            .await
            .map_err(GeneratorError::from)?;
        Ok(Self {
            store,
            config,
            artifacts,
        })
    }

    /// Runs the materialization loop on `config.interval_secs` until
    /// `shutdown` fires, independent of the Watcher's own schedule.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(self.config.interval_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!(interval_secs = self.config.interval_secs, "generator started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(err) = self.generate_once().await {
                        warn!("config generation failed, previous artifact left untouched: {err}");
                    }
                }
                _ = shutdown.recv() => {
                    info!("generator stopping");
                    break;
                }
            }
        }
    }

    /// One tick of the algorithm in spec §4.4: read → build → serialize →
    /// write. Returns early (leaving the previous artifact untouched) on
    /// any failure; callers are responsible for logging.
    pub async fn generate_once(&self) -> Result<(), AppError> {
        let resources = self.store.resources.get_resources().await?;
        let middlewares = self.store.middlewares.get_all().await?;
        let services = self.store.services.get_all().await?;

        let active: Vec<ResourceProjection> = resources
            .into_iter()
            .filter(|p| p.resource.status == ResourceStatus::Active)
            .collect();
        let operator_services: Vec<&Service> =
            services.iter().filter(|s| s.is_operator_defined()).collect();

        let locally_defined = locally_defined_names(&middlewares, &operator_services, &active);

        let mut document = DynamicConfig::default();

        for middleware in &middlewares {
            let config = normalizer::normalize_middleware(&middleware.r#type, middleware.config.clone());
            let config = suffix_config_refs(&middleware.r#type, config, &locally_defined);
            document.http.middlewares.insert(middleware.name.clone(), config);
        }

        for service in &operator_services {
            let config = normalizer::normalize_service(&service.r#type, service.config.clone());
            let config = suffix_config_refs(&service.r#type, config, &locally_defined);
            match classify_service(service) {
                ServiceClass::Http => document.http.services.insert(service.id.clone(), config),
                ServiceClass::Tcp => document.tcp.services.insert(service.id.clone(), config),
                ServiceClass::Udp => document.udp.services.insert(service.id.clone(), config),
            };
        }

        for projection in &active {
            build_resource_routers(&mut document, projection, &locally_defined, &self.config.tls_cert_resolver);
        }

        let yaml = serde_yaml::to_string(&document).map_err(GeneratorError::from)?;
        self.write_atomic(&yaml).await?;
        debug!(
            routers = document.http.routers.len() + document.tcp.routers.len(),
            "dynamic config written"
        );
        Ok(())
    }

    async fn write_atomic(&self, yaml: &str) -> Result<(), AppError> {
        let relative = self.config.output_path.to_string_lossy().to_string();
        let destination = self
            .artifacts
            .get_full_path(&relative)
            .map_err(GeneratorError::from)?;
        let dir = destination.parent().unwrap_or_else(|| destination.as_path());
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(GeneratorError::from)?;

        let mut temp_file = tempfile::NamedTempFile::new_in(dir).map_err(GeneratorError::from)?;
        temp_file
            .write_all(yaml.as_bytes())
            .map_err(GeneratorError::from)?;
        temp_file.flush().map_err(GeneratorError::from)?;
        temp_file
            .persist(&destination)
            .map_err(|err| GeneratorError::from(err.error))?;
        Ok(())
    }
}

fn locally_defined_names(
    middlewares: &[crate::models::Middleware],
    operator_services: &[&Service],
    active: &[ResourceProjection],
) -> HashSet<String> {
    let mut names = HashSet::new();
    for middleware in middlewares {
        names.insert(middleware.name.clone());
    }
    for service in operator_services {
        names.insert(service.id.clone());
    }
    for projection in active {
        if projection.resource.has_custom_headers() {
            names.insert(headers_middleware_name(&projection.resource.id));
        }
    }
    names
}

fn headers_middleware_name(resource_id: &str) -> String {
    format!("{resource_id}-headers")
}

/// Resolves a router's service reference (spec §4.4 step 3): a custom
/// override is always `@file` (it names something this tick defines), the
/// upstream default is always `@http`, unless the id already carries its
/// own provider suffix.
fn resolve_service_ref(resource: &Resource, custom_service_id: &Option<String>) -> String {
    match custom_service_id {
        Some(id) if id.contains('@') => id.clone(),
        Some(id) => format!("{id}@file"),
        None if resource.service_id.contains('@') => resource.service_id.clone(),
        None => format!("{}@http", resource.service_id),
    }
}

fn sorted_middleware_names(mut attached: Vec<AttachedMiddlewareRef>) -> Vec<String> {
    attached.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));
    attached.into_iter().map(|m| m.name).collect()
}

fn build_resource_routers(
    document: &mut DynamicConfig,
    projection: &ResourceProjection,
    locally_defined: &HashSet<String>,
    tls_cert_resolver: &str,
) {
    let resource = &projection.resource;
    let mut middleware_names = Vec::new();

    if resource.has_custom_headers() {
        let name = headers_middleware_name(&resource.id);
        let config = serde_json::json!({ "customRequestHeaders": resource.custom_headers });
        let config = normalizer::normalize_middleware("headers", config);
        document.http.middlewares.insert(name.clone(), config);
        middleware_names.push(name);
    }
    middleware_names.extend(sorted_middleware_names(projection.middlewares.clone()));

    let suffixed_middlewares: Vec<String> = middleware_names
        .iter()
        .map(|name| suffix_ref(name, locally_defined))
        .collect();
    let service = resolve_service_ref(resource, &projection.custom_service_id);

    let tls = TlsBlock {
        cert_resolver: tls_cert_resolver.to_string(),
        domains: vec![TlsDomain {
            main: resource.host.clone(),
            sans: resource.tls_domains_list(),
        }],
    };

    document.http.routers.insert(
        format!("{}-router", resource.id),
        HttpRouter {
            rule: format!("Host(`{}`)", resource.host),
            entry_points: resource.entrypoints_list(),
            priority: resource.router_priority,
            tls: Some(tls),
            middlewares: suffixed_middlewares,
            service: service.clone(),
        },
    );

    if resource.tcp_enabled {
        let rule = if resource.tcp_sni_rule.is_empty() {
            format!("HostSNI(`{}`)", resource.host)
        } else {
            resource.tcp_sni_rule.clone()
        };
        document.tcp.routers.insert(
            format!("{}-tcp-router", resource.id),
            TcpRouter {
                rule,
                entry_points: resource.tcp_entrypoints_list(),
                service,
            },
        );
    }
}

enum ServiceClass {
    Http,
    Tcp,
    Udp,
}

/// Spec §4.4 step 5 / §9 Open Question resolution #1: protocol is explicit
/// data (`protocol_hint`) rather than inferred from server shape, except for
/// distinguishing `address`-shaped load balancers (TCP/UDP) from
/// `url`-shaped ones (HTTP), which the shape itself determines unambiguously.
fn classify_service(service: &Service) -> ServiceClass {
    if service.r#type != "loadBalancer" {
        return ServiceClass::Http;
    }
    let address_shaped = service
        .config
        .get("servers")
        .and_then(|v| v.as_array())
        .map(|servers| servers.iter().any(|s| s.get("address").is_some()))
        .unwrap_or(false);
    if !address_shaped {
        return ServiceClass::Http;
    }
    match service.protocol_hint {
        Some(ProtocolHint::Udp) => ServiceClass::Udp,
        _ => ServiceClass::Tcp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ResourceStatus, DEFAULT_ROUTER_PRIORITY};
    use chrono::Utc;

    fn base_resource() -> Resource {
        let now = Utc::now();
        Resource {
            id: "svc1".to_string(),
            host: "example.com".to_string(),
            service_id: "backend".to_string(),
            org_id: None,
            site_id: None,
            status: ResourceStatus::Active,
            source_type: "platform".to_string(),
            entrypoints: String::new(),
            tls_domains: String::new(),
            tcp_enabled: false,
            tcp_entrypoints: String::new(),
            tcp_sni_rule: String::new(),
            custom_headers: serde_json::Value::Object(Default::default()),
            router_priority: DEFAULT_ROUTER_PRIORITY,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn default_service_ref_gets_http_suffix() {
        let resource = base_resource();
        assert_eq!(resolve_service_ref(&resource, &None), "backend@http");
    }

    #[test]
    fn custom_service_ref_gets_file_suffix() {
        let resource = base_resource();
        let custom = Some("override-svc".to_string());
        assert_eq!(resolve_service_ref(&resource, &custom), "override-svc@file");
    }

    #[test]
    fn already_suffixed_refs_pass_through() {
        let resource = base_resource();
        assert_eq!(
            resolve_service_ref(&resource, &Some("svc@docker".to_string())),
            "svc@docker"
        );
    }

    #[test]
    fn middleware_order_is_priority_desc_then_id_asc() {
        use uuid::Uuid;
        let low_id = Uuid::from_u128(1);
        let high_id = Uuid::from_u128(2);
        let attached = vec![
            AttachedMiddlewareRef {
                id: high_id,
                name: "b".to_string(),
                priority: 5,
            },
            AttachedMiddlewareRef {
                id: low_id,
                name: "a".to_string(),
                priority: 10,
            },
            AttachedMiddlewareRef {
                id: low_id,
                name: "c".to_string(),
                priority: 5,
            },
        ];
        let ordered = sorted_middleware_names(attached);
        assert_eq!(ordered, vec!["a", "c", "b"]);
    }

    #[test]
    fn loadbalancer_with_url_servers_is_http() {
        let service = Service {
            id: "web".to_string(),
            name: "web".to_string(),
            r#type: "loadBalancer".to_string(),
            config: serde_json::json!({ "servers": [{ "url": "http://10.0.0.1:80" }] }),
            protocol_hint: None,
            origin: "operator".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(matches!(classify_service(&service), ServiceClass::Http));
    }

    #[test]
    fn loadbalancer_with_address_servers_defaults_to_tcp() {
        let service = Service {
            id: "db".to_string(),
            name: "db".to_string(),
            r#type: "loadBalancer".to_string(),
            config: serde_json::json!({ "servers": [{ "address": "10.0.0.1:5432" }] }),
            protocol_hint: None,
            origin: "operator".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(matches!(classify_service(&service), ServiceClass::Tcp));
    }

    #[test]
    fn loadbalancer_with_udp_hint_is_udp() {
        let service = Service {
            id: "dns".to_string(),
            name: "dns".to_string(),
            r#type: "loadBalancer".to_string(),
            config: serde_json::json!({ "servers": [{ "address": "10.0.0.1:53" }] }),
            protocol_hint: Some(ProtocolHint::Udp),
            origin: "operator".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(matches!(classify_service(&service), ServiceClass::Udp));
    }

    #[test]
    fn weighted_always_http() {
        let service = Service {
            id: "w".to_string(),
            name: "w".to_string(),
            r#type: "weighted".to_string(),
            config: serde_json::json!({ "services": [] }),
            protocol_hint: None,
            origin: "operator".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(matches!(classify_service(&service), ServiceClass::Http));
    }
}
