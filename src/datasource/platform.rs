//! Platform variant (spec §4.2): fetches one aggregated document that
//! carries the platform's resource list (id/host/org/site) joined with its
//! router definitions, and a separate service inventory.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::database::maintenance::normalize_id;
use crate::errors::DataSourceError;
use crate::models::{BasicAuthConfig, DiscoveredResource, DiscoveredService};

use super::DataSource;

pub struct PlatformDataSource {
    client: reqwest::Client,
    base_url: String,
    basic_auth: Option<BasicAuthConfig>,
}

impl PlatformDataSource {
    pub fn new(base_url: String, basic_auth: Option<BasicAuthConfig>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            base_url,
            basic_auth,
        }
    }

    fn request(&self, url: String) -> reqwest::RequestBuilder {
        let builder = self.client.get(url);
        match &self.basic_auth {
            Some(auth) => builder.basic_auth(&auth.username, Some(&auth.password)),
            None => builder,
        }
    }

    async fn fetch_traefik_config(&self) -> Result<TraefikConfigDocument, DataSourceError> {
        Ok(self
            .request(format!("{}/traefik-config", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }
}

#[derive(Debug, Deserialize)]
struct TraefikConfigDocument {
    #[serde(default)]
    http: TraefikHttpSection,
}

#[derive(Debug, Default, Deserialize)]
struct TraefikHttpSection {
    #[serde(default)]
    routers: std::collections::HashMap<String, PlatformRouter>,
    #[serde(default)]
    services: std::collections::HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct PlatformResource {
    id: String,
    host: String,
    #[serde(default)]
    org_id: Option<String>,
    #[serde(default)]
    site_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlatformRouter {
    #[serde(default)]
    service: Option<String>,
    #[serde(default)]
    entry_points: Vec<String>,
    #[serde(default)]
    middlewares: Vec<String>,
    #[serde(default)]
    tls: Option<PlatformTls>,
    #[serde(default)]
    priority: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct PlatformTls {
    #[serde(default)]
    domains: Vec<PlatformTlsDomain>,
}

#[derive(Debug, Deserialize)]
struct PlatformTlsDomain {
    #[serde(default)]
    main: Option<String>,
    #[serde(default)]
    sans: Vec<String>,
}

#[async_trait]
impl DataSource for PlatformDataSource {
    fn source_type(&self) -> &'static str {
        "platform"
    }

    async fn fetch_resources(&self) -> Result<Vec<DiscoveredResource>, DataSourceError> {
        let resources: Vec<PlatformResource> = self
            .request(format!("{}/resources", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let document = self.fetch_traefik_config().await?;

        let mut discovered = Vec::with_capacity(resources.len());
        for resource in &resources {
            let router = document.http.routers.get(&resource.id);
            let mut tls_sans = Vec::new();
            if let Some(router) = router {
                if let Some(tls) = &router.tls {
                    for domain in &tls.domains {
                        if let Some(main) = &domain.main {
                            tls_sans.push(main.clone());
                        }
                        tls_sans.extend(domain.sans.iter().cloned());
                    }
                }
            }
            discovered.push(DiscoveredResource {
                id: normalize_id(&resource.id).to_string(),
                host: resource.host.clone(),
                service_id: router
                    .and_then(|r| r.service.clone())
                    .unwrap_or_else(|| resource.id.clone()),
                org_id: resource.org_id.clone(),
                site_id: resource.site_id.clone(),
                entrypoints: router.map(|r| r.entry_points.clone()).unwrap_or_default(),
                tls_sans,
                tcp_enabled: false,
                tcp_entrypoints: Vec::new(),
                tcp_sni_rule: None,
                router_priority: router.and_then(|r| r.priority).unwrap_or(100),
                source_type: "platform".to_string(),
            });
        }
        Ok(discovered)
    }

    async fn fetch_services(&self) -> Result<Vec<DiscoveredService>, DataSourceError> {
        let document = self.fetch_traefik_config().await?;
        Ok(document
            .http
            .services
            .into_iter()
            .map(|(name, config)| {
                let service_type = config
                    .get("type")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("loadBalancer")
                    .to_string();
                DiscoveredService {
                    id: name.clone(),
                    name,
                    r#type: service_type,
                    config,
                }
            })
            .collect())
    }

    async fn probe(&self) -> Result<(), DataSourceError> {
        self.request(format!("{}/resources?limit=1", self.base_url))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
