//! Proxy variant (spec §4.2): fetches the live router and service lists
//! directly from the proxy's own admin endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::database::maintenance::normalize_id;
use crate::errors::DataSourceError;
use crate::models::{BasicAuthConfig, DiscoveredResource, DiscoveredService};

use super::DataSource;

pub struct ProxyDataSource {
    client: reqwest::Client,
    base_url: String,
    basic_auth: Option<BasicAuthConfig>,
}

impl ProxyDataSource {
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
}

#[derive(Debug, Deserialize)]
struct ProxyRouter {
    #[serde(default)]
    rule: String,
    #[serde(default)]
    service: Option<String>,
    #[serde(default, rename = "entryPoints")]
    entry_points: Vec<String>,
    #[serde(default)]
    tls: Option<ProxyTls>,
    #[serde(default)]
    priority: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct ProxyTls {
    #[serde(default)]
    domains: Vec<ProxyTlsDomain>,
}

#[derive(Debug, Deserialize)]
struct ProxyTlsDomain {
    #[serde(default)]
    main: Option<String>,
    #[serde(default)]
    sans: Vec<String>,
}


#[async_trait]
impl DataSource for ProxyDataSource {
    fn source_type(&self) -> &'static str {
        "proxy"
    }

    async fn fetch_resources(&self) -> Result<Vec<DiscoveredResource>, DataSourceError> {
        let mut discovered = Vec::new();

        let http_routers: std::collections::HashMap<String, ProxyRouter> = self
            .request(format!("{}/api/http/routers", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        for (name, router) in http_routers {
            let id = normalize_id(&name).to_string();
            let mut tls_sans = Vec::new();
            if let Some(tls) = &router.tls {
                for domain in &tls.domains {
                    if let Some(main) = &domain.main {
                        tls_sans.push(main.clone());
                    }
                    tls_sans.extend(domain.sans.iter().cloned());
                }
            }
            discovered.push(DiscoveredResource {
                id,
                host: extract_host(&router.rule).unwrap_or_else(|| name.clone()),
                service_id: router.service.unwrap_or_else(|| name.clone()),
                org_id: None,
                site_id: None,
                entrypoints: router.entry_points,
                tls_sans,
                tcp_enabled: false,
                tcp_entrypoints: Vec::new(),
                tcp_sni_rule: None,
                router_priority: router.priority.unwrap_or(100),
                source_type: "proxy".to_string(),
            });
        }

        let tcp_routers: std::collections::HashMap<String, ProxyRouter> = self
            .request(format!("{}/api/tcp/routers", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        for (name, router) in tcp_routers {
            let id = normalize_id(&name).to_string();
            if let Some(existing) = discovered.iter_mut().find(|r| r.id == id) {
                existing.tcp_enabled = true;
                existing.tcp_entrypoints = router.entry_points;
                existing.tcp_sni_rule = Some(router.rule);
                continue;
            }
            discovered.push(DiscoveredResource {
                id,
                host: extract_host(&router.rule).unwrap_or_else(|| name.clone()),
                service_id: router.service.unwrap_or_else(|| name.clone()),
                org_id: None,
                site_id: None,
                entrypoints: Vec::new(),
                tls_sans: Vec::new(),
                tcp_enabled: true,
                tcp_entrypoints: router.entry_points,
                tcp_sni_rule: Some(router.rule),
                router_priority: router.priority.unwrap_or(100),
                source_type: "proxy".to_string(),
            });
        }

        Ok(discovered)
    }

    async fn fetch_services(&self) -> Result<Vec<DiscoveredService>, DataSourceError> {
        let http_services: std::collections::HashMap<String, serde_json::Value> = self
            .request(format!("{}/api/http/services", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let tcp_services: std::collections::HashMap<String, serde_json::Value> = self
            .request(format!("{}/api/tcp/services", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(http_services
            .into_iter()
            .chain(tcp_services)
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
        self.request(format!("{}/api/version", self.base_url))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Extracts the hostname out of a `Host(\`example.com\`)`-shaped rule.
/// Proxy rules combine predicates with `&&`/`||`; only the first `Host(...)`
/// match is used, matching the spec's "TLS SANs come from router.tls.domains"
/// framing of the router as the host's single source of truth.
fn extract_host(rule: &str) -> Option<String> {
    let start = rule.find("Host(`").map(|idx| idx + "Host(`".len())?;
    let rest = &rule[start..];
    let end = rest.find('`')?;
    Some(rest[..end].to_string())
}
