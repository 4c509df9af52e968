//! Domain model types shared across the Store, Watcher, Generator, and
//! Normalizer. These are plain structs independent of the SeaORM entity
//! representation (`crate::entities`) — repositories translate between the
//! two at the boundary, matching the teacher's model/entity split.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed-but-extensible vocabulary of middleware types (spec §3).
pub const MIDDLEWARE_TYPES: &[&str] = &[
    "forwardAuth",
    "basicAuth",
    "digestAuth",
    "headers",
    "rateLimit",
    "inFlightReq",
    "ipWhiteList",
    "ipAllowList",
    "redirectRegex",
    "redirectScheme",
    "replacePath",
    "replacePathRegex",
    "stripPrefix",
    "stripPrefixRegex",
    "addPrefix",
    "chain",
    "plugin",
    "compress",
    "buffering",
    "contentType",
    "circuitBreaker",
    "retry",
    "errors",
    "grpcWeb",
    "passTLSClientCert",
];

pub const SERVICE_TYPES: &[&str] = &["loadBalancer", "weighted", "mirroring", "failover"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Middleware {
    pub id: Uuid,
    pub name: String,
    pub r#type: String,
    pub config: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolHint {
    Tcp,
    Udp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    /// Upstream-style id (spec §4.6): may carry a `@provider` suffix for
    /// discovered services, or a plain generated id for operator-created
    /// ones. Never a native UUID column — the duplicate sweep keys on this
    /// the same way it keys on `Resource::id`.
    pub id: String,
    pub name: String,
    pub r#type: String,
    pub config: serde_json::Value,
    /// Resolves the spec's Open Question on `loadBalancer` protocol
    /// classification: made explicit data instead of inferred from server
    /// shape. Only meaningful for `type == "loadBalancer"` with
    /// `address`-shaped servers; `None` means TCP (the spec's default).
    pub protocol_hint: Option<ProtocolHint>,
    /// `"operator"` or a data source's `source_type` string; see
    /// `entities::services::Model::origin`.
    pub origin: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const SERVICE_ORIGIN_OPERATOR: &str = "operator";

impl Service {
    pub fn is_operator_defined(&self) -> bool {
        self.origin == SERVICE_ORIGIN_OPERATOR
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    Active,
    Disabled,
}

impl ResourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceStatus::Active => "active",
            ResourceStatus::Disabled => "disabled",
        }
    }
}

/// A routable entity discovered upstream (spec §3). `id` is always the
/// *normalized* id (raw id with any `@provider` suffix stripped) — the
/// Watcher and duplicate sweep never key on the raw upstream id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub host: String,
    pub service_id: String,
    pub org_id: Option<String>,
    pub site_id: Option<String>,
    pub status: ResourceStatus,
    pub source_type: String,

    // Operator-owned override columns (spec §4.3, §9 "two-writer
    // partitioning"). Never written by the Watcher once a resource exists.
    pub entrypoints: String,
    pub tls_domains: String,
    pub tcp_enabled: bool,
    pub tcp_entrypoints: String,
    pub tcp_sni_rule: String,
    pub custom_headers: serde_json::Value,
    pub router_priority: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const DEFAULT_ENTRYPOINT: &str = "websecure";
pub const DEFAULT_TCP_ENTRYPOINT: &str = "tcp";
pub const DEFAULT_ROUTER_PRIORITY: i32 = 100;

impl Resource {
    pub fn entrypoints_list(&self) -> Vec<String> {
        split_or_default(&self.entrypoints, DEFAULT_ENTRYPOINT)
    }

    pub fn tls_domains_list(&self) -> Vec<String> {
        self.tls_domains
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn tcp_entrypoints_list(&self) -> Vec<String> {
        split_or_default(&self.tcp_entrypoints, DEFAULT_TCP_ENTRYPOINT)
    }

    pub fn has_custom_headers(&self) -> bool {
        matches!(&self.custom_headers, serde_json::Value::Object(m) if !m.is_empty())
    }
}

fn split_or_default(raw: &str, default: &str) -> Vec<String> {
    let values: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if values.is_empty() {
        vec![default.to_string()]
    } else {
        values
    }
}

/// `(resource_id, middleware_id)` plus chain priority (spec §3). Higher
/// priority runs earlier in the emitted chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceMiddleware {
    pub resource_id: String,
    pub middleware_id: Uuid,
    pub priority: i32,
}

/// A parsed `"id:name:priority"` triple as returned by `GetResources()`'s
/// denormalized middleware projection (spec §4.1).
#[derive(Debug, Clone)]
pub struct AttachedMiddlewareRef {
    pub id: Uuid,
    pub name: String,
    pub priority: i32,
}

/// Zero-or-one override of a resource's default service (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceService {
    pub resource_id: String,
    pub service_id: String,
}

/// Flat read projection returned by `Store::get_resources` (spec §4.1):
/// a resource joined with its attached middlewares and, if present, its
/// custom service override.
#[derive(Debug, Clone)]
pub struct ResourceProjection {
    pub resource: Resource,
    pub middlewares: Vec<AttachedMiddlewareRef>,
    pub custom_service_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceType {
    Platform,
    Proxy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicAuthConfig {
    pub username: String,
    pub password: String,
}

/// `DataSourceConfig` (spec §3/§6): held in the JSON config file, mirrored
/// in-process by `DataSourceManager`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSourceConfig {
    pub r#type: DataSourceType,
    pub url: String,
    pub basic_auth: Option<BasicAuthConfig>,
}

/// A resource as reported by an upstream `DataSource` on one fetch (spec
/// §4.2). `id` has *not* been normalized yet — callers normalize it before
/// indexing.
#[derive(Debug, Clone)]
pub struct DiscoveredResource {
    pub id: String,
    pub host: String,
    pub service_id: String,
    pub org_id: Option<String>,
    pub site_id: Option<String>,
    pub entrypoints: Vec<String>,
    pub tls_sans: Vec<String>,
    pub tcp_enabled: bool,
    pub tcp_entrypoints: Vec<String>,
    pub tcp_sni_rule: Option<String>,
    pub router_priority: i32,
    pub source_type: String,
}

#[derive(Debug, Clone)]
pub struct DiscoveredService {
    pub id: String,
    pub name: String,
    pub r#type: String,
    pub config: serde_json::Value,
}
