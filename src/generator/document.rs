//! Dynamic-config document shape (spec §4.4/§6): `http.{routers,
//! middlewares, services}`, `tcp.{routers, services}`, `udp.{services}`.

use std::collections::BTreeMap;

use serde::Serialize;

/// `BTreeMap` everywhere so the emitted YAML is byte-stable between ticks
/// when nothing actually changed — not a spec requirement, but it keeps the
/// proxy's file-watcher from churning on order-only diffs.
#[derive(Debug, Default, Serialize)]
pub struct DynamicConfig {
    pub http: HttpSection,
    #[serde(skip_serializing_if = "TcpSection::is_empty")]
    pub tcp: TcpSection,
    #[serde(skip_serializing_if = "UdpSection::is_empty")]
    pub udp: UdpSection,
}

#[derive(Debug, Default, Serialize)]
pub struct HttpSection {
    pub routers: BTreeMap<String, HttpRouter>,
    pub middlewares: BTreeMap<String, serde_json::Value>,
    pub services: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Default, Serialize)]
pub struct TcpSection {
    pub routers: BTreeMap<String, TcpRouter>,
    pub services: BTreeMap<String, serde_json::Value>,
}

impl TcpSection {
    fn is_empty(&self) -> bool {
        self.routers.is_empty() && self.services.is_empty()
    }
}

#[derive(Debug, Default, Serialize)]
pub struct UdpSection {
    pub services: BTreeMap<String, serde_json::Value>,
}

impl UdpSection {
    fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

#[derive(Debug, Serialize)]
pub struct HttpRouter {
    pub rule: String,
    #[serde(rename = "entryPoints")]
    pub entry_points: Vec<String>,
    pub priority: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsBlock>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub middlewares: Vec<String>,
    pub service: String,
}

#[derive(Debug, Serialize)]
pub struct TlsBlock {
    #[serde(rename = "certResolver")]
    pub cert_resolver: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<TlsDomain>,
}

#[derive(Debug, Serialize)]
pub struct TlsDomain {
    pub main: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sans: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TcpRouter {
    pub rule: String,
    #[serde(rename = "entryPoints")]
    pub entry_points: Vec<String>,
    pub service: String,
}
