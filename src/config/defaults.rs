//! Default value functions for `#[serde(default = "...")]` fields, grounded
//! on the teacher's `config::defaults` module.

pub fn default_max_connections() -> u32 {
    25
}

pub fn default_min_connections() -> u32 {
    5
}

pub fn default_idle_timeout_secs() -> u64 {
    1800
}

pub fn default_max_lifetime_secs() -> u64 {
    1800
}

pub fn default_busy_timeout_secs() -> u64 {
    5
}

pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_port() -> u16 {
    8080
}

pub fn default_watcher_interval_secs() -> u64 {
    30
}

pub fn default_probe_timeout_secs() -> u64 {
    2
}

pub fn default_generator_interval_secs() -> u64 {
    10
}

pub fn default_tls_cert_resolver() -> String {
    "default".to_string()
}
