//! Pure transformations applied to user-supplied JSON configs for
//! middlewares and services (spec §4.5), so regex, numeric, secret, and
//! header semantics survive decode → store → YAML-emit round-tripping.
//! Grounded on the teacher's `data_mapping::engine` dispatch-by-field-name
//! shape, adapted to dispatch by the config's `type` tag instead.

pub mod middleware_types;
pub mod rules;
pub mod service_types;

use serde_json::Value;

pub fn normalize_middleware(middleware_type: &str, config: Value) -> Value {
    middleware_types::process(middleware_type, config)
}

pub fn normalize_service(service_type: &str, config: Value) -> Value {
    service_types::process(service_type, config)
}
