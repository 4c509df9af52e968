//! Per-`type` service processors (spec §4.5), symmetric to
//! `middleware_types`. All the integer/string coercions are already handled
//! by the generic pass recursing into nested objects; these exist mainly to
//! document which service shapes are expected and to leave room for a
//! future type-specific exception.

use serde_json::Value;

use super::rules::apply_generic;

pub fn process(service_type: &str, config: Value) -> Value {
    let config = apply_generic(config);
    match service_type {
        "loadBalancer" => config,
        "weighted" => config,
        "mirroring" => config,
        "failover" => config,
        _ => config,
    }
}
