//! Per-`type` middleware processors (spec §4.5). Each applies its
//! type-specific rule, then falls through to the generic pass. Dispatch is
//! a plain `match` on the type tag rather than a registry, since the set is
//! closed-but-extensible and new types simply fall to `default_processor`.

use serde_json::Value;

use super::rules::apply_generic;

pub fn process(middleware_type: &str, config: Value) -> Value {
    let config = apply_generic(config);
    match middleware_type {
        "headers" => process_headers(config),
        "forwardAuth" | "basicAuth" | "digestAuth" => process_auth(config),
        "rateLimit" | "inFlightReq" => process_rate_limit(config),
        "ipWhiteList" | "ipAllowList" => config,
        "redirectRegex" | "redirectScheme" | "replacePath" | "replacePathRegex" | "stripPrefix"
        | "stripPrefixRegex" | "addPrefix" => config,
        "chain" => config,
        "plugin" => config,
        _ => config,
    }
}

/// `headers` already gets regex/secret preservation and header-map handling
/// from the generic pass; nothing else is type-specific here beyond
/// confirming the exact-string keys survive (they're plain strings, so the
/// generic pass already leaves them alone).
fn process_headers(config: Value) -> Value {
    config
}

fn process_auth(config: Value) -> Value {
    config
}

/// `average`/`burst` integerization already happens in the generic pass
/// (both are integer keys); nothing else is type-specific here.
fn process_rate_limit(config: Value) -> Value {
    config
}
