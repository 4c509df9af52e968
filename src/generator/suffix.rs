//! Cross-provider suffixing (spec §4.4 "Cross-provider suffixing").
//! Computed at emission time — never stored — by checking candidate names
//! against the full set of names this tick is about to emit into
//! `http.middlewares` / `{http,tcp,udp}.services`.

use std::collections::HashSet;

/// Suffixes `id` with `@file` if it names something this tick emits into
/// the artifact, `@http` otherwise. An id that already carries an
/// `@provider` suffix is returned unchanged.
pub fn suffix_ref(id: &str, locally_defined: &HashSet<String>) -> String {
    if id.contains('@') {
        return id.to_string();
    }
    if locally_defined.contains(id) {
        format!("{id}@file")
    } else {
        format!("{id}@http")
    }
}

pub fn suffix_all(ids: &[String], locally_defined: &HashSet<String>) -> Vec<String> {
    ids.iter().map(|id| suffix_ref(id, locally_defined)).collect()
}

/// Rewrites the service-name references embedded inside a `chain`,
/// `weighted`, `mirroring`, or `failover` config so they carry the correct
/// cross-provider suffix (spec §4.4: "applied uniformly to... chain
/// middleware's middlewares[*], weighted/mirroring/failover service
/// references"). Other types are returned unchanged — their configs don't
/// reference other names.
pub fn suffix_config_refs(
    type_tag: &str,
    mut config: serde_json::Value,
    locally_defined: &HashSet<String>,
) -> serde_json::Value {
    match type_tag {
        "chain" => {
            if let Some(middlewares) = config.get_mut("middlewares").and_then(|v| v.as_array_mut())
            {
                for entry in middlewares {
                    if let Some(name) = entry.as_str() {
                        *entry = serde_json::Value::String(suffix_ref(name, locally_defined));
                    }
                }
            }
        }
        "weighted" => suffix_named_list(&mut config, "services", locally_defined),
        "mirroring" => {
            suffix_string_field(&mut config, "service", locally_defined);
            suffix_named_list(&mut config, "mirrors", locally_defined);
        }
        "failover" => {
            suffix_string_field(&mut config, "service", locally_defined);
            suffix_string_field(&mut config, "fallback", locally_defined);
        }
        _ => {}
    }
    config
}

fn suffix_string_field(
    config: &mut serde_json::Value,
    field: &str,
    locally_defined: &HashSet<String>,
) {
    if let Some(value) = config.get_mut(field) {
        if let Some(name) = value.as_str() {
            *value = serde_json::Value::String(suffix_ref(name, locally_defined));
        }
    }
}

fn suffix_named_list(config: &mut serde_json::Value, field: &str, locally_defined: &HashSet<String>) {
    if let Some(entries) = config.get_mut(field).and_then(|v| v.as_array_mut()) {
        for entry in entries {
            if let Some(name_field) = entry.get_mut("name") {
                if let Some(name) = name_field.as_str() {
                    *name_field = serde_json::Value::String(suffix_ref(name, locally_defined));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaves_already_suffixed_ids_unchanged() {
        let local = HashSet::new();
        assert_eq!(suffix_ref("svc@docker", &local), "svc@docker");
    }

    #[test]
    fn suffixes_file_defined_names_with_file() {
        let mut local = HashSet::new();
        local.insert("my-mw".to_string());
        assert_eq!(suffix_ref("my-mw", &local), "my-mw@file");
    }

    #[test]
    fn suffixes_unknown_names_with_http() {
        let local = HashSet::new();
        assert_eq!(suffix_ref("upstream-svc", &local), "upstream-svc@http");
    }
}
