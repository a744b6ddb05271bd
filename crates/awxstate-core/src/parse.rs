//! shared json/yaml parsing and emission helpers.

use serde_json::Value as JsonValue;
use serde_yaml::{Mapping as YamlMapping, Value as YamlValue};

/// parse json text into a generic value.
pub fn parse_json(text: &str) -> Result<JsonValue, serde_json::Error> {
    serde_json::from_str(text)
}

/// parse yaml text into a generic value.
pub fn parse_yaml(text: &str) -> Result<YamlValue, serde_yaml::Error> {
    serde_yaml::from_str(text)
}

/// emit compact json. object keys come out sorted since `serde_json::Map`
/// is btree-backed.
pub fn emit_json(value: &JsonValue) -> String {
    value.to_string()
}

/// emit block-style yaml with mapping keys sorted at every depth.
///
/// scalars are quoted by yaml 1.2 rules: strings such as `no`, `yes` or `on`
/// come out bare, which a yaml 1.1 reader (ansible) takes as booleans.
/// strings that are 1.2 booleans or numbers stay quoted.
pub fn emit_yaml(value: YamlValue) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(&sorted(value))
}

/// parse a json or yaml document into a json value, json first.
///
/// returns `None` when neither format accepts the text, or when the yaml
/// value has no json equivalent.
pub fn parse_document(text: &str) -> Option<JsonValue> {
    if let Ok(value) = parse_json(text) {
        return Some(value);
    }
    let yaml = parse_yaml(text).ok()?;
    serde_json::to_value(yaml).ok()
}

fn sorted(value: YamlValue) -> YamlValue {
    match value {
        YamlValue::Mapping(mapping) => {
            let mut entries: Vec<(YamlValue, YamlValue)> = mapping.into_iter().collect();
            entries.sort_by_cached_key(|(key, _)| key_order(key));
            let mut out = YamlMapping::new();
            for (key, value) in entries {
                out.insert(key, sorted(value));
            }
            YamlValue::Mapping(out)
        }
        YamlValue::Sequence(items) => YamlValue::Sequence(items.into_iter().map(sorted).collect()),
        YamlValue::Tagged(mut tagged) => {
            let inner = std::mem::replace(&mut tagged.value, YamlValue::Null);
            tagged.value = sorted(inner);
            YamlValue::Tagged(tagged)
        }
        other => other,
    }
}

// string keys first, everything else ordered by its rendered form.
fn key_order(key: &YamlValue) -> (u8, String) {
    match key {
        YamlValue::String(s) => (0, s.clone()),
        other => (1, serde_yaml::to_string(other).unwrap_or_default()),
    }
}
