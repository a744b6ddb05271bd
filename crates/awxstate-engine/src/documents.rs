//! normalization of document-valued resource fields.

use crate::config::EngineConfig;
use awxstate_core::{into_state_text, normalize, normalize_json, normalize_yaml, FormatValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// how a document field is canonicalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Json,
    Yaml,
    /// json, then yaml, then the text unchanged.
    Auto,
}

/// normalize one raw field value.
///
/// strings are normalized as text; other json values (the api sometimes
/// returns documents already decoded) are emitted as compact json first.
/// `Auto` never fails.
pub fn normalize_field(raw: Option<&Value>, format: DocumentFormat) -> (String, bool) {
    let rendered;
    let value = match raw {
        None | Some(Value::Null) => FormatValue::Empty,
        Some(Value::String(text)) => FormatValue::from(text),
        Some(other) => {
            rendered = other.to_string();
            FormatValue::from(&rendered)
        }
    };
    match format {
        DocumentFormat::Json => into_state_text(normalize_json(value)),
        DocumentFormat::Yaml => into_state_text(normalize_yaml(value)),
        DocumentFormat::Auto => (normalize(value), true),
    }
}

/// normalized documents for one resource object.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentReport {
    /// field -> normalized text (or error text for failed fields).
    pub documents: BTreeMap<String, String>,
    /// fields whose text failed to parse in their configured format.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<String>,
}

impl DocumentReport {
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }
}

/// normalize every configured document field of `object` for `kind`.
///
/// fields missing from the object are reported as empty documents; a kind
/// with no configured fields produces an empty report.
pub fn normalize_documents(kind: &str, object: &Value, config: &EngineConfig) -> DocumentReport {
    let mut report = DocumentReport::default();
    let Some(fields) = config.documents_for(kind) else {
        tracing::debug!(kind, "no document fields configured");
        return report;
    };
    for (field, format) in fields {
        let (text, ok) = normalize_field(object.get(field), *format);
        if !ok {
            tracing::warn!(kind, field = %field, error = %text, "document field failed to parse");
            report.failed.push(field.clone());
        }
        report.documents.insert(field.clone(), text);
    }
    report
}
