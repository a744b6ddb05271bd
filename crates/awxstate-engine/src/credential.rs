//! credential read-back: keep real secrets in state when the api masks them.

use crate::config::SchemaFallback;
use crate::state::ResourceState;
use awxstate_core::{
    inspect_secret_fields, is_masked, parse_document, sanitize_inputs, InputsMap,
    SchemaInspection, SecretMode,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// the parts of an api credential object a refresh needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub credential_type: Option<u64>,
    #[serde(default)]
    pub inputs: InputsMap,
}

/// which substitution mode a refresh ended up using.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeUsed {
    /// the credential type declared its secret fields.
    Strict,
    /// schema unreadable; every masked field was treated as secret.
    Lenient,
    /// schema unreadable and fallback disabled; server values kept.
    Passthrough,
}

/// result of refreshing one credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshOutcome {
    /// inputs to write into state.
    pub inputs: InputsMap,
    /// fields whose masked value was replaced from prior state.
    pub restored: Vec<String>,
    /// fields still holding the masking sentinel.
    pub still_masked: Vec<String>,
    pub mode: ModeUsed,
}

/// pull the `inputs` schema out of a credential type object.
///
/// awx returns it decoded; terraform configs often carry it as json or yaml
/// text, so strings are parsed too.
fn type_schema(credential_type: Option<&Value>) -> Option<Value> {
    let inputs = credential_type?.get("inputs")?;
    match inputs {
        Value::String(text) => parse_document(text),
        other => Some(other.clone()),
    }
}

/// sanitize a freshly read credential against what state already holds.
pub fn refresh_credential(
    record: &CredentialRecord,
    credential_type: Option<&Value>,
    prior: Option<&ResourceState>,
    fallback: SchemaFallback,
) -> RefreshOutcome {
    let schema = type_schema(credential_type);
    let local = prior.map(|state| &state.inputs);

    let (inputs, mode) = match inspect_secret_fields(schema.as_ref()) {
        SchemaInspection::Parsed { secrets, skipped } => {
            tracing::debug!(
                credential = record.id,
                secrets = secrets.len(),
                "credential type schema parsed"
            );
            if skipped > 0 {
                tracing::debug!(
                    credential = record.id,
                    skipped,
                    "ignored malformed field descriptors"
                );
            }
            (
                sanitize_inputs(&record.inputs, local, SecretMode::Strict(&secrets)),
                ModeUsed::Strict,
            )
        }
        SchemaInspection::Unrecognized(reason) => {
            tracing::warn!(
                credential = record.id,
                credential_type = ?record.credential_type,
                %reason,
                "credential type schema unrecognized"
            );
            match fallback {
                SchemaFallback::Lenient => (
                    sanitize_inputs(&record.inputs, local, SecretMode::Lenient),
                    ModeUsed::Lenient,
                ),
                SchemaFallback::Ignore => (record.inputs.clone(), ModeUsed::Passthrough),
            }
        }
    };

    let mut restored = Vec::new();
    let mut still_masked = Vec::new();
    for (field, server_value) in &record.inputs {
        if !is_masked(server_value) {
            continue;
        }
        match inputs.get(field) {
            Some(value) if is_masked(value) => still_masked.push(field.clone()),
            Some(_) => restored.push(field.clone()),
            None => {}
        }
    }
    if !still_masked.is_empty() {
        tracing::warn!(
            credential = record.id,
            fields = ?still_masked,
            "no prior value for masked fields"
        );
    }

    RefreshOutcome {
        inputs,
        restored,
        still_masked,
        mode,
    }
}
