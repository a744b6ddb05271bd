//! engine orchestration: config, state, credential and document refresh.

mod config;
mod credential;
mod documents;
mod job;
mod state;

#[cfg(test)]
mod tests;

pub use config::{EngineConfig, SchemaFallback, WaitConfig};
pub use credential::{refresh_credential, CredentialRecord, ModeUsed, RefreshOutcome};
pub use documents::{normalize_documents, normalize_field, DocumentFormat, DocumentReport};
pub use job::{wait_for_job, JobStatus, JobStatusSource, WaitError};
pub use state::{ResourceState, StateStore};

use serde_json::Value;

/// refresh a credential read from the api and record its inputs in state.
pub fn refresh_credential_state(
    state: &mut StateStore,
    address: &str,
    record: &CredentialRecord,
    credential_type: Option<&Value>,
    config: &EngineConfig,
) -> RefreshOutcome {
    let outcome = refresh_credential(
        record,
        credential_type,
        state.resource(address),
        config.unknown_schema,
    );
    state.resource_mut(address).inputs = outcome.inputs.clone();
    tracing::info!(
        address,
        state = %state.path().display(),
        restored = outcome.restored.len(),
        still_masked = outcome.still_masked.len(),
        "refreshed credential"
    );
    outcome
}

/// normalize a resource's document fields and record them in state.
///
/// failed fields are stored with their error text, like every other value.
pub fn refresh_documents_state(
    state: &mut StateStore,
    address: &str,
    kind: &str,
    object: &Value,
    config: &EngineConfig,
) -> DocumentReport {
    let report = normalize_documents(kind, object, config);
    let resource = state.resource_mut(address);
    for (field, text) in &report.documents {
        resource.documents.insert(field.clone(), text.clone());
    }
    report
}
