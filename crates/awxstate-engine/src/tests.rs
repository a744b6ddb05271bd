use super::*;
use awxstate_core::MASKING_SENTINEL;
use serde_json::json;
use tempfile::tempdir;

fn credential(inputs: Value) -> CredentialRecord {
    serde_json::from_value(json!({"id": 4, "name": "vault", "inputs": inputs})).unwrap()
}

#[test]
fn state_missing_file_loads_empty() {
    let dir = tempdir().unwrap();
    let store = StateStore::load(dir.path().join("state.json")).unwrap();
    assert_eq!(store.addresses().count(), 0);
}

#[test]
fn state_roundtrips_through_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("state.json");

    let mut store = StateStore::load(&path).unwrap();
    let mut resource = ResourceState::default();
    resource
        .inputs
        .insert("password".to_string(), json!("hunter2"));
    resource
        .documents
        .insert("extra_vars".to_string(), "{\"a\":1}".to_string());
    store.upsert("awx_credential.vault", resource.clone());
    store.save().unwrap();

    let loaded = StateStore::load(&path).unwrap();
    assert_eq!(loaded.path(), path.as_path());
    assert_eq!(loaded.resource("awx_credential.vault"), Some(&resource));
    assert_eq!(
        loaded.addresses().collect::<Vec<_>>(),
        vec!["awx_credential.vault"]
    );
}

#[test]
fn state_rejects_corrupt_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "not json").unwrap();
    let err = StateStore::load(&path).unwrap_err();
    assert!(err.to_string().starts_with("parse state:"));
}

#[test]
fn state_remove_forgets_resource() {
    let dir = tempdir().unwrap();
    let mut store = StateStore::load(dir.path().join("state.json")).unwrap();
    store.upsert("a", ResourceState::default());
    assert!(store.remove("a").is_some());
    assert!(store.resource("a").is_none());
}

#[test]
fn config_defaults_cover_common_documents() {
    let config = EngineConfig::default();
    assert_eq!(
        config.documents_for("job_template").unwrap().get("extra_vars"),
        Some(&DocumentFormat::Auto)
    );
    assert_eq!(
        config
            .documents_for("instance_group")
            .unwrap()
            .get("pod_spec_override"),
        Some(&DocumentFormat::Yaml)
    );
    assert_eq!(config.unknown_schema, SchemaFallback::Lenient);
    assert_eq!(config.wait, WaitConfig::default());
}

#[test]
fn config_loads_yaml_with_partial_fields() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("awxstate.yaml");
    std::fs::write(
        &path,
        r#"unknown_schema: ignore
documents:
  job_template:
    extra_vars: yaml
wait:
  timeout_secs: 30
"#,
    )
    .unwrap();

    let config = EngineConfig::load(&path).unwrap();
    assert_eq!(config.unknown_schema, SchemaFallback::Ignore);
    assert_eq!(
        config.documents_for("job_template").unwrap().get("extra_vars"),
        Some(&DocumentFormat::Yaml)
    );
    assert!(config.documents_for("inventory").is_none());
    assert_eq!(config.wait.timeout_secs, 30);
    assert_eq!(config.wait.poll_interval_ms, 1000);
}

#[test]
fn config_loads_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("awxstate.json");
    std::fs::write(&path, r#"{"wait": {"poll_interval_ms": 5}}"#).unwrap();

    let config = EngineConfig::load(&path).unwrap();
    assert_eq!(config.wait.poll_interval_ms, 5);
    assert_eq!(config.documents, EngineConfig::default().documents);
}

#[test]
fn config_missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    let err = EngineConfig::load(dir.path().join("nope.yaml")).unwrap_err();
    assert!(err.to_string().starts_with("read config:"));
    assert!(EngineConfig::load_optional(None).is_ok());
}

#[test]
fn credential_refresh_updates_state_across_cycles() {
    let dir = tempdir().unwrap();
    let mut store = StateStore::load(dir.path().join("state.json")).unwrap();
    let config = EngineConfig::default();
    let vault_type = json!({
        "inputs": {"fields": [{"id": "vault_password", "secret": true}, {"id": "vault_id"}]}
    });
    let address = "awx_credential.vault";

    store.upsert(
        address,
        ResourceState {
            inputs: serde_json::from_value(json!({"vault_password": "s3cret", "vault_id": "dev"}))
                .unwrap(),
            ..ResourceState::default()
        },
    );

    let api = credential(json!({"vault_password": MASKING_SENTINEL, "vault_id": "prod"}));
    let outcome = refresh_credential_state(&mut store, address, &api, Some(&vault_type), &config);
    assert_eq!(outcome.restored, vec!["vault_password".to_string()]);

    // second read with the same masked response keeps the secret
    let outcome = refresh_credential_state(&mut store, address, &api, Some(&vault_type), &config);
    assert_eq!(outcome.mode, ModeUsed::Strict);
    assert_eq!(
        Value::Object(store.resource(address).unwrap().inputs.clone()),
        json!({"vault_password": "s3cret", "vault_id": "prod"})
    );
}

#[test]
fn document_refresh_records_texts_and_failures() {
    let dir = tempdir().unwrap();
    let mut store = StateStore::load(dir.path().join("state.json")).unwrap();
    let config = EngineConfig::default();
    let object = json!({
        "id": 3,
        "inputs": "{\"fields\": []}",
        "injectors": "{broken",
    });

    let report = refresh_documents_state(
        &mut store,
        "awx_credential_type.x",
        "credential_type",
        &object,
        &config,
    );
    assert!(!report.is_ok());
    assert_eq!(report.failed, vec!["injectors".to_string()]);

    let resource = store.resource("awx_credential_type.x").unwrap();
    assert_eq!(resource.documents["inputs"], "{\"fields\":[]}");
    assert!(resource.documents["injectors"].starts_with("Error parsing JSON: "));
}

#[test]
fn unconfigured_kind_produces_empty_report() {
    let report = normalize_documents(
        "organization",
        &json!({"name": "x"}),
        &EngineConfig::default(),
    );
    assert!(report.is_ok());
    assert!(report.documents.is_empty());
}
