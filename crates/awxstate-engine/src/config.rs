//! engine configuration loaded from yaml or json.

use crate::documents::DocumentFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// how a credential refresh treats a credential type whose schema it cannot
/// read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaFallback {
    /// restore any masked field from prior state.
    #[default]
    Lenient,
    /// keep every server value, masked or not.
    Ignore,
}

/// polling settings for job completion waits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    pub poll_interval_ms: u64,
    pub timeout_secs: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            timeout_secs: 600,
        }
    }
}

impl WaitConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// resource kind -> document field -> format.
    pub documents: BTreeMap<String, BTreeMap<String, DocumentFormat>>,
    pub unknown_schema: SchemaFallback,
    pub wait: WaitConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let defaults: &[(&str, &str, DocumentFormat)] = &[
            ("job_template", "extra_vars", DocumentFormat::Auto),
            ("workflow_job_template", "extra_vars", DocumentFormat::Auto),
            ("inventory", "variables", DocumentFormat::Auto),
            ("host", "variables", DocumentFormat::Auto),
            ("group", "variables", DocumentFormat::Auto),
            ("instance_group", "pod_spec_override", DocumentFormat::Yaml),
            ("credential_type", "inputs", DocumentFormat::Json),
            ("credential_type", "injectors", DocumentFormat::Json),
            ("setting", "value", DocumentFormat::Auto),
            ("schedule", "extra_data", DocumentFormat::Auto),
        ];
        let mut documents: BTreeMap<String, BTreeMap<String, DocumentFormat>> = BTreeMap::new();
        for (kind, field, format) in defaults {
            documents
                .entry(kind.to_string())
                .or_default()
                .insert(field.to_string(), *format);
        }
        Self {
            documents,
            unknown_schema: SchemaFallback::default(),
            wait: WaitConfig::default(),
        }
    }
}

impl EngineConfig {
    /// load a config file; `.json` is parsed as json, anything else as yaml.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw =
            fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
        let config = if path.extension().and_then(|s| s.to_str()) == Some("json") {
            serde_json::from_str(&raw)
                .with_context(|| format!("parse json config: {}", path.display()))?
        } else {
            serde_yaml::from_str(&raw)
                .with_context(|| format!("parse yaml config: {}", path.display()))?
        };
        Ok(config)
    }

    /// load a config file when given, defaults otherwise.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// configured document fields for a resource kind.
    pub fn documents_for(&self, kind: &str) -> Option<&BTreeMap<String, DocumentFormat>> {
        self.documents.get(kind)
    }
}
