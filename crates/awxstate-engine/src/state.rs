//! local resource address -> last known good values.

use awxstate_core::InputsMap;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// values remembered for one resource.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    /// credential inputs as last written to state.
    #[serde(default, skip_serializing_if = "InputsMap::is_empty")]
    pub inputs: InputsMap,
    /// normalized document fields.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub documents: BTreeMap<String, String>,
}

/// on-disk state schema.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct StateData {
    #[serde(default)]
    resources: BTreeMap<String, ResourceState>,
}

/// state store wrapper with load/save helpers.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
    data: StateData,
}

impl StateStore {
    /// load state from disk (or create empty when absent).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("read state: {}", path.display()))?;
            let data = serde_json::from_str::<StateData>(&raw)
                .with_context(|| format!("parse state: {}", path.display()))?;
            Ok(Self { path, data })
        } else {
            Ok(Self {
                path,
                data: StateData::default(),
            })
        }
    }

    /// persist state to disk.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create state dir: {}", parent.display()))?;
        }
        let raw = serde_json::to_string_pretty(&self.data)?;
        fs::write(&self.path, raw)
            .with_context(|| format!("write state: {}", self.path.display()))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// lookup a resource by address.
    pub fn resource(&self, address: &str) -> Option<&ResourceState> {
        self.data.resources.get(address)
    }

    /// mutable entry for a resource, created empty when missing.
    pub fn resource_mut(&mut self, address: &str) -> &mut ResourceState {
        self.data
            .resources
            .entry(address.to_string())
            .or_default()
    }

    /// replace a resource's remembered values.
    pub fn upsert(&mut self, address: impl Into<String>, resource: ResourceState) {
        self.data.resources.insert(address.into(), resource);
    }

    /// forget a resource.
    pub fn remove(&mut self, address: &str) -> Option<ResourceState> {
        self.data.resources.remove(address)
    }

    /// all known addresses in order.
    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.data.resources.keys().map(String::as_str)
    }
}
