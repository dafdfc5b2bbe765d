//! Opaque state blob handed to and restored from the host.

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::params::ParamValue;

pub const STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEntry {
    pub key: String,
    pub value: ParamValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDocument {
    pub version: u32,
    #[serde(default)]
    pub parameters: Vec<StateEntry>,
}

impl StateDocument {
    pub fn new(pairs: Vec<(String, ParamValue)>) -> Self {
        Self {
            version: STATE_VERSION,
            parameters: pairs
                .into_iter()
                .map(|(key, value)| StateEntry { key, value })
                .collect(),
        }
    }

    pub fn into_pairs(self) -> Vec<(String, ParamValue)> {
        self.parameters
            .into_iter()
            .map(|entry| (entry.key, entry.value))
            .collect()
    }
}

pub fn encode(pairs: Vec<(String, ParamValue)>) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(&StateDocument::new(pairs)).context("failed to serialize state")
}

/// Parse a blob back into ordered pairs. An empty blob restores nothing.
pub fn decode(blob: &[u8]) -> Result<Vec<(String, ParamValue)>> {
    if blob.is_empty() {
        debug!("Empty state blob, nothing to restore");
        return Ok(Vec::new());
    }

    let document: StateDocument =
        serde_json::from_slice(blob).context("failed to parse state blob")?;

    if document.version > STATE_VERSION {
        warn!(
            "State blob version {} is newer than {}, restoring known parameters only",
            document.version, STATE_VERSION
        );
    }

    Ok(document.into_pairs())
}

pub fn save_to_file(path: &Path, blob: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    fs::write(path, blob).with_context(|| format!("failed to write state {}", path.display()))?;
    debug!("Saved state to {path:?}");
    Ok(())
}

pub fn load_from_file(path: &Path) -> Result<Vec<u8>> {
    let blob = fs::read(path).with_context(|| format!("failed to read state {}", path.display()))?;
    debug!("Loaded {} byte state from {path:?}", blob.len());
    Ok(blob)
}
