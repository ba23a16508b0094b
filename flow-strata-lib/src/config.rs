//! Key construction toggles
//!
//! A [`KeyConfig`] is a plain `Copy` snapshot. Callers hand it to the key
//! builder by reference, so one construction always sees one consistent set of
//! toggles even if the owner swaps in a new snapshot concurrently.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Flow key dimensions that can be ignored or enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeyConfig {
    /// Ignore the VLAN id: traffic on different VLANs shares a flow.
    pub vlan_agnostic: bool,

    /// Ignore the address space id.
    pub address_space_agnostic: bool,

    /// Keep the MPLS label in the key so that overlapping private address
    /// ranges behind different labels are told apart.
    pub mpls_overlapping_ip: bool,
}

impl KeyConfig {
    /// Parse a JSON document; missing fields default to `false`.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }
}
