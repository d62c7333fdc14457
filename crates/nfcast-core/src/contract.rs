//! Contract master: token → instrument metadata.
//!
//! The master is a UTF-8 JSON object mapping stringified instrument tokens to
//! symbol/expiry/strike metadata, loaded once at startup and shared read-only
//! with the normalizer. Keys arrive as strings on the wire format; the
//! in-memory map is integer-keyed.

use std::path::Path;

use ahash::AHashMap;
use anyhow::Context;
use serde::Deserialize;
use tracing::warn;

/// Metadata for one instrument.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ContractInfo {
    pub symbol: String,
    /// Expiry date as `DD-MMM-YYYY` (e.g. `27-NOV-2025`).
    pub expiry: String,
    /// `CE`/`PE` for options, empty for futures.
    #[serde(default)]
    pub option_type: String,
    #[serde(default)]
    pub strike: f64,
    #[serde(default)]
    pub instrument_type: String,
}

/// Immutable token-keyed instrument map with process lifetime.
#[derive(Debug, Default)]
pub struct ContractMaster {
    map: AHashMap<u32, ContractInfo>,
}

impl ContractMaster {
    /// Load the master from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading contract master {}", path.display()))?;
        Self::from_json(&content)
    }

    /// Parse the master from a JSON string.
    ///
    /// Keys that do not parse as unsigned integers are skipped with a warning
    /// rather than failing the whole load.
    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let raw: AHashMap<String, ContractInfo> =
            serde_json::from_str(content).context("parsing contract master")?;

        let mut map = AHashMap::with_capacity(raw.len());
        for (key, info) in raw {
            match key.parse::<u32>() {
                Ok(token) => {
                    map.insert(token, info);
                }
                Err(_) => warn!("contract master: skipping non-numeric token key {key:?}"),
            }
        }
        Ok(Self { map })
    }

    pub fn get(&self, token: u32) -> Option<&ContractInfo> {
        self.map.get(&token)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Smallest token in the master, if any.
    pub fn min_token(&self) -> Option<u32> {
        self.map.keys().copied().min()
    }
}
