//! Configuration parsing for the NFCAST feed handler.
//!
//! All settings come from a single JSON file loaded at startup. Optional keys
//! carry their defaults through `effective_*` accessors so the rest of the
//! system never sees an `Option`.
//!
//! # Example config
//!
//! ```json
//! {
//!   "multicast": { "ip": "226.1.0.1", "port": 12996 },
//!   "buffer_size": 4194304,
//!   "timeout": 1,
//!   "token_file": "contract_master.json",
//!   "output_json": "data/json",
//!   "output_csv": "data/csv",
//!   "logging_level": "info"
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level application config, deserialized from a JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Multicast group to join.
    pub multicast: MulticastConfig,

    /// Requested kernel receive-buffer size in bytes (SO_RCVBUF).
    pub buffer_size: Option<usize>,

    /// Receive-call bound in seconds (default: 1).
    pub timeout: Option<u64>,

    /// Contract master file path.
    pub token_file: PathBuf,

    /// Directory for daily JSON output (default: current directory).
    pub output_json: Option<PathBuf>,

    /// Directory for daily CSV output (default: current directory).
    pub output_csv: Option<PathBuf>,

    /// Log level threshold (default: "info"). Overridden by `RUST_LOG`
    /// or the `--log-level` CLI flag.
    pub logging_level: Option<String>,

    /// Accept the 300-byte legacy packet format (default: false).
    pub allow_legacy: Option<bool>,

    /// Treat canonical 564-byte packets as carrying interleaved compressed
    /// depth instead of resolved OHLC fields (default: false).
    pub compressed_depth: Option<bool>,

    /// Tokens below this value mark empty record slots (default: 2,
    /// i.e. only tokens 0 and 1 are empty).
    pub min_token: Option<u32>,
}

/// Multicast group address and port.
#[derive(Debug, Clone, Deserialize)]
pub struct MulticastConfig {
    pub ip: String,
    pub port: u16,
}

impl FeedConfig {
    /// Returns the effective receive timeout.
    pub fn effective_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout.unwrap_or(1))
    }

    /// Returns the effective JSON output directory.
    pub fn effective_output_json(&self) -> PathBuf {
        self.output_json.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Returns the effective CSV output directory.
    pub fn effective_output_csv(&self) -> PathBuf {
        self.output_csv.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Returns the effective log level.
    pub fn effective_logging_level(&self) -> &str {
        self.logging_level.as_deref().unwrap_or("info")
    }

    pub fn allow_legacy(&self) -> bool {
        self.allow_legacy.unwrap_or(false)
    }

    pub fn compressed_depth(&self) -> bool {
        self.compressed_depth.unwrap_or(false)
    }

    pub fn effective_min_token(&self) -> u32 {
        self.min_token.unwrap_or(2)
    }
}

/// Load and parse a JSON config file.
pub fn load_config(path: &Path) -> anyhow::Result<FeedConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: FeedConfig = serde_json::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let json = r#"{
            "multicast": { "ip": "226.1.0.1", "port": 12996 },
            "buffer_size": 4194304,
            "timeout": 2,
            "token_file": "contract_master.json",
            "output_json": "data/json",
            "output_csv": "data/csv",
            "logging_level": "debug",
            "allow_legacy": true
        }"#;
        let config: FeedConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.multicast.ip, "226.1.0.1");
        assert_eq!(config.multicast.port, 12996);
        assert_eq!(config.buffer_size, Some(4_194_304));
        assert_eq!(config.effective_timeout().as_secs(), 2);
        assert_eq!(config.effective_logging_level(), "debug");
        assert!(config.allow_legacy());
        assert!(!config.compressed_depth());
        assert_eq!(config.effective_min_token(), 2);
    }

    #[test]
    fn defaults_apply_for_missing_keys() {
        let json = r#"{
            "multicast": { "ip": "239.1.1.1", "port": 9000 },
            "token_file": "tokens.json"
        }"#;
        let config: FeedConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.effective_timeout().as_secs(), 1);
        assert_eq!(config.effective_output_json(), PathBuf::from("."));
        assert_eq!(config.effective_output_csv(), PathBuf::from("."));
        assert_eq!(config.effective_logging_level(), "info");
        assert!(!config.allow_legacy());
    }

    #[test]
    fn missing_multicast_is_an_error() {
        let json = r#"{ "token_file": "tokens.json" }"#;
        assert!(serde_json::from_str::<FeedConfig>(json).is_err());
    }
}
