//! Server configuration from environment variables

use anyhow::{Context, Result};
use rulelens_storage::file::{DEFAULT_FEATURES_FILE, DEFAULT_RULES_FILE, DEFAULT_TRANSACTIONS_FILE};
use rulelens_storage::JsonFileSource;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub transactions_file: String,
    pub features_file: String,
    pub rules_file: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port = get("PORT", "8080");
        let port = port
            .parse::<u16>()
            .with_context(|| format!("PORT must be a valid u16, got '{}'", port))?;

        Ok(Self {
            host: get("HOST", "127.0.0.1"),
            port,
            data_dir: PathBuf::from(get("DATA_DIR", "./data")),
            transactions_file: get("TRANSACTIONS_FILE", DEFAULT_TRANSACTIONS_FILE),
            features_file: get("FEATURES_FILE", DEFAULT_FEATURES_FILE),
            rules_file: get("RULES_FILE", DEFAULT_RULES_FILE),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The JSON files the datasets are read from
    pub fn dataset_source(&self) -> JsonFileSource {
        JsonFileSource::new(&self.data_dir).with_file_names(
            &self.transactions_file,
            &self.features_file,
            &self.rules_file,
        )
    }
}
