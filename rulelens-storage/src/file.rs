//! JSON file dataset source
//!
//! Each dataset is a single JSON array in its own file under one directory.

use async_trait::async_trait;
use rulelens_core::{FeatureVector, Rule, Transaction};
use serde::de::DeserializeOwned;
use std::path::PathBuf;

use crate::{DatasetSource, StorageError};

pub const DEFAULT_TRANSACTIONS_FILE: &str = "transactions.json";
pub const DEFAULT_FEATURES_FILE: &str = "features.json";
pub const DEFAULT_RULES_FILE: &str = "rules.json";

/// Reads the three datasets from JSON files in a directory
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    dir: PathBuf,
    transactions_file: String,
    features_file: String,
    rules_file: String,
}

impl JsonFileSource {
    /// Use the default file names inside `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            transactions_file: DEFAULT_TRANSACTIONS_FILE.to_string(),
            features_file: DEFAULT_FEATURES_FILE.to_string(),
            rules_file: DEFAULT_RULES_FILE.to_string(),
        }
    }

    pub fn with_file_names(
        mut self,
        transactions: impl Into<String>,
        features: impl Into<String>,
        rules: impl Into<String>,
    ) -> Self {
        self.transactions_file = transactions.into();
        self.features_file = features.into();
        self.rules_file = rules.into();
        self
    }

    async fn read_array<T: DeserializeOwned>(
        &self,
        file: &str,
        dataset: &'static str,
    ) -> Result<Vec<T>, StorageError> {
        let path = self.dir.join(file);
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(path.clone())
            } else {
                StorageError::Io {
                    path: path.clone(),
                    source: e,
                }
            }
        })?;

        let items: Vec<T> = serde_json::from_slice(&bytes)
            .map_err(|source| StorageError::Parse { dataset, source })?;

        tracing::debug!("Read {} {} from {:?}", items.len(), dataset, path);
        Ok(items)
    }
}

#[async_trait]
impl DatasetSource for JsonFileSource {
    async fn load_transactions(&self) -> Result<Vec<Transaction>, StorageError> {
        self.read_array(&self.transactions_file, "transactions").await
    }

    async fn load_feature_vectors(&self) -> Result<Vec<FeatureVector>, StorageError> {
        self.read_array(&self.features_file, "feature vectors").await
    }

    async fn load_rules(&self) -> Result<Vec<Rule>, StorageError> {
        self.read_array(&self.rules_file, "rules").await
    }

    fn describe(&self) -> String {
        format!("json files in {}", self.dir.display())
    }
}
