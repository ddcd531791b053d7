//! Source trait defining where the three datasets come from

use async_trait::async_trait;
use rulelens_core::{FeatureVector, Rule, Transaction};

use crate::StorageError;

/// A read-only provider of the transactions, feature vectors and rules
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Load every transaction
    async fn load_transactions(&self) -> Result<Vec<Transaction>, StorageError>;

    /// Load every feature vector
    async fn load_feature_vectors(&self) -> Result<Vec<FeatureVector>, StorageError>;

    /// Load every rule
    async fn load_rules(&self) -> Result<Vec<Rule>, StorageError>;

    /// Short human-readable description for logs
    fn describe(&self) -> String;
}
