//! In-memory dataset source for development and testing

use async_trait::async_trait;
use rulelens_core::{FeatureVector, Rule, Transaction};

use crate::{DatasetSource, StorageError};

/// In-memory source for development and testing
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    transactions: Vec<Transaction>,
    feature_vectors: Vec<FeatureVector>,
    rules: Vec<Rule>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transactions(mut self, transactions: Vec<Transaction>) -> Self {
        self.transactions = transactions;
        self
    }

    pub fn with_feature_vectors(mut self, feature_vectors: Vec<FeatureVector>) -> Self {
        self.feature_vectors = feature_vectors;
        self
    }

    pub fn with_rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = rules;
        self
    }
}

#[async_trait]
impl DatasetSource for InMemorySource {
    async fn load_transactions(&self) -> Result<Vec<Transaction>, StorageError> {
        Ok(self.transactions.clone())
    }

    async fn load_feature_vectors(&self) -> Result<Vec<FeatureVector>, StorageError> {
        Ok(self.feature_vectors.clone())
    }

    async fn load_rules(&self) -> Result<Vec<Rule>, StorageError> {
        Ok(self.rules.clone())
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}
