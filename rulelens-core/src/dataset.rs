//! The loaded, read-only dataset and its feature-vector index

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

use crate::{CoreError, FeatureVector, Rule, Transaction};

/// Feature vectors keyed by `transaction_id`, built once after load
#[derive(Debug, Clone, Default)]
pub struct FeatureIndex {
    by_transaction: HashMap<String, FeatureVector>,
}

impl FeatureIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index, rejecting two vectors for the same transaction.
    pub fn build(vectors: Vec<FeatureVector>) -> Result<Self, CoreError> {
        let mut by_transaction = HashMap::with_capacity(vectors.len());
        for fv in vectors {
            if by_transaction.contains_key(&fv.transaction_id) {
                return Err(CoreError::DuplicateFeatureVector(fv.transaction_id));
            }
            by_transaction.insert(fv.transaction_id.clone(), fv);
        }
        Ok(Self { by_transaction })
    }

    pub fn get(&self, transaction_id: &str) -> Option<&FeatureVector> {
        self.by_transaction.get(transaction_id)
    }

    pub fn len(&self) -> usize {
        self.by_transaction.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_transaction.is_empty()
    }

    pub fn transaction_ids(&self) -> impl Iterator<Item = &str> {
        self.by_transaction.keys().map(String::as_str)
    }
}

impl FromIterator<FeatureVector> for FeatureIndex {
    /// Later vectors win on duplicate ids; use [`FeatureIndex::build`] to reject them.
    fn from_iter<I: IntoIterator<Item = FeatureVector>>(iter: I) -> Self {
        Self {
            by_transaction: iter
                .into_iter()
                .map(|fv| (fv.transaction_id.clone(), fv))
                .collect(),
        }
    }
}

/// The three datasets, validated and joined, read-only after construction
#[derive(Debug, Clone)]
pub struct Dataset {
    transactions: Vec<Transaction>,
    rules: Vec<Rule>,
    features: FeatureIndex,
    position: HashMap<String, usize>,
    loaded_at: DateTime<Utc>,
}

impl Dataset {
    /// Validate and assemble the dataset.
    ///
    /// Transaction and rule ids must be unique and every rule needs at least
    /// one condition. Feature vectors for unknown transactions are kept but
    /// never joined.
    pub fn new(
        transactions: Vec<Transaction>,
        features: FeatureIndex,
        rules: Vec<Rule>,
    ) -> Result<Self, CoreError> {
        let mut position = HashMap::with_capacity(transactions.len());
        for (idx, txn) in transactions.iter().enumerate() {
            if position.insert(txn.transaction_id.clone(), idx).is_some() {
                return Err(CoreError::DuplicateTransaction(txn.transaction_id.clone()));
            }
        }

        let mut rule_ids = HashSet::with_capacity(rules.len());
        for rule in &rules {
            rule.validate()?;
            if !rule_ids.insert(rule.rule_id.as_str()) {
                return Err(CoreError::DuplicateRule(rule.rule_id.clone()));
            }
        }

        Ok(Self {
            transactions,
            rules,
            features,
            position,
            loaded_at: Utc::now(),
        })
    }

    pub fn empty() -> Self {
        Self {
            transactions: Vec::new(),
            rules: Vec::new(),
            features: FeatureIndex::new(),
            position: HashMap::new(),
            loaded_at: Utc::now(),
        }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn features(&self) -> &FeatureIndex {
        &self.features
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn transaction(&self, transaction_id: &str) -> Option<&Transaction> {
        self.position
            .get(transaction_id)
            .map(|&idx| &self.transactions[idx])
    }

    pub fn rule(&self, rule_id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.rule_id == rule_id)
    }

    pub fn features_for(&self, transaction_id: &str) -> Option<&FeatureVector> {
        self.features.get(transaction_id)
    }

    /// Number of feature vectors that match no loaded transaction
    pub fn orphan_feature_count(&self) -> usize {
        self.features
            .transaction_ids()
            .filter(|id| !self.position.contains_key(*id))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Condition, Operator, Severity};
    use serde_json::json;

    fn rule(id: &str) -> Rule {
        Rule::new(
            id,
            "Large amount",
            Severity::High,
            "review",
            vec![Condition::raw("amount", Operator::Gt, "1000")],
        )
    }

    #[test]
    fn test_feature_index_lookup() {
        let index = FeatureIndex::build(vec![
            FeatureVector::new("T1").with_field("velocity_1h", json!(4)),
            FeatureVector::new("T2"),
        ])
        .unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.get("T1").unwrap().field("velocity_1h"), Some(json!(4)));
        assert!(index.get("T3").is_none());
    }

    #[test]
    fn test_feature_index_rejects_duplicates() {
        let err = FeatureIndex::build(vec![FeatureVector::new("T1"), FeatureVector::new("T1")])
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateFeatureVector(id) if id == "T1"));
    }

    #[test]
    fn test_dataset_rejects_duplicate_transactions() {
        let err = Dataset::new(
            vec![Transaction::new("T1"), Transaction::new("T1")],
            FeatureIndex::new(),
            vec![rule("R1")],
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateTransaction(_)));
    }

    #[test]
    fn test_dataset_rejects_duplicate_and_empty_rules() {
        let err = Dataset::new(vec![], FeatureIndex::new(), vec![rule("R1"), rule("R1")])
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateRule(_)));

        let empty = Rule::new("R2", "Empty", Severity::Low, "log", vec![]);
        let err = Dataset::new(vec![], FeatureIndex::new(), vec![empty]).unwrap_err();
        assert!(matches!(err, CoreError::EmptyRule(_)));
    }

    #[test]
    fn test_dataset_lookups() {
        let features = FeatureIndex::build(vec![
            FeatureVector::new("T2"),
            FeatureVector::new("T9"),
        ])
        .unwrap();
        let dataset = Dataset::new(
            vec![Transaction::new("T1"), Transaction::new("T2")],
            features,
            vec![rule("R1")],
        )
        .unwrap();

        assert_eq!(dataset.transaction("T2").unwrap().transaction_id, "T2");
        assert!(dataset.transaction("T3").is_none());
        assert!(dataset.rule("R1").is_some());
        assert!(dataset.features_for("T1").is_none());
        assert!(dataset.features_for("T2").is_some());
        assert_eq!(dataset.orphan_feature_count(), 1);
    }
}
