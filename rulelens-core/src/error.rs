//! Error types for the core crate

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Unknown condition operator: {0}")]
    UnknownOperator(String),

    #[error("Unknown condition source: {0}")]
    UnknownSource(String),

    #[error("Unknown severity: {0}")]
    UnknownSeverity(String),

    #[error("Rule {0} has no conditions")]
    EmptyRule(String),

    #[error("Duplicate transaction id: {0}")]
    DuplicateTransaction(String),

    #[error("Duplicate rule id: {0}")]
    DuplicateRule(String),

    #[error("Duplicate feature vector for transaction: {0}")]
    DuplicateFeatureVector(String),
}
