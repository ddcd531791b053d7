//! Core domain models for RuleLens
//!
//! This crate contains the shared data structures used across
//! the rule engine: Transaction, FeatureVector, Rule, Condition,
//! the derived evaluation results, and the loaded Dataset.

pub mod dataset;
pub mod error;
pub mod models;
pub mod results;

pub use dataset::{Dataset, FeatureIndex};
pub use error::CoreError;
pub use models::*;
pub use results::*;
