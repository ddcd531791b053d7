//! Derived evaluation results
//!
//! These are never persisted; they are recomputed from the loaded
//! dataset whenever a view needs them.

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::{ConditionValue, Operator, Source};

/// Sentinel reported in place of a value that could not be looked up
pub const NOT_FOUND: &str = "NOT FOUND";

/// The value a condition saw when it was evaluated
#[derive(Debug, Clone, PartialEq)]
pub enum Actual {
    Found(Value),
    NotFound,
}

impl From<Option<Value>> for Actual {
    fn from(value: Option<Value>) -> Self {
        match value {
            Some(Value::Null) | None => Actual::NotFound,
            Some(v) => Actual::Found(v),
        }
    }
}

impl Serialize for Actual {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Actual::Found(v) => v.serialize(serializer),
            Actual::NotFound => serializer.serialize_str(NOT_FOUND),
        }
    }
}

/// Outcome of one condition against one transaction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionResult {
    pub field: String,
    pub op: Operator,
    pub expected: ConditionValue,
    pub actual: Actual,
    pub pass: bool,
    pub source: Source,
}

/// How much of a rule matched; presentation only, `pass` is authoritative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Every condition passed
    Fired,
    /// Some but not all conditions passed
    Partial,
    /// No condition passed
    Miss,
}

/// Outcome of a whole rule against one transaction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleResult {
    pub rule_id: String,
    pub pass: bool,
    pub outcome: Outcome,
    pub conditions: Vec<ConditionResult>,
}

impl RuleResult {
    /// Combine condition results with AND semantics.
    pub fn new(rule_id: impl Into<String>, conditions: Vec<ConditionResult>) -> Self {
        let passed = conditions.iter().filter(|c| c.pass).count();
        let pass = passed == conditions.len();
        let outcome = if pass {
            Outcome::Fired
        } else if passed == 0 {
            Outcome::Miss
        } else {
            Outcome::Partial
        };

        Self {
            rule_id: rule_id.into(),
            pass,
            outcome,
            conditions,
        }
    }

    pub fn passed_count(&self) -> usize {
        self.conditions.iter().filter(|c| c.pass).count()
    }
}
