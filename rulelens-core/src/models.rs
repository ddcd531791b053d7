//! Core domain models

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;
use std::str::FromStr;

use crate::CoreError;

/// Timestamp layouts accepted for `txn_date_time`, tried after RFC 3339.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// A single transaction record as loaded from the transactions dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier, join key to the feature vectors
    pub transaction_id: String,
    /// Timestamp as provided by the source system
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txn_date_time: Option<String>,
    /// Transaction amount (integer or decimal, kept as written)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_city: Option<String>,
    /// Any other raw fields, addressable by name from rule conditions
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Transaction {
    pub fn new(transaction_id: impl Into<String>) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            txn_date_time: None,
            amount: None,
            currency: None,
            transaction_type: None,
            merchant_description: None,
            merchant_country: None,
            merchant_city: None,
            extra: Map::new(),
        }
    }

    /// Builder-style setter for an arbitrary raw field.
    ///
    /// Well-known field names are routed to their typed slot, so
    /// `with_field("amount", json!(10))` sets `amount`.
    pub fn with_field(mut self, name: &str, value: Value) -> Self {
        let text = value.as_str().map(str::to_string);
        match name {
            "transaction_id" => {
                if let Some(id) = text {
                    self.transaction_id = id;
                }
            }
            "txn_date_time" => self.txn_date_time = text,
            "amount" => {
                self.amount = match value {
                    Value::Number(n) => Some(n),
                    _ => None,
                }
            }
            "currency" => self.currency = text,
            "transaction_type" => self.transaction_type = text,
            "merchant_description" => self.merchant_description = text,
            "merchant_country" => self.merchant_country = text,
            "merchant_city" => self.merchant_city = text,
            _ => {
                self.extra.insert(name.to_string(), value);
            }
        }
        self
    }

    /// Look up a raw field by name. JSON `null` counts as absent.
    pub fn field(&self, name: &str) -> Option<Value> {
        let text = |v: &Option<String>| v.clone().map(Value::String);
        match name {
            "transaction_id" => Some(Value::String(self.transaction_id.clone())),
            "txn_date_time" => text(&self.txn_date_time),
            "amount" => self.amount.clone().map(Value::Number),
            "currency" => text(&self.currency),
            "transaction_type" => text(&self.transaction_type),
            "merchant_description" => text(&self.merchant_description),
            "merchant_country" => text(&self.merchant_country),
            "merchant_city" => text(&self.merchant_city),
            other => self.extra.get(other).filter(|v| !v.is_null()).cloned(),
        }
    }

    /// Amount as a float, zero when absent
    pub fn amount_value(&self) -> f64 {
        self.amount.as_ref().and_then(Number::as_f64).unwrap_or(0.0)
    }

    /// Parse `txn_date_time` into a naive timestamp.
    ///
    /// RFC 3339 values are converted to their UTC wall time.
    pub fn occurred_at(&self) -> Option<NaiveDateTime> {
        let raw = self.txn_date_time.as_deref()?.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.naive_utc());
        }
        TIMESTAMP_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    }
}

/// Precomputed derived fields for one transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub transaction_id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl FeatureVector {
    pub fn new(transaction_id: impl Into<String>) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: Value) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    /// Look up a derived field by name. JSON `null` counts as absent.
    pub fn field(&self, name: &str) -> Option<Value> {
        if name == "transaction_id" {
            return Some(Value::String(self.transaction_id.clone()));
        }
        self.fields.get(name).filter(|v| !v.is_null()).cloned()
    }
}

/// Rule severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }
}

impl FromStr for Severity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(CoreError::UnknownSeverity(s.to_string())),
        }
    }
}

impl TryFrom<String> for Severity {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Severity> for String {
    fn from(value: Severity) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a condition looks up its field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Source {
    /// The transaction record itself
    Raw,
    /// The transaction's feature vector
    Derived,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Raw => "raw",
            Source::Derived => "derived",
        }
    }
}

impl FromStr for Source {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(Source::Raw),
            "derived" => Ok(Source::Derived),
            _ => Err(CoreError::UnknownSource(s.to_string())),
        }
    }
}

impl TryFrom<String> for Source {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Source> for String {
    fn from(value: Source) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison operator of a condition
///
/// `Eq`/`Ne` compare string renderings, so `"5" == 5` holds.
/// `OutOfHours` ignores the condition value and checks whether the
/// actual value, read as an hour of day, is at or after 22 or at or before 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
    Contains,
    OutOfHours,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::Contains => "contains",
            Operator::OutOfHours => "out_of_hours",
        }
    }
}

impl FromStr for Operator {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(Operator::Eq),
            "!=" => Ok(Operator::Ne),
            ">" => Ok(Operator::Gt),
            "<" => Ok(Operator::Lt),
            ">=" => Ok(Operator::Gte),
            "<=" => Ok(Operator::Lte),
            "contains" => Ok(Operator::Contains),
            "out_of_hours" => Ok(Operator::OutOfHours),
            _ => Err(CoreError::UnknownOperator(s.to_string())),
        }
    }
}

impl TryFrom<String> for Operator {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Operator> for String {
    fn from(value: Operator) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Right-hand operand of a condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Number(Number),
    Bool(bool),
    Text(String),
}

impl ConditionValue {
    pub fn to_value(&self) -> Value {
        match self {
            ConditionValue::Number(n) => Value::Number(n.clone()),
            ConditionValue::Bool(b) => Value::Bool(*b),
            ConditionValue::Text(s) => Value::String(s.clone()),
        }
    }
}

impl Default for ConditionValue {
    fn default() -> Self {
        ConditionValue::Text(String::new())
    }
}

impl From<&str> for ConditionValue {
    fn from(value: &str) -> Self {
        ConditionValue::Text(value.to_string())
    }
}

impl From<String> for ConditionValue {
    fn from(value: String) -> Self {
        ConditionValue::Text(value)
    }
}

impl From<i64> for ConditionValue {
    fn from(value: i64) -> Self {
        ConditionValue::Number(value.into())
    }
}

impl From<f64> for ConditionValue {
    fn from(value: f64) -> Self {
        Number::from_f64(value)
            .map(ConditionValue::Number)
            .unwrap_or_else(|| ConditionValue::Text(value.to_string()))
    }
}

/// A single comparison test within a rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub source: Source,
    pub op: Operator,
    /// Ignored by `out_of_hours`, so it may be omitted there
    #[serde(default)]
    pub value: ConditionValue,
}

impl Condition {
    pub fn new(
        field: impl Into<String>,
        source: Source,
        op: Operator,
        value: impl Into<ConditionValue>,
    ) -> Self {
        Self {
            field: field.into(),
            source,
            op,
            value: value.into(),
        }
    }

    pub fn raw(field: impl Into<String>, op: Operator, value: impl Into<ConditionValue>) -> Self {
        Self::new(field, Source::Raw, op, value)
    }

    pub fn derived(
        field: impl Into<String>,
        op: Operator,
        value: impl Into<ConditionValue>,
    ) -> Self {
        Self::new(field, Source::Derived, op, value)
    }
}

/// A named, severity-tagged AND-combination of conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub rule_id: String,
    pub name: String,
    pub severity: Severity,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Evaluated in full and displayed in this order
    pub conditions: Vec<Condition>,
}

impl Rule {
    pub fn new(
        rule_id: impl Into<String>,
        name: impl Into<String>,
        severity: Severity,
        action: impl Into<String>,
        conditions: Vec<Condition>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            name: name.into(),
            severity,
            action: action.into(),
            description: None,
            conditions,
        }
    }

    /// Check the structural invariant: at least one condition.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.conditions.is_empty() {
            return Err(CoreError::EmptyRule(self.rule_id.clone()));
        }
        Ok(())
    }
}
