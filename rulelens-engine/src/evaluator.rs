//! Condition and rule evaluation

use rulelens_core::{
    Actual, Condition, ConditionResult, FeatureVector, Operator, Rule, RuleResult, Source,
    Transaction,
};
use serde_json::Value;

use crate::coerce::{to_display_string, to_number};

/// First hour (inclusive) of the late-night window checked by `out_of_hours`
const LATE_HOUR: f64 = 22.0;
/// Last hour (inclusive) of the early-morning window checked by `out_of_hours`
const EARLY_HOUR: f64 = 5.0;

/// Look up the value a condition refers to.
///
/// Derived fields read from the feature vector; without one they are
/// always missing.
fn lookup(
    condition: &Condition,
    transaction: &Transaction,
    features: Option<&FeatureVector>,
) -> Actual {
    let value = match condition.source {
        Source::Raw => transaction.field(&condition.field),
        Source::Derived => features.and_then(|fv| fv.field(&condition.field)),
    };
    Actual::from(value)
}

fn compare(op: Operator, actual: &Value, expected: &Value) -> bool {
    match op {
        Operator::Eq => to_display_string(actual) == to_display_string(expected),
        Operator::Ne => to_display_string(actual) != to_display_string(expected),
        Operator::Gt | Operator::Lt | Operator::Gte | Operator::Lte => {
            let (Some(a), Some(b)) = (to_number(actual), to_number(expected)) else {
                return false;
            };
            match op {
                Operator::Gt => a > b,
                Operator::Lt => a < b,
                Operator::Gte => a >= b,
                _ => a <= b,
            }
        }
        Operator::Contains => to_display_string(actual)
            .to_lowercase()
            .contains(&to_display_string(expected).to_lowercase()),
        Operator::OutOfHours => {
            to_number(actual).is_some_and(|hour| hour >= LATE_HOUR || hour <= EARLY_HOUR)
        }
    }
}

/// Evaluate one condition against a transaction and its optional feature vector.
///
/// A missing value fails the condition and is reported as `NOT FOUND`.
pub fn evaluate_condition(
    condition: &Condition,
    transaction: &Transaction,
    features: Option<&FeatureVector>,
) -> ConditionResult {
    let actual = lookup(condition, transaction, features);
    let pass = match &actual {
        Actual::Found(value) => compare(condition.op, value, &condition.value.to_value()),
        Actual::NotFound => {
            tracing::trace!(
                "Field '{}' ({}) not found for transaction {}",
                condition.field,
                condition.source,
                transaction.transaction_id
            );
            false
        }
    };

    ConditionResult {
        field: condition.field.clone(),
        op: condition.op,
        expected: condition.value.clone(),
        actual,
        pass,
        source: condition.source,
    }
}

/// Evaluate every condition of a rule; the rule passes only if all do.
///
/// Conditions after a failure are still evaluated so the full breakdown
/// is available to the inspector and step debugger.
pub fn evaluate_rule(
    rule: &Rule,
    transaction: &Transaction,
    features: Option<&FeatureVector>,
) -> RuleResult {
    let conditions = rule
        .conditions
        .iter()
        .map(|c| evaluate_condition(c, transaction, features))
        .collect();
    RuleResult::new(rule.rule_id.clone(), conditions)
}
