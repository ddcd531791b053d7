//! Step-through view of a rule result
//!
//! Walks the conditions of an already evaluated rule one at a time,
//! carrying the running verdict so far.

use rulelens_core::{ConditionResult, RuleResult};
use serde::Serialize;

/// One step of the debugger
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepView {
    pub rule_id: String,
    /// Zero-based position of `condition` in the rule
    pub index: usize,
    pub total: usize,
    pub condition: ConditionResult,
    /// Passing conditions among steps `0..=index`
    pub passed_so_far: usize,
    pub all_passed_so_far: bool,
    pub is_last: bool,
    /// The rule's verdict, only reported on the last step
    pub verdict: Option<bool>,
}

/// The view at `index`, clamped to the last condition.
///
/// Returns `None` only for a result with no conditions.
pub fn step(result: &RuleResult, index: usize) -> Option<StepView> {
    let total = result.conditions.len();
    let last = total.checked_sub(1)?;
    let index = index.min(last);

    let passed_so_far = result.conditions[..=index]
        .iter()
        .filter(|c| c.pass)
        .count();
    let is_last = index == last;

    Some(StepView {
        rule_id: result.rule_id.clone(),
        index,
        total,
        condition: result.conditions[index].clone(),
        passed_so_far,
        all_passed_so_far: passed_so_far == index + 1,
        is_last,
        verdict: is_last.then_some(result.pass),
    })
}

/// Every step in order
pub fn steps(result: &RuleResult) -> impl Iterator<Item = StepView> + '_ {
    (0..result.conditions.len()).filter_map(move |i| step(result, i))
}
