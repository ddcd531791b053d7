//! Dashboard selection state
//!
//! The selected rule, selected transaction, table filter and debugger step
//! live in one value. Every update produces a new value through
//! [`Selection::apply`]; nothing is mutated in place.

use rulelens_core::Dataset;
use rulelens_engine::TransactionFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Rule {0} not found")]
    UnknownRule(String),

    #[error("Transaction {0} not found")]
    UnknownTransaction(String),
}

/// What the dashboard currently has selected
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub rule_id: Option<String>,
    pub transaction_id: Option<String>,
    pub filter: TransactionFilter,
    /// Step debugger position within the selected rule's conditions
    pub step: usize,
}

/// A user action that changes the selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SelectionAction {
    SelectRule { rule_id: String },
    SelectTransaction { transaction_id: String },
    SetFilter { filter: TransactionFilter },
    StepNext,
    StepPrev,
    ResetSteps,
    Clear,
}

impl Selection {
    /// Compute the selection that results from `action`.
    ///
    /// Ids are checked against `dataset`; on error the current selection
    /// stays as it was.
    pub fn apply(
        &self,
        action: &SelectionAction,
        dataset: &Dataset,
    ) -> Result<Selection, SelectionError> {
        let next = match action {
            SelectionAction::SelectRule { rule_id } => {
                if dataset.rule(rule_id).is_none() {
                    return Err(SelectionError::UnknownRule(rule_id.clone()));
                }
                Selection {
                    rule_id: Some(rule_id.clone()),
                    step: 0,
                    ..self.clone()
                }
            }
            SelectionAction::SelectTransaction { transaction_id } => {
                if dataset.transaction(transaction_id).is_none() {
                    return Err(SelectionError::UnknownTransaction(transaction_id.clone()));
                }
                Selection {
                    transaction_id: Some(transaction_id.clone()),
                    step: 0,
                    ..self.clone()
                }
            }
            SelectionAction::SetFilter { filter } => Selection {
                filter: *filter,
                ..self.clone()
            },
            SelectionAction::StepNext => {
                let last_step = self
                    .rule_id
                    .as_deref()
                    .and_then(|id| dataset.rule(id))
                    .map(|rule| rule.conditions.len().saturating_sub(1));
                Selection {
                    step: match last_step {
                        Some(last) => (self.step + 1).min(last),
                        None => self.step,
                    },
                    ..self.clone()
                }
            }
            SelectionAction::StepPrev => Selection {
                step: self.step.saturating_sub(1),
                ..self.clone()
            },
            SelectionAction::ResetSteps => Selection {
                step: 0,
                ..self.clone()
            },
            SelectionAction::Clear => Selection::default(),
        };
        Ok(next)
    }
}
