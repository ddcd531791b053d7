//! Rule evaluation engine
//!
//! Pure, synchronous evaluation of rules against transactions:
//! single conditions, whole rules (AND of every condition), batch
//! aggregates across the dataset, and a step-through view of one result.
//! Nothing here can fail; every input combination has a defined result.

pub mod batch;
pub mod coerce;
pub mod debugger;
pub mod evaluator;

pub use batch::{
    evaluate_all, hit_rate, BatchEvaluator, BatchReport, HitMatrix, MatrixRow, RuleStats, Summary,
    TransactionFilter, TransactionHits,
};
pub use debugger::{step, steps, StepView};
pub use evaluator::{evaluate_condition, evaluate_rule};
