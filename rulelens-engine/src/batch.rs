//! Batch evaluation across the dataset
//!
//! Aggregates are recomputed on demand; the dataset sizes this serves
//! (hundreds to low thousands of transactions, tens of rules) evaluate
//! well within a request.

use chrono::NaiveDateTime;
use rulelens_core::{Dataset, FeatureIndex, Rule, RuleResult, Severity, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::evaluate_rule;

/// Number of rules reported in `Summary::top_rules`
const TOP_RULES: usize = 5;

/// Percentage of `total` that `hits` represents, rounded to the nearest
/// integer. An empty population has a 0% hit rate.
pub fn hit_rate(hits: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (100.0 * hits as f64 / total as f64).round() as u32
}

/// Per-rule aggregate over every transaction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleStats {
    pub rule_id: String,
    pub name: String,
    pub severity: Severity,
    pub action: String,
    pub condition_count: usize,
    pub hits: usize,
    pub total: usize,
    /// Whole percent, see [`hit_rate`]
    pub hit_rate: u32,
    /// Sum of `amount` over the transactions the rule fires on
    pub flagged_amount: f64,
}

/// Every rule evaluated against one transaction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionHits {
    pub transaction_id: String,
    /// How many rules fire against this transaction
    pub fired: usize,
    pub results: Vec<RuleResult>,
}

impl TransactionHits {
    pub fn fired_rule_ids(&self) -> impl Iterator<Item = &str> {
        self.results
            .iter()
            .filter(|r| r.pass)
            .map(|r| r.rule_id.as_str())
    }
}

/// Output of [`evaluate_all`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub rules: Vec<RuleStats>,
    pub transactions: Vec<TransactionHits>,
}

/// One transaction's row of the hit matrix
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixRow {
    pub transaction_id: String,
    pub amount: f64,
    /// One cell per rule, in `HitMatrix::rule_ids` order
    pub cells: Vec<bool>,
    pub fired: usize,
}

/// Rule × transaction hit matrix
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HitMatrix {
    pub rule_ids: Vec<String>,
    pub rows: Vec<MatrixRow>,
    /// Hits per rule column
    pub column_hits: Vec<usize>,
}

/// Dataset-wide figures for the stats view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub transaction_count: usize,
    pub rule_count: usize,
    pub feature_vector_count: usize,
    /// Transactions at least one rule fires on
    pub flagged_transactions: usize,
    pub clean_transactions: usize,
    pub total_amount: f64,
    pub flagged_amount: f64,
    pub total_hits: usize,
    /// Mean of the per-rule hit rates, rounded
    pub average_hit_rate: u32,
    /// Total rule firings grouped by the firing rule's severity
    pub fired_by_severity: BTreeMap<Severity, usize>,
    pub top_rules: Vec<RuleStats>,
    pub first_transaction_at: Option<NaiveDateTime>,
    pub last_transaction_at: Option<NaiveDateTime>,
}

/// Which transactions the table shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionFilter {
    #[default]
    All,
    /// At least one rule fires
    Flagged,
    /// No rule fires
    Clean,
}

impl TransactionFilter {
    pub fn admits(&self, fired: usize) -> bool {
        match self {
            TransactionFilter::All => true,
            TransactionFilter::Flagged => fired > 0,
            TransactionFilter::Clean => fired == 0,
        }
    }
}

/// Evaluates rules over a borrowed set of transactions and feature vectors
#[derive(Debug, Clone, Copy)]
pub struct BatchEvaluator<'a> {
    rules: &'a [Rule],
    transactions: &'a [Transaction],
    features: &'a FeatureIndex,
}

impl<'a> BatchEvaluator<'a> {
    pub fn new(
        rules: &'a [Rule],
        transactions: &'a [Transaction],
        features: &'a FeatureIndex,
    ) -> Self {
        Self {
            rules,
            transactions,
            features,
        }
    }

    pub fn from_dataset(dataset: &'a Dataset) -> Self {
        Self::new(dataset.rules(), dataset.transactions(), dataset.features())
    }

    /// Evaluate one rule against one transaction, joining its feature vector.
    pub fn evaluate(&self, rule: &Rule, transaction: &Transaction) -> RuleResult {
        evaluate_rule(
            rule,
            transaction,
            self.features.get(&transaction.transaction_id),
        )
    }

    fn fires(&self, rule: &Rule, transaction: &Transaction) -> bool {
        self.evaluate(rule, transaction).pass
    }

    /// One rule across every transaction
    pub fn rule_stats(&self, rule: &Rule) -> RuleStats {
        let (hits, flagged_amount) = self
            .transactions
            .iter()
            .filter(|t| self.fires(rule, t))
            .fold((0, 0.0), |(hits, amount), t| {
                (hits + 1, amount + t.amount_value())
            });
        let total = self.transactions.len();

        RuleStats {
            rule_id: rule.rule_id.clone(),
            name: rule.name.clone(),
            severity: rule.severity,
            action: rule.action.clone(),
            condition_count: rule.conditions.len(),
            hits,
            total,
            hit_rate: hit_rate(hits, total),
            flagged_amount,
        }
    }

    pub fn all_rule_stats(&self) -> Vec<RuleStats> {
        self.rules.iter().map(|r| self.rule_stats(r)).collect()
    }

    /// Ids of the transactions a rule fires on, in dataset order
    pub fn fired_transaction_ids(&self, rule: &Rule) -> Vec<String> {
        self.transactions
            .iter()
            .filter(|t| self.fires(rule, t))
            .map(|t| t.transaction_id.clone())
            .collect()
    }

    /// Every rule against one transaction
    pub fn transaction_hits(&self, transaction: &Transaction) -> TransactionHits {
        let results: Vec<RuleResult> = self
            .rules
            .iter()
            .map(|r| self.evaluate(r, transaction))
            .collect();
        let fired = results.iter().filter(|r| r.pass).count();

        TransactionHits {
            transaction_id: transaction.transaction_id.clone(),
            fired,
            results,
        }
    }

    pub fn report(&self) -> BatchReport {
        let report = BatchReport {
            rules: self.all_rule_stats(),
            transactions: self
                .transactions
                .iter()
                .map(|t| self.transaction_hits(t))
                .collect(),
        };
        tracing::debug!(
            "Evaluated {} rules against {} transactions",
            self.rules.len(),
            self.transactions.len()
        );
        report
    }

    pub fn matrix(&self) -> HitMatrix {
        let mut column_hits = vec![0; self.rules.len()];
        let rows = self
            .transactions
            .iter()
            .map(|t| {
                let cells: Vec<bool> = self.rules.iter().map(|r| self.fires(r, t)).collect();
                for (col, hit) in cells.iter().enumerate() {
                    if *hit {
                        column_hits[col] += 1;
                    }
                }
                MatrixRow {
                    transaction_id: t.transaction_id.clone(),
                    amount: t.amount_value(),
                    fired: cells.iter().filter(|c| **c).count(),
                    cells,
                }
            })
            .collect();

        HitMatrix {
            rule_ids: self.rules.iter().map(|r| r.rule_id.clone()).collect(),
            rows,
            column_hits,
        }
    }

    /// Transactions admitted by `filter`, optionally narrowed to the ones
    /// `rule` fires on, paired with their fired-rule count.
    pub fn filter_transactions(
        &self,
        filter: TransactionFilter,
        rule: Option<&Rule>,
    ) -> Vec<(&'a Transaction, usize)> {
        self.transactions
            .iter()
            .filter(|t| rule.map_or(true, |r| self.fires(r, t)))
            .map(|t| {
                let fired = self.rules.iter().filter(|r| self.fires(r, t)).count();
                (t, fired)
            })
            .filter(|(_, fired)| filter.admits(*fired))
            .collect()
    }

    pub fn summary(&self) -> Summary {
        let matrix = self.matrix();
        let rule_stats = self.all_rule_stats();

        let flagged_transactions = matrix.rows.iter().filter(|r| r.fired > 0).count();
        let total_amount: f64 = self.transactions.iter().map(Transaction::amount_value).sum();
        let flagged_amount: f64 = matrix
            .rows
            .iter()
            .filter(|r| r.fired > 0)
            .map(|r| r.amount)
            .sum();

        let mut fired_by_severity: BTreeMap<Severity, usize> =
            Severity::ALL.iter().map(|s| (*s, 0)).collect();
        for stats in &rule_stats {
            *fired_by_severity.entry(stats.severity).or_default() += stats.hits;
        }

        let average_hit_rate = if rule_stats.is_empty() {
            0
        } else {
            let sum: u32 = rule_stats.iter().map(|s| s.hit_rate).sum();
            (sum as f64 / rule_stats.len() as f64).round() as u32
        };

        let mut top_rules: Vec<RuleStats> = rule_stats
            .iter()
            .filter(|s| s.hits > 0)
            .cloned()
            .collect();
        top_rules.sort_by(|a, b| {
            b.hits
                .cmp(&a.hits)
                .then_with(|| b.severity.cmp(&a.severity))
                .then_with(|| a.rule_id.cmp(&b.rule_id))
        });
        top_rules.truncate(TOP_RULES);

        let timestamps: Vec<NaiveDateTime> = self
            .transactions
            .iter()
            .filter_map(Transaction::occurred_at)
            .collect();

        Summary {
            transaction_count: self.transactions.len(),
            rule_count: self.rules.len(),
            feature_vector_count: self.features.len(),
            flagged_transactions,
            clean_transactions: self.transactions.len() - flagged_transactions,
            total_amount,
            flagged_amount,
            total_hits: matrix.column_hits.iter().sum(),
            average_hit_rate,
            fired_by_severity,
            top_rules,
            first_transaction_at: timestamps.iter().min().copied(),
            last_transaction_at: timestamps.iter().max().copied(),
        }
    }
}

/// Evaluate every rule against every transaction.
///
/// Empty rule or transaction sets produce empty aggregates.
pub fn evaluate_all(
    rules: &[Rule],
    transactions: &[Transaction],
    features: &FeatureIndex,
) -> BatchReport {
    BatchEvaluator::new(rules, transactions, features).report()
}
