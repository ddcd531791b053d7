//! API request handlers

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use rulelens_core::{FeatureVector, Rule, RuleResult, Transaction};
use rulelens_engine::{step, RuleStats, Summary, TransactionFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::selection::SelectionAction;
use crate::{ApiError, AppState};

fn find_rule<'a>(state: &'a AppState, rule_id: &str) -> Result<&'a Rule, ApiError> {
    state
        .dataset
        .rule(rule_id)
        .ok_or_else(|| ApiError::NotFound(format!("Rule {} not found", rule_id)))
}

fn find_transaction<'a>(
    state: &'a AppState,
    transaction_id: &str,
) -> Result<&'a Transaction, ApiError> {
    state
        .dataset
        .transaction(transaction_id)
        .ok_or_else(|| ApiError::NotFound(format!("Transaction {} not found", transaction_id)))
}

// ==================== Summary Handler ====================

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    #[serde(flatten)]
    pub summary: Summary,
    pub orphan_feature_vectors: usize,
    pub loaded_at: DateTime<Utc>,
}

/// Dataset-wide stats
pub async fn get_summary(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(SummaryResponse {
        summary: state.batch().summary(),
        orphan_feature_vectors: state.dataset.orphan_feature_count(),
        loaded_at: state.dataset.loaded_at(),
    })
}

// ==================== Rule Handlers ====================

/// List every rule with its hit statistics
pub async fn list_rules(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.batch().all_rule_stats())
}

#[derive(Debug, Serialize)]
pub struct RuleDetail {
    pub rule: Rule,
    pub stats: RuleStats,
    pub fired_transaction_ids: Vec<String>,
}

/// Get one rule with its statistics and the transactions it fires on
pub async fn get_rule(
    State(state): State<Arc<AppState>>,
    Path(rule_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let rule = find_rule(&state, &rule_id)?;
    let batch = state.batch();

    Ok(Json(RuleDetail {
        rule: rule.clone(),
        stats: batch.rule_stats(rule),
        fired_transaction_ids: batch.fired_transaction_ids(rule),
    }))
}

// ==================== Transaction Handlers ====================

#[derive(Debug, Default, Deserialize)]
pub struct TransactionQuery {
    #[serde(default)]
    pub filter: TransactionFilter,
    pub rule_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TransactionRow {
    #[serde(flatten)]
    pub transaction: Transaction,
    /// Number of rules that fire on this transaction
    pub fired: usize,
}

/// List transactions, filtered by flag status and optionally by a firing rule
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TransactionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rule = query
        .rule_id
        .as_deref()
        .map(|id| find_rule(&state, id))
        .transpose()?;

    let rows: Vec<TransactionRow> = state
        .batch()
        .filter_transactions(query.filter, rule)
        .into_iter()
        .map(|(t, fired)| TransactionRow {
            transaction: t.clone(),
            fired,
        })
        .collect();

    tracing::debug!(
        "Listing {} transactions (filter {:?}, rule {:?})",
        rows.len(),
        query.filter,
        query.rule_id
    );

    Ok(Json(rows))
}

#[derive(Debug, Serialize)]
pub struct TransactionInspector {
    pub transaction: Transaction,
    pub feature_vector: Option<FeatureVector>,
    pub fired: usize,
    pub results: Vec<RuleResult>,
}

/// Inspect one transaction: its feature vector and every rule's result
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(transaction_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let transaction = find_transaction(&state, &transaction_id)?;
    let hits = state.batch().transaction_hits(transaction);

    Ok(Json(TransactionInspector {
        transaction: transaction.clone(),
        feature_vector: state.dataset.features_for(&transaction_id).cloned(),
        fired: hits.fired,
        results: hits.results,
    }))
}

/// Step debugger view of one rule against one transaction
pub async fn get_step(
    State(state): State<Arc<AppState>>,
    Path((transaction_id, rule_id, index)): Path<(String, String, usize)>,
) -> Result<impl IntoResponse, ApiError> {
    let transaction = find_transaction(&state, &transaction_id)?;
    let rule = find_rule(&state, &rule_id)?;
    let result = state.batch().evaluate(rule, transaction);

    let view = step(&result, index)
        .ok_or_else(|| ApiError::Internal(format!("Rule {} has no conditions", rule_id)))?;
    Ok(Json(view))
}

// ==================== Matrix Handler ====================

/// Rule × transaction hit matrix
pub async fn get_matrix(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.batch().matrix())
}

// ==================== Selection Handlers ====================

/// Current selection state
pub async fn get_selection(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.selection().await)
}

/// Apply a selection action and return the new selection
pub async fn update_selection(
    State(state): State<Arc<AppState>>,
    Json(action): Json<SelectionAction>,
) -> Result<impl IntoResponse, ApiError> {
    let selection = state.update_selection(&action).await?;
    tracing::debug!("Selection updated by {:?}: {:?}", action, selection);
    Ok(Json(selection))
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "rulelens",
        "transactions": state.dataset.transactions().len(),
        "rules": state.dataset.rules().len()
    }))
}
