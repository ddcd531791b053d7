use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use rstest::rstest;
use rulelens_api::{create_router, AppState};
use rulelens_storage::InMemorySource;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // for oneshot

async fn app() -> Router {
    let transactions = serde_json::from_value(json!([
        {
            "transaction_id": "T1",
            "txn_date_time": "2024-03-01 23:40:00",
            "amount": 1500,
            "currency": "GBP",
            "transaction_type": "ATM",
            "merchant_description": "Cash Point Lagos",
            "merchant_country": "NG",
            "merchant_city": "Lagos"
        },
        {
            "transaction_id": "T2",
            "txn_date_time": "2024-03-01 12:05:00",
            "amount": 500,
            "currency": "GBP",
            "transaction_type": "POS",
            "merchant_description": "Corner Shop",
            "merchant_country": "GB",
            "merchant_city": "Leeds"
        },
        {
            "transaction_id": "T3",
            "txn_date_time": "2024-03-02 02:10:00",
            "amount": 80,
            "currency": "GBP",
            "transaction_type": "ECOM",
            "merchant_description": "Lucky Online CASINO",
            "merchant_country": "MT",
            "merchant_city": "Valletta"
        }
    ]))
    .unwrap();
    let features = serde_json::from_value(json!([
        { "transaction_id": "T1", "hour": 23, "velocity_1h": 6 },
        { "transaction_id": "T2", "hour": 12, "velocity_1h": 1 }
    ]))
    .unwrap();
    let rules = serde_json::from_value(json!([
        {
            "rule_id": "R1",
            "name": "Large amount",
            "severity": "High",
            "action": "review",
            "conditions": [
                { "field": "amount", "source": "raw", "op": ">", "value": "1000" }
            ]
        },
        {
            "rule_id": "R2",
            "name": "Night cash abroad",
            "severity": "Critical",
            "action": "block",
            "conditions": [
                { "field": "transaction_type", "source": "raw", "op": "==", "value": "ATM" },
                { "field": "merchant_country", "source": "raw", "op": "!=", "value": "GB" },
                { "field": "hour", "source": "derived", "op": "out_of_hours" }
            ]
        },
        {
            "rule_id": "R3",
            "name": "Gambling merchant",
            "severity": "Medium",
            "action": "alert",
            "conditions": [
                { "field": "merchant_description", "source": "raw", "op": "contains", "value": "casino" },
                { "field": "velocity_1h", "source": "derived", "op": ">=", "value": 3 }
            ]
        }
    ]))
    .unwrap();

    let source = InMemorySource::new()
        .with_transactions(transactions)
        .with_feature_vectors(features)
        .with_rules(rules);
    let state = AppState::from_source(&source).await.unwrap();
    create_router(Arc::new(state))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, req).await
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_health() {
    let app = app().await;
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["transactions"], 3);
    assert_eq!(body["rules"], 3);
}

#[tokio::test]
async fn test_rule_list_and_detail() {
    let app = app().await;

    let (status, rules) = get(&app, "/api/rules").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rules.as_array().unwrap().len(), 3);
    assert_eq!(rules[0]["rule_id"], "R1");
    assert_eq!(rules[0]["hits"], 1);
    assert_eq!(rules[0]["hit_rate"], 33);
    assert_eq!(rules[0]["flagged_amount"], 1500.0);

    let (status, detail) = get(&app, "/api/rules/R2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["rule"]["severity"], "Critical");
    assert_eq!(detail["stats"]["hits"], 1);
    assert_eq!(detail["fired_transaction_ids"], json!(["T1"]));

    let (status, body) = get(&app, "/api/rules/R404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_transaction_filters() {
    let app = app().await;

    let (_, all) = get(&app, "/api/transactions").await;
    assert_eq!(all.as_array().unwrap().len(), 3);
    assert_eq!(all[0]["fired"], 2);
    assert_eq!(all[0]["merchant_city"], "Lagos");

    let (_, flagged) = get(&app, "/api/transactions?filter=flagged").await;
    assert_eq!(flagged.as_array().unwrap().len(), 1);
    assert_eq!(flagged[0]["transaction_id"], "T1");

    let (_, clean) = get(&app, "/api/transactions?filter=clean").await;
    let ids: Vec<&str> = clean
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["transaction_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["T2", "T3"]);

    let (_, by_rule) = get(&app, "/api/transactions?rule_id=R2").await;
    assert_eq!(by_rule.as_array().unwrap().len(), 1);

    let (status, _) = get(&app, "/api/transactions?rule_id=R404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_transaction_inspector() {
    let app = app().await;

    // T3 has no feature vector, so the derived velocity check cannot be found
    let (status, body) = get(&app, "/api/transactions/T3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["feature_vector"], Value::Null);
    assert_eq!(body["fired"], 0);

    let gambling = &body["results"][2];
    assert_eq!(gambling["rule_id"], "R3");
    assert_eq!(gambling["pass"], false);
    assert_eq!(gambling["outcome"], "partial");
    assert_eq!(gambling["conditions"][0]["pass"], true);
    assert_eq!(gambling["conditions"][1]["actual"], "NOT FOUND");
    assert_eq!(gambling["conditions"][1]["source"], "derived");

    let (status, _) = get(&app, "/api/transactions/T404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_step_debugger() {
    let app = app().await;

    let (status, first) = get(&app, "/api/transactions/T1/rules/R2/steps/0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["total"], 3);
    assert_eq!(first["condition"]["field"], "transaction_type");
    assert_eq!(first["verdict"], Value::Null);

    let (_, last) = get(&app, "/api/transactions/T1/rules/R2/steps/9").await;
    assert_eq!(last["index"], 2);
    assert_eq!(last["is_last"], true);
    assert_eq!(last["condition"]["actual"], 23);
    assert_eq!(last["verdict"], true);

    let (status, _) = get(&app, "/api/transactions/T1/rules/R404/steps/0").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_matrix_and_summary() {
    let app = app().await;

    let (_, matrix) = get(&app, "/api/matrix").await;
    assert_eq!(matrix["rule_ids"], json!(["R1", "R2", "R3"]));
    assert_eq!(matrix["rows"][0]["cells"], json!([true, true, false]));
    assert_eq!(matrix["column_hits"], json!([1, 1, 0]));

    let (status, summary) = get(&app, "/api/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["transaction_count"], 3);
    assert_eq!(summary["flagged_transactions"], 1);
    assert_eq!(summary["clean_transactions"], 2);
    assert_eq!(summary["total_hits"], 2);
    assert_eq!(summary["fired_by_severity"]["Critical"], 1);
    assert_eq!(summary["orphan_feature_vectors"], 0);
    assert!(summary["loaded_at"].is_string());
}

#[tokio::test]
async fn test_selection_transitions() {
    let app = app().await;

    let (_, initial) = get(&app, "/api/selection").await;
    assert_eq!(initial["filter"], "all");
    assert_eq!(initial["step"], 0);

    let (status, selected) = post(
        &app,
        "/api/selection",
        json!({ "action": "select_rule", "rule_id": "R2" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(selected["rule_id"], "R2");

    for _ in 0..5 {
        post(&app, "/api/selection", json!({ "action": "step_next" })).await;
    }
    let (_, current) = get(&app, "/api/selection").await;
    assert_eq!(current["step"], 2);

    let (status, _) = post(
        &app,
        "/api/selection",
        json!({ "action": "select_transaction", "transaction_id": "T404" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, unchanged) = get(&app, "/api/selection").await;
    assert_eq!(unchanged, current);

    let (_, cleared) = post(&app, "/api/selection", json!({ "action": "clear" })).await;
    assert_eq!(cleared["rule_id"], Value::Null);
}

#[tokio::test]
async fn test_empty_dataset() {
    let app = create_router(Arc::new(AppState::new()));

    let (_, rules) = get(&app, "/api/rules").await;
    assert_eq!(rules, json!([]));

    let (_, summary) = get(&app, "/api/summary").await;
    assert_eq!(summary["transaction_count"], 0);
    assert_eq!(summary["average_hit_rate"], 0);
}

#[rstest]
#[case("/health", StatusCode::OK)]
#[case("/api/rules/R3", StatusCode::OK)]
#[case("/api/transactions?filter=flagged&rule_id=R1", StatusCode::OK)]
#[case("/api/transactions?filter=sideways", StatusCode::BAD_REQUEST)]
#[case("/api/transactions/T2/rules/R1/steps/0", StatusCode::OK)]
#[case("/api/transactions/T2/rules/R1/steps/first", StatusCode::BAD_REQUEST)]
#[case("/api/transactions/T9", StatusCode::NOT_FOUND)]
#[case("/api/nowhere", StatusCode::NOT_FOUND)]
#[tokio::test]
async fn test_route_status(#[case] uri: &str, #[case] expected: StatusCode) {
    let app = app().await;
    let (status, _) = get(&app, uri).await;
    assert_eq!(status, expected);
}
