mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::*;
use fundgraph::api;
use fundgraph::domain::ids::fee_payout_id;
use fundgraph::domain::ProtocolEvent;
use fundgraph::{MockEventSource, Repository, Timestamp};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

struct TestApp {
    app: axum::Router,
    _repo: Arc<Repository>,
    _temp: TempDir,
}

/// Index a deployed fund with one payout block, one blacklist and one
/// pending shares request, then serve it.
async fn setup_indexed_app() -> TestApp {
    let (repo, temp) = setup_repo().await;
    let source = Arc::new(MockEventSource::new().with_events(deployment()));
    source.push(fee_settled(
        3,
        0,
        management_fee(),
        ProtocolEvent::ManagementFeeSettled,
        "10000000000000000000",
    ));
    source.push(fee_settled(
        3,
        1,
        performance_fee(),
        ProtocolEvent::PerformanceFeeSettled,
        "5000000000000000000",
    ));
    source.push(fee_settings(4, management_fee(), "20000000000000000"));
    source.push(blacklist_change(5, true, vec![addr(0xa1), addr(0x99)]));
    source.push(shares_request(6, addr(0x11), ProtocolEvent::RequestCreated));

    let report = indexer(source, repo.clone()).run_once().await.unwrap();
    assert_eq!(report.skipped, 0);

    TestApp {
        app: api::create_router(api::AppState::new(repo.clone())),
        _repo: repo,
        _temp: temp,
    }
}

async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_get_fund_with_state() {
    let test_app = setup_indexed_app().await;
    let (status, json) = get_json(&test_app.app, &format!("/v1/funds/{}", vault())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Alpha Fund");
    assert_eq!(json["comptrollerProxy"], comptroller().to_string());
    assert_eq!(json["denominationAsset"], denomination().to_string());
    let payout_id = fee_payout_id(vault().as_str(), Timestamp::new(T0 + 3));
    assert_eq!(json["state"]["feePayout"], payout_id);
}

#[tokio::test]
async fn test_fund_id_is_case_insensitive() {
    let test_app = setup_indexed_app().await;
    let upper = format!("0x{}", vault().as_str()[2..].to_uppercase());
    let (status, json) = get_json(&test_app.app, &format!("/v1/funds/{}", upper)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], vault().to_string());
}

#[tokio::test]
async fn test_unknown_fund_is_404() {
    let test_app = setup_indexed_app().await;
    let (status, json) = get_json(&test_app.app, &format!("/v1/funds/{}", addr(0x42))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("Fund"));
}

#[tokio::test]
async fn test_invalid_fund_id_is_400() {
    let test_app = setup_indexed_app().await;
    let (status, json) = get_json(&test_app.app, "/v1/funds/not-an-address").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_fee_payouts_list_and_detail() {
    let test_app = setup_indexed_app().await;
    let (status, json) =
        get_json(&test_app.app, &format!("/v1/funds/{}/fee-payouts", vault())).await;

    assert_eq!(status, StatusCode::OK);
    let payouts = json["feePayouts"].as_array().unwrap();
    assert_eq!(payouts.len(), 1);
    assert_eq!(payouts[0]["shares"], "15");
    assert!(payouts[0].get("individualPayouts").is_none());

    let payout_id = payouts[0]["id"].as_str().unwrap().to_string();
    let (status, json) =
        get_json(&test_app.app, &format!("/v1/fee-payouts/{}", payout_id)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], payout_id);
    let individual = json["individualPayouts"].as_array().unwrap();
    assert_eq!(individual.len(), 2);
    let mut shares: Vec<&str> = individual
        .iter()
        .map(|p| p["shares"].as_str().unwrap())
        .collect();
    shares.sort();
    assert_eq!(shares, vec!["10", "5"]);
}

#[tokio::test]
async fn test_unknown_fee_payout_is_404() {
    let test_app = setup_indexed_app().await;
    let (status, _) = get_json(
        &test_app.app,
        &format!("/v1/fee-payouts/{}/1/payout", vault()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_shares_requests_endpoint() {
    let test_app = setup_indexed_app().await;
    let (status, json) = get_json(
        &test_app.app,
        &format!("/v1/funds/{}/shares-requests", vault()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let requests = json["requests"].as_array().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["account"], addr(0x11).to_string());
    assert_eq!(requests[0]["investmentAmount"], "250");
    assert_eq!(requests[0]["minSharesQuantity"], "2");
}

#[tokio::test]
async fn test_settings_endpoint() {
    let test_app = setup_indexed_app().await;
    let (status, json) =
        get_json(&test_app.app, &format!("/v1/funds/{}/settings", vault())).await;

    assert_eq!(status, StatusCode::OK);
    let lists = json["addressLists"].as_array().unwrap();
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0]["kind"], "ADAPTER_BLACKLIST");
    assert_eq!(lists[0]["listed"].as_array().unwrap().len(), 2);
    assert_eq!(lists[0]["adapters"][0], addr(0xa1).to_string());

    let fees = json["fees"].as_array().unwrap();
    assert_eq!(fees.len(), 1);
    assert_eq!(fees[0]["fee"], management_fee().to_string());
    assert_eq!(fees[0]["rate"], "0.02");
}

#[tokio::test]
async fn test_status_reports_cursor() {
    let test_app = setup_indexed_app().await;
    let (status, json) = get_json(&test_app.app, "/v1/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["blockNumber"], 6);
    assert_eq!(json["logIndex"], 0);
    assert_eq!(json["eventsRecorded"], 11);
}

#[tokio::test]
async fn test_health_and_ready() {
    let test_app = setup_indexed_app().await;
    let (status, json) = get_json(&test_app.app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");

    let (status, json) = get_json(&test_app.app, "/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ready");
}
