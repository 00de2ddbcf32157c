mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use common::{transfer, ScriptedFeed, PEER, SUBJECT};
use wallet_risk_engine::api::{router, AppState};
use wallet_risk_engine::config::Config;
use wallet_risk_engine::entity::AddressKnowledgeBase;
use wallet_risk_engine::feed::FeedError;
use wallet_risk_engine::pipeline::RiskPipeline;
use wallet_risk_engine::risk::RiskEngine;

fn app(feed: ScriptedFeed) -> axum::Router {
    router(AppState {
        pipeline: RiskPipeline::new(
            RiskEngine::new(Config::default().thresholds),
            Arc::new(AddressKnowledgeBase::empty()),
        ),
        feed,
        fetch_timeout: Duration::from_secs(1),
    })
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let response = app(ScriptedFeed::fixed(Vec::new()))
        .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_wallet_risk_fetches_and_scores() {
    let feed = ScriptedFeed::fixed(vec![
        transfer("0x01", SUBJECT, PEER, 1_600_000_000, 1.0),
        transfer("0x02", PEER, SUBJECT, 1_599_990_000, 2.0),
    ]);
    let uri = format!("/api/v1/wallet/{}/risk", SUBJECT.to_uppercase().replace("0X", "0x"));
    let response = app(feed)
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["address"], SUBJECT);
    assert_eq!(json["detailed_analysis"]["transaction_count"], 2);
    assert!(json["risk_score"].as_f64().unwrap() <= 1.0);
}

#[tokio::test]
async fn test_invalid_address_is_bad_request() {
    let response = app(ScriptedFeed::fixed(Vec::new()))
        .oneshot(
            Request::get("/api/v1/wallet/0x1234/risk")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_feed_errors_map_to_gateway_statuses() {
    let cases = [
        (FeedError::RateLimited, StatusCode::TOO_MANY_REQUESTS),
        (FeedError::Timeout { secs: 1 }, StatusCode::GATEWAY_TIMEOUT),
        (FeedError::Network("connection reset".to_string()), StatusCode::BAD_GATEWAY),
    ];

    for (error, expected) in cases {
        let uri = format!("/api/v1/wallet/{}/risk", SUBJECT);
        let response = app(ScriptedFeed::failing(error))
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), expected);
    }
}

#[tokio::test]
async fn test_analyze_supplied_history() {
    let body = serde_json::json!({
        "address": SUBJECT,
        "transactions": [
            {
                "blockNumber": "100",
                "timeStamp": "1600000000",
                "hash": "0xaa",
                "from": SUBJECT,
                "to": PEER,
                "value": "1000000000000000000",
                "gas": "21000",
                "gasPrice": "20000000000",
                "isError": "0",
                "input": "0x",
                "contractAddress": "",
                "gasUsed": "21000"
            }
        ],
        "real_time_flags": ["Sanctions screening hit"]
    });

    let response = app(ScriptedFeed::fixed(Vec::new()))
        .oneshot(
            Request::post("/api/v1/analyze")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["detailed_analysis"]["transaction_count"], 1);
    assert_eq!(json["real_time_flags"][0], "Sanctions screening hit");
}
