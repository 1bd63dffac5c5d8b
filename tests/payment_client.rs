//! Coral payment claims against a mock server

use liora::error::AppError;
use liora::services::{CoralPaymentClient, PaymentService};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, session: &str) -> CoralPaymentClient {
    CoralPaymentClient::new(reqwest::Client::new(), &format!("{}//", server.uri()), session)
}

#[tokio::test]
async fn test_successful_claim() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/internal/claim/session-1"))
        .and(body_json(json!({ "amount": { "type": "coral", "amount": 2.5 } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "remainingBudget": 97.5,
            "coralUsdPrice": 0.01
        })))
        .expect(1)
        .mount(&server)
        .await;

    let claim = client(&server, "session-1").claim(2.5).await.unwrap();
    assert_eq!(claim.remaining_budget, 97.5);
    assert_eq!(claim.coral_usd_price, 0.01);
}

#[tokio::test]
async fn test_session_id_is_percent_encoded() {
    let server = MockServer::start().await;
    let client = client(&server, "team a/b");

    let url = client.claim_url().unwrap();
    assert!(url.as_str().ends_with("/api/v1/internal/claim/team%20a%2Fb"));
}

#[tokio::test]
async fn test_rejection_carries_message_and_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/internal/claim/session-1"))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({
            "message": "Insufficient budget",
            "stackTrace": ["at claim()"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, "session-1").claim(1.0).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::PaymentClaim { ref message, status: 402 } if message == "Insufficient budget"
    ));
    assert_eq!(
        err.tool_message(),
        "[PaymentClaimError] Insufficient budget (status 402)"
    );
}

#[tokio::test]
async fn test_unparsable_rejection_uses_http_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/internal/claim/session-1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, "session-1").claim(1.0).await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP 500 (status 500)");
}

#[tokio::test]
async fn test_success_with_wrong_shape() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/internal/claim/session-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;

    let err = client(&server, "session-1").claim(1.0).await.unwrap_err();
    assert_eq!(
        err.tool_message(),
        "[ResponseShapeError] Unexpected payment response: Invalid success payload shape (status 200)"
    );
}

#[tokio::test]
async fn test_empty_success_body_is_a_shape_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/internal/claim/session-1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let err = client(&server, "session-1").claim(1.0).await.unwrap_err();
    assert_eq!(err.tag(), "ResponseShapeError");
}

#[tokio::test]
async fn test_unreachable_server_is_a_request_error() {
    let client = CoralPaymentClient::new(reqwest::Client::new(), "http://127.0.0.1:9", "s");
    let err = client.claim(1.0).await.unwrap_err();
    assert_eq!(err.tag(), "PaymentClaimRequestError");
}
