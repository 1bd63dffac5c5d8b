//! HTTP surface, exercised through the full router with offline collaborators

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use liora::config::{Config, Credentials};
use liora::handlers::{self, AppState};
use serde_json::{Value, json};
use std::str::FromStr;
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

const OFFLINE_CONFIG: &str = r#"
[server]
host = "127.0.0.1"
port = 3000

[services]
offline = true
"#;

fn app() -> (Router, AppState) {
    let config = Arc::new(Config::from_str(OFFLINE_CONFIG).expect("offline config should parse"));
    let state = AppState::new(config, &Credentials::from_lookup(|_| None))
        .expect("offline state needs no credentials");
    (handlers::router(state.clone()), state)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value, axum::http::HeaderMap) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()))
    };
    (status, json, headers)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_reports_offline_mode() {
    let (app, _) = app();
    let (status, body, headers) = send(app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "OK", "offline": true }));
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let (app, _) = app();
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "1b4e28ba-2fa1-11d2-883f-0016d3cca427")
        .body(Body::empty())
        .unwrap();
    let (_, _, headers) = send(app, request).await;
    assert_eq!(
        headers["x-request-id"],
        "1b4e28ba-2fa1-11d2-883f-0016d3cca427"
    );
}

#[tokio::test]
async fn test_catalog_endpoint() {
    let (app, _) = app();
    let (status, body, _) = send(app, get("/v1/catalog")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["default"], "fal-ai/flux/dev");
    assert_eq!(body["textToOutput"][0], "fal-ai/nano-banana");
    assert_eq!(body["imageToVideo"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_resolve_endpoint() {
    let (app, state) = app();
    let (status, body, _) = send(
        app,
        post_json(
            "/v1/resolve",
            json!({ "model": "kling", "outputType": "video", "imageUrl": "https://img/a.png" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "endpoint": "fal-ai/kling-video/v2/master/image-to-video",
            "catalog": "image_to_video",
            "matchKind": "exact_subset"
        })
    );

    let (_, metrics, _) = send(handlers::router(state), get("/metrics")).await;
    let metrics = metrics.as_str().unwrap().to_string();
    assert!(metrics.contains(
        r#"liora_resolutions_total{catalog="image_to_video",match_kind="exact_subset"} 1"#
    ));
}

#[tokio::test]
async fn test_resolve_blank_model_returns_default() {
    let (app, _) = app();
    let (status, body, _) = send(app, post_json("/v1/resolve", json!({ "model": "  " }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["endpoint"], "fal-ai/flux/dev");
    assert_eq!(body["matchKind"], "default");
}

#[tokio::test]
async fn test_resolve_rejects_malformed_body() {
    let (app, _) = app();
    let (status, body, _) = send(app, post_json("/v1/resolve", json!({ "outputType": "video" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("[ValidationError]"));
}

#[tokio::test]
async fn test_list_tools() {
    let (app, _) = app();
    let (status, body, _) = send(app, get("/v1/tools")).await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|tool| tool["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["fal-generate", "genai-execute", "get-best-practices"]);
    assert!(body[0]["inputSchema"]["properties"].is_object());
}

#[tokio::test]
async fn test_execute_genai_tool() {
    let (app, state) = app();
    let (status, body, _) = send(
        app,
        post_json(
            "/v1/tools/genai-execute",
            json!({ "model": "nano banana", "prompt": "a banana astronaut" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resolvedModel"], "fal-ai/nano-banana");
    assert_eq!(body["requestId"], "mock-request-id");
    assert_eq!(body["data"]["input"]["prompt"], "a banana astronaut");
    assert_eq!(
        state
            .metrics()
            .tool_invocation_count("genai-execute", liora::metrics::ToolOutcome::Ok),
        1
    );
}

#[tokio::test]
async fn test_tool_errors_are_ok_responses() {
    let (app, _) = app();
    let (status, body, _) = send(app, post_json("/v1/tools/genai-execute", json!({}))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["error"].as_str().unwrap().starts_with("[ValidationError]"));
}

#[tokio::test]
async fn test_empty_body_counts_as_empty_input() {
    let (app, _) = app();
    let request = Request::builder()
        .method("POST")
        .uri("/v1/tools/get-best-practices")
        .body(Body::empty())
        .unwrap();
    let (status, body, _) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["error"].as_str().unwrap().contains("prompt"));
}

#[tokio::test]
async fn test_unknown_tool_is_not_found() {
    let (app, _) = app();
    let (status, body, _) = send(app, post_json("/v1/tools/weather", json!({}))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "[UnknownToolError] Unknown tool: weather");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (app, _) = app();
    let (status, _, _) = send(app, get("/nonexistent")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
