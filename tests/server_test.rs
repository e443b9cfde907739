use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use estate_publisher::domain::model::{PipelineResult, WebhookEvent};
use estate_publisher::domain::ports::EventHandler;
use estate_publisher::server::{router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

#[derive(Default)]
struct RecordingHandler {
    events: Mutex<Vec<WebhookEvent>>,
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn handle(&self, event: &WebhookEvent) -> PipelineResult {
        self.events.lock().unwrap().push(event.clone());
        if event.estate_id == "404" {
            return PipelineResult::failure("Listing 404 not found");
        }
        PipelineResult::completed(
            "https://icidordogne-bergerac.netlify.app".to_string(),
            "ICI-4521".to_string(),
            Vec::new(),
        )
    }
}

fn app() -> (axum::Router, Arc<RecordingHandler>) {
    let handler = Arc::new(RecordingHandler::default());
    (router(AppState::new(handler.clone())), handler)
}

async fn json_response(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn post_webhook(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_webhook_returns_pipeline_result() {
    let (app, handler) = app();

    let response = app
        .oneshot(post_webhook(r#"{"event":"estate-added","estate_id":"4521"}"#))
        .await
        .unwrap();
    let (status, body) = json_response(response).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "success": true,
            "url": "https://icidordogne-bergerac.netlify.app",
            "reference": "ICI-4521"
        })
    );
    assert_eq!(
        *handler.events.lock().unwrap(),
        vec![WebhookEvent::estate_added("4521")]
    );
}

#[tokio::test]
async fn test_pipeline_failure_is_still_200() {
    let (app, _handler) = app();

    let response = app
        .oneshot(post_webhook(r#"{"event":"estate-updated","estate_id":404}"#))
        .await
        .unwrap();
    let (status, body) = json_response(response).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Listing 404 not found"));
}

#[tokio::test]
async fn test_invalid_payload_is_reported_in_body() {
    let (app, handler) = app();

    let response = app.oneshot(post_webhook("not json")).await.unwrap();
    let (status, body) = json_response(response).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(false));
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid webhook payload"));
    assert!(handler.events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_manual_trigger_acts_as_estate_added() {
    let (app, handler) = app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/test/4521")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let (status, body) = json_response(response).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    let events = handler.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event, "estate-added");
    assert_eq!(events[0].estate_id, "4521");
}

#[tokio::test]
async fn test_health() {
    let (app, _handler) = app();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let (status, body) = json_response(response).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));
    assert_eq!(body["service"], json!("estate-publisher"));
}
