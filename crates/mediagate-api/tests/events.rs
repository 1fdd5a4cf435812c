use axum::body::{to_bytes, Body};
use axum::Router;
use http::{Request, StatusCode};
use mediagate_api::setup::routes::setup_routes;
use mediagate_api::state::AppState;
use mediagate_core::ResourceState;
use mediagate_services::test_helpers::*;
use mediagate_services::Dispatcher;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app(harness: &TestHarness) -> Router {
    setup_routes(AppState::new(Dispatcher::with_default_pipelines(
        harness.collaborators(),
    )))
}

fn envelope(keys: &[&str]) -> String {
    let records: Vec<Value> = keys
        .iter()
        .map(|key| {
            json!({
                "s3": {
                    "bucket": { "name": SOURCE_BUCKET },
                    "object": { "key": key }
                }
            })
        })
        .collect();
    json!({ "Records": records }).to_string()
}

async fn post_event(app: Router, body: String) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/events")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn health_reports_ok() {
    let harness = TestHarness::new();
    let response = app(&harness)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn document_event_is_copied_and_returns_null() {
    let harness = TestHarness::new();
    harness
        .storage
        .set_file(SOURCE_BUCKET, "d1/document/d1/1533686400", b"%PDF".to_vec());

    let (status, body) =
        post_event(app(&harness), envelope(&["d1/document/d1/1533686400"])).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);
    assert!(harness
        .storage
        .has_file(DESTINATION_BUCKET, "d1/document/1533686400"));
    assert_eq!(harness.tracker.states(), vec![ResourceState::Ready]);
}

#[tokio::test]
async fn encoded_keys_are_decoded_before_dispatch() {
    let harness = TestHarness::new();
    harness
        .storage
        .set_file(SOURCE_BUCKET, "v1/video/v1/1533686400", b"mp4".to_vec());

    let (status, body) =
        post_event(app(&harness), envelope(&["v1%2Fvideo%2Fv1%2F1533686400"])).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "jobId": "1234567890123-abc123" }));
    assert_eq!(harness.transcoder.jobs().len(), 1);
}

#[tokio::test]
async fn malformed_key_is_a_bad_request() {
    let harness = TestHarness::new();

    let (status, body) = post_event(app(&harness), envelope(&["a/video/b"])).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(harness.tracker.updates().is_empty());
}

#[tokio::test]
async fn empty_records_is_a_bad_request() {
    let harness = TestHarness::new();

    let (status, body) = post_event(app(&harness), json!({ "Records": [] }).to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Event contains no records");
}

#[tokio::test]
async fn unparseable_body_is_a_bad_request() {
    let harness = TestHarness::new();

    let (status, body) = post_event(app(&harness), "not json".to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn storage_failure_maps_to_bad_gateway() {
    let harness = TestHarness::new();

    // Source object was never written
    let (status, body) =
        post_event(app(&harness), envelope(&["d1/document/d1/1533686400"])).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "STORAGE_ERROR");
}

#[tokio::test]
async fn records_are_processed_in_order_and_first_payload_wins() {
    let harness = TestHarness::new();
    harness
        .storage
        .set_file(SOURCE_BUCKET, "d1/document/d1/1533686400", b"%PDF".to_vec());
    harness
        .storage
        .set_file(SOURCE_BUCKET, "v1/video/v1/1533686401", b"mp4".to_vec());

    let (status, body) = post_event(
        app(&harness),
        envelope(&["d1/document/d1/1533686400", "v1/video/v1/1533686401"]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);
    assert_eq!(
        harness.tracker.states(),
        vec![ResourceState::Ready, ResourceState::Processing]
    );
}
