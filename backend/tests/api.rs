// Router-level tests for the color, palette and submitter endpoints.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceExt;

use viridis_core::model::{Submission, SubmitterRecord};
use viridis_core::palette::Palette;
use viridis_server::app::AppState;
use viridis_server::engine::EngineConfig;
use viridis_server::http::router;
use viridis_server::hub::ViewerConnection;
use viridis_server::store::{MemoryStore, StoreError, StoreResult, SubmissionStore};
use viridis_server::utils::now_epoch_ms;

/// Memory store that counts writes and can be switched into a failing mode.
#[derive(Default)]
struct TestStore {
    inner: MemoryStore,
    writes: AtomicUsize,
    fail_writes: bool,
}

impl TestStore {
    fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    fn write(&self) -> StoreResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        Ok(())
    }
}

impl SubmissionStore for TestStore {
    fn set_current_color<'a>(&'a self, hex: &'a str) -> BoxFuture<'a, StoreResult<()>> {
        async move {
            self.write()?;
            self.inner.set_current_color(hex).await
        }
        .boxed()
    }

    fn current_color(&self) -> BoxFuture<'_, StoreResult<Option<String>>> {
        self.inner.current_color()
    }

    fn record_submission<'a>(&'a self, submission: &'a Submission) -> BoxFuture<'a, StoreResult<()>> {
        async move {
            self.write()?;
            self.inner.record_submission(submission).await
        }
        .boxed()
    }

    fn recent_submissions(&self, window_ms: u64, now_ms: u64) -> BoxFuture<'_, StoreResult<Vec<Submission>>> {
        self.inner.recent_submissions(window_ms, now_ms)
    }

    fn purge_older_than(&self, cutoff_ms: u64) -> BoxFuture<'_, StoreResult<usize>> {
        async move {
            self.write()?;
            self.inner.purge_older_than(cutoff_ms).await
        }
        .boxed()
    }

    fn submitter<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<Option<SubmitterRecord>>> {
        self.inner.submitter(id)
    }
}

fn state_with(store: Arc<TestStore>) -> AppState {
    AppState::new(EngineConfig::default(), Palette::builtin(), store, now_epoch_ms())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("router responds");
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.expect("body reads");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).expect("request builds")
}

fn put_json(body: Value) -> Request<Body> {
    put_raw(body.to_string())
}

fn put_raw(body: String) -> Request<Body> {
    Request::builder()
        .method(Method::PUT)
        .uri("/api/color")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .expect("request builds")
}

fn is_upper_hex(value: &Value) -> bool {
    value.as_str().is_some_and(|hex| {
        hex.len() == 7
            && hex.starts_with('#')
            && hex[1..].chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
    })
}

#[tokio::test]
async fn health_reports_ok() {
    let app = router(state_with(Arc::default()));
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn empty_store_still_answers_with_hex_colors() {
    let app = router(state_with(Arc::default()));
    let (status, body) = send(&app, get("/api/color")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(is_upper_hex(&body["color"]), "{body}");
    assert!(is_upper_hex(&body["average"]), "{body}");
    assert!(body.get("proximityAverage").is_none());
    assert!(body.get("nearbyCount").is_none());
}

#[tokio::test]
async fn submit_then_query_nearby() {
    let app = router(state_with(Arc::default()));
    let (status, body) = send(
        &app,
        put_json(json!({ "id": "u1", "color": "#FF0000", "lat": 37.7749, "long": -122.4194 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let (status, body) = send(&app, get("/api/color?lat=37.7749&long=-122.4194")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["color"], "#FF0000");
    assert_eq!(body["average"], "#FF0000");
    assert_eq!(body["proximityAverage"], "#FF0000");
    assert!(body["nearbyCount"].as_u64().is_some_and(|count| count >= 1));
}

#[tokio::test]
async fn junk_coordinates_omit_proximity() {
    let app = router(state_with(Arc::default()));
    for uri in ["/api/color?lat=invalid&long=invalid", "/api/color?lat=10", "/api/color?lat=1&lat=2&long=3"] {
        let (status, body) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert!(body.get("color").is_some());
        assert!(body.get("nearbyCount").is_none(), "{uri}: {body}");
    }
}

#[tokio::test]
async fn radius_parameter_narrows_the_neighborhood() {
    let app = router(state_with(Arc::default()));
    let (status, _) = send(
        &app,
        put_json(json!({ "id": "u1", "color": "#0000FF", "lat": 40.7128, "long": -74.0060 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // About 55 km north of the submission.
    let (_, wide) = send(&app, get("/api/color?lat=41.2128&long=-74.0060&radius=100")).await;
    assert_eq!(wide["nearbyCount"], 1);
    let (_, default) = send(&app, get("/api/color?lat=41.2128&long=-74.0060")).await;
    assert_eq!(default["nearbyCount"], 0);
    assert_eq!(default["proximityAverage"], default["average"]);
}

#[tokio::test]
async fn out_of_range_latitude_is_rejected_without_writes() {
    let store = Arc::new(TestStore::default());
    let app = router(state_with(store.clone()));
    let (status, body) = send(
        &app,
        put_json(json!({ "id": "u1", "color": "#FF0000", "lat": 91, "long": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().is_some_and(|m| m.contains("latitude")));
    assert_eq!(store.writes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_submissions_are_bad_requests() {
    let app = router(state_with(Arc::default()));
    let cases = [
        json!({ "id": "u", "color": "FF0000", "lat": 0, "long": 0 }),
        json!({ "id": "u", "color": "#FF000", "lat": 0, "long": 0 }),
        json!({ "id": "u", "color": "#FF00000", "lat": 0, "long": 0 }),
        json!({ "id": "u", "color": "#GGGGGG", "lat": 0, "long": 0 }),
        json!({ "id": "u", "color": "#123456", "lat": 0, "long": 0 }),
        json!({ "id": "u", "lat": 0, "long": 0 }),
        json!({ "id": "", "color": "#FF0000", "lat": 0, "long": 0 }),
        json!({ "id": "idle:42", "color": "#FF0000", "lat": 0, "long": 0 }),
        json!({ "id": 42, "color": "#FF0000", "lat": 0, "long": 0 }),
        json!({ "id": "u", "color": "#FF0000", "long": 0 }),
        json!({ "id": "u", "color": "#FF0000", "lat": 0, "long": 200 }),
        json!(null),
    ];
    for case in cases {
        let (status, body) = send(&app, put_json(case.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{case}");
        assert_eq!(body["success"], false, "{case}");
        assert!(body["message"].is_string(), "{case}");
    }

    let (status, body) = send(&app, put_raw("{not json".into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn lowercase_and_boundary_submissions_are_accepted() {
    let app = router(state_with(Arc::default()));
    let cases = [
        json!({ "id": "a", "color": "#ff6347", "lat": 0, "long": 0 }),
        json!({ "id": "b", "color": "#FF0000", "lat": -90, "long": 0 }),
        json!({ "id": "c", "color": "#FF0000", "lat": 90, "long": 0 }),
        json!({ "id": "d", "color": "#FF0000", "lat": 0, "long": -180 }),
        json!({ "id": "e", "color": "#FF0000", "lat": 0, "long": 180 }),
    ];
    for case in cases {
        let (status, _) = send(&app, put_json(case.clone())).await;
        assert_eq!(status, StatusCode::OK, "{case}");
    }
}

#[tokio::test]
async fn rapid_resubmission_is_throttled() {
    let app = router(state_with(Arc::default()));
    let submission = json!({ "id": "throttle-user", "color": "#FF0000", "lat": 40.7128, "long": -74.0060 });
    let (status, _) = send(&app, put_json(submission.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, put_json(submission)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());
    assert!(body["remainingTime"].as_u64().is_some_and(|secs| secs > 0 && secs <= 12));
}

#[tokio::test]
async fn store_failure_is_an_internal_error() {
    let app = router(state_with(Arc::new(TestStore::failing())));
    let (status, body) = send(
        &app,
        put_json(json!({ "id": "u1", "color": "#FF0000", "lat": 0, "long": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn submission_is_broadcast_to_viewers() {
    let state = state_with(Arc::default());
    let (tx, mut rx) = mpsc::channel(8);
    state.hub().register(ViewerConnection::new(tx)).await;
    let (closed_tx, closed_rx) = mpsc::channel(8);
    state.hub().register(ViewerConnection::new(closed_tx)).await;
    drop(closed_rx);

    let app = router(state);
    let (status, _) = send(
        &app,
        put_json(json!({ "id": "u1", "color": "#00FF00", "lat": 10, "long": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let payload: Value = serde_json::from_str(&rx.recv().await.expect("broadcast")).expect("json");
    assert_eq!(payload["color"], "#00FF00");
    assert_eq!(payload["average"], "#00FF00");
}

#[tokio::test]
async fn palette_lists_full_catalog() {
    let app = router(state_with(Arc::default()));
    let (status, body) = send(&app, get("/api/palette")).await;
    assert_eq!(status, StatusCode::OK);
    let colors = body["colors"].as_array().expect("colors array");
    assert_eq!(colors.len(), 32);
    assert_eq!(colors[0], json!({ "hex": "#FF0000", "name": "Red" }));
    assert_eq!(body["name"], "Viridis Color Palette");
}

#[tokio::test]
async fn submitter_record_is_exposed() {
    let app = router(state_with(Arc::default()));
    let (status, _) = send(
        &app,
        put_json(json!({ "id": "geo-user", "color": "#FF6347", "lat": 37.7749, "long": -122.4194 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, get("/api/submitters/geo-user")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["color"], "#FF6347");
    assert_eq!(body["lat"], 37.7749);
    assert_eq!(body["long"], -122.4194);

    let (status, body) = send(&app, get("/api/submitters/nobody")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}
