//! An in-process fake of the review backend, the safety service and object
//! storage, served by axum on an ephemeral port.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use safewander::config::{BackendConfig, SafetyConfig, StorageConfig};

pub const ANON_KEY: &str = "anon-test-key";
pub const BUCKET: &str = "review-images";

#[derive(Clone, Default)]
pub struct FakeState {
    pub reviews: Arc<Mutex<Vec<Value>>>,
    pub submitted: Arc<Mutex<Vec<Value>>>,
    pub uploads: Arc<Mutex<Vec<Upload>>>,
    /// `GET /reviews` answers 503 this many more times.
    pub list_failures: Arc<AtomicUsize>,
    /// `POST /submit-review` answers 503 this many more times.
    pub submit_failures: Arc<AtomicUsize>,
    /// `GET /reviews` answers 200 with an error object instead of a listing.
    pub under_maintenance: Arc<AtomicBool>,
    pub list_hits: Arc<AtomicUsize>,
    pub submit_hits: Arc<AtomicUsize>,
}

#[derive(Clone, Debug)]
pub struct Upload {
    pub bucket: String,
    pub name: String,
    pub content_type: String,
    pub size: usize,
}

impl FakeState {
    pub fn with_reviews(reviews: Vec<Value>) -> Self {
        let state = Self::default();
        *state.reviews.lock().unwrap() = reviews;
        state
    }

    pub fn submitted(&self) -> Vec<Value> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().unwrap().clone()
    }
}

/// A running fake server.
pub struct FakeServer {
    pub url: String,
    pub state: FakeState,
    handle: tokio::task::JoinHandle<()>,
}

impl FakeServer {
    pub async fn start(state: FakeState) -> Self {
        let app = router(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });
        Self {
            url: format!("http://{addr}"),
            state,
            handle,
        }
    }

    pub fn backend_config(&self) -> BackendConfig {
        backend_config(&self.url)
    }

    pub fn safety_config(&self) -> SafetyConfig {
        SafetyConfig {
            api_url: self.url.clone(),
            timeout_ms: 2_000,
        }
    }

    pub fn storage_config(&self, anon_key: &str) -> StorageConfig {
        StorageConfig {
            url: Some(self.url.clone()),
            anon_key: Some(anon_key.to_string()),
            bucket: BUCKET.to_string(),
        }
    }
}

impl Drop for FakeServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn backend_config(url: &str) -> BackendConfig {
    BackendConfig {
        url: url.to_string(),
        timeout_ms: 2_000,
        connect_timeout_ms: 1_000,
    }
}

/// A URL nothing listens on.
pub async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{addr}")
}

fn router(state: FakeState) -> Router {
    Router::new()
        .route("/reviews", get(list_reviews))
        .route("/reviews/:id", get(get_review))
        .route("/submit-review", post(submit_review))
        .route("/safety-reviews", get(safety_reviews))
        .route("/slow/reviews", get(slow))
        .route("/storage/v1/object/:bucket/:name", post(upload_object))
        .with_state(state)
}

fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

async fn list_reviews(State(state): State<FakeState>) -> Result<Json<Value>, StatusCode> {
    state.list_hits.fetch_add(1, Ordering::SeqCst);
    if take_failure(&state.list_failures) {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    if state.under_maintenance.load(Ordering::SeqCst) {
        return Ok(Json(json!({ "error": "db maintenance" })));
    }
    let reviews = state.reviews.lock().unwrap().clone();
    Ok(Json(json!({ "reviews": reviews })))
}

async fn get_review(
    State(state): State<FakeState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, StatusCode> {
    let found = state
        .reviews
        .lock()
        .unwrap()
        .iter()
        .find(|r| r.get("id").and_then(Value::as_i64) == Some(id))
        .cloned();
    found
        .map(|review| Json(json!({ "review": review })))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn submit_review(
    State(state): State<FakeState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.submit_hits.fetch_add(1, Ordering::SeqCst);
    if take_failure(&state.submit_failures) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "try later" })),
        );
    }
    if body.get("placeName").and_then(Value::as_str) == Some("Rejected Place") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "rejected" })),
        );
    }
    let id = {
        let mut submitted = state.submitted.lock().unwrap();
        submitted.push(body);
        100 + submitted.len()
    };
    (
        StatusCode::CREATED,
        Json(json!({ "id": id, "message": "Review submitted successfully" })),
    )
}

async fn safety_reviews(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let place = params.get("placeName").cloned().unwrap_or_default();
    let location = params.get("location").cloned().unwrap_or_default();
    Json(json!({
        "reviews": [
            format!("{place} felt safe after dark"),
            format!("Stay on the main streets around {location}"),
            42,
        ]
    }))
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(500)).await;
    Json(json!({ "reviews": [] }))
}

async fn upload_object(
    State(state): State<FakeState>,
    Path((bucket, name)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let header = |key: &str| {
        headers
            .get(key)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    if header("apikey") != ANON_KEY || header("authorization") != format!("Bearer {ANON_KEY}") {
        return StatusCode::UNAUTHORIZED;
    }
    state.uploads.lock().unwrap().push(Upload {
        bucket,
        name,
        content_type: header("content-type"),
        size: body.len(),
    });
    StatusCode::OK
}

/// Backend records in the shapes the real service has been seen to send.
pub fn sample_records() -> Vec<Value> {
    vec![
        json!({
            "id": 11,
            "placeName": "Ichiran Shibuya",
            "category": "Cafe/Restaurant",
            "location": "Shibuya, Tokyo",
            "rating": 5,
            "safetyScore": 9,
            "image_url": "https://cdn.example/ichiran.jpg",
            "tags": "[\"Well-lit\", \"Solo-friendly\"]",
            "created_at": "2024-05-01T12:00:00Z",
            "review": "Solo booths, staff everywhere, and open late. Felt completely at ease.",
            "author": "Mika"
        }),
        json!({
            "id": "12",
            "place_name": "Hotel Gracery",
            "category": "Hotel",
            "location": "Shinjuku, Tokyo",
            "rating": "4",
            "safety_score": "8.5",
            "tags": "Female-only floor, 24h reception",
            "created_at": "2024-06-10 08:30:00",
            "review": "Female-only floor and a 24 hour front desk."
        }),
        json!({
            "id": 13,
            "placeName": "Ichiran Shibuya",
            "category": "Cafe/Restaurant",
            "location": "Shibuya, Tokyo",
            "rating": 4,
            "safetyScore": 8,
            "created_at": "2024-04-01",
            "review": "Second visit, still great."
        }),
        json!({ "category": "Hotel" }),
    ]
}
