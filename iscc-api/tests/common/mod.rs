//! Shared helpers for iscc-api integration tests
//!
//! Fake registry, storage and notification services run as real axum servers
//! on ephemeral ports so the HTTP clients are exercised end to end.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::{Query, State},
    http::{HeaderMap, Request, StatusCode},
    routing::{get, post},
    Json, Router,
};
use image::{ImageBuffer, ImageFormat, Rgb};
use iscc_api::services::{
    AssetProcessor, NotificationClient, PersistencePipeline, RegistryClient, StorageClient,
    ThumbnailWriter,
};
use iscc_api::AppState;
use iscc_common::config::UnitBits;
use iscc_common::{ByteSource, ComputationError, StandardUnits, UnitCode, UnitComputer, UnitKind, UnitPool};
use serde_json::{json, Value};

pub const BOUNDARY: &str = "iscc-test-boundary";

/// Spawn a router on an ephemeral port
pub async fn spawn_server(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Address nothing listens on
pub async fn closed_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Registry fake: digest → identifier
#[derive(Clone, Default)]
pub struct FakeRegistry {
    pub entries: Arc<Mutex<HashMap<String, String>>>,
    pub lookups: Arc<AtomicUsize>,
}

impl FakeRegistry {
    pub fn insert(&self, digest: &str, iscc: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(digest.to_string(), iscc.to_string());
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub async fn spawn(&self) -> String {
        async fn lookup(
            State(registry): State<FakeRegistry>,
            Query(params): Query<HashMap<String, String>>,
        ) -> Json<Value> {
            registry.lookups.fetch_add(1, Ordering::SeqCst);
            let digest = params.get("digest").cloned().unwrap_or_default();
            match registry.entries.lock().unwrap().get(&digest) {
                Some(iscc) => Json(json!({ "data": { "iscc": iscc } })),
                None => Json(json!({ "detail": "not found" })),
            }
        }

        let router = Router::new()
            .route("/lookup", get(lookup))
            .with_state(self.clone());
        format!("http://{}/lookup", spawn_server(router).await)
    }
}

/// Storage fake recording every POSTed record
#[derive(Clone)]
pub struct FakeStorage {
    pub records: Arc<Mutex<Vec<Value>>>,
    pub status: StatusCode,
    /// Time taken before answering each POST
    pub delay: Duration,
}

impl FakeStorage {
    pub fn responding(status: StatusCode) -> Self {
        Self::slow(status, Duration::ZERO)
    }

    pub fn slow(status: StatusCode, delay: Duration) -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            status,
            delay,
        }
    }

    pub fn records(&self) -> Vec<Value> {
        self.records.lock().unwrap().clone()
    }

    pub async fn spawn(&self) -> String {
        async fn store(State(storage): State<FakeStorage>, Json(record): Json<Value>) -> StatusCode {
            storage.records.lock().unwrap().push(record);
            tokio::time::sleep(storage.delay).await;
            storage.status
        }

        let router = Router::new()
            .route("/store", post(store))
            .with_state(self.clone());
        format!("http://{}/store", spawn_server(router).await)
    }
}

/// Notification fake recording content type and body size
#[derive(Clone, Default)]
pub struct FakeNotifier {
    pub received: Arc<Mutex<Vec<(String, usize)>>>,
}

impl FakeNotifier {
    pub fn received(&self) -> Vec<(String, usize)> {
        self.received.lock().unwrap().clone()
    }

    pub async fn spawn(&self) -> String {
        async fn notify(
            State(notifier): State<FakeNotifier>,
            headers: HeaderMap,
            body: Bytes,
        ) -> StatusCode {
            let content_type = headers
                .get("content-type")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            notifier.received.lock().unwrap().push((content_type, body.len()));
            StatusCode::OK
        }

        let router = Router::new()
            .route("/notify", post(notify))
            .with_state(self.clone());
        format!("http://{}/notify", spawn_server(router).await)
    }
}

/// Standard units with a call counter
#[derive(Default)]
pub struct CountingUnits {
    pub calls: AtomicUsize,
}

impl CountingUnits {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl UnitComputer for CountingUnits {
    fn compute_unit(
        &self,
        kind: UnitKind,
        source: &ByteSource,
        bits: u32,
    ) -> Result<UnitCode, ComputationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        StandardUnits.compute_unit(kind, source, bits)
    }
}

/// Optional collaborator URLs for a test app
#[derive(Default)]
pub struct Collaborators {
    pub registry: Option<String>,
    pub storage: Option<String>,
    pub notify: Option<String>,
}

/// Build app state around the given unit computer and collaborators
pub fn test_state(
    units: Arc<dyn UnitComputer>,
    collaborators: Collaborators,
    thumbnail_dir: &std::path::Path,
) -> AppState {
    let timeout = Duration::from_secs(5);
    let pool = UnitPool::new(units, 3, UnitBits::default());

    let registry = collaborators
        .registry
        .map(|url| RegistryClient::new(url, timeout).unwrap());
    let storage = collaborators
        .storage
        .map(|url| StorageClient::new(url, timeout).unwrap());
    let notifier = collaborators
        .notify
        .map(|url| NotificationClient::new(url, timeout).unwrap());

    let persistence = PersistencePipeline::new(ThumbnailWriter::new(thumbnail_dir), storage, notifier);
    AppState::new(AssetProcessor::new(
        pool,
        registry,
        persistence,
        Duration::from_secs(30),
    ))
}

/// Wait for every detached persistence task
pub async fn drain_persistence(state: &AppState) {
    let tasks = state.processor.tasks();
    tasks.close();
    tasks.wait().await;
    tasks.reopen();
}

/// Small smooth PNG
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 128])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Multipart request for POST /v3/iscc
pub fn iscc_request(url: Option<&str>, image: Option<(&[u8], &str)>) -> Request<Body> {
    let mut body = Vec::new();
    if let Some(url) = url {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"url\"\r\n\r\n{url}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((bytes, content_type)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"upload\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/v3/iscc")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// JSON request helper
pub fn json_request(method: &str, uri: &str, value: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(value).unwrap()))
        .unwrap()
}

/// Collect a response body as JSON
pub async fn body_json(response: axum::response::Response) -> Value {
    use http_body_util::BodyExt;
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
