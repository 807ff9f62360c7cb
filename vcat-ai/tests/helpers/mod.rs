//! Shared test utilities for vcat-ai integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::util::ServiceExt;
use vcat_ai::db::Store;
use vcat_ai::error::ClassificationError;
use vcat_ai::services::{BatchRunner, BatchSettings, Classifier};
use vcat_ai::AppState;
use vcat_common::config::TomlConfig;
use vcat_common::Category;

pub const BOUNDARY: &str = "vcat-test-boundary";

/// Classifier that answers from a script, one entry per call
///
/// `None` in the script produces an off-list answer. When the script runs
/// out every call fails with a network error.
pub struct ScriptedClassifier {
    script: Mutex<VecDeque<Option<Category>>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, String)>>,
}

impl ScriptedClassifier {
    pub fn new(script: Vec<Option<Category>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// (vendor_name, description) pairs in call order
    pub fn seen(&self) -> Vec<(String, String)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn classify(
        &self,
        vendor_name: &str,
        description: &str,
    ) -> Result<Category, ClassificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((vendor_name.to_string(), description.to_string()));

        match self.script.lock().unwrap().pop_front() {
            Some(Some(category)) => Ok(category),
            Some(None) => Err(ClassificationError::InvalidCategory("Stationery".into())),
            None => Err(ClassificationError::Network {
                provider: "scripted".into(),
                message: "script exhausted".into(),
            }),
        }
    }
}

pub fn test_settings() -> BatchSettings {
    BatchSettings {
        call_interval: Duration::ZERO,
        call_timeout: Duration::from_secs(5),
        use_cache: true,
    }
}

/// Router over an in-memory store and the given classifier
pub async fn create_test_app(
    classifier: Arc<ScriptedClassifier>,
    settings: BatchSettings,
) -> (Router, Store) {
    let store = Store::in_memory().await.expect("in-memory store");
    let router = create_test_app_with(classifier, settings, store.clone(), TomlConfig::default());
    (router, store)
}

/// Router over an explicit store and bootstrap configuration
pub fn create_test_app_with(
    classifier: Arc<dyn Classifier>,
    settings: BatchSettings,
    store: Store,
    toml_config: TomlConfig,
) -> Router {
    let runner = BatchRunner::new(classifier, store.clone(), settings);
    let state = AppState::new(store, runner).with_toml(toml_config, None);
    vcat_ai::build_router(state)
}

/// Multipart body with a single `file` field
pub fn multipart_body(filename: &str, content: &str) -> String {
    format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\nContent-Type: text/csv\r\n\r\n{c}\r\n--{b}--\r\n",
        b = BOUNDARY,
        f = filename,
        c = content
    )
}

pub fn upload_request(filename: &str, content: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(filename, content)))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Send one request and decode the JSON response
pub async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

/// Send one request and return the body as text
pub async fn send_text(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}
