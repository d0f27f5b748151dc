#![allow(dead_code)]

use anpr_badge::{
    BadgeError, BadgeImage, BadgeRenderer, BadgeSpec, EntityIdentifier, RawRegistryRecord,
    RegistryClient,
};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const REGISTRY_BASE: &str = "http://registry.test/api/comune/";

/// In-memory registry: known codes answer their payload, unknown codes answer `{"data": []}`
pub struct StubRegistry {
    payloads: HashMap<String, Value>,
    unreachable: bool,
    calls: Arc<AtomicUsize>,
}

impl StubRegistry {
    pub fn new() -> Self {
        StubRegistry {
            payloads: HashMap::new(),
            unreachable: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn unreachable() -> Self {
        StubRegistry {
            unreachable: true,
            ..StubRegistry::new()
        }
    }

    pub fn with(mut self, code: &str, payload: Value) -> Self {
        self.payloads.insert(code.to_string(), payload);
        self
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl RegistryClient for StubRegistry {
    async fn fetch(&self, identifier: &EntityIdentifier) -> Result<RawRegistryRecord, BadgeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            return Err(BadgeError::Upstream {
                url: self.url_for(identifier),
                reason: "connection failed".to_string(),
            });
        }
        let payload = self
            .payloads
            .get(identifier.as_str())
            .cloned()
            .unwrap_or_else(|| json!({ "data": [] }));
        Ok(RawRegistryRecord::from_json(payload).expect("stub payload"))
    }

    fn url_for(&self, identifier: &EntityIdentifier) -> String {
        format!("{}{}", REGISTRY_BASE, identifier)
    }
}

pub struct FailingRenderer;

impl BadgeRenderer for FailingRenderer {
    fn render(&self, _: &BadgeSpec) -> Result<BadgeImage, BadgeError> {
        Err(BadgeError::Render("font cache unavailable".to_string()))
    }
}

pub fn bergamo_payload() -> Value {
    json!({
        "result": "ok",
        "error": "",
        "data": [{
            "CodiceIstat": "016024",
            "Name": "BERGAMO",
            "DataSubentro": "2018-05-17T00:00:00Z",
            "DataAbilitazione": "2017-11-08T00:00:00Z",
            "DataPresubentro": "2018-05-08T00:00:00Z"
        }]
    })
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub async fn read_body(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body")
        .to_vec()
}

pub async fn read_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&read_body(response).await).expect("json body")
}
