#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use nursery_api::auth::{PasswordHasher, TokenService};
use nursery_api::config::AppConfig;
use nursery_api::database::MemoryStore;
use nursery_api::storage::{BlobStore, MemoryBlobStore};
use nursery_api::{app, AppState};

pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const PASSWORD: &str = "pw123456";

const BOUNDARY: &str = "nursery-test-boundary";
const BODY_LIMIT: usize = 16 * 1024 * 1024;

/// The real router over in-memory stores.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub tokens: Arc<TokenService>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(AppConfig::local(TEST_SECRET), true)
    }

    /// Documents are kept as metadata only.
    pub fn without_blobs() -> Self {
        Self::build(AppConfig::local(TEST_SECRET), false)
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self::build(config, true)
    }

    fn build(config: AppConfig, with_blobs: bool) -> Self {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let blob_backend: Option<Arc<dyn BlobStore>> = if with_blobs { Some(blobs.clone()) } else { None };

        // Cheap key derivation keeps the suite fast; the format is unchanged.
        let state = AppState::new(config, store.clone(), blob_backend, PasswordHasher::with_iterations(1_000));
        let tokens = state.tokens.clone();

        Self {
            router: app(state),
            store,
            blobs,
            tokens,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Result<TestResponse> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), BODY_LIMIT).await?;
        Ok(TestResponse { status, headers, body })
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<TestResponse> {
        self.send(request(Method::GET, path, token).body(Body::empty())?).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> Result<TestResponse> {
        self.send(request(Method::DELETE, path, token).body(Body::empty())?).await
    }

    pub async fn post_json(&self, path: &str, token: Option<&str>, body: &Value) -> Result<TestResponse> {
        self.send_json(Method::POST, path, token, body).await
    }

    pub async fn put_json(&self, path: &str, token: Option<&str>, body: &Value) -> Result<TestResponse> {
        self.send_json(Method::PUT, path, token, body).await
    }

    pub async fn send_json(&self, method: Method, path: &str, token: Option<&str>, body: &Value) -> Result<TestResponse> {
        let request = request(method, path, token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(body)?))?;
        self.send(request).await
    }

    /// Register an account and return its token and user id.
    pub async fn register(&self, email: &str) -> Result<(String, Uuid)> {
        let res = self
            .post_json(
                "/api/auth/register",
                None,
                &serde_json::json!({ "email": email, "password": PASSWORD }),
            )
            .await?;
        anyhow::ensure!(res.status == StatusCode::CREATED, "register failed: {}", res.text());

        let body = res.json()?;
        let token = body["data"]["token"].as_str().context("token missing")?.to_string();
        let user_id = body["data"]["user"]["id"].as_str().context("user id missing")?.parse()?;
        Ok((token, user_id))
    }

    /// The caller's baby id, provisioning it if needed.
    pub async fn baby_id(&self, token: &str) -> Result<Uuid> {
        let res = self.get("/api/baby", Some(token)).await?;
        anyhow::ensure!(res.status == StatusCode::OK, "baby fetch failed: {}", res.text());
        Ok(res.json()?["data"]["id"].as_str().context("baby id missing")?.parse()?)
    }

    pub async fn upload(&self, token: &str, form: &UploadForm<'_>) -> Result<TestResponse> {
        let request = request(Method::POST, "/api/documents", Some(token))
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(form.encode()))?;
        self.send(request).await
    }
}

fn request(method: Method, path: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder()
        .method(method)
        .uri(path)
        .header(header::ORIGIN, "http://localhost:5173");
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Result<Value> {
        serde_json::from_slice(&self.body).with_context(|| format!("not JSON: {}", self.text()))
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// A multipart document upload. `None` fields are left out of the body.
pub struct UploadForm<'a> {
    pub baby_id: Option<String>,
    pub title: Option<&'a str>,
    pub kind: Option<&'a str>,
    pub file: Option<(&'a str, &'a str, &'a [u8])>,
}

impl<'a> UploadForm<'a> {
    pub fn new(baby_id: Uuid, title: &'a str, bytes: &'a [u8]) -> Self {
        Self {
            baby_id: Some(baby_id.to_string()),
            title: Some(title),
            kind: Some("medical"),
            file: Some(("report.pdf", "application/pdf", bytes)),
        }
    }

    fn encode(&self) -> Vec<u8> {
        let mut body = Vec::new();
        let text_fields = [
            ("babyId", self.baby_id.as_deref()),
            ("title", self.title),
            ("type", self.kind),
        ];
        for (name, value) in text_fields {
            if let Some(value) = value {
                body.extend_from_slice(
                    format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
        }
        if let Some((file_name, content_type, bytes)) = self.file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }
}
