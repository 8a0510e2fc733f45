//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use filehub_api::{AppState, Stores, build_app};
use filehub_auth::JwtEncoder;
use filehub_core::config::AppConfig;
use filehub_database::MemoryDatabase;
use filehub_entity::user::UpsertUser;
use filehub_storage::{BlobStore, LocalStorageProvider};

const TEST_CONFIG: &str = r#"
[database]
url = "postgres://unused/filehub"

[auth]
jwt_secret = "integration-test-secret"

[storage]
max_files_per_request = 3
max_request_bytes = 4096

[logging]
level = "warn"
format = "pretty"
"#;

const BOUNDARY: &str = "filehub-test-boundary";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// In-memory stores behind the router
    pub db: Arc<MemoryDatabase>,
    /// Application config
    pub config: AppConfig,
    encoder: JwtEncoder,
    _blob_root: TempDir,
}

impl TestApp {
    /// Create a new test application over in-memory stores and a temp blob root
    pub async fn new() -> Self {
        let config = AppConfig::from_toml(TEST_CONFIG).expect("Failed to parse test config");
        let blob_root = TempDir::new().expect("Failed to create blob root");
        let provider = LocalStorageProvider::new(blob_root.path())
            .await
            .expect("Failed to open blob root");

        let db = Arc::new(MemoryDatabase::new());
        let state = AppState::new(
            config.clone(),
            Stores::in_memory(db.clone()),
            BlobStore::new(Arc::new(provider)),
        );

        Self {
            router: build_app(state),
            encoder: JwtEncoder::new(&config.auth),
            db,
            config,
            _blob_root: blob_root,
        }
    }

    /// Mint a sign-in token for a fresh identity; returns its id and token
    pub fn sign_in(&self, email: &str) -> (Uuid, String) {
        let identity = UpsertUser {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
            first_name: None,
            last_name: None,
            profile_image_url: None,
        };
        let token = self
            .encoder
            .issue(&identity)
            .expect("Failed to issue token");
        (identity.id, token)
    }

    /// Make a JSON request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");

        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        self.send(req).await
    }

    /// Upload files as `multipart/form-data`, optionally into `parent_id`
    pub async fn upload(
        &self,
        token: &str,
        parent_id: Option<Uuid>,
        files: &[(&str, &str, &[u8])],
    ) -> TestResponse {
        let mut body = Vec::new();
        if let Some(parent_id) = parent_id {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"parentId\"\r\n\r\n{parent_id}\r\n"
                )
                .as_bytes(),
            );
        }
        for (name, mime, data) in files {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: {mime}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let req = Request::builder()
            .method("POST")
            .uri("/api/files/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::from(body))
            .expect("Failed to build request");

        self.send(req).await
    }

    /// Fetch raw bytes, e.g. a download
    pub async fn fetch(&self, path: &str, token: Option<&str>) -> (StatusCode, Bytes) {
        let mut req = Request::builder().method("GET").uri(path);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = req.body(Body::empty()).expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");
        (status, bytes)
    }

    async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// The `data` payload of a success envelope
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    /// The `id` inside the `data` payload
    pub fn id(&self) -> Uuid {
        self.data()["id"]
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .expect("Response has no id")
    }

    /// The error code of a failure envelope
    pub fn error_code(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}
