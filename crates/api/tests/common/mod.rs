#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use folio_api::auth::jwt::{generate_access_token, JwtConfig};
use folio_api::auth::password::hash_password;
use folio_api::config::{AdminCredentials, ServerConfig, StorageConfig};
use folio_api::router::build_app_router;
use folio_api::state::AppState;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct-horse-battery-staple";

/// Argon2 hashing is slow on purpose; hash the admin password once per binary.
fn admin_password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(ADMIN_PASSWORD).expect("hashing should succeed"))
        .clone()
}

/// Build a test `ServerConfig` whose storage lives under `root`.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config(root: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        max_upload_bytes: 10 * 1024 * 1024,
        storage: StorageConfig {
            portfolio_path: root.join("portfolio.json"),
            images_dir: root.join("images"),
            upload_temp_dir: root.join("staging"),
        },
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 10,
        },
        admin: AdminCredentials {
            username: ADMIN_USERNAME.to_string(),
            password_hash: admin_password_hash(),
        },
    }
}

/// A running application over a private temporary directory.
///
/// `app` is cheap to clone; every clone shares the same state and files.
pub struct TestApp {
    pub app: Router,
    pub config: ServerConfig,
    root: TempDir,
}

impl TestApp {
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn images_dir(&self) -> PathBuf {
        self.config.storage.images_dir.clone()
    }

    pub fn project_dir(&self, project_id: &str) -> PathBuf {
        self.images_dir().join("projects").join(project_id)
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.config.storage.upload_temp_dir.clone()
    }

    /// Names of the files currently in a project's image directory, sorted.
    pub fn project_files(&self, project_id: &str) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(self.project_dir(project_id)) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Number of files left in the upload staging directory.
    pub fn staged_file_count(&self) -> usize {
        std::fs::read_dir(self.staging_dir())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    /// A valid access token for the configured admin.
    pub fn admin_token(&self) -> String {
        generate_access_token(ADMIN_USERNAME, &self.config.jwt)
            .expect("token generation should succeed")
    }

    pub fn write_portfolio(&self, json: &serde_json::Value) {
        std::fs::write(
            &self.config.storage.portfolio_path,
            serde_json::to_vec_pretty(json).unwrap(),
        )
        .unwrap();
    }

    pub fn read_portfolio(&self) -> serde_json::Value {
        let raw = std::fs::read(&self.config.storage.portfolio_path).unwrap();
        serde_json::from_slice(&raw).unwrap()
    }
}

/// Build the full application router with all middleware layers over a
/// fresh temporary directory.
///
/// Uses the production [`build_app_router`] so integration tests exercise
/// the same middleware stack (CORS, request ID, timeout, tracing, panic
/// recovery, body limit) that production uses.
pub fn build_test_app() -> TestApp {
    let root = tempfile::tempdir().expect("tempdir should be created");
    let config = test_config(root.path());
    let state = AppState::new(config.clone());
    let app = build_app_router(state, &config);
    TestApp { app, config, root }
}

// ---------------------------------------------------------------------------
// Multipart bodies
// ---------------------------------------------------------------------------

const BOUNDARY: &str = "----folio-test-boundary";

/// Hand-built `multipart/form-data` body.
#[derive(Default)]
pub struct MultipartBody {
    bytes: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, contents: &[u8]) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        self.bytes.extend_from_slice(contents);
        self.bytes.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> Vec<u8> {
        self.bytes
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.bytes
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Collect a response body into JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}

/// Collect a response body into raw bytes.
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes()
        .to_vec()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a multipart request. `token` of `None` sends no `Authorization` header.
pub async fn send_multipart(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: MultipartBody,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = builder.body(Body::from(body.finish())).unwrap();
    app.oneshot(request).await.unwrap()
}
