#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use std::{
    fs,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};
use tower::ServiceExt;

use gatehouse::{AppState, config::Config};

pub const TEST_JWT_SECRET: &str = "test-signing-secret";
pub const TEST_ADMIN_KEY: &str = "test-admin-key";

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    db_path: PathBuf,
}

impl TestApp {
    /// Remove the temp database. Call at the end of a test.
    pub fn cleanup(self) {
        drop(self.app);
        drop(self.state);
        for suffix in ["", "-wal", "-shm"] {
            let mut p = self.db_path.clone().into_os_string();
            p.push(suffix);
            let _ = fs::remove_file(PathBuf::from(p));
        }
    }
}

/// Fresh app over a throwaway file-backed SQLite database. File-backed so
/// every pooled connection sees the same data.
pub async fn spawn_app() -> TestApp {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let mut db_path = std::env::temp_dir();
    db_path.push(format!(
        "gatehouse-test-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));

    let database_url = format!("sqlite:{}", db_path.display());
    let pool = gatehouse::db::connect(&database_url)
        .await
        .expect("failed to open test database");

    let mut cfg = Config::default();
    cfg.database_url = database_url;
    cfg.jwt_secret = TEST_JWT_SECRET.to_string();
    cfg.admin_key = TEST_ADMIN_KEY.to_string();

    let state = AppState::new(pool, &cfg);
    let app = gatehouse::gatehouse_router(state.clone());
    TestApp {
        app,
        state,
        db_path,
    }
}

pub async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    headers: &[(&str, &str)],
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (k, v) in headers {
        builder = builder.header(*k, *v);
    }
    let req = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("failed to build request");

    let resp = app.clone().oneshot(req).await.expect("request failed");
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

pub async fn register(app: &Router, email: &str, password: &str, name: &str) -> (StatusCode, Value) {
    request(
        app,
        "POST",
        "/auth/register",
        &[],
        Some(json!({ "email": email, "password": password, "full_name": name })),
    )
    .await
}

pub async fn login(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    request(
        app,
        "POST",
        "/auth/login",
        &[],
        Some(json!({ "email": email, "password": password })),
    )
    .await
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or("")
}
