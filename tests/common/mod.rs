#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use bot_console::{build_router, AppConfig, ConsoleStore, DashboardState};
use bot_console::logger::AuditLog;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub state: Arc<DashboardState>,
    _logs: TempDir,
}

/// Seeded console with short background delays and a throwaway log dir.
pub fn test_app() -> TestApp {
    let logs = tempfile::tempdir().unwrap();
    let config = AppConfig {
        log_dir: logs.path().to_string_lossy().into_owned(),
        ingestion_delay_ms: 20,
        reindex_delay_ms: 20,
        voice_capture_delay_ms: 20,
        ..AppConfig::default()
    };
    let audit = AuditLog::new(&config.log_dir).unwrap();
    let state = DashboardState::new(config, ConsoleStore::seeded(), audit);
    TestApp {
        router: build_router(Arc::clone(&state)),
        state,
        _logs: logs,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> TestResponse {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let location = resp
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        TestResponse {
            status,
            location,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn json_request(
        &self,
        method: &str,
        uri: &str,
        body: serde_json::Value,
    ) -> TestResponse {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(req).await
    }

    pub async fn form(&self, uri: &str, body: &str) -> TestResponse {
        let req = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(req).await
    }
}
