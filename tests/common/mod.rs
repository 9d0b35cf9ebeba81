#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use chrono::Duration;
use serde_json::Value;
use tower::ServiceExt;

use shipway::auth::session;
use shipway::config::ServerConfig;
use shipway::error::Result;
use shipway::mail::{Envelope, MailConfig, Mailer, Transport};
use shipway::server::{AppState, create_router};
use shipway::store::{MemoryStore, SqliteStore, Store};
use tempfile::TempDir;

#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<Envelope>>,
}

impl Transport for RecordingTransport {
    fn deliver(&self, _config: &MailConfig, envelope: &Envelope) -> Result<()> {
        self.sent.lock().unwrap().push(envelope.clone());
        Ok(())
    }
}

pub struct TestApp {
    pub store: Arc<dyn Store>,
    pub outbox: Arc<RecordingTransport>,
    router: Router,
    _temp_dir: Option<TempDir>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), None)
    }

    /// Same router backed by a SQLite file in a fresh temp directory.
    pub fn sqlite() -> Self {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("shipway.db")).unwrap();
        store.initialize().unwrap();
        Self::with_store(Arc::new(store), Some(temp))
    }

    fn with_store(store: Arc<dyn Store>, temp_dir: Option<TempDir>) -> Self {
        let outbox = Arc::new(RecordingTransport::default());
        let mail = MailConfig {
            smtp: "smtp.example.com".to_string(),
            port: 587,
            user: "deploy-bot@example.com".to_string(),
            pass: String::new(),
            notify: vec!["release@example.com".to_string()],
        };
        let state = Arc::new(AppState {
            store: store.clone(),
            config: ServerConfig::default(),
            mailer: Some(Arc::new(Mailer::new(mail, outbox.clone()))),
        });
        Self {
            store,
            outbox,
            router: create_router(state),
            _temp_dir: temp_dir,
        }
    }

    /// Issues a fresh one-hour token for `user_id`.
    pub fn token_for(&self, user_id: i64) -> String {
        session::issue(self.store.as_ref(), user_id, Duration::hours(1))
            .unwrap()
            .token
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    /// Creates a space owned by the token's user and returns its id.
    pub async fn create_space(&self, token: &str, name: &str) -> i64 {
        let (status, body) = self
            .post("/api/v1/spaces", token, serde_json::json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_i64().unwrap()
    }

    pub async fn create_project(&self, token: &str, space_id: i64, name: &str) -> i64 {
        let (status, body) = self
            .post(
                "/api/v1/projects",
                token,
                serde_json::json!({ "space_id": space_id, "name": name }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_i64().unwrap()
    }

    pub async fn create_apply(&self, token: &str, project_id: i64, name: &str) -> i64 {
        let (status, body) = self
            .post(
                "/api/v1/applies",
                token,
                serde_json::json!({
                    "project_id": project_id,
                    "name": name,
                    "description": "release",
                    "repo_data": {
                        "repo_url": "git@example.com:acme/web.git",
                        "repo_mode": "tag",
                        "repo_tag": "v1.0.0",
                        "repo_commit": "9f1c2ab"
                    }
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_i64().unwrap()
    }
}
