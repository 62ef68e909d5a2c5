#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use navauth::auth::issue_token;
use navauth::server::{AppState, create_router};
use navauth::store::{SqliteStore, Store};

/// A router over a fresh database in a temp dir, driven in-process.
pub struct TestApp {
    pub temp_dir: TempDir,
    pub store: Arc<dyn Store>,
    pub admin_token: String,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store = SqliteStore::new(temp_dir.path().join("navauth.db")).expect("open store");
        store.initialize().expect("initialize store");
        let store: Arc<dyn Store> = Arc::new(store);

        let (_, admin_token) = issue_token(store.as_ref(), None, None).expect("issue admin token");
        let router = create_router(Arc::new(AppState::new(store.clone())));

        Self {
            temp_dir,
            store,
            admin_token,
            router,
        }
    }

    pub async fn request(
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
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("build request"))
            .await
            .expect("send request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::String(
                String::from_utf8_lossy(&bytes).into_owned(),
            ))
        };

        (status, json)
    }

    pub async fn admin(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let token = self.admin_token.clone();
        self.request(method, uri, Some(&token), body).await
    }

    /// POSTs as admin, asserts 201 and returns `data.id`.
    pub async fn create(&self, uri: &str, body: Value) -> String {
        let (status, json) = self.admin(Method::POST, uri, Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "POST {uri}: {json}");
        json["data"]["id"].as_str().expect("created id").to_string()
    }

    pub async fn role_token(&self, role_id: &str) -> String {
        let (status, json) = self
            .admin(
                Method::POST,
                &format!("/api/v1/admin/roles/{role_id}/tokens"),
                Some(serde_json::json!({})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "issue role token: {json}");
        json["data"]["token"].as_str().expect("raw token").to_string()
    }
}
