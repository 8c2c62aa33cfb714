//! Shared harness for driving the router in-process.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    body::{to_bytes, Body},
    extract::connect_info::MockConnectInfo,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use mapmarkers::{app, db, AppState, RateLimiter};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

pub struct TestApp {
    state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_limit(3, Duration::from_secs(60)).await
    }

    pub async fn with_limit(max_requests: usize, window: Duration) -> Self {
        let db_pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        db::migrate(&db_pool).await.unwrap();

        TestApp {
            state: AppState {
                db_pool,
                limiter: Arc::new(RateLimiter::in_memory(max_requests, window)),
            },
        }
    }

    fn router(&self, client: SocketAddr) -> Router {
        app(self.state.clone()).layer(MockConnectInfo(client))
    }

    pub async fn send_from(
        &self,
        client: SocketAddr,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.router(client).oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice::<Value>(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, headers, body)
    }

    pub async fn request_from(
        &self,
        client: SocketAddr,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, _, body) = self.send_from(client, method, uri, body).await;
        (status, body)
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.request_from(client(1), method, uri, body).await
    }

    pub async fn preflight(&self, uri: &str) -> (StatusCode, HeaderMap) {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri(uri)
            .header(header::ORIGIN, "https://maps.example.org")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = self.router(client(1)).oneshot(request).await.unwrap();
        (response.status(), response.headers().clone())
    }

    /// Creates a room from a fresh client address so setup never eats a test's quota.
    pub async fn create_room(&self, room: Value) -> Value {
        let (status, body) = self
            .request_from(client(200), Method::POST, "/rooms", Some(room))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    pub async fn create_marker_from(&self, client: SocketAddr, lat: f64, lng: f64, room_id: &str) -> Value {
        let (status, body) = self
            .request_from(client, Method::POST, "/markers", Some(marker(lat, lng, room_id)))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }
}

pub fn client(n: u8) -> SocketAddr {
    SocketAddr::from(([10, 0, 0, n], 40000))
}

pub fn room(id: &str) -> Value {
    json!({
        "id": id,
        "title": "Street art",
        "defaultLocation": "48.8566,2.3522",
        "zoom": 13,
        "extraFieldsAllowed": true,
        "predefinedFields": ["artist", "year"],
        "mandatoryFields": ["artist"],
        "expiresOn": "2030-06-01T12:00:00Z"
    })
}

pub fn marker(lat: f64, lng: f64, room_id: &str) -> Value {
    json!({
        "lat": lat,
        "lng": lng,
        "data": { "artist": "unknown", "year": 2019 },
        "room_id": room_id
    })
}
