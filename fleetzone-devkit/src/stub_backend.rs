/*!
Programmable stub of the FleetZone REST API.

Lets console code run its full poll cycle against an in-process server: each
route serves whatever JSON body (or bare error status) the test scripted
last. Unknown routes answer 404 like the real backend.
*/

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub enum StubReply {
    Json(serde_json::Value),
    Status(u16),
}

#[derive(Clone)]
pub struct StubBackend {
    base_url: String,
    routes: Arc<Mutex<HashMap<String, StubReply>>>,
}

impl StubBackend {
    /// Binds an ephemeral port and starts serving. Routes start with empty
    /// but well-formed bodies so a freshly started stub behaves like an idle
    /// backend.
    pub async fn start() -> Result<Self> {
        env_logger::try_init().ok();

        let mut routes = HashMap::new();
        routes.insert(
            "/metrics".to_string(),
            StubReply::Json(json!({
                "total_events": 0,
                "unique_motos": 0,
                "avg_fps_last_60": 0.0,
                "avg_detection_rate": 0.0,
                "unique_classes": 0,
                "active_alerts": 0
            })),
        );
        routes.insert("/alerts".to_string(), StubReply::Json(json!([])));
        routes.insert("/iot/devices".to_string(), StubReply::Json(json!([])));
        let routes = Arc::new(Mutex::new(routes));

        let app = Router::new().fallback({
            let routes = routes.clone();
            move |req: Request| {
                let routes = routes.clone();
                async move { respond(&routes, req.uri().path()) }
            }
        });

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                log::error!("stub backend stopped: {e}");
            }
        });

        let base_url = format!("http://{addr}");
        log::info!("stub backend listening on {base_url}");
        Ok(Self { base_url, routes })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Scripts a JSON body for a route.
    pub fn set_json(&self, route: &str, body: serde_json::Value) {
        self.routes
            .lock()
            .unwrap()
            .insert(route.to_string(), StubReply::Json(body));
    }

    /// Scripts a bare error status for a route.
    pub fn set_status(&self, route: &str, status: u16) {
        self.routes
            .lock()
            .unwrap()
            .insert(route.to_string(), StubReply::Status(status));
    }
}

fn respond(routes: &Arc<Mutex<HashMap<String, StubReply>>>, path: &str) -> Response {
    let reply = routes.lock().unwrap().get(path).cloned();
    match reply {
        Some(StubReply::Json(body)) => (StatusCode::OK, Json(body)).into_response(),
        Some(StubReply::Status(code)) => StatusCode::from_u16(code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn routes_serve_the_last_scripted_reply() {
        let stub = StubBackend::start().await.unwrap();
        stub.set_json("/metrics", json!({ "total_events": 7 }));

        let body = reqwest_free_get(stub.base_url(), "/metrics").await;
        assert!(body.contains("\"total_events\":7"));

        stub.set_status("/metrics", 500);
        let status = reqwest_free_status(stub.base_url(), "/metrics").await;
        assert_eq!(status, 500);

        let status = reqwest_free_status(stub.base_url(), "/nope").await;
        assert_eq!(status, 404);
    }

    // Plain TcpStream HTTP/1.1 client; keeps the devkit free of an HTTP
    // client dependency it only needs for its own smoke test.
    async fn reqwest_free_get(base: &str, route: &str) -> String {
        let (status, body) = raw_get(base, route).await;
        assert_eq!(status, 200);
        body
    }

    async fn reqwest_free_status(base: &str, route: &str) -> u16 {
        raw_get(base, route).await.0
    }

    async fn raw_get(base: &str, route: &str) -> (u16, String) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        let addr = base.trim_start_matches("http://");
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {route} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await.unwrap();
        let text = String::from_utf8_lossy(&raw).to_string();
        let status: u16 = text
            .split_whitespace()
            .nth(1)
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let body = text
            .split_once("\r\n\r\n")
            .map(|(_, b)| b.to_string())
            .unwrap_or_default();
        (status, body)
    }
}
