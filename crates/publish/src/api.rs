//! Results API
//!
//! - `GET /results?undervalued_only=&min_mos=` latest snapshot, 404 before the first run
//! - `GET /stream` WebSocket pushing every new snapshot
//! - `GET /health`

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use server::{health_routes, HealthState};

use crate::snapshot::Snapshot;
use crate::store::SnapshotStore;

#[derive(Debug, Default, Deserialize)]
pub struct ResultsQuery {
    #[serde(default)]
    pub undervalued_only: bool,
    pub min_mos: Option<f64>,
}

pub fn results_router(store: Arc<SnapshotStore>, health: Arc<HealthState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/results", get(results_handler))
        .route("/stream", get(stream_handler))
        .with_state(store)
        .merge(health_routes(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn results_handler(
    State(store): State<Arc<SnapshotStore>>,
    Query(query): Query<ResultsQuery>,
) -> Response {
    match store.latest() {
        Some(snapshot) => Json(snapshot.filtered(query.undervalued_only, query.min_mos)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "no results yet" })),
        )
            .into_response(),
    }
}

async fn stream_handler(ws: WebSocketUpgrade, State(store): State<Arc<SnapshotStore>>) -> Response {
    ws.on_upgrade(move |socket| handle_stream(socket, store))
}

async fn send_snapshot(socket: &mut WebSocket, snapshot: &Snapshot) -> bool {
    match serde_json::to_string(snapshot) {
        Ok(json) => socket.send(Message::Text(json)).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "Failed to encode snapshot");
            true
        }
    }
}

async fn handle_stream(mut socket: WebSocket, store: Arc<SnapshotStore>) {
    info!("Stream client connected");

    let mut rx = store.subscribe();

    if let Some(latest) = store.latest() {
        if !send_snapshot(&mut socket, &latest).await {
            return;
        }
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(snapshot) => {
                        if !send_snapshot(&mut socket, &snapshot).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        debug!(skipped = n, "Stream client lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!(error = %e, "Stream socket error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    info!("Stream client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::fixtures::{record, snapshot};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use futures::StreamExt;
    use tower::ServiceExt;

    fn router() -> (Arc<SnapshotStore>, Router) {
        let store = Arc::new(SnapshotStore::new());
        let health = Arc::new(HealthState::new("fairval"));
        (store.clone(), results_router(store, health))
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_results_404_before_first_snapshot() {
        let (_, router) = router();
        let (status, body) = get_json(router, "/results").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "no results yet");
    }

    #[tokio::test]
    async fn test_results_filters() {
        let (store, router) = router();
        store.publish(snapshot(vec![
            record("AAA", Some(50.0), 100.0),
            record("BBB", Some(90.0), 100.0),
        ]));

        let (status, body) = get_json(router.clone(), "/results").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["records"].as_array().unwrap().len(), 2);
        assert_eq!(body["schema_version"], 1);

        let (_, body) = get_json(router.clone(), "/results?undervalued_only=true").await;
        assert_eq!(body["records"].as_array().unwrap().len(), 1);

        let (_, body) = get_json(router, "/results?min_mos=0.6").await;
        assert!(body["records"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_health_is_merged() {
        let (_, router) = router();
        let (status, body) = get_json(router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_stream_pushes_latest_then_updates() {
        let (store, router) = router();
        store.publish(snapshot(Vec::new()));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/stream", addr))
            .await
            .unwrap();

        let first = ws.next().await.unwrap().unwrap();
        let first: Snapshot = serde_json::from_str(first.to_text().unwrap()).unwrap();
        assert!(first.records.is_empty());

        store.publish(snapshot(vec![record("AAPL", Some(1.0), 2.0)]));
        let second = ws.next().await.unwrap().unwrap();
        let second: Snapshot = serde_json::from_str(second.to_text().unwrap()).unwrap();
        assert_eq!(second.records.len(), 1);
    }
}
