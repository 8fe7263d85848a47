//! Web server for the price tracker UI
//!
//! Provides REST API endpoints for managing tracked items and a small
//! embedded single-page UI.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, Json},
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::database::PriceItem;
use crate::error::TrackerError;
use crate::notify::DropLog;
use crate::tracker::{DropEvent, PriceTracker, RefreshOutcome};

/// Shared application state
#[derive(Clone)]
struct AppState {
    tracker: PriceTracker,
    drops: Arc<Mutex<DropLog>>,
}

/// API response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn fail(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

#[derive(Deserialize)]
struct AddRequest {
    url: String,
}

#[derive(Deserialize)]
struct NotifyRequest {
    enabled: bool,
}

/// GET / - Serve the web UI (single HTML page)
async fn index_handler() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

/// GET /api/items - current item list, newest first
async fn list_handler(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<PriceItem>>>, StatusCode> {
    // Read off the observation stream; it always carries the latest snapshot.
    let items = state.tracker.subscribe().borrow().clone();
    Ok(Json(ApiResponse::ok(items)))
}

/// POST /api/items {url} - start tracking a product page
async fn add_handler(
    State(state): State<AppState>,
    Json(request): Json<AddRequest>,
) -> Result<Json<ApiResponse<i64>>, StatusCode> {
    match state.tracker.add_item(&request.url).await {
        Ok(id) => Ok(Json(ApiResponse::ok(id))),
        Err(e @ TrackerError::Capacity(_)) => Ok(Json(ApiResponse::fail(e.to_string()))),
        Err(e) => {
            log::error!("Add item failed: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// DELETE /api/items/{id}
async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, StatusCode> {
    match state.tracker.delete_item(id) {
        Ok(()) => Ok(Json(ApiResponse::ok(()))),
        Err(e) => {
            log::error!("Delete item {} failed: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// PUT /api/items/{id}/notify {enabled}
async fn notify_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<NotifyRequest>,
) -> Result<Json<ApiResponse<()>>, StatusCode> {
    match state.tracker.update_notify(id, request.enabled) {
        Ok(()) => Ok(Json(ApiResponse::ok(()))),
        Err(e) => {
            log::error!("Toggle notify for item {} failed: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// POST /api/refresh - run one refresh cycle now
async fn refresh_handler(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<RefreshOutcome>>, StatusCode> {
    match state.tracker.refresh_all().await {
        Ok(outcome) => {
            state
                .drops
                .lock()
                .unwrap()
                .record_all(outcome.drop_events.iter().cloned());
            Ok(Json(ApiResponse::ok(outcome)))
        }
        Err(e) => {
            log::error!("Refresh failed: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /api/drops - delivered drop events, newest first
async fn drops_handler(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<DropEvent>>>, StatusCode> {
    let events = state.drops.lock().unwrap().recent().to_vec();
    Ok(Json(ApiResponse::ok(events)))
}

/// Build the web server router
pub fn create_router(tracker: PriceTracker, drops: Arc<Mutex<DropLog>>) -> Router {
    let state = AppState { tracker, drops };

    Router::new()
        .route("/", get(index_handler))
        .route("/api/items", get(list_handler).post(add_handler))
        .route("/api/items/{id}", delete(delete_handler))
        .route("/api/items/{id}/notify", put(notify_handler))
        .route("/api/refresh", post(refresh_handler))
        .route("/api/drops", get(drops_handler))
        .with_state(state)
}

/// Start the web server (async)
pub async fn serve(
    tracker: PriceTracker,
    drops: Arc<Mutex<DropLog>>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(tracker, drops);
    let addr = format!("0.0.0.0:{}", port);

    log::info!("Web UI listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::init_schema;
    use crate::fetch::PriceClient;
    use rusqlite::Connection;
    use tempfile::TempDir;

    fn test_tracker() -> (PriceTracker, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let conn = Connection::open(&db_path).unwrap();
        init_schema(&conn).unwrap();
        let tracker = PriceTracker::new(
            Arc::new(Mutex::new(conn)),
            PriceClient::with_api("http://127.0.0.1:0", None),
            12,
        );
        (tracker, temp_dir)
    }

    #[test]
    fn test_create_router() {
        let (tracker, _temp_dir) = test_tracker();
        let drops = Arc::new(Mutex::new(DropLog::new()));

        let _router = create_router(tracker, drops);
        // If we got here without panicking, the router was created successfully
    }

    #[test]
    fn test_api_response_serialization() {
        let response: ApiResponse<Vec<i32>> = ApiResponse::ok(vec![1, 2, 3]);

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"data\":[1,2,3]"));
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn test_api_response_error_serialization() {
        let response: ApiResponse<()> = ApiResponse::fail("Max 12 items reached.".to_string());

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"success\":false"));
        assert!(json.contains("\"error\":\"Max 12 items reached.\""));
        assert!(!json.contains("\"data\""));
    }
}
