// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Service descriptor and liveness. Nothing here touches user data.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - describe the service and its route groups
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "API Tester",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Saved HTTP request collections and run history",
            "endpoints": {
                "health": "/health (public)",
                "collections": "/api/collections[/:id[/requests]] (protected)",
                "requests": "/api/requests[/:id[/duplicate]] (protected)",
                "runs": "/api/requests/:id/runs, /api/runs[/:id] (protected)",
            }
        }
    }))
}

/// GET /health - store connectivity
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store().health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
