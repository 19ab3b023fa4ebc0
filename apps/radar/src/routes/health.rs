use axum::Json;
use serde_json::{json, Value};

/// GET /health
/// Returns a simple status object with the service name and version.
pub async fn health_handler(service: &'static str) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": service
    }))
}
