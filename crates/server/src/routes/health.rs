use std::sync::Arc;

use axum::{Extension, Json};
use serde_json::Value as JsonValue;
use sqlx::SqlitePool;

use crate::db::games;
use crate::engine::EngineSession;

/// GET /health
pub async fn health_check(
    Extension(pool): Extension<SqlitePool>,
    Extension(engine): Extension<Arc<EngineSession>>,
) -> Json<JsonValue> {
    let database = if games::ping(&pool).await { "ok" } else { "unreachable" };
    Json(serde_json::json!({
        "status": "healthy",
        "engine_available": engine.available(),
        "database": database,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
