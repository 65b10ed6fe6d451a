//! Finished-game history, served from the database.

use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use sqlx::SqlitePool;

use crate::db::games;
use crate::error::AppError;

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /game-history
pub async fn game_history(
    Extension(pool): Extension<SqlitePool>,
    Query(q): Query<HistoryQuery>,
) -> Result<Json<JsonValue>, AppError> {
    let limit = q.limit.unwrap_or(50).clamp(1, 500);
    let offset = q.offset.unwrap_or(0).max(0);

    let games_list = games::list_finished_games(&pool, limit, offset).await?;
    let total = games::count_finished_games(&pool).await?;

    Ok(Json(json!({
        "games": games_list,
        "total": total,
        "limit": limit,
        "offset": offset,
    })))
}

/// GET /game/{game_id}
pub async fn get_game(
    Extension(pool): Extension<SqlitePool>,
    Path(game_id): Path<i64>,
) -> Result<Json<JsonValue>, AppError> {
    let game = games::get_game(&pool, game_id)
        .await?
        .ok_or(AppError::GameNotFound(game_id))?;
    let moves = games::get_game_moves(&pool, game_id).await?;

    Ok(Json(json!({
        "game": game,
        "moves": moves,
    })))
}
