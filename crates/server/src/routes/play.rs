//! Gameplay routes: start a game, play a move, let the engine answer.

use std::sync::Arc;

use axum::{extract::Query, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use sqlx::SqlitePool;

use chess_core::rules;

use crate::config::Config;
use crate::engine::EngineSession;
use crate::error::AppError;
use crate::game::{MoveOutcome, SessionRegistry};

#[derive(Deserialize)]
pub struct InitializeQuery {
    pub elo: Option<u32>,
    pub time: Option<f64>,
}

#[derive(Deserialize)]
pub struct PostMoveBody {
    pub game_id: i64,
    pub new_move: String,
}

#[derive(Deserialize)]
pub struct EngineMoveBody {
    pub game_id: i64,
    pub elo: Option<u32>,
    pub time: Option<f64>,
}

/// GET /initialize-board
pub async fn initialize_board(
    Extension(pool): Extension<SqlitePool>,
    Extension(registry): Extension<Arc<SessionRegistry>>,
    Extension(config): Extension<Config>,
    Query(q): Query<InitializeQuery>,
) -> Result<Json<JsonValue>, AppError> {
    let elo = q.elo.unwrap_or(config.default_elo);
    let time = q.time.unwrap_or(config.default_time_limit);

    let session = registry.create(&pool, elo, time).await?;
    let snap = session.snapshot().await;

    Ok(Json(json!({
        "game_id": session.id,
        "fen": snap.fen,
        "turn": snap.turn,
        "legal_moves": rules::legal_move_ucis(&snap.position),
    })))
}

/// POST /post-move
pub async fn post_move(
    Extension(pool): Extension<SqlitePool>,
    Extension(registry): Extension<Arc<SessionRegistry>>,
    Extension(engine): Extension<Arc<EngineSession>>,
    Json(body): Json<PostMoveBody>,
) -> Result<Json<JsonValue>, AppError> {
    let session = registry.get(body.game_id).await?;
    let outcome = session
        .submit_move(&pool, &engine, body.new_move.trim())
        .await?;

    if outcome.game_over {
        registry.evict(session.id).await;
    }
    Ok(Json(outcome_json(session.id, &outcome)))
}

/// POST /engine-move
pub async fn engine_move(
    Extension(pool): Extension<SqlitePool>,
    Extension(registry): Extension<Arc<SessionRegistry>>,
    Extension(engine): Extension<Arc<EngineSession>>,
    Json(body): Json<EngineMoveBody>,
) -> Result<Json<JsonValue>, AppError> {
    let session = registry.get(body.game_id).await?;
    let outcome = session
        .engine_move(&pool, &engine, body.elo, body.time)
        .await?;

    if outcome.game_over {
        registry.evict(session.id).await;
    }

    let mut response = outcome_json(session.id, &outcome);
    response["engine_move"] = json!(outcome.san);
    Ok(Json(response))
}

/// Common response shape for both move routes. End-of-game fields appear
/// only on the move that ended the game.
fn outcome_json(game_id: i64, o: &MoveOutcome) -> JsonValue {
    let mut v = json!({
        "game_id": game_id,
        "fen": o.fen,
        "game_over": o.game_over,
        "turn": o.turn,
        "legal_moves": o.legal_moves,
        "last_move": o.last_move,
        "san": o.san,
        "move_history": o.move_history,
        "evaluation": o.evaluation,
        "best_move": o.best_move,
    });
    if o.game_over {
        v["result"] = json!(o.result);
        v["termination"] = json!(o.termination);
        v["pgn"] = json!(o.pgn);
    }
    v
}
