//! Analysis routes: ranked candidate moves for a live game, and one-shot
//! evaluation of an arbitrary position.

use std::sync::Arc;

use axum::{extract::Query, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::warn;

use chess_core::rules;

use crate::engine::{EngineSession, GoLimit};
use crate::error::AppError;
use crate::game::session::clamp_time_limit;
use crate::game::SessionRegistry;

/// SAN preview length for candidate lines.
const LINE_PREVIEW_PLIES: usize = 5;

#[derive(Deserialize)]
pub struct BestMovesQuery {
    pub game_id: i64,
    pub multipv: Option<u32>,
    pub time: Option<f64>,
}

#[derive(Deserialize)]
pub struct AnalyzeBody {
    pub fen: String,
    pub depth: Option<u32>,
}

/// GET /best-moves
pub async fn best_moves(
    Extension(registry): Extension<Arc<SessionRegistry>>,
    Extension(engine): Extension<Arc<EngineSession>>,
    Query(q): Query<BestMovesQuery>,
) -> Result<Json<JsonValue>, AppError> {
    let session = registry.get(q.game_id).await?;
    let snap = session.snapshot().await;
    if snap.game_over {
        return Err(AppError::GameOver(q.game_id));
    }

    let multipv = q.multipv.unwrap_or(3).clamp(1, 10);
    let time = clamp_time_limit(q.time.unwrap_or(1.0));
    let budget = GoLimit::MoveTime((time * 1000.0) as u64);

    let lines = engine.analyze(&snap.fen, budget, multipv).await?;

    let mut candidates = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        // A line the current position cannot play is engine garbage; drop it
        // rather than failing the whole request.
        let m = match rules::parse_uci(&snap.position, &line.uci) {
            Ok(m) => m,
            Err(e) => {
                warn!(game_id = q.game_id, uci = %line.uci, error = %e, "Discarding unplayable engine line");
                continue;
            }
        };
        candidates.push(json!({
            "move": line.uci,
            "san": rules::san(&snap.position, &m),
            "rank": i + 1,
            "evaluation": line.cp.map(|cp| cp as f64 / 100.0),
            "mate_in": line.mate,
            "line": rules::san_line(&snap.position, &line.pv, LINE_PREVIEW_PLIES),
        }));
    }

    Ok(Json(json!({
        "game_id": q.game_id,
        "best_moves": candidates,
        "position_type": rules::game_phase(&snap.position),
        "turn": snap.turn,
    })))
}

/// POST /analyze-position
pub async fn analyze_position(
    Extension(engine): Extension<Arc<EngineSession>>,
    Json(body): Json<AnalyzeBody>,
) -> Result<Json<JsonValue>, AppError> {
    let position = rules::position_from_fen(body.fen.trim())?;
    let depth = body.depth.unwrap_or(15).clamp(1, 30);

    let lines = engine
        .analyze(&rules::fen(&position), GoLimit::Depth(depth), 1)
        .await?;
    let line = lines.first();

    // cp and mate are mutually exclusive; a forced mate is reported as
    // mate_in and never folded into the numeric score.
    Ok(Json(json!({
        "fen": rules::fen(&position),
        "turn": rules::turn_str(&position),
        "position_type": rules::game_phase(&position),
        "evaluation": line.and_then(|l| l.cp).map(|cp| cp as f64 / 100.0),
        "mate_in": line.and_then(|l| l.mate),
        "best_move": line.map(|l| l.uci.clone()),
        "depth": depth,
    })))
}
