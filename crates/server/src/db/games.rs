//! Durable game records: summary row per game plus an append-only move log.
//!
//! Move-order consistency is the caller's contract: rows for one game are
//! inserted while that game's session lock is held, so concurrent writers
//! can never interleave moves of the same game.

use serde_json::Value as JsonValue;
use sqlx::{Row, SqlitePool};

use crate::error::AppError;

/// Create the summary row for a new game and return its id. The
/// AUTOINCREMENT id doubles as the session identifier — unique and
/// monotonically increasing.
pub async fn create_game(pool: &SqlitePool, elo: u32, time_limit: f64) -> Result<i64, AppError> {
    let res = sqlx::query("INSERT INTO games (engine_elo, engine_time_limit) VALUES (?, ?)")
        .bind(elo as i64)
        .bind(time_limit)
        .execute(pool)
        .await
        .map_err(AppError::Sqlx)?;
    Ok(res.last_insert_rowid())
}

/// Append one move row. Never updates an existing row.
pub async fn insert_move(
    pool: &SqlitePool,
    game_id: i64,
    move_number: i64,
    san: &str,
    fen_after: &str,
    evaluation: Option<f64>,
    best_move: Option<&str>,
) -> Result<(), AppError> {
    sqlx::query(
        r#"INSERT INTO moves
           (game_id, move_number, move_notation, fen_after, evaluation, best_move)
           VALUES (?, ?, ?, ?, ?, ?)"#,
    )
    .bind(game_id)
    .bind(move_number)
    .bind(san)
    .bind(fen_after)
    .bind(evaluation)
    .bind(best_move)
    .execute(pool)
    .await
    .map_err(AppError::Sqlx)?;
    Ok(())
}

/// Write the end state of a finished game. Idempotent: only the first call
/// finds `end_time IS NULL` and writes; returns whether this call did.
pub async fn finalize_game(
    pool: &SqlitePool,
    game_id: i64,
    result: &str,
    termination: &str,
    pgn: &str,
    total_moves: i64,
    opening_name: Option<&str>,
) -> Result<bool, AppError> {
    let res = sqlx::query(
        r#"UPDATE games
           SET end_time = CURRENT_TIMESTAMP, result = ?, termination = ?, pgn = ?,
               total_moves = ?, opening_name = ?
           WHERE id = ? AND end_time IS NULL"#,
    )
    .bind(result)
    .bind(termination)
    .bind(pgn)
    .bind(total_moves)
    .bind(opening_name)
    .bind(game_id)
    .execute(pool)
    .await
    .map_err(AppError::Sqlx)?;
    Ok(res.rows_affected() > 0)
}

/// Record the engine strength used for the black side, shown in listings.
pub async fn update_engine_settings(
    pool: &SqlitePool,
    game_id: i64,
    elo: u32,
    time_limit: f64,
) -> Result<(), AppError> {
    sqlx::query("UPDATE games SET engine_elo = ?, engine_time_limit = ? WHERE id = ?")
        .bind(elo as i64)
        .bind(time_limit)
        .bind(game_id)
        .execute(pool)
        .await
        .map_err(AppError::Sqlx)?;
    Ok(())
}

/// Finished games, newest first.
pub async fn list_finished_games(
    pool: &SqlitePool,
    limit: i64,
    offset: i64,
) -> Result<Vec<JsonValue>, AppError> {
    let rows = sqlx::query(
        r#"SELECT id, start_time, end_time, result, termination, white_player,
                  black_player, engine_elo, total_moves, opening_name
           FROM games
           WHERE end_time IS NOT NULL
           ORDER BY start_time DESC, id DESC
           LIMIT ? OFFSET ?"#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(AppError::Sqlx)?;

    Ok(rows.iter().map(summary_to_json).collect())
}

pub async fn count_finished_games(pool: &SqlitePool) -> Result<i64, AppError> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM games WHERE end_time IS NOT NULL")
        .fetch_one(pool)
        .await
        .map_err(AppError::Sqlx)?;
    Ok(count.0)
}

pub async fn get_game(pool: &SqlitePool, game_id: i64) -> Result<Option<JsonValue>, AppError> {
    let row = sqlx::query(
        r#"SELECT id, start_time, end_time, pgn, result, termination, white_player,
                  black_player, engine_elo, engine_time_limit, opening_name, total_moves
           FROM games WHERE id = ?"#,
    )
    .bind(game_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::Sqlx)?;

    Ok(row.map(|r| {
        serde_json::json!({
            "id": r.get::<i64, _>("id"),
            "start_time": r.get::<Option<String>, _>("start_time"),
            "end_time": r.get::<Option<String>, _>("end_time"),
            "pgn": r.get::<Option<String>, _>("pgn"),
            "result": r.get::<Option<String>, _>("result"),
            "termination": r.get::<Option<String>, _>("termination"),
            "white_player": r.get::<Option<String>, _>("white_player"),
            "black_player": r.get::<Option<String>, _>("black_player"),
            "engine_elo": r.get::<Option<i64>, _>("engine_elo"),
            "engine_time_limit": r.get::<Option<f64>, _>("engine_time_limit"),
            "opening_name": r.get::<Option<String>, _>("opening_name"),
            "total_moves": r.get::<Option<i64>, _>("total_moves"),
        })
    }))
}

/// Move rows for one game in insertion order (= play order).
pub async fn get_game_moves(pool: &SqlitePool, game_id: i64) -> Result<Vec<JsonValue>, AppError> {
    let rows = sqlx::query(
        r#"SELECT move_number, move_notation, fen_after, evaluation, best_move, timestamp
           FROM moves
           WHERE game_id = ?
           ORDER BY id"#,
    )
    .bind(game_id)
    .fetch_all(pool)
    .await
    .map_err(AppError::Sqlx)?;

    Ok(rows
        .iter()
        .map(|r| {
            serde_json::json!({
                "move_number": r.get::<i64, _>("move_number"),
                "move_notation": r.get::<String, _>("move_notation"),
                "fen_after": r.get::<String, _>("fen_after"),
                "evaluation": r.get::<Option<f64>, _>("evaluation"),
                "best_move": r.get::<Option<String>, _>("best_move"),
                "timestamp": r.get::<Option<String>, _>("timestamp"),
            })
        })
        .collect())
}

/// Whether the database answers at all (health check).
pub async fn ping(pool: &SqlitePool) -> bool {
    sqlx::query("SELECT 1").execute(pool).await.is_ok()
}

fn summary_to_json(r: &sqlx::sqlite::SqliteRow) -> JsonValue {
    serde_json::json!({
        "id": r.get::<i64, _>("id"),
        "start_time": r.get::<Option<String>, _>("start_time"),
        "end_time": r.get::<Option<String>, _>("end_time"),
        "result": r.get::<Option<String>, _>("result"),
        "termination": r.get::<Option<String>, _>("termination"),
        "white_player": r.get::<Option<String>, _>("white_player"),
        "black_player": r.get::<Option<String>, _>("black_player"),
        "engine_elo": r.get::<Option<i64>, _>("engine_elo"),
        "total_moves": r.get::<Option<i64>, _>("total_moves"),
        "opening_name": r.get::<Option<String>, _>("opening_name"),
    })
}
