//! One active game: board state, move history, termination status.
//!
//! All mutation goes through the per-session mutex, so exactly one move can
//! be in flight per game. The durable record is written while that lock is
//! held, which keeps the move log in play order without any global write
//! lock. Sessions for different games only contend on the shared engine
//! connection.

use std::collections::HashMap;

use shakmaty::{Chess, Position};
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::{error, warn};

use chess_core::{opening, pgn, rules, Termination};

use crate::db::games;
use crate::engine::{EngineSession, GoLimit};
use crate::error::AppError;

pub const MIN_ELO: u32 = 800;
pub const MAX_ELO: u32 = 3000;
pub const MIN_TIME_LIMIT: f64 = 0.05;
pub const MAX_TIME_LIMIT: f64 = 5.0;

/// Budget for the advisory evaluation after each applied move.
const EVAL_MOVETIME_MS: u64 = 100;

pub fn clamp_elo(elo: u32) -> u32 {
    elo.clamp(MIN_ELO, MAX_ELO)
}

pub fn clamp_time_limit(t: f64) -> f64 {
    t.clamp(MIN_TIME_LIMIT, MAX_TIME_LIMIT)
}

/// A move that has been applied, with both notations and the position it
/// produced.
#[derive(Debug, Clone)]
pub struct PlayedMove {
    pub uci: String,
    pub san: String,
    pub fen_after: String,
}

#[derive(Debug)]
struct SessionState {
    position: Chess,
    history: Vec<PlayedMove>,
    /// Occurrence count per position (repetition key), current position
    /// included.
    seen: HashMap<String, u32>,
    termination: Termination,
    engine_elo: u32,
    time_limit: f64,
}

impl SessionState {
    fn repetitions(&self) -> u32 {
        *self.seen.get(&rules::epd(&self.position)).unwrap_or(&1)
    }
}

/// Result of a successfully applied move (player or engine).
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    pub fen: String,
    pub game_over: bool,
    pub turn: &'static str,
    pub legal_moves: Vec<String>,
    /// The applied move in coordinate notation.
    pub last_move: String,
    /// The applied move in SAN.
    pub san: String,
    pub move_history: Vec<String>,
    /// Advisory post-move score in pawns, side-to-move perspective. Absent
    /// when the engine is unavailable, failed, or reported a forced mate.
    pub evaluation: Option<f64>,
    /// Advisory best reply, coordinate notation.
    pub best_move: Option<String>,
    pub result: Option<&'static str>,
    pub termination: Option<&'static str>,
    pub pgn: Option<String>,
}

/// Read-only view of a session for analysis endpoints.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub position: Chess,
    pub fen: String,
    pub turn: &'static str,
    pub game_over: bool,
}

#[derive(Debug)]
pub struct GameSession {
    pub id: i64,
    state: Mutex<SessionState>,
}

impl GameSession {
    pub fn new(id: i64, engine_elo: u32, time_limit: f64) -> Self {
        let position = Chess::default();
        let mut seen = HashMap::new();
        seen.insert(rules::epd(&position), 1);
        Self {
            id,
            state: Mutex::new(SessionState {
                position,
                history: Vec::new(),
                seen,
                termination: Termination::InProgress,
                engine_elo,
                time_limit,
            }),
        }
    }

    pub async fn snapshot(&self) -> Snapshot {
        let state = self.state.lock().await;
        Snapshot {
            fen: rules::fen(&state.position),
            turn: rules::turn_str(&state.position),
            game_over: state.termination.is_over(),
            position: state.position.clone(),
        }
    }

    /// Apply a player move given in coordinate notation.
    pub async fn submit_move(
        &self,
        pool: &SqlitePool,
        engine: &EngineSession,
        uci_str: &str,
    ) -> Result<MoveOutcome, AppError> {
        let mut state = self.state.lock().await;
        if state.termination.is_over() {
            return Err(AppError::GameOver(self.id));
        }

        let m = rules::parse_uci(&state.position, uci_str)?;
        self.advance(&mut state, pool, engine, &m).await
    }

    /// Ask the engine for a move at the given strength and apply it. Any
    /// engine failure surfaces to the caller and leaves the session exactly
    /// as it was.
    pub async fn engine_move(
        &self,
        pool: &SqlitePool,
        engine: &EngineSession,
        elo: Option<u32>,
        time_limit: Option<f64>,
    ) -> Result<MoveOutcome, AppError> {
        let mut state = self.state.lock().await;
        if state.termination.is_over() {
            return Err(AppError::GameOver(self.id));
        }
        if !engine.available() {
            return Err(AppError::EngineUnavailable);
        }

        let elo = clamp_elo(elo.unwrap_or(state.engine_elo));
        let time_limit = clamp_time_limit(time_limit.unwrap_or(state.time_limit));

        let fen = rules::fen(&state.position);
        let limit = GoLimit::MoveTime((time_limit * 1000.0) as u64);
        let chosen = engine.best_move(&fen, elo, limit).await?;

        // The session is untouched up to here; a timeout or dead engine
        // cannot leave a half-applied move behind.
        let m = rules::parse_uci(&state.position, &chosen).map_err(|e| {
            error!(game_id = self.id, chosen = %chosen, error = %e, "Engine played an invalid move");
            AppError::Anyhow(anyhow::anyhow!("engine returned an unplayable move: {chosen}"))
        })?;

        // The engine actually played at these settings; record them now that
        // the move is going to be applied.
        state.engine_elo = elo;
        state.time_limit = time_limit;
        if let Err(e) = games::update_engine_settings(pool, self.id, elo, time_limit).await {
            warn!(game_id = self.id, error = %e, "Failed to record engine settings");
        }

        self.advance(&mut state, pool, engine, &m).await
    }

    /// Shared move-application path: apply, reclassify termination, attach
    /// the advisory evaluation, persist, finalize if the game just ended.
    async fn advance(
        &self,
        state: &mut SessionState,
        pool: &SqlitePool,
        engine: &EngineSession,
        m: &shakmaty::Move,
    ) -> Result<MoveOutcome, AppError> {
        let san = rules::san(&state.position, m);
        let next = rules::apply(&state.position, m)?;
        let fen_after = rules::fen(&next);

        state.history.push(PlayedMove {
            uci: rules::uci(m),
            san: san.clone(),
            fen_after: fen_after.clone(),
        });
        *state.seen.entry(rules::epd(&next)).or_insert(0) += 1;
        state.position = next;
        state.termination = rules::classify_termination(&state.position, state.repetitions());

        // Advisory evaluation of the new position. Failures degrade to "no
        // evaluation" — they never fail the move.
        let (evaluation, best_move) = if engine.available() {
            match engine
                .analyze(&fen_after, GoLimit::MoveTime(EVAL_MOVETIME_MS), 1)
                .await
            {
                Ok(lines) => match lines.first() {
                    Some(line) => (line.cp.map(|cp| cp as f64 / 100.0), Some(line.uci.clone())),
                    None => (None, None),
                },
                Err(e) => {
                    warn!(game_id = self.id, error = %e, "Post-move analysis failed");
                    (None, None)
                }
            }
        } else {
            (None, None)
        };

        let ply = state.history.len() as i64;
        let move_number = (ply - 1) / 2 + 1;
        self.persist_move(pool, move_number, &san, &fen_after, evaluation, best_move.as_deref())
            .await;

        let mut outcome = MoveOutcome {
            fen: fen_after,
            game_over: state.termination.is_over(),
            turn: rules::turn_str(&state.position),
            legal_moves: rules::legal_move_ucis(&state.position),
            last_move: state.history.last().map(|p| p.uci.clone()).unwrap_or_default(),
            san,
            move_history: state.history.iter().map(|p| p.uci.clone()).collect(),
            evaluation,
            best_move,
            result: None,
            termination: None,
            pgn: None,
        };

        if state.termination.is_over() {
            let result = rules::result_string(state.termination, state.position.turn());
            let sans: Vec<String> = state.history.iter().map(|p| p.san.clone()).collect();
            let date = chrono::Utc::now().format("%Y.%m.%d").to_string();
            let black = format!("Stockfish ({})", state.engine_elo);
            let game_pgn = pgn::render_game("Human", &black, &date, result, &sans);
            let opening = opening::opening_name(&outcome.fen, state.history.len());

            self.finalize(pool, result, state.termination.reason(), &game_pgn, ply, opening)
                .await;

            outcome.result = Some(result);
            outcome.termination = Some(state.termination.reason());
            outcome.pgn = Some(game_pgn);
        }

        Ok(outcome)
    }

    /// Synchronous write with one retry. On repeated failure the move stands
    /// in memory and the gap is logged loudly; gameplay is never blocked on a
    /// broken database.
    async fn persist_move(
        &self,
        pool: &SqlitePool,
        move_number: i64,
        san: &str,
        fen_after: &str,
        evaluation: Option<f64>,
        best_move: Option<&str>,
    ) {
        for attempt in 0..2u32 {
            match games::insert_move(pool, self.id, move_number, san, fen_after, evaluation, best_move)
                .await
            {
                Ok(()) => return,
                Err(e) if attempt == 0 => {
                    warn!(game_id = self.id, error = %e, "Move write failed, retrying");
                }
                Err(e) => {
                    error!(game_id = self.id, move_number, san, error = %e, "Move write failed twice, move not persisted");
                }
            }
        }
    }

    async fn finalize(
        &self,
        pool: &SqlitePool,
        result: &str,
        termination: &str,
        game_pgn: &str,
        total_moves: i64,
        opening: Option<&str>,
    ) {
        for attempt in 0..2u32 {
            match games::finalize_game(pool, self.id, result, termination, game_pgn, total_moves, opening)
                .await
            {
                Ok(true) => return,
                Ok(false) => {
                    // Already finalized; nothing to write.
                    warn!(game_id = self.id, "Finalize skipped: record already closed");
                    return;
                }
                Err(e) if attempt == 0 => {
                    warn!(game_id = self.id, error = %e, "Finalize failed, retrying");
                }
                Err(e) => {
                    error!(game_id = self.id, error = %e, "Finalize failed twice, game record left open");
                }
            }
        }
    }
}
