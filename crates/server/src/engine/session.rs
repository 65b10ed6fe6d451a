//! The shared engine session: one live UCI connection, one outstanding
//! request at a time.
//!
//! The connection is opened lazily on first use and kept alive across
//! requests. A request that fails on a dead or garbled connection drops the
//! process and retries once on a fresh one; a request that misses its hard
//! deadline drops the process (its state is unknown) and reports a timeout.
//! If the engine binary cannot be spawned at all the service degrades to
//! rules-only mode — callers see `EngineError::Unavailable`.

use std::path::Path;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{info, warn};

use super::uci::{EngineError, EngineLine, GoLimit, UciEngine};

/// Ceiling on the UCI handshake for a freshly spawned process.
const SPAWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Ceiling for depth-limited searches, which carry no wall-clock budget.
const DEPTH_SEARCH_TIMEOUT: Duration = Duration::from_secs(60);

/// A movetime search gets twice its budget plus fixed overhead before it is
/// declared lost.
fn hard_ceiling(limit: GoLimit) -> Duration {
    match limit {
        GoLimit::MoveTime(ms) => Duration::from_millis(ms * 2 + 1000),
        GoLimit::Depth(_) => DEPTH_SEARCH_TIMEOUT,
    }
}

pub struct EngineSession {
    path: String,
    slot: Mutex<Option<UciEngine>>,
}

impl EngineSession {
    pub fn new(path: String) -> Self {
        Self {
            path,
            slot: Mutex::new(None),
        }
    }

    /// Whether an engine binary is configured. Spawning may still fail, in
    /// which case individual requests report `Unavailable`.
    pub fn available(&self) -> bool {
        Path::new(&self.path).exists()
    }

    /// Play a move for the given position at the given strength.
    pub async fn best_move(
        &self,
        fen: &str,
        elo: u32,
        limit: GoLimit,
    ) -> Result<String, EngineError> {
        let ceiling = hard_ceiling(limit);
        let mut slot = self.slot.lock().await;

        for attempt in 0..2u32 {
            let engine = Self::ensure_spawned(&self.path, &mut *slot).await?;

            let outcome = tokio::time::timeout(ceiling, async {
                engine.set_strength(Some(elo)).await?;
                engine.best_move(fen, limit).await
            })
            .await;

            match outcome {
                Ok(Ok(mv)) => return Ok(mv),
                Ok(Err(e)) => {
                    warn!(error = %e, attempt, "Engine request failed, dropping connection");
                    *slot = None;
                    if attempt == 1 {
                        return Err(e);
                    }
                }
                Err(_) => {
                    // The process missed its deadline; its stream state is
                    // unknown, so it cannot be reused.
                    warn!("Engine missed its deadline, dropping connection");
                    *slot = None;
                    return Err(EngineError::Timeout);
                }
            }
        }

        Err(EngineError::Unavailable(
            "engine connection could not be established".into(),
        ))
    }

    /// Analyze at full strength with up to `multipv` ranked candidate lines.
    pub async fn analyze(
        &self,
        fen: &str,
        limit: GoLimit,
        multipv: u32,
    ) -> Result<Vec<EngineLine>, EngineError> {
        let ceiling = hard_ceiling(limit);
        let mut slot = self.slot.lock().await;

        for attempt in 0..2u32 {
            let engine = Self::ensure_spawned(&self.path, &mut *slot).await?;

            let outcome = tokio::time::timeout(ceiling, async {
                engine.set_strength(None).await?;
                engine.analyze(fen, limit, multipv).await
            })
            .await;

            match outcome {
                Ok(Ok(lines)) => return Ok(lines),
                Ok(Err(e)) => {
                    warn!(error = %e, attempt, "Engine request failed, dropping connection");
                    *slot = None;
                    if attempt == 1 {
                        return Err(e);
                    }
                }
                Err(_) => {
                    warn!("Engine missed its deadline, dropping connection");
                    *slot = None;
                    return Err(EngineError::Timeout);
                }
            }
        }

        Err(EngineError::Unavailable(
            "engine connection could not be established".into(),
        ))
    }

    /// Close the connection. Called once at shutdown; kill-on-drop covers
    /// abnormal exits.
    pub async fn shutdown(&self) {
        let mut slot = self.slot.lock().await;
        if let Some(mut engine) = slot.take() {
            info!("Shutting down engine");
            engine.quit().await;
        }
    }

    async fn ensure_spawned<'s>(
        path: &str,
        slot: &'s mut Option<UciEngine>,
    ) -> Result<&'s mut UciEngine, EngineError> {
        if slot.is_none() {
            match tokio::time::timeout(SPAWN_TIMEOUT, UciEngine::spawn(path)).await {
                Ok(Ok(engine)) => {
                    info!(path, "Engine connection established");
                    *slot = Some(engine);
                }
                Ok(Err(e)) => return Err(e),
                Err(_) => {
                    return Err(EngineError::Unavailable("engine handshake timed out".into()))
                }
            }
        }
        Ok(slot.as_mut().expect("engine slot populated above"))
    }
}
