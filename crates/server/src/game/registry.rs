//! In-memory table of live game sessions, keyed by the database id.

use std::collections::HashMap;
use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::RwLock;
use tracing::info;

use crate::db::games;
use crate::error::AppError;
use crate::game::session::{clamp_elo, clamp_time_limit, GameSession};

#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<i64, Arc<GameSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a game record and register a fresh session for it. The
    /// engine settings are clamped to the supported ranges up front, so a
    /// session never carries an out-of-range configuration.
    pub async fn create(
        &self,
        pool: &SqlitePool,
        elo: u32,
        time_limit: f64,
    ) -> Result<Arc<GameSession>, AppError> {
        let elo = clamp_elo(elo);
        let time_limit = clamp_time_limit(time_limit);
        let id = games::create_game(pool, elo, time_limit).await?;
        let session = Arc::new(GameSession::new(id, elo, time_limit));
        self.sessions.write().await.insert(id, session.clone());
        info!(game_id = id, elo, time_limit, "New game started");
        Ok(session)
    }

    pub async fn get(&self, id: i64) -> Result<Arc<GameSession>, AppError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(AppError::SessionNotFound(id))
    }

    /// Drop a session from the registry. The database record stays.
    pub async fn evict(&self, id: i64) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
