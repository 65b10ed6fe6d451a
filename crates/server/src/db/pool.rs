use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
}

/// Run the full schema migration inline.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Game summary records. End-state columns stay NULL until the game is
-- finalized, exactly once.
CREATE TABLE IF NOT EXISTS games (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    start_time        TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    end_time          TIMESTAMP,
    pgn               TEXT,
    result            TEXT,
    termination       TEXT,
    white_player      TEXT DEFAULT 'Human',
    black_player      TEXT DEFAULT 'Stockfish',
    engine_elo        INTEGER,
    engine_time_limit REAL,
    opening_name      TEXT,
    total_moves       INTEGER DEFAULT 0
);

-- Append-only move log. Rows are written once, in play order, and never
-- updated.
CREATE TABLE IF NOT EXISTS moves (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    game_id       INTEGER NOT NULL,
    move_number   INTEGER NOT NULL,
    move_notation TEXT NOT NULL,
    fen_after     TEXT NOT NULL,
    evaluation    REAL,
    best_move     TEXT,
    timestamp     TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (game_id) REFERENCES games (id)
);

CREATE INDEX IF NOT EXISTS idx_moves_game_id ON moves (game_id);
CREATE INDEX IF NOT EXISTS idx_games_end_time ON games (end_time);
"#;
