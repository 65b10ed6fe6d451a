use std::env;

pub const DEFAULT_ENGINE_ELO: u32 = 1320;
pub const DEFAULT_TIME_LIMIT: f64 = 0.1;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub stockfish_path: String,
    pub host: String,
    pub port: u16,
    pub default_elo: u32,
    pub default_time_limit: f64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://chess-games.db?mode=rwc".to_string()),
            stockfish_path: env::var("STOCKFISH_PATH")
                .unwrap_or_else(|_| "/usr/local/bin/stockfish".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            default_elo: env::var("DEFAULT_ENGINE_ELO")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_ENGINE_ELO),
            default_time_limit: env::var("DEFAULT_TIME_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TIME_LIMIT),
        }
    }
}
