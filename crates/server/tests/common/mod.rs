use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use server::db;
use server::engine::EngineSession;

/// Fresh in-memory database with the schema applied. One connection, so
/// every query in a test sees the same memory database.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    db::pool::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Generate a unique suffix based on timestamp to avoid collisions.
pub fn unique_suffix() -> String {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}", ts % 1_000_000_000)
}

/// An engine session pointing at a path that does not exist; every request
/// reports unavailable and gameplay runs rules-only.
pub fn no_engine() -> EngineSession {
    EngineSession::new("/nonexistent/stockfish".to_string())
}

/// Write an executable shell script that speaks enough UCI for tests and
/// return an engine session driving it.
pub fn stub_engine(name: &str, script_body: &str) -> EngineSession {
    let path = write_stub(name, script_body);
    EngineSession::new(path.to_string_lossy().into_owned())
}

fn write_stub(name: &str, body: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("uci-stub-{}-{}.sh", name, unique_suffix()));
    fs::write(&path, format!("#!/bin/sh\n{body}")).expect("Failed to write stub engine");
    let mut perms = fs::metadata(&path).expect("Failed to stat stub engine").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("Failed to chmod stub engine");
    path
}

/// Stub that answers instantly with a legal move for either side of the
/// opening position (e2e4 for white, e7e5 for black).
pub const RESPONSIVE_STUB: &str = r#"
POS=""
while read line; do
  case "$line" in
    uci) echo "id name stub"; echo "uciok" ;;
    isready) echo "readyok" ;;
    position*) POS="$line" ;;
    go*)
      case "$POS" in
        *" b "*) MV=e7e5 ;;
        *) MV=e2e4 ;;
      esac
      echo "info depth 8 multipv 1 score cp 20 pv $MV"
      echo "bestmove $MV"
      ;;
    quit) exit 0 ;;
  esac
done
"#;

/// Stub that completes the handshake but never answers a search.
pub const STALLING_STUB: &str = r#"
while read line; do
  case "$line" in
    uci) echo "uciok" ;;
    isready) echo "readyok" ;;
    go*) sleep 60 ;;
    quit) exit 0 ;;
  esac
done
"#;

/// Stub that reports a forced mate for every position.
pub const MATE_STUB: &str = r#"
while read line; do
  case "$line" in
    uci) echo "uciok" ;;
    isready) echo "readyok" ;;
    go*)
      echo "info depth 10 multipv 1 score mate 1 pv d8h4"
      echo "bestmove d8h4"
      ;;
    quit) exit 0 ;;
  esac
done
"#;
