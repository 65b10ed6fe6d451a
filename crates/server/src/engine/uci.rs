//! UCI engine wrapper over a spawned subprocess (async I/O).

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    #[error("engine I/O error: {0}")]
    Io(String),

    #[error("engine response deadline exceeded")]
    Timeout,
}

/// Search limit for a `go` command.
#[derive(Debug, Clone, Copy)]
pub enum GoLimit {
    /// Wall-clock budget in milliseconds.
    MoveTime(u64),
    /// Fixed search depth in plies.
    Depth(u32),
}

impl GoLimit {
    fn command(self) -> String {
        match self {
            GoLimit::MoveTime(ms) => format!("go movetime {ms}"),
            GoLimit::Depth(d) => format!("go depth {d}"),
        }
    }
}

/// One ranked candidate line from analysis. `cp` and `mate` are mutually
/// exclusive; both are from the side-to-move's perspective at the analyzed
/// position (UCI native).
#[derive(Debug, Clone)]
pub struct EngineLine {
    /// First move of the line, coordinate notation.
    pub uci: String,
    pub cp: Option<i32>,
    pub mate: Option<i32>,
    /// Full principal variation, coordinate notation.
    pub pv: Vec<String>,
}

/// A live engine process. All methods take `&mut self`; serialization across
/// callers is the [`super::EngineSession`]'s job.
pub struct UciEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    limited_elo: Option<u32>,
}

impl UciEngine {
    /// Spawn the engine binary and run the UCI handshake.
    pub async fn spawn(path: &str) -> Result<Self, EngineError> {
        let mut process = Command::new(path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| EngineError::Unavailable(format!("failed to spawn engine: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| EngineError::Unavailable("engine stdin not captured".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| EngineError::Unavailable("engine stdout not captured".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout: BufReader::new(stdout),
            limited_elo: None,
        };

        engine.send("uci").await?;
        engine.wait_for("uciok").await?;
        engine.send("setoption name Threads value 1").await?;
        engine.send("isready").await?;
        engine.wait_for("readyok").await?;

        Ok(engine)
    }

    /// Configure playing strength. `Some(elo)` enables strength limiting,
    /// `None` restores full strength (used for analysis). No-op if already in
    /// the requested state.
    pub async fn set_strength(&mut self, elo: Option<u32>) -> Result<(), EngineError> {
        if self.limited_elo == elo {
            return Ok(());
        }
        match elo {
            Some(elo) => {
                self.send("setoption name UCI_LimitStrength value true").await?;
                self.send(&format!("setoption name UCI_Elo value {elo}")).await?;
            }
            None => {
                self.send("setoption name UCI_LimitStrength value false").await?;
            }
        }
        self.send("isready").await?;
        self.wait_for("readyok").await?;
        self.limited_elo = elo;
        Ok(())
    }

    /// Search the position and return the move the engine picks.
    pub async fn best_move(&mut self, fen: &str, limit: GoLimit) -> Result<String, EngineError> {
        self.send(&format!("position fen {fen}")).await?;
        self.send(&limit.command()).await?;

        let mut line = String::new();
        loop {
            line.clear();
            let n = self
                .stdout
                .read_line(&mut line)
                .await
                .map_err(|e| EngineError::Io(format!("failed to read from engine: {e}")))?;
            if n == 0 {
                return Err(EngineError::Io("engine closed its output".into()));
            }
            let trimmed = line.trim();
            debug!(line = trimmed, "engine >");

            if let Some(rest) = trimmed.strip_prefix("bestmove") {
                let mv = rest.split_whitespace().next().unwrap_or("");
                if mv.is_empty() || mv == "(none)" {
                    return Err(EngineError::Io("engine returned no move".into()));
                }
                return Ok(mv.to_string());
            }
        }
    }

    /// Analyze the position with up to `multipv` candidate lines, ranked best
    /// first. Returns fewer lines if the engine reports fewer.
    pub async fn analyze(
        &mut self,
        fen: &str,
        limit: GoLimit,
        multipv: u32,
    ) -> Result<Vec<EngineLine>, EngineError> {
        let multipv = multipv.max(1);
        self.send(&format!("setoption name MultiPV value {multipv}")).await?;
        self.send(&format!("position fen {fen}")).await?;
        self.send(&limit.command()).await?;

        let mut lines: Vec<EngineLine> = vec![
            EngineLine {
                uci: String::new(),
                cp: None,
                mate: None,
                pv: vec![],
            };
            multipv as usize
        ];

        let mut line = String::new();
        loop {
            line.clear();
            let n = self
                .stdout
                .read_line(&mut line)
                .await
                .map_err(|e| EngineError::Io(format!("failed to read from engine: {e}")))?;
            if n == 0 {
                return Err(EngineError::Io("engine closed its output".into()));
            }
            let trimmed = line.trim();
            debug!(line = trimmed, "engine >");

            if trimmed.starts_with("info") && trimmed.contains(" pv ") {
                let idx = parse_multipv_index(trimmed).unwrap_or(1) - 1;
                if (idx as usize) < lines.len() {
                    let entry = &mut lines[idx as usize];
                    entry.cp = parse_cp(trimmed);
                    entry.mate = parse_mate(trimmed);
                    entry.pv = parse_pv(trimmed);
                }
            } else if trimmed.starts_with("bestmove") {
                break;
            }
        }

        self.send("setoption name MultiPV value 1").await?;

        lines.retain(|l| !l.pv.is_empty());
        for l in &mut lines {
            l.uci = l.pv[0].clone();
        }
        Ok(lines)
    }

    /// Send quit and wait for the process to exit.
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }

    async fn send(&mut self, cmd: &str) -> Result<(), EngineError> {
        debug!(cmd, "engine <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| EngineError::Io(format!("failed to write to engine: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| EngineError::Io(format!("failed to flush engine stdin: {e}")))?;
        Ok(())
    }

    async fn wait_for(&mut self, expected: &str) -> Result<(), EngineError> {
        let mut line = String::new();
        loop {
            line.clear();
            let n = self
                .stdout
                .read_line(&mut line)
                .await
                .map_err(|e| EngineError::Io(format!("failed to read from engine: {e}")))?;
            if n == 0 {
                return Err(EngineError::Io(format!(
                    "engine closed its output waiting for '{expected}'"
                )));
            }
            let trimmed = line.trim();
            debug!(line = trimmed, "engine >");
            if trimmed == expected {
                return Ok(());
            }
        }
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}

/// Parse centipawn score from an info line
fn parse_cp(line: &str) -> Option<i32> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "cp" && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}

/// Parse mate score from an info line
fn parse_mate(line: &str) -> Option<i32> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "mate" && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}

/// Parse multipv index (1-based) from an info line
fn parse_multipv_index(line: &str) -> Option<u32> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "multipv" && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}

/// Parse PV moves from an info line
fn parse_pv(line: &str) -> Vec<String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let mut in_pv = false;
    let mut moves = Vec::new();

    for part in parts {
        if part == "pv" {
            in_pv = true;
            continue;
        }
        if in_pv {
            // PV ends at the next keyword
            if part == "string" || part.starts_with("bmc") {
                break;
            }
            moves.push(part.to_string());
        }
    }

    moves
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cp() {
        let line = "info depth 20 seldepth 25 multipv 1 score cp 35 nodes 100000 pv e2e4";
        assert_eq!(parse_cp(line), Some(35));
        assert_eq!(parse_mate(line), None);
    }

    #[test]
    fn test_parse_mate() {
        let line = "info depth 20 score mate 3 nodes 100000 pv e2e4";
        assert_eq!(parse_mate(line), Some(3));
        assert_eq!(parse_cp(line), None);
    }

    #[test]
    fn test_parse_pv() {
        let line = "info depth 20 score cp 35 pv e2e4 e7e5 g1f3";
        assert_eq!(parse_pv(line), vec!["e2e4", "e7e5", "g1f3"]);
    }

    #[test]
    fn test_parse_multipv_index() {
        let line = "info depth 12 multipv 2 score cp -14 pv e7e5 g1f3";
        assert_eq!(parse_multipv_index(line), Some(2));
    }

    #[test]
    fn test_go_limit_commands() {
        assert_eq!(GoLimit::MoveTime(100).command(), "go movetime 100");
        assert_eq!(GoLimit::Depth(18).command(), "go depth 18");
    }
}
