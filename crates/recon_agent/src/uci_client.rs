//! [`Oracle`] backed by a UCI engine process such as Stockfish.
//!
//! The engine's stdout is drained by a reader thread into a channel so every
//! read can carry a deadline. A query that misses its deadline, hits EOF or
//! gets unparseable output kills the process and starts a fresh one before
//! the error is returned; the caller only ever loses that one answer.

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chess_core::{Move, Position, parse_uci_squares, position_command};
use tracing::{Level, event};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::oracle::{Limit, Line, Oracle, Score};

/// Deadline for depth-limited searches, which have no time limit of their own.
const DEPTH_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct UciEngine {
    config: EngineConfig,
    process: Option<EngineProcess>,
}

struct EngineProcess {
    child: Child,
    stdin: ChildStdin,
    lines: Receiver<String>,
    reader: Option<JoinHandle<()>>,
    multipv: usize,
}

impl UciEngine {
    /// Spawn the engine and complete the `uci`/`isready` handshake.
    pub fn start(config: EngineConfig) -> Result<Self, EngineError> {
        let process = EngineProcess::spawn(&config)?;
        Ok(Self {
            config,
            process: Some(process),
        })
    }

    pub fn is_running(&self) -> bool {
        self.process.is_some()
    }

    fn process(&mut self) -> Result<&mut EngineProcess, EngineError> {
        if self.process.is_none() {
            self.process = Some(EngineProcess::spawn(&self.config)?);
        }
        self.process
            .as_mut()
            .ok_or_else(|| EngineError::Unavailable("engine not running".into()))
    }

    /// Drop the current process after a failed query and try to bring up a
    /// replacement, then hand `err` back to the caller.
    fn recover<T>(&mut self, err: EngineError) -> Result<T, EngineError> {
        event!(
            target: "recon_agent::engine",
            Level::WARN,
            error = %err,
            "engine query failed; restarting"
        );
        if let Err(restart_err) = self.restart() {
            event!(
                target: "recon_agent::engine",
                Level::WARN,
                error = %restart_err,
                "engine restart failed"
            );
        }
        Err(err)
    }

    fn run_query(
        &mut self,
        position: &Position,
        limit: Limit,
        top_k: usize,
    ) -> Result<(Vec<Line>, Option<Move>), EngineError> {
        let grace = self.config.grace();
        let process = self.process()?;
        process.set_multipv(top_k.max(1))?;
        process.send(&position_command(position))?;
        let (go, budget) = match limit {
            Limit::Depth(depth) => (format!("go depth {depth}"), DEPTH_QUERY_TIMEOUT),
            Limit::Time(time) => {
                let ms = time.as_millis().max(1);
                (format!("go movetime {ms}"), time)
            }
        };
        process.send(&go)?;

        let deadline = Instant::now() + budget + grace;
        let mut lines: BTreeMap<usize, Line> = BTreeMap::new();
        loop {
            let text = process.read_line(deadline)?;
            if let Some(rest) = text.strip_prefix("bestmove") {
                let best = parse_bestmove(rest)?;
                let lines = lines.into_values().filter(|l| l.rank <= top_k.max(1)).collect();
                return Ok((lines, best));
            }
            if let Some(line) = parse_info_line(&text)? {
                lines.insert(line.rank, line);
            }
        }
    }
}

impl Oracle for UciEngine {
    fn analyze(
        &mut self,
        position: &Position,
        limit: Limit,
        top_k: usize,
    ) -> Result<Vec<Line>, EngineError> {
        match self.run_query(position, limit, top_k) {
            Ok((lines, _)) => Ok(lines),
            Err(err) => self.recover(err),
        }
    }

    fn play(&mut self, position: &Position, limit: Limit) -> Result<Move, EngineError> {
        match self.run_query(position, limit, 1) {
            Ok((_, Some(best))) => Ok(best),
            Ok((_, None)) => Err(EngineError::Malformed("engine has no move to play".into())),
            Err(err) => self.recover(err),
        }
    }

    fn restart(&mut self) -> Result<(), EngineError> {
        if let Some(mut old) = self.process.take() {
            old.terminate();
        }
        self.process = Some(EngineProcess::spawn(&self.config)?);
        event!(target: "recon_agent::engine", Level::INFO, "engine restarted");
        Ok(())
    }

    fn ensure_running(&mut self) -> Result<(), EngineError> {
        self.process().map(|_| ())
    }

    fn shutdown(&mut self) {
        if let Some(mut process) = self.process.take() {
            process.terminate();
        }
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl EngineProcess {
    fn spawn(config: &EngineConfig) -> Result<Self, EngineError> {
        let path = config.resolve_path();
        let spawn_err = |reason: String| EngineError::Spawn {
            path: path.display().to_string(),
            reason,
        };

        let mut child = Command::new(&path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| spawn_err(e.to_string()))?;
        let stdin = child.stdin.take().ok_or_else(|| spawn_err("no stdin pipe".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| spawn_err("no stdout pipe".into()))?;

        let (tx, rx) = mpsc::channel();
        let reader = thread::Builder::new()
            .name("uci-reader".into())
            .spawn(move || {
                for line in BufReader::new(stdout).lines() {
                    let Ok(line) = line else { break };
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| spawn_err(e.to_string()))?;

        let mut process = EngineProcess {
            child,
            stdin,
            lines: rx,
            reader: Some(reader),
            multipv: 1,
        };

        if let Err(err) = process.handshake(config) {
            process.terminate();
            return Err(spawn_err(err.to_string()));
        }

        event!(
            target: "recon_agent::engine",
            Level::DEBUG,
            path = %path.display(),
            threads = config.threads,
            hash_mb = config.hash_mb,
            "engine ready"
        );
        Ok(process)
    }

    fn handshake(&mut self, config: &EngineConfig) -> Result<(), EngineError> {
        let deadline = Instant::now() + config.startup_timeout();
        self.send("uci")?;
        self.wait_for("uciok", deadline)?;
        self.send(&format!("setoption name Threads value {}", config.threads))?;
        self.send(&format!("setoption name Hash value {}", config.hash_mb))?;
        self.send("isready")?;
        self.wait_for("readyok", deadline)
    }

    fn send(&mut self, cmd: &str) -> Result<(), EngineError> {
        writeln!(self.stdin, "{cmd}")
            .and_then(|_| self.stdin.flush())
            .map_err(|e| EngineError::Unavailable(format!("write failed: {e}")))
    }

    fn read_line(&mut self, deadline: Instant) -> Result<String, EngineError> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match self.lines.recv_timeout(remaining) {
            Ok(line) => Ok(line.trim().to_string()),
            Err(RecvTimeoutError::Timeout) => {
                Err(EngineError::Unavailable("no response before deadline".into()))
            }
            Err(RecvTimeoutError::Disconnected) => {
                Err(EngineError::Unavailable("engine closed its output".into()))
            }
        }
    }

    fn wait_for(&mut self, token: &str, deadline: Instant) -> Result<(), EngineError> {
        loop {
            if self.read_line(deadline)?.starts_with(token) {
                return Ok(());
            }
        }
    }

    fn set_multipv(&mut self, k: usize) -> Result<(), EngineError> {
        if self.multipv != k {
            self.send(&format!("setoption name MultiPV value {k}"))?;
            self.multipv = k;
        }
        Ok(())
    }

    /// Ask politely, then kill. Errors are ignored: the process may already
    /// be gone.
    fn terminate(&mut self) {
        let _ = self.send("quit");
        let deadline = Instant::now() + Duration::from_millis(200);
        loop {
            match self.child.try_wait() {
                Ok(Some(_)) => break,
                Ok(None) if Instant::now() < deadline => thread::sleep(Duration::from_millis(10)),
                _ => {
                    let _ = self.child.kill();
                    let _ = self.child.wait();
                    break;
                }
            }
        }
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
    }
}

/// Parse an `info` line carrying a score and a principal variation.
/// Other lines (`info string`, `currmove` updates, ...) give `Ok(None)`.
pub(crate) fn parse_info_line(text: &str) -> Result<Option<Line>, EngineError> {
    let mut tokens = text.split_whitespace();
    if tokens.next() != Some("info") {
        return Ok(None);
    }
    let mut rank = 1usize;
    let mut score = None;
    let mut first_move = None;
    while let Some(token) = tokens.next() {
        match token {
            "string" => return Ok(None),
            "multipv" => {
                rank = parse_number(tokens.next(), text)?;
            }
            "score" => {
                score = Some(match (tokens.next(), tokens.next()) {
                    (Some("cp"), value) => Score::Centipawns(parse_number(value, text)?),
                    (Some("mate"), value) => Score::Mate(parse_number(value, text)?),
                    _ => return Err(EngineError::Malformed(format!("bad score in '{text}'"))),
                });
            }
            "pv" => {
                first_move = tokens.next();
                break;
            }
            _ => {}
        }
    }
    match (score, first_move) {
        (Some(score), Some(mv)) => {
            let first_move = parse_uci_squares(mv)
                .ok_or_else(|| EngineError::Malformed(format!("bad move '{mv}' in '{text}'")))?;
            Ok(Some(Line {
                rank,
                first_move,
                score,
            }))
        }
        _ => Ok(None),
    }
}

/// The move after `bestmove`, or `None` for `(none)` / `0000`.
fn parse_bestmove(rest: &str) -> Result<Option<Move>, EngineError> {
    match rest.split_whitespace().next() {
        None | Some("(none)") | Some("0000") => Ok(None),
        Some(mv) => parse_uci_squares(mv)
            .map(Some)
            .ok_or_else(|| EngineError::Malformed(format!("bad bestmove '{mv}'"))),
    }
}

fn parse_number<T: std::str::FromStr>(token: Option<&str>, text: &str) -> Result<T, EngineError> {
    token
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| EngineError::Malformed(format!("bad number in '{text}'")))
}

#[cfg(test)]
#[path = "uci_client_tests.rs"]
mod uci_client_tests;
