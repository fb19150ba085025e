//! Sandboxed expression evaluation.
//!
//! Expressions typed by users are evaluated in a separate worker process,
//! reached over a line-based pipe. The worker is spawned lazily, survives
//! across calls, and is killed and respawned when a call outruns the
//! wall-clock timeout. At most one worker exists per `Evaluator`, and the
//! pipe is owned exclusively by it.

pub mod expr;
pub mod worker;

pub use expr::EvalError;

use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

/// Default wall-clock budget for a single evaluation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Argument that makes the bot binary run the worker loop instead.
pub const WORKER_ARG: &str = "eval-worker";

/// Evaluates expressions in an isolated worker process.
pub struct Evaluator {
    program: Option<PathBuf>,
    timeout: Duration,
    worker: Option<WorkerHandle>,
}

struct WorkerHandle {
    child: Child,
    stdin: ChildStdin,
    replies: mpsc::Receiver<String>,
}

impl Evaluator {
    /// An evaluator that re-invokes the current executable as its worker.
    pub fn new(timeout: Duration) -> Self {
        Self {
            program: None,
            timeout,
            worker: None,
        }
    }

    /// An evaluator spawning a specific worker binary. Used by tests,
    /// where the current executable is the test harness.
    pub fn with_program(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: Some(program.into()),
            timeout,
            worker: None,
        }
    }

    /// Evaluates one expression, returning the response text: either
    /// `"= <result>"` or one of the categorized error strings. Never
    /// fails outright; a broken or slow worker is torn down and reported
    /// as its error category, and the next call starts a fresh one.
    pub fn evaluate(&mut self, expression: &str) -> String {
        // The pipe protocol is one line per message.
        let expression: String = expression
            .chars()
            .filter(|c| *c != '\n' && *c != '\r')
            .collect();

        match self.exchange(&expression) {
            Ok(reply) => sanitize(&reply),
            Err(category) => {
                self.reset();
                category.to_string()
            }
        }
    }

    fn exchange(&mut self, expression: &str) -> Result<String, EvalError> {
        let timeout = self.timeout;
        let worker = match self.ensure_worker() {
            Ok(worker) => worker,
            Err(e) => {
                warn!("Could not spawn evaluation worker: {}", e);
                return Err(EvalError::Other);
            }
        };

        if writeln!(worker.stdin, "{expression}")
            .and_then(|_| worker.stdin.flush())
            .is_err()
        {
            return Err(EvalError::Other);
        }

        match worker.replies.recv_timeout(timeout) {
            Ok(reply) => Ok(reply),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(EvalError::TimedOut),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(EvalError::Other),
        }
    }

    fn ensure_worker(&mut self) -> io::Result<&mut WorkerHandle> {
        if self.worker.is_none() {
            self.worker = Some(self.spawn()?);
        }
        match self.worker.as_mut() {
            Some(worker) => Ok(worker),
            None => Err(io::Error::new(io::ErrorKind::Other, "worker vanished")),
        }
    }

    fn spawn(&self) -> io::Result<WorkerHandle> {
        let program = match &self.program {
            Some(program) => program.clone(),
            None => std::env::current_exe()?,
        };
        let mut child = Command::new(program)
            .arg(WORKER_ARG)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "worker stdin unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "worker stdout unavailable"))?;

        // Reader thread feeding a channel, so the caller can wait with a
        // timeout. It exits when the pipe closes or the handle is dropped.
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let reader = BufReader::new(stdout);
            for line in reader.lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        });

        info!("Spawned evaluation worker (pid {})", child.id());
        Ok(WorkerHandle {
            child,
            stdin,
            replies: rx,
        })
    }

    /// Kills and reaps the worker, if any. The next call respawns one.
    fn reset(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            let _ = worker.child.kill();
            let _ = worker.child.wait();
            info!("Evaluation worker torn down");
        }
    }
}

impl Drop for Evaluator {
    fn drop(&mut self) {
        self.reset();
    }
}

/// Strips non-printable control characters from a worker reply.
fn sanitize(reply: &str) -> String {
    reply.chars().filter(|c| (*c as u32) >= 32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_control_characters() {
        assert_eq!(sanitize("= 5\u{7}\u{1b}[2J"), "= 5[2J");
        assert_eq!(sanitize("plain"), "plain");
    }
}
