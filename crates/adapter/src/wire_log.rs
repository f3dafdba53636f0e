//! Append-only record of everything crossing the socket.
//!
//! Each line is `<ms-since-epoch> <dir> <text>` where `<dir>` is `<` for
//! server text and `>` for what the session sent. The login password is
//! written as `***`.

use std::fmt::Write as _;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Inbound,
    Outbound,
}

#[derive(Debug)]
struct WireRecord {
    at_ms: u64,
    direction: Direction,
    text: String,
}

/// Cheap cloneable handle to the writer task.
#[derive(Debug, Clone)]
pub struct WireLog {
    tx: mpsc::UnboundedSender<WireRecord>,
    secret: Option<String>,
}

impl WireLog {
    /// Spawn the writer task appending to `path`.
    ///
    /// Must be called from within a tokio runtime. If the file cannot be
    /// opened the task logs a warning and records are silently dropped.
    pub fn spawn(path: impl Into<String>, secret: Option<String>) -> Self {
        let path = path.into();
        let (tx, mut rx) = mpsc::unbounded_channel::<WireRecord>();
        tokio::spawn(async move {
            use tokio::fs::OpenOptions;
            use tokio::io::AsyncWriteExt;

            let mut file = match OpenOptions::new().create(true).append(true).open(&path).await {
                Ok(f) => f,
                Err(e) => {
                    warn!(%path, error = %e, "wire log unavailable");
                    return;
                }
            };

            let mut buf = String::with_capacity(4096);
            while let Some(rec) = rx.recv().await {
                buf.clear();
                let dir = match rec.direction {
                    Direction::Inbound => '<',
                    Direction::Outbound => '>',
                };
                for line in rec.text.lines() {
                    let _ = writeln!(buf, "{} {} {}", rec.at_ms, dir, line);
                }
                if rec.text.is_empty() {
                    let _ = writeln!(buf, "{} {}", rec.at_ms, dir);
                }
                if file.write_all(buf.as_bytes()).await.is_err() {
                    break;
                }
            }

            let _ = file.flush().await;
        });

        Self {
            tx,
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    pub fn inbound(&self, text: &str) {
        self.record(Direction::Inbound, text.to_string());
    }

    pub fn outbound(&self, text: &str) {
        let text = match &self.secret {
            Some(secret) if secret == text => "***".to_string(),
            _ => text.to_string(),
        };
        self.record(Direction::Outbound, text);
    }

    fn record(&self, direction: Direction, text: String) {
        let _ = self.tx.send(WireRecord {
            at_ms: current_timestamp_ms(),
            direction,
            text,
        });
    }
}

fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
