//! Errors surfaced to callers of the session.

/// Failure of a submitted command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// No parseable reply arrived within the reply window.
    #[error("command timed out waiting for a reply: {command}")]
    Timeout { command: String },
    /// The connection is gone; the session will not serve further commands.
    #[error("session closed")]
    Closed,
}
