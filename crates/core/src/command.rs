//! Command protocol - correlating a sent command with its reply
//!
//! A [`CommandProtocol`] knows its outbound text and how to read the reply out
//! of the lines accumulated since it was sent. The session holds the command
//! in type-erased form as an [`Exchange`], which also owns the delivery path
//! back to the caller waiting on it.

use std::fmt;

use crate::error::SessionError;
use crate::types::GameId;

/// Outcome of offering accumulated reply lines to a parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome<T> {
    /// More lines are needed.
    Incomplete,
    Parsed(T),
}

/// A server command with a typed reply.
pub trait CommandProtocol: Send + 'static {
    type Output: Send + 'static;

    /// Text sent to the server (without line terminator).
    fn text(&self) -> String;

    /// Attempt to parse the reply from every non-event line received so far.
    ///
    /// `marker` is the session's end-of-reply prompt.
    fn parse(&self, lines: &[String], marker: &str) -> ParseOutcome<Self::Output>;
}

/// The outstanding command as seen by the session.
pub trait Exchange: Send {
    fn text(&self) -> &str;

    /// Offer the accumulated reply. Returns `true` once the reply parsed and
    /// was delivered to the caller.
    fn offer(&mut self, lines: &[String], marker: &str) -> bool;

    /// Resolve the caller with an error.
    fn fail(self: Box<Self>, error: SessionError);
}

type Deliver<T> = Box<dyn FnOnce(Result<T, SessionError>) + Send>;

/// A command paired with the callback that resolves its caller.
pub struct Correlated<C: CommandProtocol> {
    command: C,
    text: String,
    deliver: Option<Deliver<C::Output>>,
}

impl<C: CommandProtocol> Correlated<C> {
    pub fn new<F>(command: C, deliver: F) -> Self
    where
        F: FnOnce(Result<C::Output, SessionError>) + Send + 'static,
    {
        let text = command.text();
        Self {
            command,
            text,
            deliver: Some(Box::new(deliver)),
        }
    }
}

impl<C: CommandProtocol> Exchange for Correlated<C> {
    fn text(&self) -> &str {
        &self.text
    }

    fn offer(&mut self, lines: &[String], marker: &str) -> bool {
        match self.command.parse(lines, marker) {
            ParseOutcome::Incomplete => false,
            ParseOutcome::Parsed(output) => {
                if let Some(deliver) = self.deliver.take() {
                    deliver(Ok(output));
                }
                true
            }
        }
    }

    fn fail(mut self: Box<Self>, error: SessionError) {
        if let Some(deliver) = self.deliver.take() {
            deliver(Err(error));
        }
    }
}

/// Work a caller hands to the session.
pub enum Request {
    Command(Box<dyn Exchange>),
    Observe(GameId),
}

impl Request {
    pub fn command<C, F>(command: C, deliver: F) -> Self
    where
        C: CommandProtocol,
        F: FnOnce(Result<C::Output, SessionError>) + Send + 'static,
    {
        Request::Command(Box::new(Correlated::new(command, deliver)))
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Command(exchange) => f.debug_tuple("Command").field(&exchange.text()).finish(),
            Request::Observe(id) => f.debug_tuple("Observe").field(id).finish(),
        }
    }
}
