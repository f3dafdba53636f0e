//! Core session logic - pure, deterministic, and testable
//!
//! This crate contains the protocol rules of a FICS session: reading the
//! server's text, recognising game events, correlating command replies and
//! pacing outbound traffic. It performs **no I/O**; sockets, clocks and task
//! spawning live in the adapter crate. That makes it:
//!
//! - **Deterministic**: the same inputs always produce the same actions
//! - **Testable**: every transition is reachable from a plain unit test
//! - **Portable**: any runtime can drive it by executing [`session::Action`]s
//!
//! # Module Structure
//!
//! - [`classify`]: ordered line matchers for moves, resignations and draws
//! - [`noise`]: suppression of uninteresting server text in diagnostics
//! - [`command`]: the command/reply contract and the type-erased exchange
//! - [`commands`]: stock commands (raw text, relay game list)
//! - [`config`]: credentials, setup sequence and timings
//! - [`publish`]: the event publisher seam
//! - [`session`]: the session state machine
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use fics_session_core::publish::NullPublisher;
//! use fics_session_core::session::{Action, Session, SessionState};
//! use fics_session_core::SessionConfig;
//!
//! let mut session = Session::new(SessionConfig::default(), Arc::new(NullPublisher));
//! session.connected();
//!
//! let actions = session.text_received(&["login: "]);
//! assert_eq!(actions, vec![Action::Send("guest".to_string())]);
//! assert_eq!(session.state(), SessionState::LoggingIn);
//! ```

pub mod classify;
pub mod command;
pub mod commands;
pub mod config;
pub mod error;
pub mod noise;
pub mod publish;
pub mod session;

pub use fics_session_types as types;

// Re-export commonly used types for convenience
pub use classify::{classify, Classified};
pub use command::{CommandProtocol, Correlated, Exchange, ParseOutcome, Request};
pub use commands::{RawCommand, RelayGame, RelayListGames};
pub use config::SessionConfig;
pub use error::SessionError;
pub use publish::{EventPublisher, NullPublisher};
pub use session::{Action, BufferMode, Session, SessionState, TimerId, TimerKind};
