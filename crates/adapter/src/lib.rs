//! Adapter crate - runs a FICS session over TCP
//!
//! This crate drives the pure session state machine from
//! `fics-session-core` against a live chess server. It owns every effect the
//! core only describes: the socket, the clock and the fan-out of events.
//!
//! # Session Overview
//!
//! The server speaks plain text over a long-lived TCP connection:
//!
//! 1. **Connection**: the client connects (default: freechess.org:5000)
//! 2. **Login**: the server prompts `login:`; the session answers with the
//!    handle, then the password (or accepts the guest name it is offered)
//! 3. **Configuration**: after the first prompt the session sends its setup
//!    commands (quiet channels, no seeks, style 12 boards)
//! 4. **Commands**: callers submit commands; each reply runs up to the next
//!    `fics% ` prompt and is parsed into a typed result
//! 5. **Events**: style 12 boards and relay kibitzes are classified as they
//!    arrive and published on the event bus, whatever the session is doing
//!
//! Outbound commands are strictly serialised: one command in flight, and a
//! short pause after each reply before the next one goes out.
//!
//! # Environment Variables
//!
//! - `FICS_HOST`: server host (default: "freechess.org")
//! - `FICS_PORT`: server port (default: 5000)
//! - `FICS_LOGIN` / `FICS_PASSWORD`: credentials (default: guest login)
//! - `FICS_REPLY_TIMEOUT_MS`: how long to wait for a parseable reply (default: 7000)
//! - `FICS_THROTTLE_MS`: pause between commands (default: 500)
//! - `FICS_PUBLISH_OUTCOMES`: also publish resignations and draws
//! - `FICS_WIRE_LOG_PATH`: append all socket traffic to this file
//! - `FICS_OBSERVE`: comma-separated game numbers to observe on start
//! - `FICS_FOLLOW_RELAY`: observe every game the relay bot lists
//! - `FICS_DISABLED`: set to "1" or "true" to skip connecting entirely
//!
//! # Example Session
//!
//! ```text
//! Server -> Client: login:
//! Client -> Server: guest
//! Server -> Client: Press return to enter the server as "GuestWXYZ":
//! Client -> Server:
//! Server -> Client: **** Starting FICS session as GuestWXYZ(U) ****\nfics%
//! Client -> Server: set seek 0
//! ...
//! Client -> Server: observe 101
//! Server -> Client: <12> rnbqkbnr pppppppp ... B 4 ... 101 Carlsen Caruana ... P/e2-e4 (0:00) e4 0 1 0
//! ```
//!
//! # Implementation
//!
//! - Uses **tokio** for networking, timers and channels
//! - See [`transport`] for socket handling and chunk decoding
//! - See [`runtime`] for the driver task and the caller handle
//! - See [`bus`] for the broadcast publisher
//!
//! # Testing
//!
//! Point the session at a local fake server:
//!
//! ```bash
//! FICS_HOST=127.0.0.1 FICS_PORT=5000 FICS_WIRE_LOG_PATH=/tmp/fics.log cargo run
//! ```

pub mod bus;
pub mod config;
pub mod runtime;
pub mod transport;
pub mod wire_log;

pub use fics_session_core as core;
pub use fics_session_types as types;

// Re-export the runtime surface for convenience
pub use bus::{EventBus, Published};
pub use config::ServerConfig;
pub use runtime::{new_session, start, SessionDriver, SessionHandle, SessionMsg};
pub use transport::{attach, connect, ChunkDecoder, TransportCommand, TransportEvent, TransportSender};
pub use wire_log::WireLog;
