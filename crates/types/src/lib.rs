//! Core types module - shared data structures and protocol constants
//!
//! This module defines the fundamental types used throughout the session driver.
//! All types are plain data with no I/O, so they can travel freely between the
//! pure session logic, the tokio runtime and downstream subscribers.
//!
//! # Protocol Constants
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `END_OF_REPLY_MARKER` | `"fics% "` | Prompt printed after every completed reply |
//! | `LOGIN_PROMPT` | `"login:"` | Server asks for a handle |
//! | `PASSWORD_PROMPT` | `"password:"` | Server asks for the password of a registered handle |
//! | `GUEST_PROMPT` | `"Press return to enter the server as"` | Server offers a guest handle |
//!
//! # Session Timing Constants
//!
//! Timing values are in milliseconds:
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `REPLY_TIMEOUT_MS` | 7000 | Longest wait for a command reply to parse |
//! | `THROTTLE_MS` | 500 | Cooldown after every completed exchange |
//!
//! # Examples
//!
//! ```
//! use fics_session_types::{ply_number, ClassifiedEvent, GameId, Side};
//!
//! let id: GameId = "42".parse().unwrap();
//! assert_eq!(id, GameId(42));
//!
//! // Black to move on move 5: white's fifth move was just played.
//! assert_eq!(ply_number(5, Side::Black), Some(9));
//!
//! let ev = ClassifiedEvent::Draw { game_id: id };
//! assert_eq!(ev.game_id(), GameId(42));
//! ```

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Prompt the server prints once a command reply is complete.
pub const END_OF_REPLY_MARKER: &str = "fics% ";

/// Trailing text of the handle prompt.
pub const LOGIN_PROMPT: &str = "login:";

/// Trailing text of the password prompt (registered handles only).
pub const PASSWORD_PROMPT: &str = "password:";

/// Leading text of the prompt offered to unregistered handles.
pub const GUEST_PROMPT: &str = "Press return to enter the server as";

/// Reply timeout for the outstanding command (7s).
pub const REPLY_TIMEOUT_MS: u64 = 7_000;

/// Cooldown enforced after every completed exchange (500ms).
pub const THROTTLE_MS: u64 = 500;

/// Default server host.
pub const DEFAULT_HOST: &str = "freechess.org";

/// Default server port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default login handle.
pub const DEFAULT_LOGIN: &str = "guest";

/// One-time configuration sent after login.
///
/// Silences seek ads, shouts and channel traffic, stops arrival/game
/// notifications, gates match offers behind an unreachable rating and
/// switches board output to style 12.
pub const SETUP_COMMANDS: [&str; 8] = [
    "set seek 0",
    "set shout 0",
    "set cshout 0",
    "set chanoff 1",
    "set pin 0",
    "set gin 0",
    "set formula rating >= 9999",
    "set style 12",
];

/// Topic for move events.
pub const MOVE_TOPIC: &str = "fics.move";

/// Topic for resignation events.
pub const RESIGN_TOPIC: &str = "fics.resign";

/// Topic for draw events.
pub const DRAW_TOPIC: &str = "fics.draw";

/// Server-side game number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub u32);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GameId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(GameId)
    }
}

/// Side to move, as reported in a style 12 line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    White,
    Black,
}

impl Side {
    /// Parse the single-letter code used on the wire (`W` / `B`).
    ///
    /// # Examples
    ///
    /// ```
    /// use fics_session_types::Side;
    ///
    /// assert_eq!(Side::from_code("W"), Some(Side::White));
    /// assert_eq!(Side::from_code("B"), Some(Side::Black));
    /// assert_eq!(Side::from_code("b"), None);
    /// ```
    pub fn from_code(s: &str) -> Option<Self> {
        match s {
            "W" => Some(Side::White),
            "B" => Some(Side::Black),
            _ => None,
        }
    }
}

/// Half-move count of the move that produced a position.
///
/// `move_number` is the number of the move about to be played. With black to
/// move, white has just played that move; with white to move, black has just
/// completed the previous one. Returns `None` for move number 0.
pub fn ply_number(move_number: u32, side_to_move: Side) -> Option<u32> {
    let base = move_number.checked_sub(1)?.checked_mul(2)?;
    match side_to_move {
        Side::Black => base.checked_add(1),
        Side::White => Some(base),
    }
}

/// An unsolicited game event recognised in the server stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClassifiedEvent {
    Move {
        game_id: GameId,
        notation: String,
        ply: u32,
        raw_line: String,
    },
    Resign {
        game_id: GameId,
        loser: String,
    },
    Draw {
        game_id: GameId,
    },
}

impl ClassifiedEvent {
    pub fn game_id(&self) -> GameId {
        match self {
            ClassifiedEvent::Move { game_id, .. }
            | ClassifiedEvent::Resign { game_id, .. }
            | ClassifiedEvent::Draw { game_id } => *game_id,
        }
    }

    /// Bus topic this event is delivered under.
    pub fn topic(&self) -> &'static str {
        match self {
            ClassifiedEvent::Move { .. } => MOVE_TOPIC,
            ClassifiedEvent::Resign { .. } => RESIGN_TOPIC,
            ClassifiedEvent::Draw { .. } => DRAW_TOPIC,
        }
    }
}

impl fmt::Display for ClassifiedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifiedEvent::Move {
                game_id,
                notation,
                ply,
                ..
            } => write!(f, "game {game_id}: ply {ply} {notation}"),
            ClassifiedEvent::Resign { game_id, loser } => {
                write!(f, "game {game_id}: {loser} resigned")
            }
            ClassifiedEvent::Draw { game_id } => write!(f, "game {game_id}: drawn"),
        }
    }
}
