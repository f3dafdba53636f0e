//! Session configuration.

use std::fmt;
use std::time::Duration;

use crate::types::{
    DEFAULT_LOGIN, END_OF_REPLY_MARKER, REPLY_TIMEOUT_MS, SETUP_COMMANDS, THROTTLE_MS,
};

/// Credentials, login sequence and timings for one session.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub login: String,
    pub password: String,
    /// Sent once, in order, on the first block after login.
    pub setup_commands: Vec<String>,
    /// End-of-reply prompt; also the transport delimiter after login.
    pub marker: String,
    pub reply_timeout: Duration,
    pub throttle: Duration,
    /// Publish resignations and draws alongside moves.
    pub publish_outcomes: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            login: DEFAULT_LOGIN.to_string(),
            password: String::new(),
            setup_commands: SETUP_COMMANDS.iter().map(|s| s.to_string()).collect(),
            marker: END_OF_REPLY_MARKER.to_string(),
            reply_timeout: Duration::from_millis(REPLY_TIMEOUT_MS),
            throttle: Duration::from_millis(THROTTLE_MS),
            publish_outcomes: false,
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("login", &self.login)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .field("setup_commands", &self.setup_commands)
            .field("marker", &self.marker)
            .field("reply_timeout", &self.reply_timeout)
            .field("throttle", &self.throttle)
            .field("publish_outcomes", &self.publish_outcomes)
            .finish()
    }
}
