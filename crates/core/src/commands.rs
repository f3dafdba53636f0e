//! Stock commands.

use std::sync::LazyLock;

use regex::Regex;

use crate::command::{CommandProtocol, ParseOutcome};
use crate::types::GameId;

static RELAY_ROW_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^:(\d+)\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)").expect("relay row regex is valid")
});

fn is_marker(line: &str, marker: &str) -> bool {
    line.trim() == marker.trim()
}

/// One row of the relay game list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayGame {
    pub game_id: GameId,
    pub white: String,
    pub black: String,
    pub result: String,
    pub eco: String,
}

/// Any command whose reply is simply the text up to the next prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCommand {
    text: String,
}

impl RawCommand {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl CommandProtocol for RawCommand {
    type Output = Vec<String>;

    fn text(&self) -> String {
        self.text.clone()
    }

    fn parse(&self, lines: &[String], marker: &str) -> ParseOutcome<Vec<String>> {
        match lines.iter().position(|l| is_marker(l, marker)) {
            Some(end) => ParseOutcome::Parsed(
                lines[..end]
                    .iter()
                    .filter(|l| !l.trim().is_empty())
                    .cloned()
                    .collect(),
            ),
            None => ParseOutcome::Incomplete,
        }
    }
}

/// `tell relay listgames`: the games the relay bot is currently broadcasting.
///
/// The bot answers with `:`-prefixed qtell rows that arrive after the
/// server's own acknowledgement prompt, so the reply is complete at the first
/// prompt that follows a `:` row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayListGames;

impl CommandProtocol for RelayListGames {
    type Output = Vec<RelayGame>;

    fn text(&self) -> String {
        "tell relay listgames".to_string()
    }

    fn parse(&self, lines: &[String], marker: &str) -> ParseOutcome<Vec<RelayGame>> {
        let Some(last_row) = lines.iter().rposition(|l| l.starts_with(':')) else {
            return ParseOutcome::Incomplete;
        };
        if !lines[last_row..].iter().any(|l| is_marker(l, marker)) {
            return ParseOutcome::Incomplete;
        }

        let games = lines
            .iter()
            .filter_map(|l| {
                let caps = RELAY_ROW_REGEX.captures(l)?;
                Some(RelayGame {
                    game_id: caps[1].parse().ok()?,
                    white: caps[2].to_string(),
                    black: caps[3].to_string(),
                    result: caps[4].to_string(),
                    eco: caps[5].to_string(),
                })
            })
            .collect();
        ParseOutcome::Parsed(games)
    }
}
