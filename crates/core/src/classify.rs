//! Event classifier - maps one server line to an event or plain text
//!
//! Matchers run in a fixed order and the first hit wins:
//!
//! 1. [`match_move`]: style 12 board line (`<12> ...`)
//! 2. [`match_resign`]: relay kibitz announcing a resignation
//! 3. [`match_draw`]: relay kibitz announcing a draw
//!
//! The patterns are not mutually exclusive by construction (a player handle in
//! a style 12 line is free text), so the order is part of the contract.
//! Anything that fails a matcher, including lines whose fields are present but
//! malformed, falls through as [`Classified::Text`].

use std::sync::LazyLock;

use arrayvec::ArrayVec;
use regex::Regex;

use crate::types::{ply_number, ClassifiedEvent, GameId, Side};

/// Upper bound on the fields kept from a style 12 line.
pub const STYLE12_MAX_FIELDS: usize = 40;

/// Field positions in a style 12 line (`<12>` is field 0).
const FIELD_SIDE_TO_MOVE: usize = 9;
const FIELD_GAME_ID: usize = 16;
const FIELD_MOVE_NUMBER: usize = 26;
const FIELD_PRETTY_MOVE: usize = 29;

static RESIGN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\w+\([^)]*\)\[(\d+)\] kibitzes: (\S+) has resigned")
        .expect("resign regex is valid")
});

static DRAW_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\w+\([^)]*\)\[(\d+)\] kibitzes: The game is officially a draw")
        .expect("draw regex is valid")
});

/// Result of classifying a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified<'a> {
    Event(ClassifiedEvent),
    Text(&'a str),
}

pub type Matcher = fn(&str) -> Option<ClassifiedEvent>;

/// Matchers in priority order.
pub const MATCHERS: [(&str, Matcher); 3] = [
    ("move", match_move),
    ("resign", match_resign),
    ("draw", match_draw),
];

/// Classify one line.
pub fn classify(line: &str) -> Classified<'_> {
    for (_, matcher) in MATCHERS.iter() {
        if let Some(event) = matcher(line) {
            return Classified::Event(event);
        }
    }
    Classified::Text(line)
}

/// Split a style 12 line into whitespace-separated fields without allocating.
///
/// Returns `None` if the line does not start with the `<12>` tag.
pub fn style12_fields(line: &str) -> Option<ArrayVec<&str, STYLE12_MAX_FIELDS>> {
    let line = line.trim_start();
    if !line.starts_with("<12> ") {
        return None;
    }
    Some(line.split_whitespace().take(STYLE12_MAX_FIELDS).collect())
}

pub fn match_move(line: &str) -> Option<ClassifiedEvent> {
    let fields = style12_fields(line)?;

    let side = Side::from_code(fields.get(FIELD_SIDE_TO_MOVE)?)?;
    let game_id: GameId = fields.get(FIELD_GAME_ID)?.parse().ok()?;
    let move_number: u32 = fields.get(FIELD_MOVE_NUMBER)?.parse().ok()?;
    let notation = *fields.get(FIELD_PRETTY_MOVE)?;
    // Initial position of a freshly observed game.
    if notation == "none" {
        return None;
    }
    let ply = ply_number(move_number, side)?;

    Some(ClassifiedEvent::Move {
        game_id,
        notation: notation.to_string(),
        ply,
        raw_line: line.trim().to_string(),
    })
}

pub fn match_resign(line: &str) -> Option<ClassifiedEvent> {
    let caps = RESIGN_REGEX.captures(line)?;
    Some(ClassifiedEvent::Resign {
        game_id: caps[1].parse().ok()?,
        loser: caps[2].to_string(),
    })
}

pub fn match_draw(line: &str) -> Option<ClassifiedEvent> {
    let caps = DRAW_REGEX.captures(line)?;
    Some(ClassifiedEvent::Draw {
        game_id: caps[1].parse().ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style12(side: &str, game: &str, move_number: &str, pretty: &str) -> String {
        format!(
            "<12> rnbqkbnr pppppppp -------- -------- -------- -----N-- PPPPPPPP RNBQKB-R {side} -1 1 1 1 1 1 {game} Carlsen Caruana 0 120 0 39 39 7200 7200 {move_number} N/g1-f3 (0:05) {pretty} 0 1 0"
        )
    }

    #[test]
    fn test_move_ply_from_black_to_move() {
        let line = style12("B", "42", "5", "Nf3");
        match classify(&line) {
            Classified::Event(ClassifiedEvent::Move {
                game_id,
                notation,
                ply,
                raw_line,
            }) => {
                assert_eq!(game_id, GameId(42));
                assert_eq!(notation, "Nf3");
                assert_eq!(ply, 9);
                assert_eq!(raw_line, line);
            }
            other => panic!("expected move, got {other:?}"),
        }
    }

    #[test]
    fn test_move_ply_from_white_to_move() {
        let line = style12("W", "7", "12", "Bxc6");
        let Some(ClassifiedEvent::Move { ply, .. }) = match_move(&line) else {
            panic!("expected move");
        };
        assert_eq!(ply, 22);
    }

    #[test]
    fn test_move_rejects_non_numeric_fields() {
        assert_eq!(match_move(&style12("B", "x42", "5", "Nf3")), None);
        assert_eq!(match_move(&style12("B", "42", "five", "Nf3")), None);
        assert_eq!(match_move(&style12("X", "42", "5", "Nf3")), None);
    }

    #[test]
    fn test_move_rejects_truncated_line() {
        assert_eq!(match_move("<12> rnbqkbnr pppppppp B 42"), None);
    }

    #[test]
    fn test_move_ignores_initial_position() {
        assert_eq!(match_move(&style12("W", "42", "1", "none")), None);
    }

    #[test]
    fn test_resign() {
        assert_eq!(
            classify("relay(X)[42] kibitzes: Bob has resigned"),
            Classified::Event(ClassifiedEvent::Resign {
                game_id: GameId(42),
                loser: "Bob".to_string(),
            })
        );
    }

    #[test]
    fn test_draw() {
        assert_eq!(
            classify("relay(X)[42] kibitzes: The game is officially a draw..."),
            Classified::Event(ClassifiedEvent::Draw {
                game_id: GameId(42)
            })
        );
    }

    #[test]
    fn test_kibitz_with_oversized_id_is_text() {
        let line = "relay(X)[99999999999] kibitzes: Bob has resigned";
        assert_eq!(classify(line), Classified::Text(line));
    }

    #[test]
    fn test_plain_text_passes_through() {
        let line = "Game 42: Carlsen (2830) Caruana (2805) rated standard 120 0";
        assert_eq!(classify(line), Classified::Text(line));
    }

    #[test]
    fn test_matcher_order() {
        let names: Vec<&str> = MATCHERS.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ["move", "resign", "draw"]);
    }
}
