use fics_session::core::classify::{classify, Classified};
use fics_session::core::noise::NoiseFilter;
use fics_session::types::{ClassifiedEvent, GameId, END_OF_REPLY_MARKER};

fn style12(side: &str, game: u32, move_number: u32, pretty: &str) -> String {
    format!(
        "<12> r-bqkb-r pppp-ppp --n--n-- ----p--- ----P--- -----N-- PPPP-PPP RNBQKB-R {side} -1 1 1 1 1 2 {game} Nepo Ding 0 90 30 38 38 5100 5200 {move_number} N/g1-f3 (0:12) {pretty} 0 1 0"
    )
}

#[test]
fn black_to_move_on_move_five_is_ply_nine() {
    let line = style12("B", 42, 5, "Nf3");
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
fn white_to_move_counts_blacks_reply() {
    let line = style12("W", 7, 12, "Qxd8+");
    let Classified::Event(ClassifiedEvent::Move { ply, notation, .. }) = classify(&line) else {
        panic!("expected move");
    };
    assert_eq!(ply, 22);
    assert_eq!(notation, "Qxd8+");
}

#[test]
fn relay_resign_and_draw() {
    assert_eq!(
        classify("relay(TD)[42] kibitzes: Bob has resigned"),
        Classified::Event(ClassifiedEvent::Resign {
            game_id: GameId(42),
            loser: "Bob".to_string()
        })
    );
    assert_eq!(
        classify("relay(TD)[42] kibitzes: The game is officially a draw..."),
        Classified::Event(ClassifiedEvent::Draw { game_id: GameId(42) })
    );
}

#[test]
fn malformed_lines_fall_through_as_text() {
    for line in [
        "<12> truncated board",
        "<12> rnbqkbnr pppppppp -------- -------- -------- -------- PPPPPPPP RNBQKBNR W -1 1 1 1 1 0 x Nepo Ding 0 90 30 39 39 5400 5400 1 none (0:00) none 0 0 0",
        "relay(TD)[abc] kibitzes: Bob has resigned",
        "Bob has resigned",
        "fics% ",
    ] {
        assert_eq!(classify(line), Classified::Text(line), "line: {line}");
    }
}

#[test]
fn marker_only_block_produces_no_diagnostic() {
    let filter = NoiseFilter::new(END_OF_REPLY_MARKER);
    assert_eq!(filter.diagnostic(&[END_OF_REPLY_MARKER]), None);
    assert_eq!(filter.diagnostic(&["", "fics%", "  "]), None);
    assert_eq!(
        filter.diagnostic(&["Style 12 set.", "fics% "]),
        None,
        "known setting acknowledgements are noise"
    );
    assert_eq!(
        filter.diagnostic(&["Notification: Bob has arrived.", "fics% "]),
        Some("Notification: Bob has arrived.".to_string())
    );
}
