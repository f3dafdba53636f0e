use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fics_session::core::classify::{classify, style12_fields};
use fics_session::core::{NullPublisher, Session, SessionConfig};

const BOARD: &str = "<12> rnbqkbnr pppppppp -------- -------- ----P--- -------- PPPP-PPP RNBQKBNR B 4 1 1 1 1 0 42 Carlsen Caruana 0 120 0 39 39 7200 7200 1 P/e2-e4 (0:00) e4 0 1 0";
const KIBITZ: &str = "relay(TD)[42] kibitzes: The game is officially a draw.";
const CHATTER: &str = "Notification: Carlsen has arrived.";

fn bench_style12_split(c: &mut Criterion) {
    c.bench_function("style12_fields", |b| {
        b.iter(|| style12_fields(black_box(BOARD)))
    });
}

fn bench_classify(c: &mut Criterion) {
    c.bench_function("classify_move", |b| b.iter(|| classify(black_box(BOARD))));
    c.bench_function("classify_draw", |b| b.iter(|| classify(black_box(KIBITZ))));
    c.bench_function("classify_text", |b| b.iter(|| classify(black_box(CHATTER))));
}

fn bench_session_block(c: &mut Criterion) {
    let mut session = Session::new(SessionConfig::default(), Arc::new(NullPublisher));
    session.connected();
    let block = format!("{BOARD}\n{KIBITZ}\n{CHATTER}\nfics% ");

    c.bench_function("session_unsolicited_block", |b| {
        b.iter(|| session.text_received(black_box(&[block.as_str()])))
    });
}

criterion_group!(
    benches,
    bench_style12_split,
    bench_classify,
    bench_session_block
);
criterion_main!(benches);
