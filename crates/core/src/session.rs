//! Session state machine - pure, I/O-free protocol driver
//!
//! The session consumes one input at a time (connection, received text, a
//! caller request or a timer expiry) and answers with the [`Action`]s the
//! runtime must perform. It never touches a socket or a clock itself, which
//! keeps every transition deterministic and testable.
//!
//! # States
//!
//! ```text
//! Connecting -> LoggingIn -> Configuring -> Throttled <-> Ready <-> Running
//!                                               ^                     |
//!                                               +---------------------+
//! ```
//!
//! - At most one command is outstanding, and only while `Running`.
//! - Every finished exchange (parsed or timed out) passes through `Throttled`.
//! - Requests arriving outside `Ready` are queued and replayed in submission
//!   order when `Ready` is entered again.
//!
//! # Timers
//!
//! Timers are requested with [`Action::StartTimer`] and reported back through
//! [`Session::timer_fired`]. Each carries the epoch current at arming time;
//! any state change bumps the epoch, so a timer that outlived its state is
//! ignored.

use std::collections::VecDeque;
use std::mem;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::classify::{classify, Classified};
use crate::command::{Exchange, Request};
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::noise::NoiseFilter;
use crate::publish::EventPublisher;
use crate::types::{ClassifiedEvent, GUEST_PROMPT, LOGIN_PROMPT, PASSWORD_PROMPT};

/// Protocol phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Connecting,
    LoggingIn,
    Configuring,
    Ready,
    Running,
    Throttled,
}

/// How the transport should cut the inbound byte stream into chunks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BufferMode {
    /// Deliver whatever each read produced.
    Raw,
    /// Hold bytes until the delimiter; each chunk ends with it.
    Delimited(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Reply,
    Throttle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId {
    pub kind: TimerKind,
    epoch: u64,
}

/// Effect the runtime must carry out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Send(String),
    SetBufferMode(BufferMode),
    StartTimer(TimerId, Duration),
}

struct Outstanding {
    exchange: Box<dyn Exchange>,
    lines: Vec<String>,
}

pub struct Session {
    config: SessionConfig,
    state: SessionState,
    outstanding: Option<Outstanding>,
    pending: VecDeque<Request>,
    timer_epoch: u64,
    noise: NoiseFilter,
    publisher: Arc<dyn EventPublisher>,
}

impl Session {
    pub fn new(config: SessionConfig, publisher: Arc<dyn EventPublisher>) -> Self {
        let noise = NoiseFilter::new(&config.marker);
        Self {
            config,
            state: SessionState::Connecting,
            outstanding: None,
            pending: VecDeque::new(),
            timer_epoch: 0,
            noise,
            publisher,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Text of the command awaiting its reply, if any.
    pub fn outstanding_command(&self) -> Option<&str> {
        self.outstanding.as_ref().map(|o| o.exchange.text())
    }

    /// The transport is up and can send.
    pub fn connected(&mut self) -> Vec<Action> {
        if self.state == SessionState::Connecting {
            info!("connected, waiting for login prompt");
            self.state = SessionState::LoggingIn;
        } else {
            warn!(state = ?self.state, "connection reported twice");
        }
        Vec::new()
    }

    /// Chunks decoded by the transport, in arrival order.
    pub fn text_received<S: AsRef<str>>(&mut self, chunks: &[S]) -> Vec<Action> {
        let mut out = Vec::new();
        for chunk in chunks {
            self.on_chunk(chunk.as_ref(), &mut out);
        }
        self.check_invariants();
        out
    }

    /// A caller submitted a command or an observe request.
    pub fn submit(&mut self, request: Request) -> Vec<Action> {
        let mut out = Vec::new();
        self.accept(request, &mut out);
        self.check_invariants();
        out
    }

    pub fn timer_fired(&mut self, timer: TimerId) -> Vec<Action> {
        let mut out = Vec::new();
        if timer.epoch != self.timer_epoch {
            debug!(?timer, "stale timer ignored");
            return out;
        }

        match (timer.kind, self.state) {
            (TimerKind::Reply, SessionState::Running) => {
                if let Some(outstanding) = self.outstanding.take() {
                    let command = outstanding.exchange.text().to_string();
                    warn!(
                        command = %command,
                        discarded = outstanding.lines.len(),
                        "no parseable reply before timeout"
                    );
                    for line in &outstanding.lines {
                        debug!(target: "fics::server", "discarded: {line}");
                    }
                    outstanding.exchange.fail(SessionError::Timeout { command });
                }
                self.enter_throttled(&mut out);
            }
            (TimerKind::Throttle, SessionState::Throttled) => self.enter_ready(&mut out),
            _ => debug!(?timer, state = ?self.state, "timer does not apply to state"),
        }

        self.check_invariants();
        out
    }

    /// The transport closed. Every waiting caller is failed; the session is
    /// unusable afterwards.
    pub fn shutdown(&mut self) {
        if let Some(outstanding) = self.outstanding.take() {
            outstanding.exchange.fail(SessionError::Closed);
        }
        for request in self.pending.drain(..) {
            if let Request::Command(exchange) = request {
                exchange.fail(SessionError::Closed);
            }
        }
        self.timer_epoch += 1;
        self.state = SessionState::Connecting;
    }

    fn on_chunk(&mut self, chunk: &str, out: &mut Vec<Action>) {
        match self.state {
            SessionState::LoggingIn => {
                let tail = chunk.trim_end();
                if tail.ends_with(LOGIN_PROMPT) {
                    debug!("sending login handle");
                    out.push(Action::Send(self.config.login.clone()));
                } else if tail.ends_with(PASSWORD_PROMPT) {
                    debug!("sending password");
                    self.enter_configuring(out);
                    out.push(Action::Send(self.config.password.clone()));
                } else if is_guest_prompt(tail) {
                    debug!("accepting guest handle");
                    self.enter_configuring(out);
                    out.push(Action::Send(String::new()));
                } else {
                    self.dispatch_unsolicited(chunk);
                }
            }
            SessionState::Configuring => {
                self.dispatch_unsolicited(chunk);
                info!(commands = self.config.setup_commands.len(), "configuring session");
                for command in &self.config.setup_commands {
                    out.push(Action::Send(command.clone()));
                }
                self.enter_throttled(out);
            }
            SessionState::Running => self.on_reply_text(chunk, out),
            _ => self.dispatch_unsolicited(chunk),
        }
    }

    fn on_reply_text(&mut self, chunk: &str, out: &mut Vec<Action>) {
        let Some(mut outstanding) = self.outstanding.take() else {
            self.dispatch_unsolicited(chunk);
            return;
        };

        let mut saw_event = false;
        let mut text = Vec::new();
        for line in chunk.lines() {
            match classify(line) {
                Classified::Event(event) => {
                    saw_event = true;
                    self.dispatch_event(event);
                }
                Classified::Text(t) => text.push(t),
            }
        }

        // A block that carried only events is its own prompt-terminated
        // message, not part of the reply.
        let marker = self.config.marker.trim();
        if saw_event && text.iter().all(|t| t.trim().is_empty() || t.trim() == marker) {
            self.outstanding = Some(outstanding);
            return;
        }
        outstanding.lines.extend(text.into_iter().map(str::to_string));

        if outstanding.exchange.offer(&outstanding.lines, &self.config.marker) {
            debug!(command = outstanding.exchange.text(), "reply parsed");
            self.enter_throttled(out);
        } else {
            self.outstanding = Some(outstanding);
        }
    }

    fn dispatch_unsolicited(&self, chunk: &str) {
        let mut text = Vec::new();
        for line in chunk.lines() {
            match classify(line) {
                Classified::Event(event) => self.dispatch_event(event),
                Classified::Text(t) => text.push(t),
            }
        }
        if let Some(block) = self.noise.diagnostic(&text) {
            info!(target: "fics::server", "{block}");
        }
    }

    fn dispatch_event(&self, event: ClassifiedEvent) {
        match event {
            ClassifiedEvent::Move { .. } => {
                debug!(%event, "move");
                self.publisher.publish(event.topic(), event);
            }
            ClassifiedEvent::Resign { .. } | ClassifiedEvent::Draw { .. } => {
                info!(target: "fics::event", "{event}");
                if self.config.publish_outcomes {
                    self.publisher.publish(event.topic(), event);
                }
            }
        }
    }

    fn accept(&mut self, request: Request, out: &mut Vec<Action>) {
        if self.state != SessionState::Ready {
            debug!(?request, state = ?self.state, depth = self.pending.len() + 1, "queued");
            self.pending.push_back(request);
            return;
        }

        match request {
            Request::Observe(game_id) => {
                out.push(Action::Send(format!("observe {game_id}")));
            }
            Request::Command(exchange) => {
                debug!(command = exchange.text(), "sending command");
                out.push(Action::Send(exchange.text().to_string()));
                self.outstanding = Some(Outstanding {
                    exchange,
                    lines: Vec::new(),
                });
                self.state = SessionState::Running;
                out.push(self.arm(TimerKind::Reply, self.config.reply_timeout));
            }
        }
    }

    /// Switches the transport to delimited mode before the credential that
    /// triggers the first prompt goes out.
    fn enter_configuring(&mut self, out: &mut Vec<Action>) {
        out.push(Action::SetBufferMode(BufferMode::Delimited(
            self.config.marker.clone(),
        )));
        self.state = SessionState::Configuring;
    }

    fn enter_throttled(&mut self, out: &mut Vec<Action>) {
        self.state = SessionState::Throttled;
        out.push(self.arm(TimerKind::Throttle, self.config.throttle));
    }

    fn enter_ready(&mut self, out: &mut Vec<Action>) {
        self.state = SessionState::Ready;
        self.timer_epoch += 1;
        let queued = mem::take(&mut self.pending);
        if !queued.is_empty() {
            debug!(count = queued.len(), "replaying queued requests");
        }
        for request in queued {
            self.accept(request, out);
        }
    }

    fn arm(&mut self, kind: TimerKind, after: Duration) -> Action {
        self.timer_epoch += 1;
        Action::StartTimer(
            TimerId {
                kind,
                epoch: self.timer_epoch,
            },
            after,
        )
    }

    fn check_invariants(&self) {
        debug_assert_eq!(
            self.outstanding.is_some(),
            self.state == SessionState::Running,
            "outstanding command must exist exactly while running"
        );
    }
}

fn is_guest_prompt(tail: &str) -> bool {
    tail.ends_with("\":")
        && tail
            .lines()
            .last()
            .is_some_and(|l| l.trim_start().starts_with(GUEST_PROMPT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandProtocol, ParseOutcome};
    use crate::types::{GameId, DRAW_TOPIC, MOVE_TOPIC};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Capture(Mutex<Vec<(&'static str, ClassifiedEvent)>>);

    impl EventPublisher for Capture {
        fn publish(&self, topic: &'static str, event: ClassifiedEvent) {
            self.0.lock().unwrap().push((topic, event));
        }
    }

    /// Parses once a line equal to `done` arrives.
    struct Until(&'static str, &'static str);

    impl CommandProtocol for Until {
        type Output = usize;

        fn text(&self) -> String {
            self.0.to_string()
        }

        fn parse(&self, lines: &[String], _marker: &str) -> ParseOutcome<usize> {
            if lines.iter().any(|l| l == self.1) {
                ParseOutcome::Parsed(lines.len())
            } else {
                ParseOutcome::Incomplete
            }
        }
    }

    type Replies = Arc<Mutex<Vec<Result<usize, SessionError>>>>;

    fn command(text: &'static str, done: &'static str, replies: &Replies) -> Request {
        let replies = Arc::clone(replies);
        Request::command(Until(text, done), move |r| replies.lock().unwrap().push(r))
    }

    fn sends(actions: &[Action]) -> Vec<&str> {
        actions
            .iter()
            .filter_map(|a| match a {
                Action::Send(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    fn timer(actions: &[Action], kind: TimerKind) -> TimerId {
        actions
            .iter()
            .find_map(|a| match a {
                Action::StartTimer(id, _) if id.kind == kind => Some(*id),
                _ => None,
            })
            .expect("timer armed")
    }

    fn ready_session(publisher: Arc<Capture>) -> Session {
        let mut s = Session::new(SessionConfig::default(), publisher);
        s.connected();
        s.text_received(&["login: "]);
        s.text_received(&["password: "]);
        let out = s.text_received(&["Welcome\nfics% "]);
        s.timer_fired(timer(&out, TimerKind::Throttle));
        assert_eq!(s.state(), SessionState::Ready);
        s
    }

    #[test]
    fn test_login_sequence() {
        let config = SessionConfig {
            login: "relaybot".to_string(),
            password: "secret".to_string(),
            ..SessionConfig::default()
        };
        let mut s = Session::new(config, Arc::new(Capture::default()));
        assert_eq!(s.state(), SessionState::Connecting);
        assert!(s.connected().is_empty());
        assert_eq!(s.state(), SessionState::LoggingIn);

        let out = s.text_received(&["\n\nlogin: "]);
        assert_eq!(sends(&out), ["relaybot"]);
        assert_eq!(s.state(), SessionState::LoggingIn);

        let out = s.text_received(&["password: "]);
        assert_eq!(sends(&out), ["secret"]);
        assert!(out.contains(&Action::SetBufferMode(BufferMode::Delimited(
            "fics% ".to_string()
        ))));
        assert_eq!(s.state(), SessionState::Configuring);

        let out = s.text_received(&["**** Starting FICS session as relaybot ****\nfics% "]);
        assert_eq!(sends(&out).len(), SessionConfig::default().setup_commands.len());
        assert_eq!(sends(&out).last(), Some(&"set style 12"));
        assert_eq!(s.state(), SessionState::Throttled);
    }

    #[test]
    fn test_guest_prompt_enters_configuring() {
        let mut s = Session::new(SessionConfig::default(), Arc::new(Capture::default()));
        s.connected();
        s.text_received(&["login: "]);
        let out = s.text_received(&[
            "\"guest\" is not a registered name.\nPress return to enter the server as \"GuestQRST\":",
        ]);
        assert_eq!(sends(&out), [""]);
        assert_eq!(s.state(), SessionState::Configuring);
    }

    #[test]
    fn test_single_outstanding_and_fifo() {
        let replies = Replies::default();
        let mut s = ready_session(Arc::new(Capture::default()));

        let out = s.submit(command("games", "done-a", &replies));
        assert_eq!(sends(&out), ["games"]);
        assert_eq!(s.state(), SessionState::Running);

        assert!(s.submit(command("who", "done-b", &replies)).is_empty());
        assert!(s.submit(Request::Observe(GameId(7))).is_empty());
        assert_eq!(s.pending_len(), 2);
        assert_eq!(s.outstanding_command(), Some("games"));

        let out = s.text_received(&["line\ndone-a\nfics% "]);
        assert_eq!(replies.lock().unwrap().as_slice(), &[Ok(3)]);
        assert_eq!(s.state(), SessionState::Throttled);
        assert!(sends(&out).is_empty());

        let out = s.timer_fired(timer(&out, TimerKind::Throttle));
        assert_eq!(sends(&out), ["who"]);
        assert_eq!(s.pending_len(), 1);
    }

    #[test]
    fn test_observe_in_ready_is_fire_and_forget() {
        let mut s = ready_session(Arc::new(Capture::default()));
        let out = s.submit(Request::Observe(GameId(42)));
        assert_eq!(sends(&out), ["observe 42"]);
        assert_eq!(s.state(), SessionState::Ready);
        assert_eq!(s.outstanding_command(), None);
    }

    #[test]
    fn test_timeout_fails_caller_then_throttles() {
        let replies = Replies::default();
        let mut s = ready_session(Arc::new(Capture::default()));
        let out = s.submit(command("finger nobody", "never", &replies));
        let reply_timer = timer(&out, TimerKind::Reply);

        s.text_received(&["partial\nfics% "]);
        let out = s.timer_fired(reply_timer);
        assert_eq!(
            replies.lock().unwrap().as_slice(),
            &[Err(SessionError::Timeout {
                command: "finger nobody".to_string()
            })]
        );
        assert_eq!(s.state(), SessionState::Throttled);
        s.timer_fired(timer(&out, TimerKind::Throttle));
        assert_eq!(s.state(), SessionState::Ready);
    }

    #[test]
    fn test_stale_reply_timer_ignored() {
        let replies = Replies::default();
        let mut s = ready_session(Arc::new(Capture::default()));
        let out = s.submit(command("games", "ok", &replies));
        let reply_timer = timer(&out, TimerKind::Reply);
        s.text_received(&["ok\nfics% "]);

        assert!(s.timer_fired(reply_timer).is_empty());
        assert_eq!(s.state(), SessionState::Throttled);
        assert_eq!(replies.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_events_during_reply_are_not_accumulated() {
        let replies = Replies::default();
        let publisher = Arc::new(Capture::default());
        let mut s = ready_session(Arc::clone(&publisher));
        s.submit(command("games", "end", &replies));

        s.text_received(&[
            "relay(TD)[3] kibitzes: The game is officially a draw.\nrow\nend\nfics% ",
        ]);
        // row, end, prompt
        assert_eq!(replies.lock().unwrap().as_slice(), &[Ok(3)]);
        // outcomes are not published unless enabled
        assert!(publisher.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_event_only_block_is_not_a_reply() {
        let replies = Replies::default();
        let mut s = ready_session(Arc::new(Capture::default()));
        s.submit(command("games", "fics% ", &replies));

        let out = s.text_received(&["\nrelay(TD)[3] kibitzes: Bob has resigned\nfics% "]);
        assert!(out.is_empty());
        assert_eq!(s.state(), SessionState::Running);
        assert!(replies.lock().unwrap().is_empty());

        s.text_received(&["row\nfics% "]);
        assert_eq!(replies.lock().unwrap().as_slice(), &[Ok(2)]);
    }

    #[test]
    fn test_publish_outcomes_switch() {
        let publisher = Arc::new(Capture::default());
        let config = SessionConfig {
            publish_outcomes: true,
            ..SessionConfig::default()
        };
        let mut s = Session::new(config, publisher.clone());
        s.connected();
        s.text_received(&["relay(TD)[3] kibitzes: The game is officially a draw."]);
        let published = publisher.0.lock().unwrap();
        assert_eq!(
            published.as_slice(),
            &[(DRAW_TOPIC, ClassifiedEvent::Draw { game_id: GameId(3) })]
        );
    }

    #[test]
    fn test_moves_published_in_any_state() {
        let publisher = Arc::new(Capture::default());
        let mut s = Session::new(SessionConfig::default(), publisher.clone());
        s.connected();
        s.text_received(&[
            "<12> rnbqkbnr pppppppp -------- -------- ----P--- -------- PPPP-PPP RNBQKBNR B 4 1 1 1 1 0 42 Carlsen Caruana 0 120 0 39 39 7200 7200 1 P/e2-e4 (0:00) e4 0 1 0",
        ]);
        let published = publisher.0.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, MOVE_TOPIC);
    }

    #[test]
    fn test_shutdown_fails_everyone() {
        let replies = Replies::default();
        let mut s = ready_session(Arc::new(Capture::default()));
        s.submit(command("a", "x", &replies));
        s.submit(command("b", "x", &replies));
        s.shutdown();
        assert_eq!(
            replies.lock().unwrap().as_slice(),
            &[Err(SessionError::Closed), Err(SessionError::Closed)]
        );
        assert_eq!(s.pending_len(), 0);
    }
}
