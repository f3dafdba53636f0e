//! Session runtime.
//!
//! Bridges the pure [`Session`] state machine with tokio: a single driver task
//! owns the session and feeds it transport events, caller requests and timer
//! expiries one at a time, then executes the actions it returns. Callers talk
//! to the driver through a cloneable [`SessionHandle`].

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::core::{
    Action, CommandProtocol, EventPublisher, Request, Session, SessionConfig, SessionError,
    TimerId,
};
use crate::transport::{self, TransportEvent, TransportSender};
use crate::types::GameId;
use crate::wire_log::WireLog;

/// Message delivered to the driver's inbox.
#[derive(Debug)]
pub enum SessionMsg {
    Submit(Request),
    Timer(TimerId),
}

/// Caller-side handle. Cheap to clone; every clone talks to the same session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionMsg>,
}

impl SessionHandle {
    /// Send a command and wait for its parsed reply.
    ///
    /// Commands are executed one at a time in submission order. Resolves with
    /// [`SessionError::Timeout`] if no parseable reply arrives in time and
    /// with [`SessionError::Closed`] if the connection goes away first.
    pub async fn submit<C: CommandProtocol>(&self, command: C) -> Result<C::Output, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let request = Request::command(command, move |result| {
            let _ = reply_tx.send(result);
        });
        self.tx
            .send(SessionMsg::Submit(request))
            .map_err(|_| SessionError::Closed)?;
        reply_rx.await.map_err(|_| SessionError::Closed)?
    }

    /// Ask the server to stream a game. Returns once the request is queued;
    /// moves arrive through the publisher.
    pub fn observe(&self, game_id: GameId) -> Result<(), SessionError> {
        self.tx
            .send(SessionMsg::Submit(Request::Observe(game_id)))
            .map_err(|_| SessionError::Closed)
    }
}

/// Owns the session; run it on its own task.
pub struct SessionDriver {
    session: Session,
    transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
    inbox_rx: mpsc::UnboundedReceiver<SessionMsg>,
    inbox_tx: mpsc::UnboundedSender<SessionMsg>,
    sender: Option<TransportSender>,
}

/// Create a session wired to `transport_rx`.
pub fn new_session(
    config: SessionConfig,
    publisher: Arc<dyn EventPublisher>,
    transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
) -> (SessionHandle, SessionDriver) {
    let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
    let handle = SessionHandle {
        tx: inbox_tx.clone(),
    };
    let driver = SessionDriver {
        session: Session::new(config, publisher),
        transport_rx,
        inbox_rx,
        inbox_tx,
        sender: None,
    };
    (handle, driver)
}

impl SessionDriver {
    /// Process events until the transport closes.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                biased;
                event = self.transport_rx.recv() => {
                    match event {
                        Some(TransportEvent::Connected(sender)) => {
                            self.sender = Some(sender);
                            let actions = self.session.connected();
                            self.execute(actions);
                        }
                        Some(TransportEvent::Text(chunks)) => {
                            let actions = self.session.text_received(&chunks[..]);
                            self.execute(actions);
                        }
                        Some(TransportEvent::Closed) | None => break,
                    }
                }
                Some(msg) = self.inbox_rx.recv() => {
                    let actions = match msg {
                        SessionMsg::Submit(request) => self.session.submit(request),
                        SessionMsg::Timer(timer) => self.session.timer_fired(timer),
                    };
                    self.execute(actions);
                }
            }
        }

        info!("transport closed, failing waiting callers");
        self.session.shutdown();
    }

    fn execute(&mut self, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::Send(text) => {
                    let sent = self.sender.as_ref().is_some_and(|s| s.send(text));
                    if !sent {
                        warn!("send dropped, transport unavailable");
                    }
                }
                Action::SetBufferMode(mode) => {
                    if let Some(sender) = self.sender.as_ref() {
                        sender.set_buffer_mode(mode);
                    }
                }
                Action::StartTimer(timer, after) => {
                    debug!(?timer, ?after, "timer armed");
                    let inbox = self.inbox_tx.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(after).await;
                        let _ = inbox.send(SessionMsg::Timer(timer));
                    });
                }
            }
        }
    }
}

/// Connect to the configured server and spawn the session driver.
pub async fn start(
    config: &ServerConfig,
    publisher: Arc<dyn EventPublisher>,
) -> anyhow::Result<(SessionHandle, JoinHandle<()>)> {
    let wire_log = config
        .wire_log_path
        .as_ref()
        .map(|path| WireLog::spawn(path.clone(), Some(config.session.password.clone())));

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let addr = config.address();
    transport::connect(&addr, events_tx, wire_log).await?;

    let (handle, driver) = new_session(config.session.clone(), publisher, events_rx);
    let task = tokio::spawn(driver.run());
    Ok((handle, task))
}
