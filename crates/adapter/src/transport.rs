//! TCP line transport
//!
//! Owns the socket. A reader task cuts inbound bytes into text chunks
//! according to the current [`BufferMode`] and a writer task sends outbound
//! lines. Both talk to the session only through channels, so the session sees
//! one ordered stream of [`TransportEvent`]s.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::core::BufferMode;
use crate::wire_log::WireLog;

/// Transport -> session.
#[derive(Debug)]
pub enum TransportEvent {
    /// The socket is up; carries the capability to send on it.
    Connected(TransportSender),
    /// Decoded chunks from a single read, in arrival order.
    Text(Vec<String>),
    Closed,
}

/// Session -> transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCommand {
    Send(String),
    SetBufferMode(BufferMode),
}

/// Send capability handed to the session on connect.
#[derive(Debug, Clone)]
pub struct TransportSender {
    tx: mpsc::UnboundedSender<TransportCommand>,
}

impl TransportSender {
    pub fn new(tx: mpsc::UnboundedSender<TransportCommand>) -> Self {
        Self { tx }
    }

    /// Queue one line for sending. Returns false once the writer is gone.
    pub fn send(&self, text: String) -> bool {
        self.tx.send(TransportCommand::Send(text)).is_ok()
    }

    pub fn set_buffer_mode(&self, mode: BufferMode) -> bool {
        self.tx.send(TransportCommand::SetBufferMode(mode)).is_ok()
    }
}

/// Held-back input above this size is logged once as suspicious.
pub const PENDING_WARN_BYTES: usize = 64 * 1024;

/// Cuts a byte stream into text chunks.
#[derive(Debug, Clone)]
pub struct ChunkDecoder {
    mode: BufferMode,
    buf: Vec<u8>,
    over_limit: bool,
}

impl Default for ChunkDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkDecoder {
    pub fn new() -> Self {
        Self {
            mode: BufferMode::Raw,
            buf: Vec::with_capacity(4096),
            over_limit: false,
        }
    }

    pub fn mode(&self) -> &BufferMode {
        &self.mode
    }

    pub fn set_mode(&mut self, mode: BufferMode) {
        self.mode = mode;
    }

    /// Bytes held back waiting for a delimiter.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Whether the held-back bytes have passed [`PENDING_WARN_BYTES`].
    pub fn over_limit(&self) -> bool {
        self.over_limit
    }

    /// Feed freshly read bytes; returns every chunk now complete.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(bytes);

        let mut chunks = Vec::new();
        match &self.mode {
            BufferMode::Raw => {
                if !self.buf.is_empty() {
                    chunks.push(decode(&self.buf));
                    self.buf.clear();
                }
            }
            BufferMode::Delimited(delimiter) => {
                let delimiter = delimiter.as_bytes();
                while !delimiter.is_empty() {
                    let Some(pos) = find(&self.buf, delimiter) else {
                        break;
                    };
                    let end = pos + delimiter.len();
                    chunks.push(decode(&self.buf[..end]));
                    self.buf.drain(..end);
                }
            }
        }

        let over = self.buf.len() > PENDING_WARN_BYTES;
        if over && !self.over_limit {
            warn!(
                buffered = self.buf.len(),
                "no delimiter in pending input, still buffering"
            );
        }
        self.over_limit = over;
        chunks
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).replace('\r', "")
}

/// Connect to `addr` and start the reader and writer tasks.
///
/// `TransportEvent::Connected` is delivered before any text.
pub async fn connect(
    addr: &str,
    events: mpsc::UnboundedSender<TransportEvent>,
    wire_log: Option<WireLog>,
) -> anyhow::Result<()> {
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;
    info!(%addr, "connected");
    attach(stream, events, wire_log);
    Ok(())
}

/// Start the reader and writer tasks on an established stream.
pub fn attach(
    stream: TcpStream,
    events: mpsc::UnboundedSender<TransportEvent>,
    wire_log: Option<WireLog>,
) {
    let (mut reader, mut writer) = stream.into_split();
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<TransportCommand>();
    let (mode_tx, mut mode_rx) = watch::channel(BufferMode::Raw);

    let _ = events.send(TransportEvent::Connected(TransportSender::new(cmd_tx)));

    let wire_log_out = wire_log.clone();
    tokio::spawn(async move {
        while let Some(cmd) = cmd_rx.recv().await {
            match cmd {
                TransportCommand::Send(text) => {
                    if let Some(log) = wire_log_out.as_ref() {
                        log.outbound(&text);
                    }
                    if writer.write_all(text.as_bytes()).await.is_err()
                        || writer.write_all(b"\n").await.is_err()
                        || writer.flush().await.is_err()
                    {
                        warn!("write failed, stopping writer");
                        break;
                    }
                }
                TransportCommand::SetBufferMode(mode) => {
                    debug!(?mode, "buffer mode");
                    let _ = mode_tx.send(mode);
                }
            }
        }
    });

    tokio::spawn(async move {
        let mut decoder = ChunkDecoder::new();
        let mut buf = vec![0u8; 4096];
        let mut mode_open = true;
        loop {
            tokio::select! {
                biased;
                changed = mode_rx.changed(), if mode_open => {
                    match changed {
                        Ok(()) => decoder.set_mode(mode_rx.borrow_and_update().clone()),
                        Err(_) => mode_open = false,
                    }
                }
                read = reader.read(&mut buf) => {
                    let n = match read {
                        Ok(0) => break,
                        Ok(n) => n,
                        Err(e) => {
                            warn!(error = %e, "read failed");
                            break;
                        }
                    };
                    let chunks = decoder.push(&buf[..n]);
                    if chunks.is_empty() {
                        continue;
                    }
                    if let Some(log) = wire_log.as_ref() {
                        for chunk in &chunks {
                            log.inbound(chunk);
                        }
                    }
                    if events.send(TransportEvent::Text(chunks)).is_err() {
                        break;
                    }
                }
            }
        }
        info!("connection closed");
        let _ = events.send(TransportEvent::Closed);
    });
}
