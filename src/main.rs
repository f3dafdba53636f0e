//! FICS session runner (default binary).
//!
//! Logs in, observes the configured games and prints every published event
//! to stdout as one JSON object per line. Diagnostics go to stderr through
//! `tracing`; set `RUST_LOG` to adjust (e.g. `RUST_LOG=fics::server=debug`).

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use fics_session::adapter::{start, EventBus, ServerConfig, SessionHandle};
use fics_session::core::RelayListGames;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if ServerConfig::is_disabled() {
        info!("session disabled via FICS_DISABLED");
        return Ok(());
    }

    let config = ServerConfig::from_env();
    info!(address = %config.address(), login = %config.session.login, "starting session");

    let bus = EventBus::default();
    let mut events = bus.subscribe();
    let (handle, driver) = start(&config, Arc::new(bus.clone())).await?;

    for game_id in &config.observe {
        handle.observe(*game_id)?;
    }
    if config.follow_relay {
        tokio::spawn(follow_relay(handle.clone()));
    }

    let printer = tokio::spawn(async move {
        let stdout = std::io::stdout();
        loop {
            match events.recv().await {
                Ok(published) => {
                    let mut out = stdout.lock();
                    if serde_json::to_writer(&mut out, &published).is_err() || writeln!(out).is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(n)) => warn!(skipped = n, "event printer lagging"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    tokio::select! {
        result = driver => {
            if let Err(e) = result {
                error!(error = %e, "session task failed");
            }
            info!("session ended");
        }
        _ = tokio::signal::ctrl_c() => info!("interrupted"),
    }

    printer.abort();
    Ok(())
}

async fn follow_relay(handle: SessionHandle) {
    match handle.submit(RelayListGames).await {
        Ok(games) => {
            info!(count = games.len(), "relay games");
            for game in games {
                info!(game = %game.game_id, white = %game.white, black = %game.black, "following");
                if handle.observe(game.game_id).is_err() {
                    break;
                }
            }
        }
        Err(e) => warn!(error = %e, "relay game list unavailable"),
    }
}
