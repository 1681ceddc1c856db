//! Serve command - run the webhook endpoint and the governor

use crate::cli::context::BotContext;
use anyhow::{Context, Result};
use automerge_bot::automerge::PushHandler;
use automerge_bot::config::SharedConfig;
use automerge_bot::governor::PullRequestGovernor;
use automerge_bot::server::{self, AppState};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Run the bot until ctrl-c
pub async fn run_serve(config_path: &Path, listen: SocketAddr) -> Result<()> {
    let ctx = BotContext::new(config_path)?;
    ctx.config.log_summary();

    let governor = Arc::new(PullRequestGovernor::with_configured_notifier(
        Arc::clone(&ctx.config),
        Arc::clone(&ctx.platform),
    ));
    let governor_task = governor.start()?;

    spawn_reload_on_hangup(Arc::clone(&ctx.config), ctx.config_path.clone());

    let state = AppState {
        handler: PushHandler::new(Arc::clone(&ctx.config), Arc::clone(&ctx.platform)),
    };
    let listener = TcpListener::bind(listen)
        .await
        .with_context(|| format!("binding {listen}"))?;

    server::serve(listener, state, shutdown_signal()).await?;

    governor_task.abort();
    info!("stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

#[cfg(unix)]
fn spawn_reload_on_hangup(config: Arc<SharedConfig>, path: PathBuf) {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangups = match signal(SignalKind::hangup()) {
        Ok(stream) => stream,
        Err(e) => {
            error!(error = %e, "could not listen for SIGHUP, configuration reload disabled");
            return;
        }
    };
    tokio::spawn(async move {
        while hangups.recv().await.is_some() {
            if let Err(e) = config.reload(&path) {
                error!(path = %path.display(), error = %e, "configuration reload failed, keeping previous");
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_reload_on_hangup(_config: Arc<SharedConfig>, _path: PathBuf) {}
