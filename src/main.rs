#![forbid(unsafe_code)]

//! `pipelink` binary: the point-to-point byte relay.
//!
//! Bootstraps configuration, negotiates the socket role, opens the FIFO
//! endpoints, and runs the two directional transfer loops until either side
//! terminates or an interrupt arrives.

use std::process::ExitCode;
use std::sync::Arc;

use tracing::{debug, error, info};
use tracing_subscriber::{fmt, EnvFilter};

use pipelink::cli::{self, LogFormat};
use pipelink::config::RelayConfig;
use pipelink::endpoint::{establish, RelaySession};
use pipelink::relay::{bind_transfers, run_transfer};
use pipelink::shutdown::{Coordinator, ShutdownTrigger};
use pipelink::{AppError, Result};

fn main() -> ExitCode {
    let invocation = match cli::parse() {
        Ok(invocation) => invocation,
        Err(err) => {
            eprintln!("pipelink: {err}");
            return ExitCode::FAILURE;
        }
    };

    let config = invocation.config;
    let strict_exit = config.strict_exit;

    if let Err(err) = init_tracing(invocation.log_format, config.debug) {
        eprintln!("pipelink: {err}");
        return ExitCode::FAILURE;
    }

    let outcome = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))
        .and_then(|runtime| runtime.block_on(run(config)));

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "relay terminated");
            // Historical contract: fatal errors leave the exit status
            // untouched unless strict exit was requested.
            if strict_exit {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
    }
}

async fn run(config: RelayConfig) -> Result<()> {
    if !config.extra.is_empty() {
        debug!(count = config.extra.len(), "ignoring positional arguments");
    }

    let coordinator = Arc::new(Coordinator::new());
    let mut session = RelaySession::new();

    let established = tokio::select! {
        biased;

        () = shutdown_signal() => {
            coordinator.begin(ShutdownTrigger::Interrupt);
            Err(AppError::Endpoint("interrupted during endpoint setup".into()))
        }

        result = establish(&config, &mut session) => result,
    };

    let result = match established {
        Ok(()) => relay_until_shutdown(&mut session, &coordinator).await,
        Err(err) => Err(err),
    };

    // Cleanup runs on every path, fatal setup errors included.
    coordinator.finish(&mut session);
    result
}

/// Spawn both transfer loops and wait for a termination trigger.
async fn relay_until_shutdown(
    session: &mut RelaySession,
    coordinator: &Arc<Coordinator>,
) -> Result<()> {
    let (upload, download) = bind_transfers(session)?;

    match session.role() {
        Some(role) => info!(%role, "relay established"),
        None => info!("relay established without socket"),
    }

    let upload_task = tokio::spawn(run_transfer(upload, Arc::clone(coordinator)));
    let download_task =
        download.map(|pair| tokio::spawn(run_transfer(pair, Arc::clone(coordinator))));

    tokio::select! {
        biased;

        () = shutdown_signal() => {
            coordinator.begin(ShutdownTrigger::Interrupt);
        }

        () = coordinator.cancelled() => {}
    }

    let _ = upload_task.await;
    if let Some(task) = download_task {
        let _ = task.await;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat, debug: bool) -> Result<()> {
    let default_filter = if debug { "pipelink=debug" } else { "pipelink=warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // Stdout is a data channel for this program; all diagnostics go to
    // stderr.
    let subscriber = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
