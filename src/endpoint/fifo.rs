//! FIFO endpoint opening.
//!
//! Opening either end of a FIFO waits until a peer holds the matching end:
//! the read end is opened with a blocking `open(2)` on the blocking pool,
//! and the write end polls until a reader appears. Because of that wait, two
//! cooperating instances must open their FIFO pairs in opposite orders or
//! they deadlock (see [`RelayConfig::reverse_fifo_order`]).

use std::os::unix::fs::FileTypeExt;
use std::path::Path;
use std::time::Duration;

use nix::sys::stat::Mode;
use nix::unistd::mkfifo;
use tokio::net::unix::pipe;
use tokio::time::sleep;
use tracing::debug;

use crate::config::RelayConfig;
use crate::endpoint::session::RelaySession;
use crate::{AppError, Result};

/// Poll interval while waiting for a FIFO reader to appear.
const SENDER_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Open the configured FIFO endpoints into `session`.
///
/// Honors the configured open order: output end first when
/// `reverse_fifo_order` is set, input end first otherwise. Handles are
/// installed into the session as soon as each open completes, so a cancelled
/// call leaves the session consistent for cleanup.
///
/// # Errors
///
/// Returns `AppError::Endpoint` when a FIFO cannot be created or opened;
/// this is fatal for the relay.
pub async fn open_fifos(config: &RelayConfig, session: &mut RelaySession) -> Result<()> {
    if config.reverse_fifo_order {
        open_output(config, session).await?;
        open_input(config, session).await?;
    } else {
        open_input(config, session).await?;
        open_output(config, session).await?;
    }
    Ok(())
}

async fn open_input(config: &RelayConfig, session: &mut RelaySession) -> Result<()> {
    if let Some(ref path) = config.stdin_fifo {
        session.install_fifo_in(open_receiver(path).await?);
    }
    Ok(())
}

async fn open_output(config: &RelayConfig, session: &mut RelaySession) -> Result<()> {
    if let Some(ref path) = config.stdout_fifo {
        session.install_fifo_out(open_sender(path).await?);
    }
    Ok(())
}

/// Open the read end of the FIFO at `path`, creating the FIFO if missing.
///
/// Waits until a peer opens the write end. A non-blocking read-end open
/// would succeed immediately and then report EOF before any writer arrives,
/// so the open happens blocking on the blocking pool instead and the
/// resulting descriptor is handed to tokio afterwards.
///
/// # Errors
///
/// Returns `AppError::Endpoint` if the path cannot be created as a FIFO, is
/// not a FIFO, or fails to open.
pub async fn open_receiver(path: &Path) -> Result<pipe::Receiver> {
    ensure_fifo(path)?;

    let blocking_path = path.to_path_buf();
    let file = tokio::task::spawn_blocking(move || {
        std::fs::OpenOptions::new().read(true).open(blocking_path)
    })
    .await
    .map_err(|err| AppError::Endpoint(format!("fifo open task failed: {err}")))?
    .map_err(|err| {
        AppError::Endpoint(format!(
            "failed to open {} for reading: {err}",
            path.display()
        ))
    })?;

    let receiver = pipe::Receiver::from_file(file).map_err(|err| {
        AppError::Endpoint(format!(
            "failed to register {} with the runtime: {err}",
            path.display()
        ))
    })?;

    debug!(path = %path.display(), "opened fifo read end");
    Ok(receiver)
}

/// Open the write end of the FIFO at `path`, creating the FIFO if missing.
///
/// Waits indefinitely until a peer opens the read end. There are no
/// timeouts; the caller bounds the wait by dropping the future (e.g. on an
/// interrupt).
///
/// # Errors
///
/// Returns `AppError::Endpoint` if the path cannot be created as a FIFO, is
/// not a FIFO, or fails to open for a reason other than a missing reader.
pub async fn open_sender(path: &Path) -> Result<pipe::Sender> {
    ensure_fifo(path)?;

    loop {
        match pipe::OpenOptions::new().open_sender(path) {
            Ok(sender) => {
                debug!(path = %path.display(), "opened fifo write end");
                return Ok(sender);
            }
            // ENXIO: no reader holds the other end yet.
            Err(err) if err.raw_os_error() == Some(nix::libc::ENXIO) => {}
            Err(err) => {
                return Err(AppError::Endpoint(format!(
                    "failed to open {} for writing: {err}",
                    path.display()
                )));
            }
        }
        sleep(SENDER_RETRY_INTERVAL).await;
    }
}

/// Make sure `path` names a FIFO, creating one (mode 0644) if absent.
fn ensure_fifo(path: &Path) -> Result<()> {
    match std::fs::metadata(path) {
        Ok(metadata) if metadata.file_type().is_fifo() => Ok(()),
        Ok(_) => Err(AppError::Endpoint(format!(
            "{} exists but is not a fifo",
            path.display()
        ))),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            match mkfifo(path, Mode::from_bits_truncate(0o644)) {
                Ok(()) => {
                    debug!(path = %path.display(), "created fifo");
                    Ok(())
                }
                // A cooperating instance created it first; the open verifies
                // the file type.
                Err(nix::errno::Errno::EEXIST) => Ok(()),
                Err(err) => Err(AppError::Endpoint(format!(
                    "failed to create fifo {}: {err}",
                    path.display()
                ))),
            }
        }
        Err(err) => Err(AppError::Endpoint(format!(
            "failed to stat {}: {err}",
            path.display()
        ))),
    }
}
