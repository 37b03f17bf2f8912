//! Shutdown coordination.
//!
//! One [`Coordinator`] is shared by both transfer loops and the signal
//! watcher. Whichever party observes a termination trigger first wins the
//! `Running → ShuttingDown` transition and fires the cancellation token; the
//! other loop, multiplexing its blocking read with the token, exits instead
//! of retrying. Teardown of the endpoints the loops did not consume happens
//! once, in [`Coordinator::finish`].

use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU8, Ordering};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::endpoint::RelaySession;
use crate::relay::routes::Direction;

const RUNNING: u8 = 0;
const SHUTTING_DOWN: u8 = 1;
const STOPPED: u8 = 2;

/// Lifecycle of the relay, monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    /// Loops may be running; no termination trigger observed yet.
    Running,
    /// A trigger was observed; loops are being cancelled.
    ShuttingDown,
    /// All endpoints are closed and both loops have exited.
    Stopped,
}

/// What caused the shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownTrigger {
    /// A loop's source reached end of stream.
    SourceEof(Direction),
    /// A loop hit a mid-session read or write failure.
    TransferFault(Direction),
    /// A loop's sink reported a broken pipe.
    BrokenPipe(Direction),
    /// An external interrupt (Ctrl-C or SIGTERM).
    Interrupt,
}

impl Display for ShutdownTrigger {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourceEof(direction) => write!(f, "{direction} source eof"),
            Self::TransferFault(direction) => write!(f, "{direction} transfer fault"),
            Self::BrokenPipe(direction) => write!(f, "{direction} broken pipe"),
            Self::Interrupt => f.write_str("interrupt"),
        }
    }
}

/// Shared shutdown coordinator.
///
/// Safe to invoke concurrently from either loop or from the signal-watcher
/// task; every operation is lock-free or idempotent.
#[derive(Debug)]
pub struct Coordinator {
    state: AtomicU8,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Create a coordinator in the `Running` state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(RUNNING),
            cancel: CancellationToken::new(),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ShutdownState {
        match self.state.load(Ordering::Acquire) {
            RUNNING => ShutdownState::Running,
            SHUTTING_DOWN => ShutdownState::ShuttingDown,
            _ => ShutdownState::Stopped,
        }
    }

    /// Begin shutdown for `trigger`.
    ///
    /// The first caller wins the `Running → ShuttingDown` transition and is
    /// told so; every caller fires the cancellation token, which is
    /// idempotent. Callable from any context, any number of times.
    pub fn begin(&self, trigger: ShutdownTrigger) -> bool {
        let first = self
            .state
            .compare_exchange(RUNNING, SHUTTING_DOWN, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();

        if first {
            debug!(%trigger, "shutdown initiated");
        }

        self.cancel.cancel();
        first
    }

    /// Resolves when shutdown has begun. The loops multiplex their blocking
    /// reads with this future.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }

    /// Whether shutdown has begun.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.state.load(Ordering::Acquire) != RUNNING
    }

    /// Close every endpoint the session still holds and mark the relay
    /// `Stopped`.
    ///
    /// Called once by the top-level flow after both loops have been joined;
    /// loop-owned endpoints are already closed by then (dropped on exit), and
    /// [`RelaySession::close_all`] skips anything closed before, so repeated
    /// calls stay no-ops.
    pub fn finish(&self, session: &mut RelaySession) {
        session.close_all();
        self.state.store(STOPPED, Ordering::Release);
        debug!("shutdown complete");
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}
