//! Endpoint abstraction: uniform readable/writable handles over terminal,
//! FIFO, and socket byte streams.
//!
//! [`SourceEndpoint`] and [`SinkEndpoint`] delegate `AsyncRead` / `AsyncWrite`
//! to the concrete handle so the transfer loops stay agnostic of what they
//! are pumping. [`EndpointKind`] is the role tag used for route planning and
//! logging; [`EndpointSet`] records which optional endpoints a session has.

use std::fmt::{Display, Formatter};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf, Stdin, Stdout};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::unix::pipe;

pub mod fifo;
pub mod resolver;
pub mod session;

pub use resolver::SocketRole;
pub use session::RelaySession;

use crate::config::RelayConfig;
use crate::Result;

/// Establish endpoints in startup order: socket negotiation first, then the
/// FIFO pair. Handles land in the session as soon as each open completes, so
/// an interrupt mid-setup still leaves everything reachable for cleanup.
///
/// # Errors
///
/// Returns `AppError::Resolve` when socket negotiation fails and
/// `AppError::Endpoint` when a FIFO cannot be opened; both are fatal for the
/// relay.
pub async fn establish(config: &RelayConfig, session: &mut RelaySession) -> Result<()> {
    if let Some((address, port)) = config.socket_target() {
        let link = resolver::resolve(&address, port).await?;
        session.install_socket(link);
    }

    fifo::open_fifos(config, session).await?;
    Ok(())
}

/// Role tag of a relay endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    /// Terminal standard input.
    TerminalIn,
    /// Terminal standard output.
    TerminalOut,
    /// The FIFO local input is read from.
    FifoIn,
    /// The FIFO local output is written to.
    FifoOut,
    /// The negotiated peer socket.
    Socket,
}

impl Display for EndpointKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::TerminalIn => "terminal-in",
            Self::TerminalOut => "terminal-out",
            Self::FifoIn => "fifo-in",
            Self::FifoOut => "fifo-out",
            Self::Socket => "socket",
        };
        f.write_str(name)
    }
}

/// Which optional endpoints are active in a session.
///
/// Route planning derives each loop's source/sink pair from these three
/// presence flags alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EndpointSet {
    /// A stdin FIFO is open.
    pub fifo_in: bool,
    /// A stdout FIFO is open.
    pub fifo_out: bool,
    /// A peer socket is connected.
    pub socket: bool,
}

/// A readable endpoint owned by one transfer loop.
#[derive(Debug)]
pub enum SourceEndpoint {
    /// Terminal standard input.
    Terminal(Stdin),
    /// Read end of the stdin FIFO.
    FifoIn(pipe::Receiver),
    /// Read half of the peer socket.
    Socket(OwnedReadHalf),
}

impl SourceEndpoint {
    /// Role tag of this source.
    #[must_use]
    pub fn kind(&self) -> EndpointKind {
        match self {
            Self::Terminal(_) => EndpointKind::TerminalIn,
            Self::FifoIn(_) => EndpointKind::FifoIn,
            Self::Socket(_) => EndpointKind::Socket,
        }
    }
}

impl AsyncRead for SourceEndpoint {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Terminal(inner) => Pin::new(inner).poll_read(cx, buf),
            Self::FifoIn(inner) => Pin::new(inner).poll_read(cx, buf),
            Self::Socket(inner) => Pin::new(inner).poll_read(cx, buf),
        }
    }
}

/// A writable endpoint, possibly shared by both transfer loops.
#[derive(Debug)]
pub enum SinkEndpoint {
    /// Terminal standard output.
    Terminal(Stdout),
    /// Write end of the stdout FIFO.
    FifoOut(pipe::Sender),
    /// Write half of the peer socket.
    Socket(OwnedWriteHalf),
}

impl SinkEndpoint {
    /// Role tag of this sink.
    #[must_use]
    pub fn kind(&self) -> EndpointKind {
        match self {
            Self::Terminal(_) => EndpointKind::TerminalOut,
            Self::FifoOut(_) => EndpointKind::FifoOut,
            Self::Socket(_) => EndpointKind::Socket,
        }
    }
}

impl AsyncWrite for SinkEndpoint {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Terminal(inner) => Pin::new(inner).poll_write(cx, buf),
            Self::FifoOut(inner) => Pin::new(inner).poll_write(cx, buf),
            Self::Socket(inner) => Pin::new(inner).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Terminal(inner) => Pin::new(inner).poll_flush(cx),
            Self::FifoOut(inner) => Pin::new(inner).poll_flush(cx),
            Self::Socket(inner) => Pin::new(inner).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Terminal(inner) => Pin::new(inner).poll_shutdown(cx),
            Self::FifoOut(inner) => Pin::new(inner).poll_shutdown(cx),
            Self::Socket(inner) => Pin::new(inner).poll_shutdown(cx),
        }
    }
}
