//! The relay session: single owner of every open endpoint handle.
//!
//! The session is created by the top-level flow and passed by reference to
//! the Resolver, the FIFO opener, and the Shutdown Coordinator. A slot that
//! has been taken or closed is `None`, so a stale reference can never close a
//! freshly reopened handle and a double close is a no-op.

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::unix::pipe;
use tokio::net::TcpListener;
use tracing::debug;

use crate::endpoint::resolver::{SocketLink, SocketRole};
use crate::endpoint::EndpointSet;

/// Owner of all endpoint handles for one relay run.
#[derive(Debug, Default)]
pub struct RelaySession {
    fifo_in: Option<pipe::Receiver>,
    fifo_out: Option<pipe::Sender>,
    socket_read: Option<OwnedReadHalf>,
    socket_write: Option<OwnedWriteHalf>,
    listener: Option<TcpListener>,
    role: Option<SocketRole>,
}

impl RelaySession {
    /// Create an empty session with no endpoints.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the negotiated socket, splitting it into its two halves.
    ///
    /// In server role the listening socket is retained as well; it stays
    /// open, idle, until full shutdown.
    pub fn install_socket(&mut self, link: SocketLink) {
        let (read_half, write_half) = link.stream.into_split();
        self.socket_read = Some(read_half);
        self.socket_write = Some(write_half);
        self.listener = link.listener;
        self.role = Some(link.role);
    }

    /// Install the read end of the stdin FIFO.
    pub fn install_fifo_in(&mut self, receiver: pipe::Receiver) {
        self.fifo_in = Some(receiver);
    }

    /// Install the write end of the stdout FIFO.
    pub fn install_fifo_out(&mut self, sender: pipe::Sender) {
        self.fifo_out = Some(sender);
    }

    /// Which optional endpoints are currently present.
    #[must_use]
    pub fn endpoint_set(&self) -> EndpointSet {
        EndpointSet {
            fifo_in: self.fifo_in.is_some(),
            fifo_out: self.fifo_out.is_some(),
            socket: self.socket_read.is_some() || self.socket_write.is_some(),
        }
    }

    /// Negotiated socket role, if a socket was established.
    #[must_use]
    pub fn role(&self) -> Option<SocketRole> {
        self.role
    }

    /// Take ownership of the stdin FIFO read end.
    pub fn take_fifo_in(&mut self) -> Option<pipe::Receiver> {
        self.fifo_in.take()
    }

    /// Take ownership of the stdout FIFO write end.
    pub fn take_fifo_out(&mut self) -> Option<pipe::Sender> {
        self.fifo_out.take()
    }

    /// Take ownership of the socket read half.
    pub fn take_socket_read(&mut self) -> Option<OwnedReadHalf> {
        self.socket_read.take()
    }

    /// Take ownership of the socket write half.
    pub fn take_socket_write(&mut self) -> Option<OwnedWriteHalf> {
        self.socket_write.take()
    }

    /// Close every endpoint still held by the session.
    ///
    /// Each close is performed at most once; slots already taken by a
    /// transfer loop or closed earlier are skipped, so the call is idempotent
    /// and safe to repeat any number of times.
    pub fn close_all(&mut self) {
        if self.fifo_out.take().is_some() {
            debug!("closed fifo-out endpoint");
        }
        if self.fifo_in.take().is_some() {
            debug!("closed fifo-in endpoint");
        }
        let write_half = self.socket_write.take().is_some();
        let read_half = self.socket_read.take().is_some();
        if write_half || read_half {
            debug!("closed socket endpoint");
        }
        if self.listener.take().is_some() {
            debug!("closed listening socket");
        }
    }

    /// Whether every slot is empty (taken or closed).
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.fifo_in.is_none()
            && self.fifo_out.is_none()
            && self.socket_read.is_none()
            && self.socket_write.is_none()
            && self.listener.is_none()
    }
}
