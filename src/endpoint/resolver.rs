//! Socket role negotiation.
//!
//! Two cooperating instances of the program are invoked identically and must
//! agree on roles without prior coordination: each first tries to connect as
//! a client, and the one that finds no listener becomes the server, binds,
//! listens with a backlog of one, and accepts exactly one peer.

use std::fmt::{Display, Formatter};
use std::net::SocketAddr;

use tokio::net::{lookup_host, TcpListener, TcpSocket, TcpStream};
use tracing::{debug, info};

use crate::{AppError, Result};

/// Which side of the negotiated connection this instance ended up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketRole {
    /// Connected to an already-listening peer.
    Client,
    /// Bound, listened, and accepted the peer.
    Server,
}

impl Display for SocketRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Client => "client",
            Self::Server => "server",
        })
    }
}

/// Outcome of a successful negotiation.
#[derive(Debug)]
pub struct SocketLink {
    /// The established peer connection.
    pub stream: TcpStream,
    /// The listening socket, present only in server role. Kept open until
    /// full shutdown.
    pub listener: Option<TcpListener>,
    /// Negotiated role.
    pub role: SocketRole,
}

/// Negotiate the peer connection for `address:port`.
///
/// Tries a client connect first; on failure falls back to bind + listen
/// (backlog 1, single peer by design) and accepts exactly one connection.
/// The listening handle is returned alongside the stream so it outlives the
/// accept and stays open until shutdown.
///
/// # Errors
///
/// Returns `AppError::Resolve` when the connect fails and the bind/listen
/// fallback fails as well; socket mode is then fatal for the relay.
pub async fn resolve(address: &str, port: u16) -> Result<SocketLink> {
    match TcpStream::connect((address, port)).await {
        Ok(stream) => {
            info!(address, port, "connected to listening peer");
            Ok(SocketLink {
                stream,
                listener: None,
                role: SocketRole::Client,
            })
        }
        Err(err) => {
            debug!(address, port, %err, "client connect failed, falling back to server role");
            serve_one(address, port).await
        }
    }
}

/// Bind, listen, and accept exactly one peer connection.
async fn serve_one(address: &str, port: u16) -> Result<SocketLink> {
    let addr = lookup_host((address, port))
        .await
        .map_err(|err| AppError::Resolve(format!("cannot resolve {address}:{port}: {err}")))?
        .next()
        .ok_or_else(|| AppError::Resolve(format!("no usable address for {address}:{port}")))?;

    let socket = match addr {
        SocketAddr::V4(_) => TcpSocket::new_v4(),
        SocketAddr::V6(_) => TcpSocket::new_v6(),
    }
    .map_err(|err| AppError::Resolve(format!("failed to create socket: {err}")))?;

    socket
        .bind(addr)
        .map_err(|err| AppError::Resolve(format!("failed to bind {addr}: {err}")))?;

    // Single peer by design.
    let listener = socket
        .listen(1)
        .map_err(|err| AppError::Resolve(format!("failed to listen on {addr}: {err}")))?;

    info!(%addr, "listening for peer");

    let (stream, peer) = listener
        .accept()
        .await
        .map_err(|err| AppError::Resolve(format!("failed to accept peer: {err}")))?;

    info!(%peer, "accepted peer connection");

    Ok(SocketLink {
        stream,
        listener: Some(listener),
        role: SocketRole::Server,
    })
}
