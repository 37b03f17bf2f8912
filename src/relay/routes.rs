//! Data-driven route planning for the two transfer loops.
//!
//! The forwarding rules are evaluated independently per direction over the
//! session's [`EndpointSet`]; the loops themselves contain no endpoint
//! branching.

use std::fmt::{Display, Formatter};

use crate::endpoint::{EndpointKind, EndpointSet};

/// Which way a transfer loop pumps data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Local input toward the remote peer.
    Upload,
    /// Remote peer toward local output.
    Download,
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Upload => "upload",
            Self::Download => "download",
        })
    }
}

/// The (source, sink) pair one loop pumps between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutePlan {
    /// Endpoint the loop reads from.
    pub source: EndpointKind,
    /// Endpoint the loop writes to.
    pub sink: EndpointKind,
}

/// Route for the upload loop. The upload loop always runs.
#[must_use]
pub fn upload_route(set: EndpointSet) -> RoutePlan {
    let source = if set.fifo_in && set.socket {
        EndpointKind::FifoIn
    } else {
        EndpointKind::TerminalIn
    };

    let sink = match (set.fifo_in && set.socket, set.fifo_out, set.socket) {
        (true, _, _) => EndpointKind::Socket,
        (false, true, _) => EndpointKind::FifoOut,
        (false, false, true) => EndpointKind::Socket,
        (false, false, false) => EndpointKind::TerminalOut,
    };

    RoutePlan { source, sink }
}

/// Route for the download loop, or `None` when it has nothing to read:
/// without a socket or a stdin FIFO the loop does not run.
#[must_use]
pub fn download_route(set: EndpointSet) -> Option<RoutePlan> {
    let source = if set.socket {
        EndpointKind::Socket
    } else if set.fifo_in {
        EndpointKind::FifoIn
    } else {
        return None;
    };

    let sink = if set.fifo_out && set.socket {
        EndpointKind::FifoOut
    } else {
        EndpointKind::TerminalOut
    };

    Some(RoutePlan { source, sink })
}
