//! The duplex relay engine: route planning, segment framing, and the two
//! directional transfer loops.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::endpoint::{EndpointKind, RelaySession, SinkEndpoint, SourceEndpoint};
use crate::{AppError, Result};

pub mod codec;
pub mod routes;
pub mod transfer;

pub use routes::Direction;
pub use transfer::{run_transfer, SharedSink, TransferOutcome, TransferPair};

/// Derive both transfer pairs from the session's active endpoints.
///
/// Consumes the endpoint handles the routes call for, leaving the rest (the
/// listening socket, unused socket halves) in the session for the
/// Coordinator to close. When both directions target the same sink endpoint
/// they share one locked handle.
///
/// The upload pair always exists; the download pair is `None` when that loop
/// has nothing to read.
///
/// # Errors
///
/// Returns `AppError::Endpoint` if a planned endpoint is missing from the
/// session, which indicates the session was consumed twice.
pub fn bind_transfers(
    session: &mut RelaySession,
) -> Result<(TransferPair, Option<TransferPair>)> {
    let set = session.endpoint_set();
    let upload_plan = routes::upload_route(set);
    let download_plan = routes::download_route(set);

    let upload_source = take_source(session, upload_plan.source)?;
    let upload_sink: SharedSink = Arc::new(Mutex::new(take_sink(session, upload_plan.sink)?));

    let download = match download_plan {
        None => None,
        Some(plan) => {
            let source = take_source(session, plan.source)?;
            let sink = if plan.sink == upload_plan.sink {
                Arc::clone(&upload_sink)
            } else {
                Arc::new(Mutex::new(take_sink(session, plan.sink)?))
            };
            Some(TransferPair {
                direction: Direction::Download,
                source,
                sink,
                sink_kind: plan.sink,
            })
        }
    };

    let upload = TransferPair {
        direction: Direction::Upload,
        source: upload_source,
        sink: upload_sink,
        sink_kind: upload_plan.sink,
    };

    Ok((upload, download))
}

fn take_source(session: &mut RelaySession, kind: EndpointKind) -> Result<SourceEndpoint> {
    match kind {
        EndpointKind::TerminalIn => Ok(SourceEndpoint::Terminal(tokio::io::stdin())),
        EndpointKind::FifoIn => session
            .take_fifo_in()
            .map(SourceEndpoint::FifoIn)
            .ok_or_else(|| AppError::Endpoint("stdin fifo endpoint is not open".into())),
        EndpointKind::Socket => session
            .take_socket_read()
            .map(SourceEndpoint::Socket)
            .ok_or_else(|| AppError::Endpoint("socket read endpoint is not open".into())),
        EndpointKind::TerminalOut | EndpointKind::FifoOut => Err(AppError::Endpoint(format!(
            "{kind} cannot act as a source"
        ))),
    }
}

fn take_sink(session: &mut RelaySession, kind: EndpointKind) -> Result<SinkEndpoint> {
    match kind {
        EndpointKind::TerminalOut => Ok(SinkEndpoint::Terminal(tokio::io::stdout())),
        EndpointKind::FifoOut => session
            .take_fifo_out()
            .map(SinkEndpoint::FifoOut)
            .ok_or_else(|| AppError::Endpoint("stdout fifo endpoint is not open".into())),
        EndpointKind::Socket => session
            .take_socket_write()
            .map(SinkEndpoint::Socket)
            .ok_or_else(|| AppError::Endpoint("socket write endpoint is not open".into())),
        EndpointKind::TerminalIn | EndpointKind::FifoIn => Err(AppError::Endpoint(format!(
            "{kind} cannot act as a sink"
        ))),
    }
}
