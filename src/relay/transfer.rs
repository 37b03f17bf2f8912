//! The directional transfer loop.
//!
//! One parametrized loop, instantiated twice (upload and download). Each
//! instance reads bounded line segments from its source through
//! [`SegmentCodec`] and writes each segment whole to its sink. EOF, a read
//! error, or a write error terminates the loop and signals the Coordinator,
//! which cancels the sibling; the token is multiplexed with the read so a
//! cancelled loop exits even while blocked.

use std::io;
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tokio_util::codec::FramedRead;
use tracing::{debug, trace, warn};

use crate::endpoint::{EndpointKind, SinkEndpoint, SourceEndpoint};
use crate::relay::codec::SegmentCodec;
use crate::relay::routes::Direction;
use crate::shutdown::{Coordinator, ShutdownTrigger};
use crate::AppError;

/// A sink handle, shared when both loops target the same endpoint.
///
/// A segment is written under the lock, so two loops sharing a sink cannot
/// interleave bytes within a single line.
pub type SharedSink = Arc<Mutex<SinkEndpoint>>;

/// Everything one transfer loop needs to run.
#[derive(Debug)]
pub struct TransferPair {
    /// Which way this loop pumps.
    pub direction: Direction,
    /// Endpoint read from; owned exclusively by this loop.
    pub source: SourceEndpoint,
    /// Endpoint written to; possibly shared with the sibling loop.
    pub sink: SharedSink,
    /// Role tag of the sink, for logging without taking the lock.
    pub sink_kind: EndpointKind,
}

/// How a transfer loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The source reached end of stream.
    SourceClosed,
    /// Reading the source failed.
    SourceError,
    /// Writing the sink failed.
    SinkError,
    /// The Coordinator cancelled the loop.
    Cancelled,
}

/// Run one directional transfer loop until EOF, error, or cancellation.
///
/// Every termination cause other than cancellation itself signals the
/// Coordinator so the sibling loop is cancelled too.
pub async fn run_transfer(pair: TransferPair, coordinator: Arc<Coordinator>) -> TransferOutcome {
    let TransferPair {
        direction,
        source,
        sink,
        sink_kind,
    } = pair;

    let source_kind = source.kind();
    let mut segments = FramedRead::new(source, SegmentCodec::new());

    debug!(%direction, source = %source_kind, sink = %sink_kind, "transfer loop started");

    let outcome = loop {
        tokio::select! {
            biased;

            () = coordinator.cancelled() => {
                debug!(%direction, "cancellation received, stopping");
                break TransferOutcome::Cancelled;
            }

            segment = segments.next() => {
                match segment {
                    None => {
                        debug!(%direction, source = %source_kind, "source reached end of stream");
                        coordinator.begin(ShutdownTrigger::SourceEof(direction));
                        break TransferOutcome::SourceClosed;
                    }

                    Some(Err(err)) => {
                        let err = AppError::Transfer(format!("{source_kind} read failed: {err}"));
                        warn!(%direction, %err, "transfer loop failed");
                        coordinator.begin(ShutdownTrigger::TransferFault(direction));
                        break TransferOutcome::SourceError;
                    }

                    Some(Ok(segment)) => {
                        if let Err(err) = write_segment(&sink, &segment).await {
                            let trigger = if err.kind() == io::ErrorKind::BrokenPipe {
                                ShutdownTrigger::BrokenPipe(direction)
                            } else {
                                ShutdownTrigger::TransferFault(direction)
                            };
                            let err =
                                AppError::Transfer(format!("{sink_kind} write failed: {err}"));
                            warn!(%direction, %err, "transfer loop failed");
                            coordinator.begin(trigger);
                            break TransferOutcome::SinkError;
                        }

                        trace!(
                            %direction,
                            source = %source_kind,
                            sink = %sink_kind,
                            bytes = segment.len(),
                            "forwarded segment"
                        );
                    }
                }
            }
        }
    };

    debug!(%direction, ?outcome, "transfer loop finished");
    outcome
}

/// Write one whole segment, holding the sink lock for its duration.
async fn write_segment(sink: &SharedSink, segment: &[u8]) -> io::Result<()> {
    let mut guard = sink.lock().await;
    guard.write_all(segment).await?;
    guard.flush().await
}
