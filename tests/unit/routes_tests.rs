//! Unit tests for route planning.
//!
//! Walks the full truth table of active-endpoint combinations for both
//! directions; the rules are asymmetric by design, so every combination is
//! pinned explicitly.

use pipelink::endpoint::{EndpointKind, EndpointSet};
use pipelink::relay::routes::{download_route, upload_route};

fn set(fifo_in: bool, fifo_out: bool, socket: bool) -> EndpointSet {
    EndpointSet {
        fifo_in,
        fifo_out,
        socket,
    }
}

/// Upload routes for every combination of active endpoints.
#[test]
fn upload_routes_cover_the_full_truth_table() {
    use EndpointKind::{FifoIn, FifoOut, Socket, TerminalIn, TerminalOut};

    // (fifo_in, fifo_out, socket) -> (source, sink)
    let table = [
        (set(false, false, false), TerminalIn, TerminalOut),
        (set(true, false, false), TerminalIn, TerminalOut),
        (set(false, true, false), TerminalIn, FifoOut),
        (set(false, false, true), TerminalIn, Socket),
        (set(true, true, false), TerminalIn, FifoOut),
        (set(true, false, true), FifoIn, Socket),
        (set(false, true, true), TerminalIn, FifoOut),
        (set(true, true, true), FifoIn, Socket),
    ];

    for (endpoints, source, sink) in table {
        let plan = upload_route(endpoints);
        assert_eq!(
            plan.source, source,
            "upload source mismatch for {endpoints:?}"
        );
        assert_eq!(plan.sink, sink, "upload sink mismatch for {endpoints:?}");
    }
}

/// Download routes for every combination of active endpoints, including the
/// combinations where the loop does not run.
#[test]
fn download_routes_cover_the_full_truth_table() {
    use EndpointKind::{FifoIn, FifoOut, Socket, TerminalOut};

    let table = [
        (set(false, false, false), None),
        (set(true, false, false), Some((FifoIn, TerminalOut))),
        (set(false, true, false), None),
        (set(false, false, true), Some((Socket, TerminalOut))),
        (set(true, true, false), Some((FifoIn, TerminalOut))),
        (set(true, false, true), Some((Socket, TerminalOut))),
        (set(false, true, true), Some((Socket, FifoOut))),
        (set(true, true, true), Some((Socket, FifoOut))),
    ];

    for (endpoints, expected) in table {
        let plan = download_route(endpoints).map(|plan| (plan.source, plan.sink));
        assert_eq!(plan, expected, "download route mismatch for {endpoints:?}");
    }
}

/// The two loops never read the same endpoint, whatever is active.
#[test]
fn sources_never_overlap() {
    for fifo_in in [false, true] {
        for fifo_out in [false, true] {
            for socket in [false, true] {
                let endpoints = set(fifo_in, fifo_out, socket);
                let upload = upload_route(endpoints);
                if let Some(download) = download_route(endpoints) {
                    assert_ne!(
                        upload.source, download.source,
                        "loops must not share a source for {endpoints:?}"
                    );
                }
            }
        }
    }
}
