//! Integration tests for socket role negotiation.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, timeout, Duration};

use pipelink::config::RelayConfig;
use pipelink::endpoint::resolver::{self, SocketRole};
use pipelink::endpoint::{establish, EndpointSet, RelaySession};
use pipelink::AppError;

use super::test_helpers::WAIT;

/// Without an address or port, establishing touches no network: no socket
/// endpoint exists and no role is negotiated.
#[tokio::test]
async fn no_target_means_no_socket_endpoint() {
    let config = RelayConfig::default();
    let mut session = RelaySession::new();

    establish(&config, &mut session)
        .await
        .expect("pure terminal mode must establish");

    assert_eq!(session.endpoint_set(), EndpointSet::default());
    assert_eq!(session.role(), None);
    assert!(session.is_drained(), "no endpoint may exist without a target");
}

/// With an already-listening peer the resolver connects as client and never
/// binds.
#[tokio::test]
async fn listening_peer_yields_client_role() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("peer bind");
    let addr = listener.local_addr().expect("peer addr");
    let accept = tokio::spawn(async move { listener.accept().await.expect("peer accept") });

    let link = timeout(WAIT, resolver::resolve("127.0.0.1", addr.port()))
        .await
        .expect("resolution timed out")
        .expect("resolution must succeed");

    assert_eq!(link.role, SocketRole::Client);
    assert!(
        link.listener.is_none(),
        "client role must not hold a listening socket"
    );

    accept.await.expect("join peer accept");
}

/// With no listener the resolver binds, listens, and accepts exactly one
/// connection; the listening handle stays open.
#[tokio::test]
async fn vacant_port_yields_server_role() {
    // Learn a free port, then release it for the resolver.
    let probe = TcpListener::bind("127.0.0.1:0").await.expect("probe bind");
    let port = probe.local_addr().expect("probe addr").port();
    drop(probe);

    let resolve_task = tokio::spawn(resolver::resolve("127.0.0.1", port));

    // Connect as the cooperating peer once the listener is up.
    let mut peer = loop {
        match TcpStream::connect(("127.0.0.1", port)).await {
            Ok(stream) => break stream,
            Err(_) => sleep(Duration::from_millis(20)).await,
        }
    };

    let link = timeout(WAIT, resolve_task)
        .await
        .expect("resolution timed out")
        .expect("join resolve task")
        .expect("resolution must succeed");

    assert_eq!(link.role, SocketRole::Server);
    assert!(
        link.listener.is_some(),
        "the listening handle must stay open until full shutdown"
    );

    // Data flows across the negotiated link.
    peer.write_all(b"ping\n").await.expect("peer write");
    let mut stream = link.stream;
    let mut buf = [0u8; 5];
    timeout(WAIT, stream.read_exact(&mut buf))
        .await
        .expect("read timed out")
        .expect("read");
    assert_eq!(&buf, b"ping\n");
}

/// When neither connect nor bind is possible, resolution fails with a
/// resolve error and the relay cannot run.
#[tokio::test]
async fn unreachable_target_is_fatal() {
    // A multicast address: TCP can neither connect to it nor bind on it.
    let result = timeout(WAIT, resolver::resolve("224.0.0.1", 39999))
        .await
        .expect("resolution must fail promptly");

    assert!(
        matches!(result, Err(AppError::Resolve(_))),
        "both-roles failure must be a resolve error, got: {result:?}"
    );
}
