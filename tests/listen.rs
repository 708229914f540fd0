//! Integration tests for the server setup path: bind, listen, accept one.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use tcp_chat::listener::{ListenError, Listener};

/// Happy path: bind an OS-assigned port, accept one client, exchange bytes.
#[tokio::test]
async fn accepts_a_single_connection() {
    let listener = Listener::bind(0, 4).await.expect("bind");
    let port = listener.local_addr().unwrap().port();

    let client = tokio::spawn(async move {
        TcpStream::connect(("127.0.0.1", port))
            .await
            .expect("client connect")
    });

    let mut accepted = timeout(Duration::from_secs(5), listener.accept_one())
        .await
        .expect("accept timed out")
        .expect("accept failed");
    let mut client = client.await.unwrap();

    client.write_all(b"hello\n").await.unwrap();
    let mut buf = [0u8; 6];
    accepted.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"hello\n");
}

/// One accept per invocation: a second client connecting while the
/// first session is active lands in the backlog and is never handed to the
/// application.
#[tokio::test]
async fn second_client_queues_in_the_backlog() {
    let listener = Listener::bind(0, 4).await.expect("bind");
    let port = listener.local_addr().unwrap().port();

    let mut first = TcpStream::connect(("127.0.0.1", port))
        .await
        .expect("first connect");
    let second = TcpStream::connect(("127.0.0.1", port))
        .await
        .expect("second connect (queued)");

    let mut accepted = timeout(Duration::from_secs(5), listener.accept_one())
        .await
        .expect("accept timed out")
        .expect("accept failed");

    // The single accepted stream pairs with the first client.
    first.write_all(b"1").await.unwrap();
    let mut byte = [0u8; 1];
    accepted.read_exact(&mut byte).await.unwrap();
    assert_eq!(&byte, b"1");

    drop(second);
}

/// SO_REUSEADDR recovers from TIME_WAIT remnants, not from a port
/// another socket is actively listening on — the single retry must also
/// fail and surface as a typed bind error rather than a process exit.
#[tokio::test]
async fn bind_on_an_actively_held_port_fails_after_the_retry() {
    let holder = tokio::net::TcpListener::bind("0.0.0.0:0").await.unwrap();
    let port = holder.local_addr().unwrap().port();

    match Listener::bind(port, 4).await {
        Err(ListenError::Bind { addr, .. }) => assert_eq!(addr.port(), port),
        Err(other) => panic!("expected a bind error, got: {other}"),
        Ok(_) => panic!("bind unexpectedly succeeded on a held port"),
    }
}
