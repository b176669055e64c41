//! End-to-end tests driving a live server over loopback TCP.

use futures::{SinkExt, StreamExt};
use linechat::config::Config;
use linechat::core::protocol::LineCodec;
use linechat::server::{connection_loop, initialization};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::time::timeout;
use tokio_test::assert_ok;
use tokio_util::codec::Framed;

type Client = Framed<TcpStream, LineCodec>;

async fn start_server_with(config: Config) -> (SocketAddr, broadcast::Sender<()>) {
    let ctx = initialization::setup(config).await.expect("server setup");
    let addr = ctx.listener.local_addr().expect("listener address");
    let shutdown = ctx.shutdown_tx.clone();
    tokio::spawn(connection_loop::run(ctx));
    (addr, shutdown)
}

async fn start_server() -> (SocketAddr, broadcast::Sender<()>) {
    // Port 0 gives each test its own ephemeral listener.
    let config = Config {
        port: 0,
        ..Config::default()
    };
    start_server_with(config).await
}

async fn connect(addr: SocketAddr) -> Client {
    let stream = TcpStream::connect(addr).await.expect("connect");
    Framed::new(stream, LineCodec::default())
}

/// Connects, registers `nickname`, and consumes the session's own join
/// announcement so each test starts from a quiet stream.
async fn join(addr: SocketAddr, nickname: &str) -> Client {
    let mut client = connect(addr).await;
    assert_ok!(client.send(nickname.to_string()).await);
    assert_eq!(
        recv_line(&mut client).await,
        format!("server> {nickname} has joined.")
    );
    client
}

async fn recv_line(client: &mut Client) -> String {
    timeout(Duration::from_secs(2), client.next())
        .await
        .expect("timed out waiting for a frame")
        .expect("connection closed while expecting a frame")
        .expect("frame decode error")
}

async fn expect_closed(client: &mut Client) {
    let frame = timeout(Duration::from_secs(2), client.next())
        .await
        .expect("timed out waiting for the connection to close");
    assert!(
        frame.is_none(),
        "expected the server to close the connection, got {frame:?}"
    );
}

#[tokio::test]
async fn test_empty_nickname_closes_without_announcement() {
    let (addr, _shutdown) = start_server().await;
    let mut observer = join(addr, "Observer").await;

    let mut ghost = connect(addr).await;
    ghost.send("   ".to_string()).await.expect("send blank nickname");
    expect_closed(&mut ghost).await;

    // The observer hears nothing about the discarded session; the next
    // frame it sees is the following join.
    let mut late = join(addr, "Late").await;
    assert_eq!(recv_line(&mut observer).await, "server> Late has joined.");
    let _ = late.close().await;
}

#[tokio::test]
async fn test_join_and_leave_are_announced_in_order() {
    let (addr, _shutdown) = start_server().await;
    let mut alice = join(addr, "Alice").await;

    let bob = join(addr, "Bob").await;
    assert_eq!(recv_line(&mut alice).await, "server> Bob has joined.");

    // Dropping the socket is an abrupt disconnect; the server still
    // deregisters and announces exactly once.
    drop(bob);
    assert_eq!(recv_line(&mut alice).await, "server> Bob has left.");
}

#[tokio::test]
async fn test_chat_broadcast_reaches_everyone_including_sender() {
    let (addr, _shutdown) = start_server().await;
    let mut alice = join(addr, "Alice").await;
    let mut bob = join(addr, "Bob").await;
    let mut carol = join(addr, "Carol").await;
    assert_eq!(recv_line(&mut alice).await, "server> Bob has joined.");
    assert_eq!(recv_line(&mut alice).await, "server> Carol has joined.");
    assert_eq!(recv_line(&mut bob).await, "server> Carol has joined.");

    alice.send("hello".to_string()).await.expect("send chat");

    assert_eq!(recv_line(&mut alice).await, "Alice> hello");
    assert_eq!(recv_line(&mut bob).await, "Alice> hello");
    assert_eq!(recv_line(&mut carol).await, "Alice> hello");
}

#[tokio::test]
async fn test_whisper_is_invisible_to_third_parties() {
    let (addr, _shutdown) = start_server().await;
    let mut alice = join(addr, "Alice").await;
    let mut bob = join(addr, "Bob").await;
    let mut carol = join(addr, "Carol").await;
    assert_eq!(recv_line(&mut alice).await, "server> Bob has joined.");
    assert_eq!(recv_line(&mut alice).await, "server> Carol has joined.");
    assert_eq!(recv_line(&mut bob).await, "server> Carol has joined.");

    alice.send("/w Bob secret".to_string()).await.expect("send whisper");

    assert_eq!(recv_line(&mut bob).await, "(whisper) Alice> secret");
    assert_eq!(recv_line(&mut alice).await, "(whisper sent) Alice -> Bob> secret");

    // Carol never sees the whisper: her next frame is the following chat.
    alice.send("ping".to_string()).await.expect("send chat");
    assert_eq!(recv_line(&mut carol).await, "Alice> ping");
}

#[tokio::test]
async fn test_whisper_to_unknown_target_notifies_sender_only() {
    let (addr, _shutdown) = start_server().await;
    let mut alice = join(addr, "Alice").await;

    alice.send("/w Ghost hi".to_string()).await.expect("send whisper");
    assert_eq!(
        recv_line(&mut alice).await,
        "server> target nickname not found: Ghost"
    );
}

#[tokio::test]
async fn test_self_whisper_delivers_exactly_once() {
    let (addr, _shutdown) = start_server().await;
    let mut alice = join(addr, "Alice").await;

    alice.send("/w Alice hi".to_string()).await.expect("send whisper");
    assert_eq!(recv_line(&mut alice).await, "(whisper) Alice> hi");

    // No confirmation frame follows; the next frame is the chat echo.
    alice.send("still here".to_string()).await.expect("send chat");
    assert_eq!(recv_line(&mut alice).await, "Alice> still here");
}

#[tokio::test]
async fn test_malformed_whisper_gets_usage_notice() {
    let (addr, _shutdown) = start_server().await;
    let mut alice = join(addr, "Alice").await;

    alice.send("/w Bob".to_string()).await.expect("send whisper");
    assert_eq!(
        recv_line(&mut alice).await,
        "server> usage: /w <nickname> <message>"
    );

    // The session stays usable afterwards.
    alice.send("hello".to_string()).await.expect("send chat");
    assert_eq!(recv_line(&mut alice).await, "Alice> hello");
}

#[tokio::test]
async fn test_quit_sends_farewell_and_announces_departure_once() {
    let (addr, _shutdown) = start_server().await;
    let mut alice = join(addr, "Alice").await;
    let mut bob = join(addr, "Bob").await;
    assert_eq!(recv_line(&mut alice).await, "server> Bob has joined.");

    alice.send("/quit".to_string()).await.expect("send quit");
    assert_eq!(
        recv_line(&mut alice).await,
        "server> connection closing. goodbye."
    );
    expect_closed(&mut alice).await;

    assert_eq!(recv_line(&mut bob).await, "server> Alice has left.");

    // No second departure notice: Bob's next frame is his own chat echo.
    bob.send("anyone?".to_string()).await.expect("send chat");
    assert_eq!(recv_line(&mut bob).await, "Bob> anyone?");
}

#[tokio::test]
async fn test_overlong_line_terminates_only_the_offender() {
    let config = Config {
        port: 0,
        max_line_len: 64,
        ..Config::default()
    };
    let (addr, _shutdown) = start_server_with(config).await;
    let mut alice = join(addr, "Alice").await;
    let mut bob = join(addr, "Bob").await;
    assert_eq!(recv_line(&mut alice).await, "server> Bob has joined.");

    alice.send("a".repeat(200)).await.expect("send long line");
    expect_closed(&mut alice).await;

    assert_eq!(recv_line(&mut bob).await, "server> Alice has left.");
    bob.send("fine here".to_string()).await.expect("send chat");
    assert_eq!(recv_line(&mut bob).await, "Bob> fine here");
}

#[tokio::test]
async fn test_shutdown_notifies_every_session_and_closes() {
    let (addr, shutdown) = start_server().await;
    let mut alice = join(addr, "Alice").await;
    let mut bob = join(addr, "Bob").await;
    assert_eq!(recv_line(&mut alice).await, "server> Bob has joined.");

    shutdown.send(()).expect("request shutdown");

    assert_eq!(
        recv_line(&mut alice).await,
        "server> server is shutting down."
    );
    assert_eq!(recv_line(&mut bob).await, "server> server is shutting down.");
    expect_closed(&mut alice).await;
    expect_closed(&mut bob).await;
}

#[tokio::test]
async fn test_multiple_lines_in_one_write_are_all_routed() {
    let (addr, _shutdown) = start_server().await;
    let mut alice = join(addr, "Alice").await;
    let mut bob = join(addr, "Bob").await;
    assert_eq!(recv_line(&mut alice).await, "server> Bob has joined.");

    // Two frames in a single TCP write; strict framing splits them.
    let stream = alice.get_mut();
    tokio::io::AsyncWriteExt::write_all(stream, b"one\ntwo\n")
        .await
        .expect("raw write");

    assert_eq!(recv_line(&mut bob).await, "Alice> one");
    assert_eq!(recv_line(&mut bob).await, "Alice> two");
}
