//! # Line Channel Integration Tests
//!
//! Runs the transport and the client session against a scripted server on a
//! loopback socket.
//!
//! Run with: cargo test --package bomber_networking --test line_channel

#![allow(clippy::unwrap_used, clippy::panic)]

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use bomber_networking::{
    ChannelConfig, ChannelEvent, ClientConfig, GameClient, LineChannel, NetError, ReadyOutcome,
    RenderOp, RoundEvent, SessionEvent,
};
use bomber_shared::{ClientCommand, ClientRole, GridPos};

const WAIT: Duration = Duration::from_secs(5);

const LOBBY: &str = r##"{"type":"game_state","payload":{"state":"WAITING","map":[],"players":[{"id":"me","name":"Ann","x":1,"y":1,"alive":true,"ready":false}],"bombs":[],"explosions":[],"time_remaining":null,"winner":null}}"##;

const LIVE: &str = r##"{"type":"game_state","payload":{"state":"IN_PROGRESS","map":[["#","#","#","#"],["#"," "," ","#"],["#","#","#","#"]],"players":[{"id":"me","name":"Ann","x":1,"y":1,"alive":true,"ready":true},{"id":"bob","name":"Bob","x":2,"y":1,"alive":true,"ready":true}],"bombs":[{"x":2,"y":1}],"explosions":[],"time_remaining":90,"winner":null}}"##;

/// Scripted peer: the closure gets a line reader and a writer for the single
/// accepted connection.
struct Server {
    addr: String,
    handle: JoinHandle<()>,
}

impl Server {
    fn start<F>(script: F) -> Self
    where
        F: FnOnce(&mut BufReader<TcpStream>, &mut TcpStream) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut writer = stream.try_clone().unwrap();
            let mut reader = BufReader::new(stream);
            script(&mut reader, &mut writer);
        });
        Self { addr, handle }
    }

    fn channel(&self, max_frame_bytes: usize) -> Arc<LineChannel> {
        Arc::new(LineChannel::new(ChannelConfig {
            addr: self.addr.clone(),
            connect_timeout: Duration::from_secs(1),
            max_frame_bytes,
        }))
    }

    fn client_config(&self) -> ClientConfig {
        let (host, port) = self.addr.rsplit_once(':').unwrap();
        ClientConfig {
            host: host.to_owned(),
            port: port.parse().unwrap(),
            player_name: "Ann".to_owned(),
            ..ClientConfig::default()
        }
    }

    fn join(self) {
        self.handle.join().unwrap();
    }
}

fn read_line(reader: &mut BufReader<TcpStream>) -> serde_json::Value {
    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    serde_json::from_str(&line).unwrap()
}

fn send_line(writer: &mut TcpStream, line: &str) {
    writer.write_all(line.as_bytes()).unwrap();
    writer.write_all(b"\n").unwrap();
}

/// Polls until `done` holds for the accumulated frames.
fn poll_until(
    client: &mut GameClient,
    mut done: impl FnMut(&[RenderOp], &[RoundEvent], &[SessionEvent]) -> bool,
) -> (Vec<RenderOp>, Vec<RoundEvent>, Vec<SessionEvent>) {
    let deadline = Instant::now() + WAIT;
    let (mut ops, mut rounds, mut session) = (Vec::new(), Vec::new(), Vec::new());
    while !done(&ops, &rounds, &session) {
        assert!(Instant::now() < deadline, "timed out; ops={ops:?} rounds={rounds:?}");
        let frame = client.poll(Instant::now());
        ops.extend(frame.ops);
        rounds.extend(frame.rounds);
        session.extend(frame.session);
        thread::sleep(Duration::from_millis(5));
    }
    (ops, rounds, session)
}

#[test]
fn test_join_then_receive_identity_and_snapshot() {
    let server = Server::start(|reader, writer| {
        let join = read_line(reader);
        assert_eq!(join["type"], "join");
        assert_eq!(join["role"], "spectator");
        assert!(join.get("name").is_none());
        send_line(writer, r#"{"type":"assign_id","payload":"me"}"#);
        send_line(writer, LIVE);
        let _ = read_line(reader);
    });

    let channel = server.channel(4096);
    let events = channel.subscribe();
    channel.connect().unwrap();
    channel.send(&ClientCommand::join(ClientRole::Spectator, "ignored"));

    let Some(ChannelEvent::AssignedId(id)) = events.recv_timeout(WAIT) else {
        panic!("expected assign_id");
    };
    assert_eq!(id.as_str(), "me");

    let Some(ChannelEvent::Snapshot(snapshot)) = events.recv_timeout(WAIT) else {
        panic!("expected snapshot");
    };
    assert!(snapshot.is_initialized());
    assert_eq!(snapshot.players().len(), 2);

    channel.send(&ClientCommand::Ready);
    server.join();
}

#[test]
fn test_undecodable_frames_are_dropped_not_fatal() {
    let server = Server::start(|reader, writer| {
        send_line(writer, "this is not json");
        send_line(writer, r#"{"type":"chat","payload":"hello"}"#);
        send_line(writer, &"x".repeat(500));
        send_line(writer, r#"{"type":"assign_id","payload":"p7"}"#);
        let _ = read_line(reader);
    });

    let channel = server.channel(256);
    let events = channel.subscribe();
    channel.connect().unwrap();

    let Some(ChannelEvent::AssignedId(id)) = events.recv_timeout(WAIT) else {
        panic!("expected the valid frame after the bad ones");
    };
    assert_eq!(id.as_str(), "p7");
    assert!(channel.is_connected());
    assert_eq!(channel.stats().frames_dropped, 3);

    channel.send(&ClientCommand::PlaceBomb);
    server.join();
}

#[test]
fn test_peer_close_reports_cause() {
    let server = Server::start(|_, _| {});

    let channel = server.channel(4096);
    let events = channel.subscribe();
    channel.connect().unwrap();
    server.join();

    let Some(ChannelEvent::Disconnected { cause: Some(cause) }) = events.recv_timeout(WAIT) else {
        panic!("expected a disconnect with a cause");
    };
    assert!(matches!(*cause, NetError::ClosedByPeer | NetError::Io(_)));
    assert!(!channel.is_connected());
}

#[test]
fn test_sends_after_peer_reset_report_once() {
    let server = Server::start(|reader, _| {
        assert_eq!(read_line(reader)["type"], "join");
    });

    let channel = server.channel(4096);
    let events = channel.subscribe();
    channel.connect().unwrap();
    channel.send(&ClientCommand::join(ClientRole::Player, "Ann"));
    server.join();

    // Keep writing into the closed socket until the channel notices.
    let deadline = Instant::now() + WAIT;
    while channel.is_connected() {
        assert!(Instant::now() < deadline, "channel never noticed the peer went away");
        channel.send(&ClientCommand::PlaceBomb);
        thread::sleep(Duration::from_millis(5));
    }
    for _ in 0..3 {
        channel.send(&ClientCommand::PlaceBomb);
    }

    let disconnects: Vec<_> = std::iter::from_fn(|| events.recv_timeout(Duration::from_millis(200)))
        .filter(|e| matches!(e, ChannelEvent::Disconnected { .. }))
        .collect();
    let [ChannelEvent::Disconnected { cause: Some(cause) }] = disconnects.as_slice() else {
        panic!("expected exactly one disconnect with a cause, got {disconnects:?}");
    };
    assert!(matches!(**cause, NetError::ClosedByPeer | NetError::Io(_)));
    assert!(!channel.is_connected());
}

#[test]
fn test_intentional_disconnect_reports_once_without_cause() {
    let server = Server::start(|reader, _| {
        let mut sink = String::new();
        while reader.read_line(&mut sink).map(|n| n > 0).unwrap_or(false) {}
    });

    let channel = server.channel(4096);
    let events = channel.subscribe();
    assert!(channel.connect().unwrap());
    assert!(!channel.connect().unwrap(), "second connect reuses the open one");
    assert!(channel.is_connected());

    channel.disconnect();
    assert!(matches!(
        events.recv_timeout(WAIT),
        Some(ChannelEvent::Disconnected { cause: None })
    ));
    assert!(events.recv_timeout(Duration::from_millis(200)).is_none());

    // Sending after close is dropped quietly.
    channel.send(&ClientCommand::Ready);
    server.join();
}

#[test]
fn test_connect_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let channel = LineChannel::new(ChannelConfig {
        addr,
        connect_timeout: Duration::from_millis(500),
        max_frame_bytes: 1024,
    });
    assert!(channel.connect().is_err());
    assert!(!channel.is_connected());
}

#[test]
fn test_game_client_session() {
    let server = Server::start(|reader, writer| {
        let join = read_line(reader);
        assert_eq!(join["name"], "Ann");
        send_line(writer, r#"{"type":"assign_id","payload":"me"}"#);
        send_line(writer, LOBBY);

        assert_eq!(read_line(reader)["type"], "ready");
        send_line(writer, LIVE);

        let step = read_line(reader);
        assert_eq!((step["type"].as_str(), step["dx"].as_i64()), (Some("move"), Some(1)));
        let mut sink = String::new();
        while reader.read_line(&mut sink).map(|n| n > 0).unwrap_or(false) {}
    });

    let config = server.client_config();
    let channel = Arc::new(LineChannel::new(ChannelConfig::from(&config)));
    let mut client = GameClient::new(config, channel);
    client.connect().unwrap();
    // Already connected: no second join reaches the server.
    client.connect().unwrap();

    let (ops, rounds, session) =
        poll_until(&mut client, |_, rounds, _| rounds.contains(&RoundEvent::EnteredLobby));
    assert!(ops.is_empty(), "lobby frame has no grid");
    assert!(matches!(session.as_slice(), [SessionEvent::Identified(id)] if id.as_str() == "me"));
    assert!(rounds.iter().any(|e| matches!(e, RoundEvent::RosterChanged(r) if r.len() == 1)));

    assert_eq!(client.ready(), ReadyOutcome::Sent);
    let (ops, _, _) =
        poll_until(&mut client, |_, rounds, _| rounds.contains(&RoundEvent::RoundStarted));
    assert!(ops.iter().any(|op| matches!(op, RenderOp::ReplaceGrid { .. })));
    assert!(ops.iter().any(|op| matches!(op, RenderOp::CreateBomb { .. })));
    assert!(ops.iter().any(|op| matches!(op, RenderOp::CreatePlayer { view, .. } if view.id.as_str() == "bob")));
    assert!(ops.contains(&RenderOp::MoveLocalPlayer {
        position: GridPos::new(1, 1),
        alive: true,
        animate: false
    }));

    assert_eq!(client.ready(), ReadyOutcome::AlreadyInProgress);
    let predicted = client.move_player(bomber_shared::Direction::Right);
    assert_eq!(
        predicted,
        Some(RenderOp::MoveLocalPlayer { position: GridPos::new(2, 1), alive: true, animate: true })
    );

    client.disconnect();
    let (ops, _, session) = poll_until(&mut client, |_, _, session| {
        session.iter().any(|e| matches!(e, SessionEvent::Disconnected { .. }))
    });
    assert!(matches!(session.as_slice(), [SessionEvent::Disconnected { cause: None }]));
    assert_eq!(ops.iter().filter(|op| op.is_remove()).count(), 2);
    assert!(ops.contains(&RenderOp::RemoveLocalPlayer));
    server.join();
}
