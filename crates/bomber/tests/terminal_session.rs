//! # Terminal Session Test
//!
//! Drives [`TerminalApp`] against a scripted server on a loopback socket:
//! lobby with auto-ready, a live round drawn as text, a predicted move,
//! and a local quit.
//!
//! Run with: cargo test --package bomber --test terminal_session

#![allow(clippy::unwrap_used, clippy::panic)]

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use bomber::{FrameOutput, Input, TerminalApp};
use bomber_networking::{ChannelConfig, ClientConfig, GameClient, LineChannel};
use bomber_shared::{ClientCommand, ClientRole, Direction};

const WAIT: Duration = Duration::from_secs(5);

const LOBBY: &str = r##"{"type":"game_state","payload":{"state":"WAITING","map":[],"players":[{"id":"me","name":"Ann","x":1,"y":1,"alive":true,"ready":false}],"bombs":[],"explosions":[],"time_remaining":null,"winner":null}}"##;

const LIVE: &str = r##"{"type":"game_state","payload":{"state":"IN_PROGRESS","map":[["#","#","#","#","#"],["#"," "," ","."," "],["#","#","#","#","#"]],"players":[{"id":"me","name":"Ann","x":1,"y":1,"alive":true,"ready":true},{"id":"bob","name":"bob","x":4,"y":1,"alive":true,"ready":true}],"bombs":[],"explosions":[],"time_remaining":60,"winner":null}}"##;

/// Pumps frames until `done` holds for the accumulated output.
fn pump_until(app: &mut TerminalApp, mut done: impl FnMut(&FrameOutput) -> bool) -> FrameOutput {
    let deadline = Instant::now() + WAIT;
    let mut all = FrameOutput::default();
    while !done(&all) {
        assert!(Instant::now() < deadline, "timed out; got {all:?}");
        let out = app.frame(Instant::now());
        all.notices.extend(out.notices);
        if out.board.is_some() {
            all.board = out.board;
        }
        thread::sleep(Duration::from_millis(5));
    }
    all
}

#[test]
fn test_auto_ready_round_and_quit() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut writer = stream.try_clone().unwrap();
        let mut reader = BufReader::new(stream);
        let mut next = || {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            (!line.is_empty()).then(|| serde_json::from_str::<ClientCommand>(&line).unwrap())
        };
        let mut send = |line: &str| {
            writer.write_all(line.as_bytes()).unwrap();
            writer.write_all(b"\n").unwrap();
        };

        assert_eq!(
            next(),
            Some(ClientCommand::Join { role: ClientRole::Player, name: Some("Ann".into()) })
        );
        send(r#"{"type":"assign_id","payload":"me"}"#);
        send(LOBBY);
        assert_eq!(next(), Some(ClientCommand::Ready));
        send(LIVE);

        // Everything after the round starts, until the client hangs up.
        std::iter::from_fn(next).collect::<Vec<_>>()
    });

    let config = ClientConfig {
        host: addr.ip().to_string(),
        port: addr.port(),
        player_name: "Ann".to_owned(),
        ..ClientConfig::default()
    };
    let channel = Arc::new(LineChannel::new(ChannelConfig::from(&config)));
    let mut app = TerminalApp::new(GameClient::new(config, channel), true);
    app.client_mut().connect().unwrap();

    let lobby = pump_until(&mut app, |out| out.notices.iter().any(|n| n == "ready"));
    assert!(lobby.notices.contains(&"connected as me".to_owned()));
    assert!(lobby.notices.contains(&"in lobby".to_owned()));
    assert!(lobby.notices.contains(&"lobby: Ann".to_owned()));

    let live = pump_until(&mut app, |out| out.board.is_some());
    assert!(live.notices.contains(&"round started".to_owned()));
    assert_eq!(live.board.as_deref(), Some("=====\n|@ :B\n=====\n"));

    app.handle_input(Input::Move(Direction::Right), Instant::now());
    let moved = app.frame(Instant::now());
    assert_eq!(moved.board.as_deref(), Some("=====\n| @:B\n=====\n"));

    app.handle_input(Input::Ready, Instant::now());
    app.handle_input(Input::Quit, Instant::now());
    let last = app.frame(Instant::now());
    assert!(!app.is_running());
    assert_eq!(last.notices, vec!["round already running".to_owned(), "disconnected".to_owned()]);

    let after_start = server.join().unwrap();
    assert_eq!(after_start, vec![ClientCommand::step(Direction::Right)]);
}
