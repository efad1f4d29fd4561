//! Connection manager against a local WebSocket controller.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use pacsis_network::{ConnectionConfig, ConnectionManager, ConnectionState};
use pacsis_protocol::{Command, Inbound, ProtocolCodec, Update};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};

const WAIT: Duration = Duration::from_secs(5);

async fn listen() -> (TcpListener, ConnectionConfig) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let config = ConnectionConfig::new("127.0.0.1")
        .with_port(port)
        .with_connect_timeout(Duration::from_secs(2));
    (listener, config)
}

async fn accept(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
    accept_async(stream).await.unwrap()
}

/// Next command the client sent, or `None` once the client closed.
async fn next_command(ws: &mut WebSocketStream<TcpStream>) -> Option<Command> {
    loop {
        match timeout(WAIT, ws.next()).await.unwrap() {
            Some(Ok(Message::Text(text))) => {
                let command = ProtocolCodec::new().decode_command(text.as_str()).unwrap();
                return Some(command);
            }
            Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return None,
            Some(Ok(_)) => continue,
        }
    }
}

async fn push_update(ws: &mut WebSocketStream<TcpStream>, door_id: &str, id: &str, active: bool) {
    let frame = ProtocolCodec::new()
        .encode_inbound(&Inbound::Update(Update::new(door_id, id, active)))
        .unwrap();
    ws.send(Message::text(frame)).await.unwrap();
}

async fn wait_for_state(manager: &ConnectionManager, wanted: ConnectionState) {
    let mut state = manager.state_changes();
    timeout(WAIT, state.wait_for(|s| *s == wanted))
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_resync_requested_on_open() {
    let (listener, config) = listen().await;
    let mut manager = ConnectionManager::new(config);

    manager.connect().await;
    let mut server = accept(&listener).await;

    assert_eq!(
        next_command(&mut server).await,
        Some(Command::request_update())
    );
    wait_for_state(&manager, ConnectionState::Open).await;
    assert!(manager.is_connected());

    manager.disconnect().await;
}

#[tokio::test]
async fn test_commands_follow_resync_in_order() {
    let (listener, config) = listen().await;
    let mut manager = ConnectionManager::new(config);

    manager.connect().await;
    // Queued while the handshake may still be in flight.
    manager.send(Command::open_door("D1", "M1")).unwrap();
    manager.send(Command::push_rex("D1", "X1")).unwrap();

    let mut server = accept(&listener).await;
    assert_eq!(
        next_command(&mut server).await,
        Some(Command::request_update())
    );
    assert_eq!(
        next_command(&mut server).await,
        Some(Command::open_door("D1", "M1"))
    );
    assert_eq!(
        next_command(&mut server).await,
        Some(Command::push_rex("D1", "X1"))
    );

    manager.disconnect().await;
}

#[tokio::test]
async fn test_guarded_command_never_reaches_controller() {
    let (listener, config) = listen().await;
    let mut manager = ConnectionManager::new(config);

    manager.connect().await;
    let mut server = accept(&listener).await;
    assert_eq!(
        next_command(&mut server).await,
        Some(Command::request_update())
    );

    let empty_pin = Command::enter_pin("D1", "R1", "");
    assert!(manager.send(empty_pin).is_err());
    manager.send(Command::close_door("D1", "M1")).unwrap();

    assert_eq!(
        next_command(&mut server).await,
        Some(Command::close_door("D1", "M1"))
    );

    manager.disconnect().await;
}

#[tokio::test]
async fn test_updates_reach_every_subscriber_in_order() {
    let (listener, config) = listen().await;
    let mut manager = ConnectionManager::new(config);
    let mut first = manager.subscribe();
    let mut second = manager.subscribe();

    manager.connect().await;
    let mut server = accept(&listener).await;
    next_command(&mut server).await;

    push_update(&mut server, "D1", "L1", true).await;
    push_update(&mut server, "D1", "L1", false).await;
    push_update(&mut server, "D2", "M2", true).await;

    let expected = [
        Update::new("D1", "L1", true),
        Update::new("D1", "L1", false),
        Update::new("D2", "M2", true),
    ];
    for receiver in [&mut first, &mut second] {
        for update in &expected {
            let message = timeout(WAIT, receiver.recv()).await.unwrap().unwrap();
            assert_eq!(message, Inbound::Update(update.clone()));
        }
    }

    manager.disconnect().await;
}

#[tokio::test]
async fn test_malformed_frames_are_dropped() {
    let (listener, config) = listen().await;
    let mut manager = ConnectionManager::new(config);
    let mut updates = manager.subscribe();

    manager.connect().await;
    let mut server = accept(&listener).await;
    next_command(&mut server).await;

    server.send(Message::text("not json at all")).await.unwrap();
    server
        .send(Message::text(r#"{"Update":{"DoorId":"D1","Id":"L1"}}"#))
        .await
        .unwrap();
    server.send(Message::binary(vec![1u8, 2, 3])).await.unwrap();
    push_update(&mut server, "D1", "L1", true).await;

    let message = timeout(WAIT, updates.recv()).await.unwrap().unwrap();
    assert_eq!(message, Inbound::Update(Update::new("D1", "L1", true)));
    assert!(manager.is_connected());

    manager.disconnect().await;
}

#[tokio::test]
async fn test_reconnect_closes_previous_connection() {
    let (listener, config) = listen().await;
    let mut manager = ConnectionManager::new(config);
    let (events_tx, mut events) = mpsc::unbounded_channel();

    // The first connection is read on its own task so that its close frame
    // and the second TCP accept race; the close must come first.
    let server = tokio::spawn(async move {
        let mut first = accept(&listener).await;
        let first_events = events_tx.clone();
        let reader = tokio::spawn(async move {
            while let Some(command) = next_command(&mut first).await {
                first_events.send(format!("1: {}", command.name())).unwrap();
            }
            first_events.send("1: closed".to_string()).unwrap();
        });

        let (stream, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
        events_tx.send("2: accepted".to_string()).unwrap();
        let mut second = accept_async(stream).await.unwrap();
        if let Some(command) = next_command(&mut second).await {
            events_tx.send(format!("2: {}", command.name())).unwrap();
        }
        reader.await.unwrap();
        second
    });

    manager.connect().await;
    wait_for_state(&manager, ConnectionState::Open).await;
    manager.connect().await;

    let mut seen = Vec::new();
    for _ in 0..4 {
        let event = timeout(WAIT, events.recv()).await.unwrap().unwrap();
        seen.push(event);
    }
    assert_eq!(
        seen,
        [
            "1: RequestUpdate",
            "1: closed",
            "2: accepted",
            "2: RequestUpdate",
        ]
    );

    let _second = server.await.unwrap();
    assert!(manager.is_connected());

    manager.disconnect().await;
}

#[tokio::test]
async fn test_refused_connection_reports_disconnected() {
    let (listener, config) = listen().await;
    drop(listener);

    let mut manager = ConnectionManager::new(config);
    manager.connect().await;

    wait_for_state(&manager, ConnectionState::Disconnected).await;
    assert!(!manager.is_connected());
    let command = Command::open_door("D1", "M1");
    assert!(manager.send(command).is_err());
}

#[tokio::test]
async fn test_controller_close_reports_disconnected() {
    let (listener, config) = listen().await;
    let mut manager = ConnectionManager::new(config);

    manager.connect().await;
    let mut server = accept(&listener).await;
    next_command(&mut server).await;
    wait_for_state(&manager, ConnectionState::Open).await;

    server.close(None).await.unwrap();

    wait_for_state(&manager, ConnectionState::Disconnected).await;
    assert!(!manager.is_connected());
}

#[tokio::test]
async fn test_disconnect_sends_close() {
    let (listener, config) = listen().await;
    let mut manager = ConnectionManager::new(config);

    manager.connect().await;
    let mut server = accept(&listener).await;
    next_command(&mut server).await;

    manager.disconnect().await;
    assert!(!manager.is_connected());
    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert_eq!(next_command(&mut server).await, None);
}
