//! Bus client integration tests against an in-process shell endpoint

use futures_util::{SinkExt, StreamExt};
use pagecraft::{EventSender, FrontEvent, ShellClient};
use pagecraft_protocol::{Channel, Command, FrontCommand, Frame, MenuItemDescriptor};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

const WAIT: Duration = Duration::from_secs(10);

async fn next_event(rx: &mut mpsc::UnboundedReceiver<FrontEvent>) -> FrontEvent {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for front event")
        .expect("event channel closed")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_client_round_trip_with_shell() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let client = ShellClient::connect(&addr, EventSender::new(tx)).unwrap();

    let (stream, _) = tokio::time::timeout(WAIT, listener.accept()).await.unwrap().unwrap();
    let mut shell = tokio_tungstenite::accept_async(stream).await.unwrap();

    assert_eq!(next_event(&mut rx).await, FrontEvent::ShellConnected);
    assert!(client.is_connected());

    // Front → shell: menu setup
    let items = vec![
        MenuItemDescriptor::new("Row", "layout"),
        MenuItemDescriptor::new("Text", "content"),
    ];
    client.setup_app_menu(&items);

    let msg = tokio::time::timeout(WAIT, shell.next()).await.unwrap().unwrap().unwrap();
    let Message::Binary(data) = msg else {
        panic!("expected binary frame, got {:?}", msg);
    };
    let frame = Frame::decode(&data).unwrap();
    assert_eq!(frame.channel, Channel::SetupAppMenu);
    assert_eq!(frame.payload_as::<Vec<MenuItemDescriptor>>().unwrap(), items);

    // Front → shell: page context menu
    client.show_page_context_menu("page-1");
    let msg = tokio::time::timeout(WAIT, shell.next()).await.unwrap().unwrap().unwrap();
    let Message::Binary(data) = msg else {
        panic!("expected binary frame, got {:?}", msg);
    };
    let frame = Frame::decode(&data).unwrap();
    assert_eq!(frame.channel, Channel::ShowPageContextMenu);
    assert_eq!(frame.payload_as::<String>().unwrap(), "page-1");

    // Shell → front: command
    let wire = FrontCommand::InsertNode { label: "Row".into() }.to_wire();
    let out = Frame::encode(Channel::Command, 0, &wire).unwrap();
    shell.send(Message::Binary(out.into())).await.unwrap();
    assert_eq!(next_event(&mut rx).await, FrontEvent::Command(wire));

    // Garbage is skipped, the connection survives
    shell.send(Message::Binary(vec![0xEE, 0, 0].into())).await.unwrap();
    let redo = Command::new("ReDo", serde_json::Value::Null);
    let out = Frame::encode(Channel::Command, 1, &redo).unwrap();
    shell.send(Message::Binary(out.into())).await.unwrap();
    assert_eq!(next_event(&mut rx).await, FrontEvent::Command(redo));

    // Shell goes away
    shell.close(None).await.unwrap();
    assert_eq!(next_event(&mut rx).await, FrontEvent::ShellDisconnected);
    assert!(!client.is_connected());
}

#[tokio::test]
async fn test_sends_without_shell_are_dropped() {
    // Reserve a port nobody listens on
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().to_string()
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let client = ShellClient::connect(&addr, EventSender::new(tx)).unwrap();

    client.setup_app_menu(&[MenuItemDescriptor::new("Row", "layout")]);
    client.show_page_context_menu("page-1");

    assert!(!client.is_connected());
    let nothing = tokio::time::timeout(Duration::from_millis(300), rx.recv()).await;
    assert!(nothing.is_err(), "no events expected without a shell");
}

#[tokio::test]
async fn test_dropping_client_stops_reconnecting() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().to_string()
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let client = ShellClient::connect(&addr, EventSender::new(tx)).unwrap();
    drop(client);

    // The bus thread exits and releases its event sender
    let closed = tokio::time::timeout(WAIT, rx.recv()).await.expect("bus thread still running");
    assert_eq!(closed, None);
}
