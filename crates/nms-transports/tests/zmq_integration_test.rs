//! Loopback tests of DEALER sessions against a real zeromq ROUTER

#![cfg(feature = "zmq-client")]

use nms_transports::prelude::*;
use std::net::TcpListener;
use std::time::Duration;
use zeromq::{RouterSocket, Socket, SocketRecv, SocketSend, ZmqMessage};

fn reserve_tcp_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind ephemeral port");
    let port = listener
        .local_addr()
        .expect("Failed to read local address")
        .port();
    drop(listener);
    port
}

/// Broker stand-in: answers one request, echoing the body back to the caller
async fn serve_one(mut router: RouterSocket) -> Vec<Vec<u8>> {
    let request = router.recv().await.expect("router receive");
    let frames: Vec<Vec<u8>> = request.into_vec().into_iter().map(|f| f.to_vec()).collect();

    // [socket identity, "", destination, caller identity, body]
    let mut reply = ZmqMessage::from(frames[4].clone());
    reply.prepend(&ZmqMessage::from(frames[2].clone()));
    reply.prepend(&ZmqMessage::from(Vec::new()));
    reply.prepend(&ZmqMessage::from(frames[0].clone()));
    router.send(reply).await.expect("router send");
    frames
}

#[tokio::test]
async fn test_request_reply_through_router() {
    let endpoint = format!("tcp://127.0.0.1:{}", reserve_tcp_port());
    let mut router = RouterSocket::new();
    router.bind(&endpoint).await.expect("bind router");
    let server = tokio::spawn(serve_one(router));

    let connector = ZmqDealerConnector::new(SessionConfig::default()).unwrap();
    let mut session = connector.open(&endpoint, "NMS_WEB_TOPO_REFRESH").unwrap();
    let message = RoutedMessage::new("ctrl-app-TOPOLOGY_APP", "NMS_WEB_TOPO_REFRESH", vec![0x15, 0xda, 0x04]);
    session.send(&message).await.unwrap();

    let reply = tokio::time::timeout(Duration::from_secs(5), session.receive())
        .await
        .expect("reply within deadline")
        .unwrap();
    assert_eq!(reply, vec![0x15, 0xda, 0x04]);
    session.close().await;

    let seen = server.await.unwrap();
    assert_eq!(seen.len(), 5);
    assert_eq!(seen[0], session.socket_identity().as_bytes());
    assert!(seen[1].is_empty());
    assert_eq!(seen[2], b"ctrl-app-TOPOLOGY_APP");
    assert_eq!(seen[3], b"NMS_WEB_TOPO_REFRESH");
}

#[tokio::test]
async fn test_unanswered_request_times_out_and_closes() {
    let endpoint = format!("tcp://127.0.0.1:{}", reserve_tcp_port());
    let mut router = RouterSocket::new();
    router.bind(&endpoint).await.expect("bind router");

    let connector = ZmqDealerConnector::default();
    let mut session = connector.open(&endpoint, "NMS_WEB_STATUS_REFRESH").unwrap();
    session
        .send(&RoutedMessage::new("ctrl-app-STATUS_APP", "NMS_WEB_STATUS_REFRESH", vec![0]))
        .await
        .unwrap();

    let outcome = tokio::time::timeout(Duration::from_millis(200), session.receive()).await;
    assert!(outcome.is_err());
    session.close().await;
    assert!(session.is_closed());
    drop(router);
}
