//! Integration tests for the WebSocket transport.
//!
//! These spin up a real listener on a free port and talk to it with a
//! `tokio-tungstenite` client.

#[cfg(feature = "websocket")]
mod websocket {
    use std::sync::Arc;
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use impostor_transport::{Connection, Transport, WebSocketConnection, WebSocketTransport};
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs =
        tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

    /// Binds on a free port and returns a connected (server, client) pair.
    async fn pair() -> (WebSocketConnection, ClientWs) {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("should have an address");

        let server = tokio::spawn(async move { transport.accept().await.expect("should accept") });
        let (client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");
        (server.await.expect("task should complete"), client)
    }

    #[tokio::test]
    async fn test_websocket_accept_and_send_receive() {
        let (server, mut client) = pair().await;
        assert!(server.id().into_inner() > 0);

        server.send(br#"{"type":"HandshakeAck"}"#).await.unwrap();
        let msg = client.next().await.unwrap().unwrap();
        assert!(msg.is_text(), "JSON should go out as a text frame");
        assert_eq!(msg.into_data().as_ref(), br#"{"type":"HandshakeAck"}"#);

        client
            .send(Message::text(r#"{"type":"Heartbeat"}"#.to_string()))
            .await
            .unwrap();
        let received = server.recv().await.unwrap().expect("should have data");
        assert_eq!(received, br#"{"type":"Heartbeat"}"#);

        server.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_websocket_non_utf8_goes_out_as_binary() {
        let (server, mut client) = pair().await;

        server.send(&[0xff, 0x00, 0xfe]).await.unwrap();

        let msg = client.next().await.unwrap().unwrap();
        assert!(msg.is_binary());
        assert_eq!(msg.into_data().as_ref(), &[0xffu8, 0x00, 0xfe][..]);
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_client_close() {
        let (server, mut client) = pair().await;

        client.send(Message::Close(None)).await.unwrap();

        let result = server.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_websocket_send_while_recv_pending() {
        let (server, mut client) = pair().await;
        let server = Arc::new(server);

        // A task parked in recv must not block sends.
        let reader = {
            let server = Arc::clone(&server);
            tokio::spawn(async move { server.recv().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        tokio::time::timeout(Duration::from_secs(1), server.send(b"push"))
            .await
            .expect("send should not wait for recv")
            .unwrap();
        let pushed = client.next().await.unwrap().unwrap();
        assert_eq!(pushed.into_data().as_ref(), b"push");

        client.send(Message::text("reply".to_string())).await.unwrap();
        let got = reader.await.unwrap().unwrap();
        assert_eq!(got.as_deref(), Some(b"reply".as_slice()));
    }

    #[tokio::test]
    async fn test_websocket_peer_addr_is_loopback() {
        let (server, _client) = pair().await;
        assert!(server.peer_addr().ip().is_loopback());
    }
}
