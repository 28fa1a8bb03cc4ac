//! Integration tests for the TCP line transport.
//!
//! These spin up a real listener on an OS-assigned port and talk to it
//! with a plain `TcpStream`, so framing is exercised end to end.

#[cfg(feature = "tcp")]
mod tcp {
    use skirmish_transport::{Connection, TcpLineTransport, Transport, TransportError};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpStream;

    async fn bound() -> (TcpLineTransport, String) {
        let transport = TcpLineTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("local addr").to_string();
        (transport, addr)
    }

    #[tokio::test]
    async fn test_tcp_accept_and_send_receive() {
        let (mut transport, addr) = bound().await;

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let client = TcpStream::connect(&addr).await.expect("connect");
        let server_conn = server_handle.await.expect("task should complete");

        assert!(server_conn.id().into_inner() > 0);
        assert_eq!(
            server_conn.peer_addr(),
            client.local_addr().expect("client addr")
        );

        let (read, mut write) = client.into_split();
        let mut lines = BufReader::new(read).lines();

        // --- Server sends, client receives ---
        server_conn
            .send(b"LOGIN OK")
            .await
            .expect("send should succeed");
        let line = lines.next_line().await.unwrap().unwrap();
        assert_eq!(line, "LOGIN OK");

        // --- Client sends two frames in one write, server sees two ---
        write.write_all(b"HOTBAR OPEN\nQUIT\n").await.unwrap();
        let first = server_conn.recv().await.unwrap().unwrap();
        let second = server_conn.recv().await.unwrap().unwrap();
        assert_eq!(first, b"HOTBAR OPEN");
        assert_eq!(second, b"QUIT");

        server_conn.close().await.expect("close should succeed");
        assert!(lines.next_line().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_tcp_recv_returns_none_on_client_close() {
        let (mut transport, addr) = bound().await;

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let client = TcpStream::connect(&addr).await.unwrap();
        let server_conn = server_handle.await.unwrap();

        drop(client);

        let result = server_conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_tcp_oversized_frame_is_an_error() {
        let (transport, addr) = bound().await;
        let mut transport = transport.with_max_line_len(16);

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let mut client = TcpStream::connect(&addr).await.unwrap();
        let server_conn = server_handle.await.unwrap();

        client.write_all(&[b'x'; 64]).await.unwrap();
        client.write_all(b"\n").await.unwrap();

        let err = server_conn.recv().await.unwrap_err();
        assert!(matches!(err, TransportError::FrameTooLong(16)));
    }

    #[tokio::test]
    async fn test_tcp_connection_ids_are_unique() {
        let (mut transport, addr) = bound().await;

        let server_handle = tokio::spawn(async move {
            let a = transport.accept().await.expect("accept a");
            let b = transport.accept().await.expect("accept b");
            (a, b)
        });
        let _c1 = TcpStream::connect(&addr).await.unwrap();
        let _c2 = TcpStream::connect(&addr).await.unwrap();
        let (a, b) = server_handle.await.unwrap();

        assert_ne!(a.id(), b.id());
    }
}
