//! TCP transport carrying newline-terminated text frames.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::Mutex;

use crate::{Connection, ConnectionId, LineReader, Transport, TransportError};

/// Longest frame accepted by default, in bytes.
pub const DEFAULT_MAX_LINE_LEN: usize = 1024;

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// A TCP [`Transport`] that listens for incoming connections.
pub struct TcpLineTransport {
    listener: TcpListener,
    max_line_len: usize,
}

impl TcpLineTransport {
    /// Binds a new TCP transport to the given address.
    pub async fn bind(addr: impl ToSocketAddrs) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::BindFailed)?;
        if let Ok(local) = listener.local_addr() {
            tracing::info!(%local, "TCP transport listening");
        }
        Ok(Self {
            listener,
            max_line_len: DEFAULT_MAX_LINE_LEN,
        })
    }

    /// Sets the longest frame accepted from clients.
    pub fn with_max_line_len(mut self, max: usize) -> Self {
        self.max_line_len = max.max(1);
        self
    }
}

impl Transport for TcpLineTransport {
    type Connection = TcpLineConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, _) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let conn = TcpLineConnection::from_stream(stream, self.max_line_len)?;
        tracing::debug!(id = %conn.id, peer = %conn.peer, "accepted TCP connection");
        Ok(conn)
    }

    fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// A single newline-framed TCP connection.
///
/// The read and write halves are locked independently, so a broadcast can
/// write to a connection while its handler is parked in `recv`.
pub struct TcpLineConnection {
    id: ConnectionId,
    peer: SocketAddr,
    reader: Mutex<LineReader<OwnedReadHalf>>,
    writer: Mutex<OwnedWriteHalf>,
}

impl TcpLineConnection {
    /// Wraps an already-connected stream.
    pub fn from_stream(
        stream: TcpStream,
        max_line_len: usize,
    ) -> Result<Self, TransportError> {
        let peer = stream.peer_addr().map_err(TransportError::AcceptFailed)?;
        let _ = stream.set_nodelay(true);
        let (read, write) = stream.into_split();
        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        Ok(Self {
            id,
            peer,
            reader: Mutex::new(LineReader::new(read, max_line_len)),
            writer: Mutex::new(write),
        })
    }
}

impl Connection for TcpLineConnection {
    type Error = TransportError;

    async fn send(&self, frame: &[u8]) -> Result<(), Self::Error> {
        let mut line = Vec::with_capacity(frame.len() + 1);
        line.extend_from_slice(frame);
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(&line)
            .await
            .map_err(TransportError::SendFailed)?;
        writer.flush().await.map_err(TransportError::SendFailed)
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let line = self.reader.lock().await.read_line().await?;
        Ok(line.map(|b| b.to_vec()))
    }

    async fn close(&self) -> Result<(), Self::Error> {
        match self.writer.lock().await.shutdown().await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(TransportError::SendFailed(e)),
        }
    }

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}
