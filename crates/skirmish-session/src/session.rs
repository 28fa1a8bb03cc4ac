//! Registry entries and per-connection settings.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use skirmish_protocol::AccountId;
use skirmish_transport::{Connection, ConnectionId, DEFAULT_MAX_LINE_LEN};
use tokio::sync::Notify;

/// How long a single broadcast send may take before it is abandoned.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Limits applied to every connection the server accepts.
///
/// The defaults impose no read timeout and no connection cap, only the
/// line length limit and the broadcast send timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Longest accepted frame in bytes, excluding the newline.
    pub max_line_len: usize,

    /// Close a connection that sends nothing for this long.
    ///
    /// `None` waits forever.
    pub idle_timeout: Option<Duration>,

    /// Refuse new connections once this many are registered.
    ///
    /// `None` means unlimited.
    pub max_connections: Option<usize>,

    /// Upper bound on each per-connection send during a broadcast.
    pub send_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_line_len: DEFAULT_MAX_LINE_LEN,
            idle_timeout: None,
            max_connections: None,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One registry entry: a live connection and who it is logged in as.
pub struct Session<C> {
    /// Shared handle used for broadcast; the handler owns another clone.
    pub conn: Arc<C>,

    pub peer: SocketAddr,

    /// Set once the handshake succeeds. At most one account per
    /// connection, and at most one connection per account.
    pub account: Option<AccountId>,

    /// Fired when a newer login for the same account evicts this entry.
    pub(crate) evicted: Arc<Notify>,
}

impl<C: Connection> Session<C> {
    pub(crate) fn new(conn: Arc<C>, peer: SocketAddr) -> Self {
        Self {
            conn,
            peer,
            account: None,
            evicted: Arc::new(Notify::new()),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.conn.id()
    }

    /// A copy of the entry's metadata without the connection handle.
    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.conn.id(),
            peer: self.peer,
            account: self.account,
        }
    }
}

// Derives would require `C: Clone`/`C: Debug`; only the `Arc` is cloned.
impl<C> Clone for Session<C> {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
            peer: self.peer,
            account: self.account,
            evicted: Arc::clone(&self.evicted),
        }
    }
}

impl<C: Connection> fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.conn.id())
            .field("peer", &self.peer)
            .field("account", &self.account)
            .finish()
    }
}

/// Plain metadata about one entry, as returned by
/// [`SessionRegistry::snapshot`](crate::SessionRegistry::snapshot).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionInfo {
    pub id: ConnectionId,
    pub peer: SocketAddr,
    pub account: Option<AccountId>,
}
