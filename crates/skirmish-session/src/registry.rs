//! The connection registry: who is connected, and as whom.
//!
//! # Concurrency note
//!
//! The map sits behind a `tokio::sync::Mutex` owned by the registry, and
//! the registry itself is shared as `Arc<SessionRegistry<C>>` between the
//! accept loop and every connection task. No method holds the lock across
//! network I/O: [`SessionRegistry::broadcast`] clones the connection
//! handles out first and sends after releasing it. The sends run
//! concurrently, each under its own timeout, so one stalled peer cannot
//! hold up the rest.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use skirmish_protocol::AccountId;
use skirmish_transport::{Connection, ConnectionId};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinSet;

use crate::{DEFAULT_SEND_TIMEOUT, Session, SessionError, SessionInfo};

/// Tracks every live connection.
///
/// ## Lifecycle
///
/// ```text
/// register() ──→ bind() / take_over() ──→ remove()
///     │                                        ▲
///     └────────────────────────────────────────┘  (handshake never completed)
/// ```
pub struct SessionRegistry<C: Connection> {
    sessions: Mutex<HashMap<ConnectionId, Session<C>>>,
    max_connections: Option<usize>,
    send_timeout: Duration,
}

impl<C: Connection> SessionRegistry<C> {
    /// Creates an empty registry with no connection limit.
    pub fn new() -> Self {
        Self::with_limit(None)
    }

    /// Creates an empty registry that refuses registrations beyond
    /// `max_connections` live entries.
    pub fn with_limit(max_connections: Option<usize>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            max_connections,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    /// Caps how long [`broadcast`](Self::broadcast) waits on any one
    /// connection.
    pub fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }

    /// Adds a freshly accepted connection with no account bound.
    ///
    /// # Errors
    /// Returns [`SessionError::Full`] if the registry is at its limit.
    pub async fn register(
        &self,
        conn: Arc<C>,
        peer: SocketAddr,
    ) -> Result<ConnectionId, SessionError> {
        let id = conn.id();
        let mut sessions = self.sessions.lock().await;
        if let Some(limit) = self.max_connections {
            if sessions.len() >= limit {
                return Err(SessionError::Full { limit });
            }
        }
        sessions.insert(id, Session::new(conn, peer));
        tracing::debug!(conn_id = %id, %peer, live = sessions.len(), "connection registered");
        Ok(id)
    }

    /// Records that connection `id` is logged in as `account`.
    ///
    /// Rebinding a connection to the account it already holds is a no-op.
    ///
    /// # Errors
    /// - [`SessionError::AlreadyConnected`] if another connection holds
    ///   the account
    /// - [`SessionError::NotFound`] if `id` is not registered
    pub async fn bind(&self, id: ConnectionId, account: AccountId) -> Result<(), SessionError> {
        let mut sessions = self.sessions.lock().await;

        let taken = sessions
            .iter()
            .any(|(other, s)| *other != id && s.account == Some(account));
        if taken {
            return Err(SessionError::AlreadyConnected(account));
        }

        let session = sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        session.account = Some(account);
        tracing::info!(conn_id = %id, account_id = %account, "connection bound to account");
        Ok(())
    }

    /// Binds `account` to connection `id`, evicting any other connection
    /// that currently holds it.
    ///
    /// The evicted entry is removed at once and its eviction signal fires,
    /// so its handler stops reading and closes the socket. This keeps a
    /// half-open connection from locking its owner out forever. Returns the
    /// evicted entry, if there was one.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if `id` is not registered; no
    /// other entry is touched in that case.
    pub async fn take_over(
        &self,
        id: ConnectionId,
        account: AccountId,
    ) -> Result<Option<Session<C>>, SessionError> {
        let mut sessions = self.sessions.lock().await;
        if !sessions.contains_key(&id) {
            return Err(SessionError::NotFound(id));
        }

        let holder = sessions
            .iter()
            .find(|(other, s)| **other != id && s.account == Some(account))
            .map(|(other, _)| *other);
        let evicted = holder.and_then(|other| sessions.remove(&other));
        if let Some(old) = &evicted {
            old.evicted.notify_one();
            tracing::info!(
                conn_id = %old.id(),
                account_id = %account,
                by = %id,
                "connection evicted by newer login"
            );
        }

        let session = sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        session.account = Some(account);
        tracing::info!(conn_id = %id, account_id = %account, "connection bound to account");
        Ok(evicted)
    }

    /// The signal that fires when connection `id` is evicted by
    /// [`take_over`](Self::take_over). `None` if `id` is not registered.
    pub async fn eviction_signal(&self, id: ConnectionId) -> Option<Arc<Notify>> {
        self.sessions
            .lock()
            .await
            .get(&id)
            .map(|s| Arc::clone(&s.evicted))
    }

    /// Deregisters a connection, returning its entry.
    ///
    /// Returns `None` if it was already removed, so callers racing to
    /// clean up can tell which one actually did.
    pub async fn remove(&self, id: ConnectionId) -> Option<Session<C>> {
        let removed = self.sessions.lock().await.remove(&id);
        if let Some(session) = &removed {
            tracing::debug!(
                conn_id = %id,
                account_id = ?session.account,
                "connection deregistered"
            );
        }
        removed
    }

    /// The account bound to `id`, if any.
    pub async fn account_of(&self, id: ConnectionId) -> Option<AccountId> {
        self.sessions.lock().await.get(&id).and_then(|s| s.account)
    }

    /// The live connection logged in as `account`, if any.
    pub async fn connection_for(&self, account: AccountId) -> Option<Arc<C>> {
        self.sessions
            .lock()
            .await
            .values()
            .find(|s| s.account == Some(account))
            .map(|s| Arc::clone(&s.conn))
    }

    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.sessions.lock().await.contains_key(&id)
    }

    /// Number of registered connections, logged in or not.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    /// Metadata for every entry, ordered by connection id.
    pub async fn snapshot(&self) -> Vec<SessionInfo> {
        let mut infos: Vec<_> = self
            .sessions
            .lock()
            .await
            .values()
            .map(Session::info)
            .collect();
        infos.sort_by_key(|info| info.id);
        infos
    }

    /// Sends `frame` to every registered connection except `except`.
    ///
    /// Sends run concurrently. A send that fails or outlives the send
    /// timeout is logged and skipped; the failing connection's own handler
    /// is responsible for removing it. Returns how many sends succeeded.
    pub async fn broadcast(&self, frame: &[u8], except: Option<ConnectionId>) -> usize {
        let targets: Vec<Arc<C>> = {
            let sessions = self.sessions.lock().await;
            sessions
                .iter()
                .filter(|(id, _)| Some(**id) != except)
                .map(|(_, s)| Arc::clone(&s.conn))
                .collect()
        };

        let frame: Arc<[u8]> = Arc::from(frame);
        let limit = self.send_timeout;
        let mut sends = JoinSet::new();
        for conn in targets {
            let frame = Arc::clone(&frame);
            sends.spawn(async move {
                let outcome = match tokio::time::timeout(limit, conn.send(&frame)).await {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(_) => Err(format!("timed out after {limit:?}")),
                };
                (conn.id(), outcome)
            });
        }

        let mut delivered = 0;
        while let Some(joined) = sends.join_next().await {
            match joined {
                Ok((_, Ok(()))) => delivered += 1,
                Ok((conn_id, Err(error))) => {
                    tracing::warn!(%conn_id, %error, "broadcast send failed");
                }
                Err(e) => tracing::error!(error = %e, "broadcast task failed"),
            }
        }
        delivered
    }
}

impl<C: Connection> Default for SessionRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
