//! `SkirmishServer` builder and accept loop.
//!
//! This is the entry point for running a Skirmish lobby. It ties together
//! all the layers: transport → protocol → session registry → account store.

use std::net::SocketAddr;
use std::sync::Arc;

use skirmish_protocol::{Codec, Reply, TextCodec};
use skirmish_session::{SessionConfig, SessionRegistry};
use skirmish_store::AccountStore;
use skirmish_transport::{Connection, TcpLineConnection, TcpLineTransport, Transport};

use crate::SkirmishError;
use crate::handler::handle_connection;

/// Address used when the builder is not told otherwise.
pub const DEFAULT_BIND_ADDR: &str = "localhost:5555";

/// The registry type the server shares with its connection tasks.
pub type Registry = SessionRegistry<TcpLineConnection>;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The store
/// and registry provide their own interior locking.
pub(crate) struct ServerState<S: AccountStore, C: Codec> {
    pub(crate) registry: Arc<Registry>,
    pub(crate) store: S,
    pub(crate) codec: C,
    pub(crate) config: SessionConfig,
}

/// Builder for configuring and starting a Skirmish server.
///
/// # Example
///
/// ```rust,no_run
/// use skirmish::prelude::*;
///
/// # async fn demo() -> Result<(), SkirmishError> {
/// let store = SqliteAccountStore::open("data.db")?;
/// let server = SkirmishServerBuilder::new()
///     .bind("0.0.0.0:5555")
///     .build(store)
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct SkirmishServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
}

impl SkirmishServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            session_config: SessionConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the per-connection limits.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Binds the listener and returns a server backed by `store`.
    ///
    /// Frames are newline-terminated text decoded with [`TextCodec`].
    pub async fn build<S: AccountStore>(
        self,
        store: S,
    ) -> Result<SkirmishServer<S, TextCodec>, SkirmishError> {
        let transport = TcpLineTransport::bind(&self.bind_addr)
            .await?
            .with_max_line_len(self.session_config.max_line_len);

        let state = Arc::new(ServerState {
            registry: Arc::new(
                SessionRegistry::with_limit(self.session_config.max_connections)
                    .with_send_timeout(self.session_config.send_timeout),
            ),
            store,
            codec: TextCodec,
            config: self.session_config,
        });

        Ok(SkirmishServer { transport, state })
    }
}

impl Default for SkirmishServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Skirmish lobby server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct SkirmishServer<S: AccountStore, C: Codec> {
    transport: TcpLineTransport,
    state: Arc<ServerState<S, C>>,
}

impl<S, C> SkirmishServer<S, C>
where
    S: AccountStore,
    C: Codec,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// A handle to the connection registry that stays valid after
    /// [`run()`](Self::run) takes ownership of the server.
    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.state.registry)
    }

    /// Sends `reply` to every registered connection. Returns how many
    /// sends succeeded.
    pub async fn broadcast(&self, reply: &Reply) -> usize {
        let frame = self.state.codec.encode(reply);
        self.state.registry.broadcast(&frame, None).await
    }

    /// Runs the server accept loop.
    ///
    /// Registers each accepted connection and spawns a handler task for
    /// it. Accept errors are logged and the loop keeps going. Runs until
    /// the process is terminated or the future is dropped.
    pub async fn run(mut self) -> Result<(), SkirmishError> {
        tracing::info!(addr = ?self.local_addr().ok(), "Skirmish server running");

        loop {
            let conn = match self.transport.accept().await {
                Ok(conn) => Arc::new(conn),
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                    continue;
                }
            };

            let conn_id = conn.id();
            let peer = conn.peer_addr();
            if let Err(e) = self.state.registry.register(Arc::clone(&conn), peer).await {
                tracing::warn!(%conn_id, %peer, error = %e, "connection refused");
                tokio::spawn(async move {
                    let _ = conn.close().await;
                });
                continue;
            }
            tracing::info!(%conn_id, %peer, "connection accepted");

            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                if let Err(e) = handle_connection(conn, state).await {
                    tracing::debug!(%conn_id, error = %e, "connection ended with error");
                }
            });
        }
    }
}
