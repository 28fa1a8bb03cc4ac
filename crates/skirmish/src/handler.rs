//! Per-connection handler: handshake, login, and command routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Initial frame: `quit`, `REGISTER ...`, or credentials
//!   2. Login retry loop until `LOGIN OK` (or a fatal frame)
//!   3. Loop: receive commands → reply → until `QUIT` or disconnect
//!
//! The registry entry created by the accept loop is removed exactly once,
//! either explicitly on the way out or by [`ConnectionGuard`] on drop.
//! A newer login for the same account evicts this connection: its entry
//! is removed by the registry and the next read returns as if the peer
//! had closed.

use std::sync::Arc;

use skirmish_protocol::{
    AccountId, Codec, Command, HandshakeFrame, HotbarCommand, ProtocolError, Reply,
};
use skirmish_store::AccountStore;
use skirmish_transport::{Connection, ConnectionId, TcpLineConnection};
use tokio::sync::Notify;

use crate::SkirmishError;
use crate::server::ServerState;

/// Drop guard that deregisters the connection when the handler exits.
///
/// This ensures cleanup happens even if the handler panics or returns
/// early with an error. Since `Drop` is synchronous, we spawn a
/// fire-and-forget task for the async registry lock. Normal exits call
/// [`release`](Self::release) instead, which disarms the guard.
struct ConnectionGuard<S: AccountStore, C: Codec> {
    conn_id: ConnectionId,
    state: Option<Arc<ServerState<S, C>>>,
}

impl<S: AccountStore, C: Codec> ConnectionGuard<S, C> {
    fn new(conn_id: ConnectionId, state: &Arc<ServerState<S, C>>) -> Self {
        Self {
            conn_id,
            state: Some(Arc::clone(state)),
        }
    }

    /// Deregisters now. Returns `true` if this call removed the entry.
    async fn release(&mut self) -> bool {
        match self.state.take() {
            Some(state) => state.registry.remove(self.conn_id).await.is_some(),
            None => false,
        }
    }
}

impl<S: AccountStore, C: Codec> Drop for ConnectionGuard<S, C> {
    fn drop(&mut self) {
        let Some(state) = self.state.take() else {
            return;
        };
        let conn_id = self.conn_id;
        // No runtime means the process is tearing down anyway.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                state.registry.remove(conn_id).await;
            });
        }
    }
}

/// How a handshake ended.
enum Handshake {
    LoggedIn(AccountId),
    Quit,
    Closed,
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<S, C>(
    conn: Arc<TcpLineConnection>,
    state: Arc<ServerState<S, C>>,
) -> Result<(), SkirmishError>
where
    S: AccountStore,
    C: Codec,
{
    let conn_id = conn.id();
    let mut guard = ConnectionGuard::new(conn_id, &state);
    tracing::debug!(%conn_id, "handling new connection");

    // Registered by the accept loop before this task was spawned.
    let evicted = state
        .registry
        .eviction_signal(conn_id)
        .await
        .unwrap_or_default();
    let link = Link {
        conn: &conn,
        evicted: &evicted,
    };

    // --- Step 1 & 2: Handshake ---
    let quit = match perform_handshake(link, &state).await? {
        Handshake::LoggedIn(account_id) => {
            tracing::info!(%conn_id, %account_id, "player logged in");
            // --- Step 3: Command loop ---
            command_loop(link, &state, account_id).await?
        }
        Handshake::Quit => true,
        Handshake::Closed => false,
    };

    // Deregister before closing so a concurrent broadcast never sees a
    // connection that is already shut down.
    guard.release().await;
    if quit {
        tracing::info!(%conn_id, "client quit");
        conn.close().await?;
    } else {
        tracing::info!(%conn_id, "connection closed");
        let _ = conn.close().await;
    }
    Ok(())
}

/// The connection a handler drives, plus its eviction signal.
#[derive(Clone, Copy)]
struct Link<'a> {
    conn: &'a TcpLineConnection,
    evicted: &'a Notify,
}

/// Reads the next frame, applying the idle timeout if one is configured.
///
/// `Ok(None)` means the peer closed the connection, went idle, or was
/// evicted by a newer login for the same account.
async fn next_frame<S, C>(
    link: Link<'_>,
    state: &ServerState<S, C>,
) -> Result<Option<Vec<u8>>, SkirmishError>
where
    S: AccountStore,
    C: Codec,
{
    let conn = link.conn;
    let recv = async {
        let frame = match state.config.idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, conn.recv()).await {
                Ok(frame) => frame?,
                Err(_) => {
                    tracing::info!(conn_id = %conn.id(), ?limit, "connection idle, closing");
                    None
                }
            },
            None => conn.recv().await?,
        };
        Ok::<_, SkirmishError>(frame)
    };

    tokio::select! {
        frame = recv => frame,
        () = link.evicted.notified() => {
            tracing::info!(conn_id = %conn.id(), "account logged in elsewhere, closing");
            Ok(None)
        }
    }
}

async fn send_reply<S, C>(
    conn: &TcpLineConnection,
    state: &ServerState<S, C>,
    reply: &Reply,
) -> Result<(), SkirmishError>
where
    S: AccountStore,
    C: Codec,
{
    conn.send(&state.codec.encode(reply)).await?;
    Ok(())
}

/// Runs the initial handshake state: `quit`, registration, or the first
/// login attempt.
async fn perform_handshake<S, C>(
    link: Link<'_>,
    state: &ServerState<S, C>,
) -> Result<Handshake, SkirmishError>
where
    S: AccountStore,
    C: Codec,
{
    let conn = link.conn;
    let conn_id = conn.id();

    loop {
        let Some(data) = next_frame(link, state).await? else {
            return Ok(Handshake::Closed);
        };

        let frame = match state.codec.decode_handshake(&data) {
            Ok(frame) => frame,
            Err(e) => {
                send_reply(conn, state, &Reply::LoginError).await?;
                return Err(e.into());
            }
        };

        match frame {
            HandshakeFrame::Quit => return Ok(Handshake::Quit),

            HandshakeFrame::Register {
                username,
                email,
                password,
            } => {
                let account_id = match state
                    .store
                    .create_account(&username, &email, &password)
                    .await
                {
                    Ok(id) => id,
                    Err(e) => {
                        if e.is_rejection() {
                            tracing::info!(%conn_id, error = %e, "registration rejected");
                        } else {
                            tracing::warn!(%conn_id, error = %e, "registration failed");
                        }
                        send_reply(conn, state, &Reply::RegisterError).await?;
                        continue;
                    }
                };

                // A brand-new account cannot be bound elsewhere; failure
                // here means this connection was already deregistered.
                if let Err(e) = state.registry.bind(conn_id, account_id).await {
                    send_reply(conn, state, &Reply::RegisterError).await?;
                    return Err(e.into());
                }
                send_reply(conn, state, &Reply::RegisterOk).await?;
                return Ok(Handshake::LoggedIn(account_id));
            }

            HandshakeFrame::MalformedRegister { tokens } => {
                tracing::debug!(%conn_id, tokens, "malformed REGISTER frame");
                send_reply(conn, state, &Reply::RegisterError).await?;
            }

            login => return login_loop(link, state, login).await,
        }
    }
}

/// The login retry state. Wrong credentials keep the loop going; a frame
/// with the wrong shape ends the connection.
async fn login_loop<S, C>(
    link: Link<'_>,
    state: &ServerState<S, C>,
    mut frame: HandshakeFrame,
) -> Result<Handshake, SkirmishError>
where
    S: AccountStore,
    C: Codec,
{
    let conn = link.conn;
    let conn_id = conn.id();

    loop {
        match frame {
            HandshakeFrame::Empty => return Ok(Handshake::Closed),

            HandshakeFrame::Login { email, password } => {
                if let Some(account_id) = try_login(conn_id, state, &email, &password).await? {
                    send_reply(conn, state, &Reply::LoginOk).await?;
                    return Ok(Handshake::LoggedIn(account_id));
                }
                send_reply(conn, state, &Reply::LoginError).await?;
            }

            other => {
                tracing::debug!(%conn_id, frame = ?other, "malformed login frame");
                send_reply(conn, state, &Reply::LoginError).await?;
                return Ok(Handshake::Closed);
            }
        }

        let Some(data) = next_frame(link, state).await? else {
            return Ok(Handshake::Closed);
        };
        frame = match state.codec.decode_login(&data) {
            Ok(frame) => frame,
            Err(e) => {
                send_reply(conn, state, &Reply::LoginError).await?;
                return Err(e.into());
            }
        };
    }
}

/// Checks credentials and binds the account to this connection.
///
/// The newest login wins: a connection already holding the account is
/// evicted. Returns `Ok(None)` when the client should see `LOGIN ERROR`,
/// meaning bad credentials or a store fault.
async fn try_login<S, C>(
    conn_id: ConnectionId,
    state: &ServerState<S, C>,
    email: &str,
    password: &str,
) -> Result<Option<AccountId>, SkirmishError>
where
    S: AccountStore,
    C: Codec,
{
    let account_id = match state.store.authenticate(email, password).await {
        Ok(Some(id)) => id,
        Ok(None) => {
            tracing::info!(%conn_id, "login rejected: bad credentials");
            return Ok(None);
        }
        Err(e) => {
            tracing::warn!(%conn_id, error = %e, "login failed");
            return Ok(None);
        }
    };

    if let Some(previous) = state.registry.take_over(conn_id, account_id).await? {
        tracing::info!(
            %conn_id,
            %account_id,
            previous = %previous.id(),
            "login replaced an existing session"
        );
    }
    Ok(Some(account_id))
}

/// Processes commands for a logged-in connection. Returns `true` if the
/// client sent `QUIT`, `false` if it disconnected.
async fn command_loop<S, C>(
    link: Link<'_>,
    state: &ServerState<S, C>,
    account_id: AccountId,
) -> Result<bool, SkirmishError>
where
    S: AccountStore,
    C: Codec,
{
    let conn = link.conn;
    let conn_id = conn.id();

    loop {
        let Some(data) = next_frame(link, state).await? else {
            return Ok(false);
        };

        let command = match state.codec.decode_command(&data) {
            Ok(command) => command,
            Err(ProtocolError::InvalidUtf8) => {
                tracing::debug!(%conn_id, "ignoring non-UTF-8 frame");
                continue;
            }
            // Only HOTBAR frames fail to parse.
            Err(e) => {
                send_reply(conn, state, &Reply::HotbarError(e.to_string())).await?;
                continue;
            }
        };

        match command {
            Command::Hotbar(hotbar) => {
                handle_hotbar(conn, state, account_id, hotbar).await?;
            }

            Command::Quit => return Ok(true),

            Command::Empty => {}

            Command::Unknown(head) => {
                tracing::debug!(%conn_id, %head, "ignoring unknown command");
            }

            reserved => {
                tracing::debug!(
                    %conn_id,
                    command = reserved.head(),
                    "reserved command, nothing to do"
                );
            }
        }
    }
}

async fn handle_hotbar<S, C>(
    conn: &TcpLineConnection,
    state: &ServerState<S, C>,
    account_id: AccountId,
    command: HotbarCommand,
) -> Result<(), SkirmishError>
where
    S: AccountStore,
    C: Codec,
{
    let reply = match command {
        HotbarCommand::Open => Reply::HotbarOpen,
        HotbarCommand::Close => Reply::HotbarClose,
        HotbarCommand::Set { slot, item } => {
            match state.store.equip_weapon(account_id, slot, item).await {
                Ok(()) => Reply::HotbarSetOk,
                Err(e) => {
                    if !e.is_rejection() {
                        tracing::warn!(%account_id, error = %e, "hotbar update failed");
                    }
                    Reply::HotbarError(e.to_string())
                }
            }
        }
    };
    send_reply(conn, state, &reply).await
}
