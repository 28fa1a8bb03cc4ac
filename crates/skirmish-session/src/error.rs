//! Error types for the session layer.

use skirmish_protocol::AccountId;
use skirmish_transport::ConnectionId;

/// Errors returned by [`SessionRegistry`](crate::SessionRegistry).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The account is already bound to another live connection.
    /// One account can only be logged in once at a time.
    #[error("account {0} already has an active session")]
    AlreadyConnected(AccountId),

    /// No registry entry exists for the connection. Either it was never
    /// registered or it has already been removed.
    #[error("connection {0} is not registered")]
    NotFound(ConnectionId),

    /// The registry is at its configured connection limit.
    #[error("connection limit of {limit} reached")]
    Full { limit: usize },
}
