//! Unified error type for the Skirmish server.

use skirmish_protocol::ProtocolError;
use skirmish_session::SessionError;
use skirmish_store::StoreError;
use skirmish_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impls,
/// so `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum SkirmishError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A registry error (double login, unknown connection, full).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// An account store error.
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use skirmish_protocol::AccountId;
    use skirmish_transport::ConnectionId;

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::FrameTooLong(16);
        let skirmish_err: SkirmishError = err.into();
        assert!(matches!(skirmish_err, SkirmishError::Transport(_)));
        assert!(skirmish_err.to_string().contains("16"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidSlot("9".into());
        let skirmish_err: SkirmishError = err.into();
        assert!(matches!(skirmish_err, SkirmishError::Protocol(_)));
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::AlreadyConnected(AccountId(1));
        let skirmish_err: SkirmishError = err.into();
        assert!(matches!(skirmish_err, SkirmishError::Session(_)));

        let err = SessionError::NotFound(ConnectionId::new(4));
        assert!(SkirmishError::from(err).to_string().contains("conn-4"));
    }

    #[test]
    fn test_from_store_error() {
        let err = StoreError::Duplicate("email".into());
        let skirmish_err: SkirmishError = err.into();
        assert!(matches!(skirmish_err, SkirmishError::Store(_)));
        assert_eq!(skirmish_err.to_string(), "email already taken");
    }
}
