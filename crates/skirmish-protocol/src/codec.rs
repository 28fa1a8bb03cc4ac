//! Codec trait and the plain-text implementation.
//!
//! The transport hands the server whole frames as bytes. A [`Codec`] turns
//! those bytes into typed frames and typed replies back into bytes, so the
//! session handler never touches string splitting or encodings.

use crate::{Command, HandshakeFrame, ProtocolError, Reply};

/// Converts between frame bytes and protocol types.
///
/// `Send + Sync + 'static` because one codec is shared by every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Decodes the first frame of a handshake.
    fn decode_handshake(&self, data: &[u8]) -> Result<HandshakeFrame, ProtocolError>;

    /// Decodes a frame in the login retry loop.
    fn decode_login(&self, data: &[u8]) -> Result<HandshakeFrame, ProtocolError>;

    /// Decodes a post-login command frame.
    fn decode_command(&self, data: &[u8]) -> Result<Command, ProtocolError>;

    /// Encodes a reply into frame bytes.
    fn encode(&self, reply: &Reply) -> Vec<u8>;
}

/// A [`Codec`] for UTF-8, whitespace-separated text frames.
///
/// ```rust
/// use skirmish_protocol::{Codec, Command, HotbarCommand, Reply, TextCodec};
///
/// let codec = TextCodec;
/// let cmd = codec.decode_command(b"HOTBAR OPEN").unwrap();
/// assert_eq!(cmd, Command::Hotbar(HotbarCommand::Open));
/// assert_eq!(codec.encode(&Reply::HotbarOpen), b"HOTBAR OPEN");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl TextCodec {
    fn text(data: &[u8]) -> Result<&str, ProtocolError> {
        std::str::from_utf8(data).map_err(|_| ProtocolError::InvalidUtf8)
    }
}

impl Codec for TextCodec {
    fn decode_handshake(&self, data: &[u8]) -> Result<HandshakeFrame, ProtocolError> {
        Self::text(data).map(HandshakeFrame::parse)
    }

    fn decode_login(&self, data: &[u8]) -> Result<HandshakeFrame, ProtocolError> {
        Self::text(data).map(HandshakeFrame::parse_login)
    }

    fn decode_command(&self, data: &[u8]) -> Result<Command, ProtocolError> {
        Command::parse(Self::text(data)?)
    }

    fn encode(&self, reply: &Reply) -> Vec<u8> {
        reply.to_string().into_bytes()
    }
}
