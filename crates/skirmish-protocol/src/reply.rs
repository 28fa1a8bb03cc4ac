//! Server-to-client reply frames.

use std::fmt;

/// A frame the server sends to a client.
///
/// `Display` renders the exact line that goes on the wire, without the
/// trailing newline (the transport adds it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    RegisterOk,
    RegisterError,
    LoginOk,
    LoginError,
    HotbarOpen,
    HotbarSetOk,
    HotbarClose,
    /// A rejected hotbar command. The detail is free text and must not
    /// contain a newline.
    HotbarError(String),
    /// Broadcast to every client before the server stops.
    Shutdown,
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::RegisterOk => f.write_str("REGISTER OK"),
            Reply::RegisterError => f.write_str("REGISTER ERROR"),
            Reply::LoginOk => f.write_str("LOGIN OK"),
            Reply::LoginError => f.write_str("LOGIN ERROR"),
            Reply::HotbarOpen => f.write_str("HOTBAR OPEN"),
            Reply::HotbarSetOk => f.write_str("OK HOTBAR SET"),
            Reply::HotbarClose => f.write_str("HOTBAR CLOSE"),
            Reply::HotbarError(detail) => {
                let detail = detail.replace(['\r', '\n'], " ");
                write!(f, "ERROR ({detail}) HOTBAR")
            }
            Reply::Shutdown => f.write_str("SERVER SHUTDOWN"),
        }
    }
}
