//! Connection tracking for the Skirmish lobby.
//!
//! Every accepted connection gets an entry in the [`SessionRegistry`]
//! until its handler exits. The entry records the peer address and, once
//! the handshake succeeds, the account the connection is logged in as.
//! The registry is also the broadcast fan-out point.
//!
//! # How it fits in the stack
//!
//! ```text
//! Server (above)      ← registers on accept, binds on login, removes on exit
//!     ↕
//! Session Layer (this crate)
//!     ↕
//! Transport (below)   ← provides Connection and ConnectionId
//! ```

mod error;
mod registry;
mod session;

pub use error::SessionError;
pub use registry::SessionRegistry;
pub use session::{DEFAULT_SEND_TIMEOUT, Session, SessionConfig, SessionInfo};
