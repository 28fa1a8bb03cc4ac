//! # Skirmish
//!
//! Lobby server for the Skirmish game. Clients connect over TCP, register
//! or log in with a line-based text protocol, and manage their weapon
//! hotbar before a match. Accounts live in SQLite.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use skirmish::prelude::*;
//!
//! # async fn demo() -> Result<(), SkirmishError> {
//! let store = SqliteAccountStore::open("data.db")?;
//! let server = SkirmishServerBuilder::new()
//!     .bind("localhost:5555")
//!     .build(store)
//!     .await?;
//! server.run().await
//! # }
//! ```

pub mod config;
mod error;
mod handler;
mod server;

pub use error::SkirmishError;
pub use server::{DEFAULT_BIND_ADDR, Registry, SkirmishServer, SkirmishServerBuilder};

/// Everything needed to embed or test the server.
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::{Registry, SkirmishError, SkirmishServer, SkirmishServerBuilder};
    pub use skirmish_protocol::{
        AccountId, Codec, Command, CosmeticId, HandshakeFrame, HotbarCommand, HotbarSlot,
        PROTOCOL_VERSION, ProtocolError, Reply, TextCodec, WeaponId,
    };
    pub use skirmish_session::{SessionConfig, SessionError, SessionInfo, SessionRegistry};
    pub use skirmish_store::{Account, AccountStore, Loadout, SqliteAccountStore, StoreError};
    pub use skirmish_transport::{Connection, ConnectionId, TransportError};
}
