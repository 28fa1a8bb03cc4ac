//! Wire protocol for Skirmish.
//!
//! This crate defines the text language that game clients and the lobby
//! server speak:
//!
//! - **Types** ([`AccountId`], [`WeaponId`], [`HotbarSlot`], ...): the
//!   identities shared with the store and session layers.
//! - **Frames** ([`HandshakeFrame`], [`Command`]): client input, parsed
//!   once into closed enums.
//! - **Replies** ([`Reply`]): everything the server can say back.
//! - **Codec** ([`Codec`] trait, [`TextCodec`]): bytes to frames and back.
//!
//! # Framing
//!
//! Version 2 of the protocol puts exactly one frame on each
//! `\n`-terminated line. The transport does the line splitting; this crate
//! only ever sees complete frames.
//!
//! ```text
//! Transport (lines) → Protocol (Command) → Session (account context)
//! ```

mod codec;
mod error;
mod frame;
mod reply;
mod types;

pub use codec::{Codec, TextCodec};
pub use error::ProtocolError;
pub use frame::{Command, HandshakeFrame, HotbarCommand};
pub use reply::Reply;
pub use types::{AccountId, CosmeticId, HOTBAR_SLOTS, HotbarSlot, WeaponId};

/// Current wire protocol version (newline-delimited frames).
pub const PROTOCOL_VERSION: u32 = 2;
