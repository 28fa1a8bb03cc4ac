//! Error types for the protocol layer.

/// Errors produced while turning raw frames into typed messages.
///
/// The `Display` text of the validation variants is what the client sees
/// inside an `ERROR (...) HOTBAR` reply, so keep it short and readable.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The frame bytes are not valid UTF-8.
    #[error("frame is not valid UTF-8")]
    InvalidUtf8,

    /// A hotbar slot outside `0..=2` or not a number.
    #[error("invalid slot {0:?}: expected 0, 1 or 2")]
    InvalidSlot(String),

    /// An item argument that is not a weapon id.
    #[error("invalid item {0:?}: expected a weapon id")]
    InvalidItem(String),

    /// A command is missing a required argument.
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
}
