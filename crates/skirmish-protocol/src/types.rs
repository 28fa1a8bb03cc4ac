//! Identity and slot types shared by every layer of the server.
//!
//! Accounts, weapons and cosmetics are all keyed by SQLite rowids, so each
//! gets its own newtype around `i64`. Mixing them up is a compile error
//! instead of a silently wrong query.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A persisted player account.
///
/// Serialized as the bare number (`#[serde(transparent)]`), so an
/// `AccountId(42)` is just `42` in JSON logs and dumps.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AccountId(pub i64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A-{}", self.0)
    }
}

/// A weapon in the catalog.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct WeaponId(pub i64);

impl fmt::Display for WeaponId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "W-{}", self.0)
    }
}

/// Weapons travel on the wire as their plain numeric id.
impl FromStr for WeaponId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>()
            .map(WeaponId)
            .map_err(|_| ProtocolError::InvalidItem(s.to_string()))
    }
}

/// A cosmetic (skin) in the catalog.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CosmeticId(pub i64);

impl fmt::Display for CosmeticId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// HotbarSlot
// ---------------------------------------------------------------------------

/// Number of weapon slots on the hotbar.
pub const HOTBAR_SLOTS: usize = 3;

/// One of the three hotbar positions.
///
/// The only way to build a `HotbarSlot` is through validation, so code
/// holding one never needs to re-check the range.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct HotbarSlot(u8);

impl HotbarSlot {
    /// All slots in order.
    pub const ALL: [HotbarSlot; HOTBAR_SLOTS] =
        [HotbarSlot(0), HotbarSlot(1), HotbarSlot(2)];

    /// Returns the slot as an array index.
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl TryFrom<u8> for HotbarSlot {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if usize::from(value) < HOTBAR_SLOTS {
            Ok(HotbarSlot(value))
        } else {
            Err(ProtocolError::InvalidSlot(value.to_string()))
        }
    }
}

impl From<HotbarSlot> for u8 {
    fn from(slot: HotbarSlot) -> Self {
        slot.0
    }
}

impl FromStr for HotbarSlot {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: u8 = s
            .parse()
            .map_err(|_| ProtocolError::InvalidSlot(s.to_string()))?;
        HotbarSlot::try_from(raw)
    }
}

impl fmt::Display for HotbarSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&AccountId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_account_id_display() {
        assert_eq!(AccountId(7).to_string(), "A-7");
    }

    #[test]
    fn test_weapon_id_parses_numeric_item() {
        assert_eq!("12".parse::<WeaponId>().unwrap(), WeaponId(12));
    }

    #[test]
    fn test_weapon_id_rejects_non_numeric_item() {
        let err = "sword".parse::<WeaponId>().unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidItem(ref s) if s == "sword"));
    }

    #[test]
    fn test_hotbar_slot_accepts_zero_through_two() {
        for (raw, slot) in ["0", "1", "2"].iter().zip(HotbarSlot::ALL) {
            assert_eq!(raw.parse::<HotbarSlot>().unwrap(), slot);
        }
    }

    #[test]
    fn test_hotbar_slot_rejects_out_of_range() {
        for raw in ["3", "-1", "255", "x", ""] {
            assert!(
                raw.parse::<HotbarSlot>().is_err(),
                "{raw:?} should not be a slot"
            );
        }
    }

    #[test]
    fn test_hotbar_slot_deserialize_validates_range() {
        assert!(serde_json::from_str::<HotbarSlot>("1").is_ok());
        assert!(serde_json::from_str::<HotbarSlot>("5").is_err());
    }

    #[test]
    fn test_hotbar_slot_index() {
        assert_eq!(HotbarSlot::ALL[2].index(), 2);
    }
}
