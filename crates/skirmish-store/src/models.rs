//! Immutable snapshots returned by the store.
//!
//! Nothing here talks to the database. A snapshot is read in one
//! transaction and then handed around freely; changing an account goes
//! through the discrete mutation methods on
//! [`AccountStore`](crate::AccountStore).

use serde::{Deserialize, Serialize};
use skirmish_protocol::{AccountId, CosmeticId, HOTBAR_SLOTS, HotbarSlot, WeaponId};

/// What a player has equipped: one skin and up to three weapons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loadout {
    pub skin: Option<CosmeticId>,
    pub hotbar: [Option<WeaponId>; HOTBAR_SLOTS],
}

impl Loadout {
    /// The weapon in `slot`, if any.
    pub fn weapon_in(&self, slot: HotbarSlot) -> Option<WeaponId> {
        self.hotbar[slot.index()]
    }
}

/// A point-in-time view of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub balance: i64,
    /// Owned weapons, in the order they were granted.
    pub weapons: Vec<WeaponId>,
    /// Owned cosmetics, in the order they were granted.
    pub cosmetics: Vec<CosmeticId>,
    /// Outgoing friend links, in the order they were added.
    pub friends: Vec<AccountId>,
    pub loadout: Loadout,
}

impl Account {
    pub fn owns_weapon(&self, weapon: WeaponId) -> bool {
        self.weapons.contains(&weapon)
    }

    pub fn owns_cosmetic(&self, cosmetic: CosmeticId) -> bool {
        self.cosmetics.contains(&cosmetic)
    }
}

/// A weapon definition from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
    pub id: WeaponId,
    pub name: String,
    pub price: i64,
    pub damage: i64,
    /// Explosion radius; 0 for melee.
    pub radius: i64,
    pub cool_down: i64,
    pub reach: i64,
    pub velocity: i64,
    pub motion_type: String,
    /// Sprite path used by the client.
    pub path: String,
    /// Granted to every new account.
    pub starter: bool,
}

/// Fields for inserting a weapon; the id is assigned by the database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWeapon {
    pub name: String,
    pub price: i64,
    pub damage: i64,
    pub radius: i64,
    pub cool_down: i64,
    pub reach: i64,
    pub velocity: i64,
    pub motion_type: String,
    pub path: String,
    pub starter: bool,
}

/// A cosmetic definition from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cosmetic {
    pub id: CosmeticId,
    pub name: String,
    pub price: i64,
    pub path: String,
    pub starter: bool,
}

/// Fields for inserting a cosmetic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCosmetic {
    pub name: String,
    pub price: i64,
    pub path: String,
    pub starter: bool,
}
