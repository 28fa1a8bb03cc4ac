//! # skirmish-store
//!
//! Persistent accounts for the Skirmish lobby: credentials, balance,
//! owned weapons and cosmetics, friend links and the equipped loadout.
//!
//! [`AccountStore`] is the interface the server depends on.
//! [`SqliteAccountStore`] implements it over one SQLite file whose schema
//! is managed by [`migrations`]. Passwords are stored as Argon2 PHC
//! strings, never in plain text.

mod error;
mod migrations;
mod models;
mod password;
mod sqlite;
mod store;

pub use error::StoreError;
pub use migrations::migrations;
pub use models::{Account, Cosmetic, Loadout, NewCosmetic, NewWeapon, Weapon};
pub use password::{hash_password, verify_password};
pub use sqlite::SqliteAccountStore;
pub use store::AccountStore;
