//! The repository interface the session layer talks to.

use std::future::Future;

use skirmish_protocol::{AccountId, CosmeticId, HotbarSlot, WeaponId};

use crate::{Account, StoreError};

/// Account persistence used by the lobby server.
///
/// Reads return immutable [`Account`] snapshots; every mutation is a
/// separate method that runs in its own transaction. Implementations must
/// be shareable across connection tasks.
///
/// # Example
///
/// ```rust,no_run
/// use skirmish_store::{AccountStore, SqliteAccountStore};
///
/// # async fn demo() -> Result<(), skirmish_store::StoreError> {
/// let store = SqliteAccountStore::open("data.db")?;
/// let id = store.create_account("alice", "alice@example.com", "secret").await?;
/// assert_eq!(store.authenticate("alice@example.com", "secret").await?, Some(id));
/// # Ok(())
/// # }
/// ```
pub trait AccountStore: Send + Sync + 'static {
    /// Creates an account and grants the starter kit.
    ///
    /// # Errors
    /// [`StoreError::Duplicate`] if the username or email is taken,
    /// [`StoreError::InvalidInput`] if a field is empty.
    fn create_account(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<AccountId, StoreError>> + Send;

    /// Checks credentials. `Ok(None)` means unknown email or wrong
    /// password; the two look the same to the caller, and an unknown
    /// email still pays for one password verification.
    fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Option<AccountId>, StoreError>> + Send;

    /// Reads a consistent snapshot of one account.
    fn account(
        &self,
        id: AccountId,
    ) -> impl Future<Output = Result<Account, StoreError>> + Send;

    fn set_username(
        &self,
        id: AccountId,
        username: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn set_email(
        &self,
        id: AccountId,
        email: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn set_balance(
        &self,
        id: AccountId,
        balance: i64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Grants a weapon. Granting one already owned is a no-op.
    fn add_weapon(
        &self,
        id: AccountId,
        weapon: WeaponId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Revokes a weapon and unequips it from every hotbar slot.
    fn remove_weapon(
        &self,
        id: AccountId,
        weapon: WeaponId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Grants a cosmetic. Granting one already owned is a no-op.
    fn add_cosmetic(
        &self,
        id: AccountId,
        cosmetic: CosmeticId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Revokes a cosmetic and unequips it if it was the active skin.
    fn remove_cosmetic(
        &self,
        id: AccountId,
        cosmetic: CosmeticId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Adds a one-way friend link.
    fn add_friend(
        &self,
        id: AccountId,
        friend: AccountId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn remove_friend(
        &self,
        id: AccountId,
        friend: AccountId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Puts an owned weapon into a hotbar slot.
    ///
    /// # Errors
    /// [`StoreError::NotOwned`] if the account does not own the weapon;
    /// the loadout is left unchanged.
    fn equip_weapon(
        &self,
        id: AccountId,
        slot: HotbarSlot,
        weapon: WeaponId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Sets the active skin to an owned cosmetic.
    fn equip_skin(
        &self,
        id: AccountId,
        cosmetic: CosmeticId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
