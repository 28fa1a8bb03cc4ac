//! Integration tests for the SQLite account store.

use skirmish_protocol::{AccountId, CosmeticId, HotbarSlot, WeaponId};
use skirmish_store::{AccountStore, NewCosmetic, NewWeapon, SqliteAccountStore, StoreError};

fn store() -> SqliteAccountStore {
    SqliteAccountStore::open_in_memory().unwrap()
}

async fn alice(store: &SqliteAccountStore) -> AccountId {
    store
        .create_account("alice", "alice@example.com", "pw1")
        .await
        .unwrap()
}

async fn extra_weapon(store: &SqliteAccountStore) -> WeaponId {
    store
        .insert_weapon(NewWeapon {
            name: "Crossbow".into(),
            price: 250,
            damage: 20,
            reach: 15,
            velocity: 18,
            motion_type: "projectile".into(),
            ..Default::default()
        })
        .await
        .unwrap()
}

// =========================================================================
// Registration and authentication
// =========================================================================

#[tokio::test]
async fn test_register_then_authenticate_returns_same_account() {
    let store = store();
    let id = alice(&store).await;

    let found = store.authenticate("alice@example.com", "pw1").await.unwrap();
    assert_eq!(found, Some(id));
}

#[tokio::test]
async fn test_authenticate_wrong_password_is_none() {
    let store = store();
    alice(&store).await;

    let found = store.authenticate("alice@example.com", "nope").await.unwrap();
    assert_eq!(found, None);
}

#[tokio::test]
async fn test_authenticate_unknown_email_is_none() {
    let store = store();
    let found = store.authenticate("ghost@example.com", "pw").await.unwrap();
    assert_eq!(found, None);
    let found = store.authenticate("ghost@example.com", "").await.unwrap();
    assert_eq!(found, None);
}

#[tokio::test]
async fn test_register_duplicate_username_rejected() {
    let store = store();
    alice(&store).await;

    let err = store
        .create_account("alice", "other@example.com", "pw2")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(ref f) if f == "username"));
    assert_eq!(
        store.authenticate("other@example.com", "pw2").await.unwrap(),
        None,
        "no account should have been created"
    );
}

#[tokio::test]
async fn test_register_duplicate_email_rejected() {
    let store = store();
    alice(&store).await;

    let err = store
        .create_account("bob", "alice@example.com", "pw2")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(ref f) if f == "email"));
    // The original credentials still work.
    assert!(store.authenticate("alice@example.com", "pw1").await.unwrap().is_some());
}

#[tokio::test]
async fn test_register_rejects_empty_fields() {
    let store = store();
    for (user, email, pw) in [("", "a@x.io", "pw"), ("a", "", "pw"), ("a", "a@x.io", "")] {
        let err = store.create_account(user, email, pw).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)), "{user:?} {email:?} {pw:?}");
    }
}

#[tokio::test]
async fn test_new_account_has_starter_kit() {
    let store = store();
    let id = alice(&store).await;

    let account = store.account(id).await.unwrap();
    assert_eq!(account.username, "alice");
    assert_eq!(account.email, "alice@example.com");
    assert_eq!(account.balance, 0);
    assert!(account.friends.is_empty());

    let catalog = store.weapons().await.unwrap();
    let starters: Vec<_> = catalog.iter().filter(|w| w.starter).map(|w| w.id).collect();
    assert_eq!(account.weapons, starters);
    assert_eq!(account.cosmetics.len(), 1);
    assert_eq!(account.loadout.skin, Some(account.cosmetics[0]));
}

// =========================================================================
// Profile mutations
// =========================================================================

#[tokio::test]
async fn test_set_username_and_balance() {
    let store = store();
    let id = alice(&store).await;

    store.set_username(id, "alicia").await.unwrap();
    store.set_balance(id, 500).await.unwrap();

    let account = store.account(id).await.unwrap();
    assert_eq!(account.username, "alicia");
    assert_eq!(account.balance, 500);
}

#[tokio::test]
async fn test_set_email_collision_is_duplicate() {
    let store = store();
    alice(&store).await;
    let bob = store.create_account("bob", "bob@example.com", "pw").await.unwrap();

    let err = store.set_email(bob, "alice@example.com").await.unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(ref f) if f == "email"));
}

#[tokio::test]
async fn test_mutating_unknown_account_is_not_found() {
    let store = store();
    let err = store.set_balance(AccountId(42), 1).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
    let err = store.account(AccountId(42)).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

// =========================================================================
// Inventory and friends
// =========================================================================

#[tokio::test]
async fn test_add_weapon_is_idempotent() {
    let store = store();
    let id = alice(&store).await;
    let crossbow = extra_weapon(&store).await;

    store.add_weapon(id, crossbow).await.unwrap();
    store.add_weapon(id, crossbow).await.unwrap();

    let account = store.account(id).await.unwrap();
    assert_eq!(account.weapons.iter().filter(|w| **w == crossbow).count(), 1);
}

#[tokio::test]
async fn test_add_unknown_weapon_is_not_found() {
    let store = store();
    let id = alice(&store).await;
    let err = store.add_weapon(id, WeaponId(999)).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn test_remove_weapon_clears_hotbar() {
    let store = store();
    let id = alice(&store).await;
    let crossbow = extra_weapon(&store).await;
    store.add_weapon(id, crossbow).await.unwrap();

    let slot0 = HotbarSlot::try_from(0).unwrap();
    let slot2 = HotbarSlot::try_from(2).unwrap();
    store.equip_weapon(id, slot0, crossbow).await.unwrap();
    store.equip_weapon(id, slot2, crossbow).await.unwrap();

    store.remove_weapon(id, crossbow).await.unwrap();

    let account = store.account(id).await.unwrap();
    assert!(!account.owns_weapon(crossbow));
    assert_eq!(account.loadout.hotbar, [None, None, None]);
}

#[tokio::test]
async fn test_remove_active_skin_clears_it() {
    let store = store();
    let id = alice(&store).await;
    let skin = store.account(id).await.unwrap().loadout.skin.unwrap();

    store.remove_cosmetic(id, skin).await.unwrap();

    let account = store.account(id).await.unwrap();
    assert!(account.cosmetics.is_empty());
    assert_eq!(account.loadout.skin, None);
}

#[tokio::test]
async fn test_equip_skin_requires_ownership() {
    let store = store();
    let id = alice(&store).await;
    let gold = store
        .insert_cosmetic(NewCosmetic {
            name: "Gold".into(),
            price: 1000,
            ..Default::default()
        })
        .await
        .unwrap();

    let err = store.equip_skin(id, gold).await.unwrap_err();
    assert!(matches!(err, StoreError::NotOwned(_)));

    store.add_cosmetic(id, gold).await.unwrap();
    store.equip_skin(id, gold).await.unwrap();
    assert_eq!(store.account(id).await.unwrap().loadout.skin, Some(gold));

    let cosmetic = store.cosmetic(gold).await.unwrap();
    assert_eq!(cosmetic.name, "Gold");
    assert!(!cosmetic.starter);
}

#[tokio::test]
async fn test_friends_are_one_way() {
    let store = store();
    let a = alice(&store).await;
    let b = store.create_account("bob", "bob@example.com", "pw").await.unwrap();

    store.add_friend(a, b).await.unwrap();
    store.add_friend(a, b).await.unwrap();

    assert_eq!(store.account(a).await.unwrap().friends, vec![b]);
    assert!(store.account(b).await.unwrap().friends.is_empty());

    store.remove_friend(a, b).await.unwrap();
    assert!(store.account(a).await.unwrap().friends.is_empty());
}

#[tokio::test]
async fn test_befriend_self_rejected() {
    let store = store();
    let a = alice(&store).await;
    let err = store.add_friend(a, a).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidInput(_)));
}

// =========================================================================
// Hotbar
// =========================================================================

#[tokio::test]
async fn test_equip_owned_weapon_sets_slot() {
    let store = store();
    let id = alice(&store).await;
    let weapon = store.account(id).await.unwrap().weapons[1];
    let slot = HotbarSlot::try_from(1).unwrap();

    store.equip_weapon(id, slot, weapon).await.unwrap();

    let loadout = store.account(id).await.unwrap().loadout;
    assert_eq!(loadout.weapon_in(slot), Some(weapon));
    assert_eq!(loadout.hotbar[0], None);
    assert_eq!(loadout.hotbar[2], None);
}

#[tokio::test]
async fn test_equip_unowned_weapon_leaves_loadout_unchanged() {
    let store = store();
    let id = alice(&store).await;
    let owned = store.account(id).await.unwrap().weapons[0];
    let slot = HotbarSlot::try_from(0).unwrap();
    store.equip_weapon(id, slot, owned).await.unwrap();
    let before = store.account(id).await.unwrap().loadout;

    let crossbow = extra_weapon(&store).await;
    let err = store.equip_weapon(id, slot, crossbow).await.unwrap_err();
    assert!(matches!(err, StoreError::NotOwned(_)));
    assert_eq!(err.to_string(), format!("weapon {crossbow} is not owned"));

    let err = store.equip_weapon(id, slot, WeaponId(999)).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));

    assert_eq!(store.account(id).await.unwrap().loadout, before);
}

#[tokio::test]
async fn test_unknown_cosmetic_lookup_is_not_found() {
    let store = store();
    let err = store.cosmetic(CosmeticId(77)).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

// =========================================================================
// Persistence
// =========================================================================

#[tokio::test]
async fn test_reopen_file_keeps_accounts() {
    let dir = std::env::temp_dir().join(format!("skirmish-store-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("reopen.db");
    let _ = std::fs::remove_file(&path);

    let id = {
        let store = SqliteAccountStore::open(&path).unwrap();
        alice(&store).await
    };

    let store = SqliteAccountStore::open(&path).unwrap();
    assert_eq!(
        store.authenticate("alice@example.com", "pw1").await.unwrap(),
        Some(id)
    );

    drop(store);
    let _ = std::fs::remove_dir_all(&dir);
}
