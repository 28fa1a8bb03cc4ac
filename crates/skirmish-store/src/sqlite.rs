//! SQLite implementation of [`AccountStore`].
//!
//! rusqlite is synchronous, so the connection lives behind
//! `Arc<std::sync::Mutex<_>>` and every query runs on Tokio's blocking
//! pool via `spawn_blocking`. Password hashing and verification also run
//! there, but outside the connection lock.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, OptionalExtension, Row, params};
use skirmish_protocol::{AccountId, CosmeticId, HotbarSlot, WeaponId};

use crate::error::is_unique_violation;
use crate::migrations::migrations;
use crate::password::{dummy_hash, hash_password, verify_password};
use crate::{
    Account, AccountStore, Cosmetic, Loadout, NewCosmetic, NewWeapon, StoreError, Weapon,
};

/// An [`AccountStore`] backed by one SQLite database file.
///
/// Cloning is cheap and every clone shares the same connection.
#[derive(Clone)]
pub struct SqliteAccountStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteAccountStore {
    /// Opens (or creates) the database at `path` and migrates it to the
    /// latest schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        let store = Self::init(conn)?;
        tracing::info!(path = %path.display(), "account store opened");
        Ok(store)
    }

    /// Opens a private in-memory database. Used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(mut conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations().to_latest(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&mut *guard)
        })
        .await?
    }

    // -- Catalog ---------------------------------------------------------

    /// Looks up one weapon definition.
    pub async fn weapon(&self, id: WeaponId) -> Result<Weapon, StoreError> {
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("SELECT {WEAPON_COLUMNS} FROM weapons WHERE id = ?1"),
                [id.0],
                weapon_from_row,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("weapon {id}")))
        })
        .await
    }

    /// Lists the whole weapon catalog ordered by id.
    pub async fn weapons(&self) -> Result<Vec<Weapon>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {WEAPON_COLUMNS} FROM weapons ORDER BY id"))?;
            let rows = stmt.query_map([], weapon_from_row)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }

    /// Looks up one cosmetic definition.
    pub async fn cosmetic(&self, id: CosmeticId) -> Result<Cosmetic, StoreError> {
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT id, name, price, path, starter FROM cosmetics WHERE id = ?1",
                [id.0],
                cosmetic_from_row,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("cosmetic {id}")))
        })
        .await
    }

    /// Adds a weapon to the catalog.
    pub async fn insert_weapon(&self, weapon: NewWeapon) -> Result<WeaponId, StoreError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO weapons (name, price, damage, radius, cool_down, reach, velocity, motion_type, path, starter)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    weapon.name,
                    weapon.price,
                    weapon.damage,
                    weapon.radius,
                    weapon.cool_down,
                    weapon.reach,
                    weapon.velocity,
                    weapon.motion_type,
                    weapon.path,
                    weapon.starter,
                ],
            )?;
            Ok(WeaponId(conn.last_insert_rowid()))
        })
        .await
    }

    /// Adds a cosmetic to the catalog.
    pub async fn insert_cosmetic(
        &self,
        cosmetic: NewCosmetic,
    ) -> Result<CosmeticId, StoreError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO cosmetics (name, price, path, starter) VALUES (?1, ?2, ?3, ?4)",
                params![cosmetic.name, cosmetic.price, cosmetic.path, cosmetic.starter],
            )?;
            Ok(CosmeticId(conn.last_insert_rowid()))
        })
        .await
    }
}

impl AccountStore for SqliteAccountStore {
    async fn create_account(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AccountId, StoreError> {
        validate_token("username", username)?;
        validate_token("email", email)?;

        let password = password.to_string();
        let phc = tokio::task::spawn_blocking(move || hash_password(&password)).await??;

        let (username, email) = (username.to_string(), email.to_string());
        let id = self
            .with_conn(move |conn| insert_account(conn, &username, &email, &phc))
            .await?;
        tracing::info!(account_id = %id, "account created");
        Ok(id)
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<AccountId>, StoreError> {
        let lookup = email.to_string();
        let row = self
            .with_conn(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT id, password FROM players WHERE email = ?1",
                        [&lookup],
                        |r| Ok((AccountId(r.get(0)?), r.get::<_, String>(1)?)),
                    )
                    .optional()?)
            })
            .await?;

        let password = password.to_string();
        let Some((id, phc)) = row else {
            // Burn the same Argon2 work as a real check before answering.
            if let Some(dummy) = dummy_hash() {
                tokio::task::spawn_blocking(move || verify_password(&password, dummy)).await?;
            }
            return Ok(None);
        };
        let ok = tokio::task::spawn_blocking(move || verify_password(&password, &phc)).await?;
        Ok(ok.then_some(id))
    }

    async fn account(&self, id: AccountId) -> Result<Account, StoreError> {
        self.with_conn(move |conn| read_account(conn, id)).await
    }

    async fn set_username(&self, id: AccountId, username: &str) -> Result<(), StoreError> {
        validate_token("username", username)?;
        let username = username.to_string();
        self.with_conn(move |conn| update_unique(conn, id, "username", &username))
            .await
    }

    async fn set_email(&self, id: AccountId, email: &str) -> Result<(), StoreError> {
        validate_token("email", email)?;
        let email = email.to_string();
        self.with_conn(move |conn| update_unique(conn, id, "email", &email))
            .await
    }

    async fn set_balance(&self, id: AccountId, balance: i64) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE players SET balance = ?1 WHERE id = ?2",
                params![balance, id.0],
            )?;
            if changed == 0 {
                return Err(account_not_found(id));
            }
            Ok(())
        })
        .await
    }

    async fn add_weapon(&self, id: AccountId, weapon: WeaponId) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            ensure_account(&tx, id)?;
            ensure_weapon(&tx, weapon)?;
            tx.execute(
                "INSERT OR IGNORE INTO player_weapons (id_player, id_weapon) VALUES (?1, ?2)",
                params![id.0, weapon.0],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn remove_weapon(&self, id: AccountId, weapon: WeaponId) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            ensure_account(&tx, id)?;
            tx.execute(
                "DELETE FROM player_weapons WHERE id_player = ?1 AND id_weapon = ?2",
                params![id.0, weapon.0],
            )?;
            tx.execute(
                "UPDATE game_setup SET
                    id_weapon_1 = NULLIF(id_weapon_1, ?2),
                    id_weapon_2 = NULLIF(id_weapon_2, ?2),
                    id_weapon_3 = NULLIF(id_weapon_3, ?2)
                 WHERE player_id = ?1",
                params![id.0, weapon.0],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn add_cosmetic(&self, id: AccountId, cosmetic: CosmeticId) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            ensure_account(&tx, id)?;
            ensure_cosmetic(&tx, cosmetic)?;
            tx.execute(
                "INSERT OR IGNORE INTO player_cosmetics (id_player, id_cosmetic) VALUES (?1, ?2)",
                params![id.0, cosmetic.0],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn remove_cosmetic(
        &self,
        id: AccountId,
        cosmetic: CosmeticId,
    ) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            ensure_account(&tx, id)?;
            tx.execute(
                "DELETE FROM player_cosmetics WHERE id_player = ?1 AND id_cosmetic = ?2",
                params![id.0, cosmetic.0],
            )?;
            tx.execute(
                "UPDATE game_setup SET skin_id = NULLIF(skin_id, ?2) WHERE player_id = ?1",
                params![id.0, cosmetic.0],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn add_friend(&self, id: AccountId, friend: AccountId) -> Result<(), StoreError> {
        if id == friend {
            return Err(StoreError::InvalidInput("cannot befriend yourself".into()));
        }
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            ensure_account(&tx, id)?;
            ensure_account(&tx, friend)?;
            tx.execute(
                "INSERT OR IGNORE INTO friends (id_player_a, id_player_b) VALUES (?1, ?2)",
                params![id.0, friend.0],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn remove_friend(&self, id: AccountId, friend: AccountId) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            conn.execute(
                "DELETE FROM friends WHERE id_player_a = ?1 AND id_player_b = ?2",
                params![id.0, friend.0],
            )?;
            Ok(())
        })
        .await
    }

    async fn equip_weapon(
        &self,
        id: AccountId,
        slot: HotbarSlot,
        weapon: WeaponId,
    ) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            ensure_account(&tx, id)?;
            ensure_weapon(&tx, weapon)?;
            let owned: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM player_weapons WHERE id_player = ?1 AND id_weapon = ?2)",
                params![id.0, weapon.0],
                |r| r.get(0),
            )?;
            if !owned {
                return Err(StoreError::NotOwned(format!("weapon {weapon}")));
            }
            ensure_loadout_row(&tx, id)?;
            tx.execute(
                &format!(
                    "UPDATE game_setup SET {} = ?1 WHERE player_id = ?2",
                    hotbar_column(slot)
                ),
                params![weapon.0, id.0],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await?;
        tracing::debug!(account_id = %id, %slot, %weapon, "weapon equipped");
        Ok(())
    }

    async fn equip_skin(&self, id: AccountId, cosmetic: CosmeticId) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            ensure_account(&tx, id)?;
            ensure_cosmetic(&tx, cosmetic)?;
            let owned: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM player_cosmetics WHERE id_player = ?1 AND id_cosmetic = ?2)",
                params![id.0, cosmetic.0],
                |r| r.get(0),
            )?;
            if !owned {
                return Err(StoreError::NotOwned(format!("cosmetic {cosmetic}")));
            }
            ensure_loadout_row(&tx, id)?;
            tx.execute(
                "UPDATE game_setup SET skin_id = ?1 WHERE player_id = ?2",
                params![cosmetic.0, id.0],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

const WEAPON_COLUMNS: &str =
    "id, name, price, damage, radius, cool_down, reach, velocity, motion_type, path, starter";

fn weapon_from_row(r: &Row<'_>) -> rusqlite::Result<Weapon> {
    Ok(Weapon {
        id: WeaponId(r.get(0)?),
        name: r.get(1)?,
        price: r.get(2)?,
        damage: r.get(3)?,
        radius: r.get(4)?,
        cool_down: r.get(5)?,
        reach: r.get(6)?,
        velocity: r.get(7)?,
        motion_type: r.get(8)?,
        path: r.get(9)?,
        starter: r.get(10)?,
    })
}

fn cosmetic_from_row(r: &Row<'_>) -> rusqlite::Result<Cosmetic> {
    Ok(Cosmetic {
        id: CosmeticId(r.get(0)?),
        name: r.get(1)?,
        price: r.get(2)?,
        path: r.get(3)?,
        starter: r.get(4)?,
    })
}

/// Usernames and emails travel as single protocol tokens.
fn validate_token(field: &str, value: &str) -> Result<(), StoreError> {
    if value.is_empty() {
        return Err(StoreError::InvalidInput(format!("empty {field}")));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(StoreError::InvalidInput(format!("{field} contains whitespace")));
    }
    Ok(())
}

fn account_not_found(id: AccountId) -> StoreError {
    StoreError::NotFound(format!("account {id}"))
}

fn hotbar_column(slot: HotbarSlot) -> &'static str {
    match slot.index() {
        0 => "id_weapon_1",
        1 => "id_weapon_2",
        _ => "id_weapon_3",
    }
}

fn exists(conn: &Connection, sql: &str, id: i64) -> Result<bool, StoreError> {
    Ok(conn.query_row(sql, [id], |r| r.get(0))?)
}

fn ensure_account(conn: &Connection, id: AccountId) -> Result<(), StoreError> {
    if exists(conn, "SELECT EXISTS(SELECT 1 FROM players WHERE id = ?1)", id.0)? {
        Ok(())
    } else {
        Err(account_not_found(id))
    }
}

fn ensure_weapon(conn: &Connection, id: WeaponId) -> Result<(), StoreError> {
    if exists(conn, "SELECT EXISTS(SELECT 1 FROM weapons WHERE id = ?1)", id.0)? {
        Ok(())
    } else {
        Err(StoreError::NotFound(format!("weapon {id}")))
    }
}

fn ensure_cosmetic(conn: &Connection, id: CosmeticId) -> Result<(), StoreError> {
    if exists(conn, "SELECT EXISTS(SELECT 1 FROM cosmetics WHERE id = ?1)", id.0)? {
        Ok(())
    } else {
        Err(StoreError::NotFound(format!("cosmetic {id}")))
    }
}

fn ensure_loadout_row(conn: &Connection, id: AccountId) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO game_setup (player_id) VALUES (?1) ON CONFLICT(player_id) DO NOTHING",
        [id.0],
    )?;
    Ok(())
}

/// Inserts the player row, the starter kit and the loadout row in one
/// transaction.
fn insert_account(
    conn: &mut Connection,
    username: &str,
    email: &str,
    phc: &str,
) -> Result<AccountId, StoreError> {
    let tx = conn.transaction()?;

    let taken = |column: &str, value: &str| -> Result<bool, StoreError> {
        Ok(tx.query_row(
            &format!("SELECT EXISTS(SELECT 1 FROM players WHERE {column} = ?1)"),
            [value],
            |r| r.get(0),
        )?)
    };
    if taken("username", username)? {
        return Err(StoreError::Duplicate("username".into()));
    }
    if taken("email", email)? {
        return Err(StoreError::Duplicate("email".into()));
    }

    tx.execute(
        "INSERT INTO players (username, email, password, balance) VALUES (?1, ?2, ?3, 0)",
        params![username, email, phc],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            StoreError::Duplicate("account".into())
        } else {
            StoreError::Database(e)
        }
    })?;
    let id = AccountId(tx.last_insert_rowid());

    tx.execute(
        "INSERT INTO player_weapons (id_player, id_weapon)
         SELECT ?1, id FROM weapons WHERE starter = 1 ORDER BY id",
        [id.0],
    )?;
    tx.execute(
        "INSERT INTO player_cosmetics (id_player, id_cosmetic)
         SELECT ?1, id FROM cosmetics WHERE starter = 1 ORDER BY id",
        [id.0],
    )?;
    tx.execute(
        "INSERT INTO game_setup (player_id, skin_id)
         VALUES (?1, (SELECT MIN(id) FROM cosmetics WHERE starter = 1))",
        [id.0],
    )?;

    tx.commit()?;
    Ok(id)
}

fn read_account(conn: &mut Connection, id: AccountId) -> Result<Account, StoreError> {
    let tx = conn.transaction()?;

    let (username, email, balance) = tx
        .query_row(
            "SELECT username, email, balance FROM players WHERE id = ?1",
            [id.0],
            |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?, r.get::<_, i64>(2)?)),
        )
        .optional()?
        .ok_or_else(|| account_not_found(id))?;

    let weapons = id_list(
        &tx,
        "SELECT id_weapon FROM player_weapons WHERE id_player = ?1 ORDER BY id",
        id,
    )?
    .into_iter()
    .map(WeaponId)
    .collect();
    let cosmetics = id_list(
        &tx,
        "SELECT id_cosmetic FROM player_cosmetics WHERE id_player = ?1 ORDER BY id",
        id,
    )?
    .into_iter()
    .map(CosmeticId)
    .collect();
    let friends = id_list(
        &tx,
        "SELECT id_player_b FROM friends WHERE id_player_a = ?1 ORDER BY id",
        id,
    )?
    .into_iter()
    .map(AccountId)
    .collect();

    let loadout = tx
        .query_row(
            "SELECT skin_id, id_weapon_1, id_weapon_2, id_weapon_3
             FROM game_setup WHERE player_id = ?1",
            [id.0],
            |r| {
                Ok(Loadout {
                    skin: r.get::<_, Option<i64>>(0)?.map(CosmeticId),
                    hotbar: [
                        r.get::<_, Option<i64>>(1)?.map(WeaponId),
                        r.get::<_, Option<i64>>(2)?.map(WeaponId),
                        r.get::<_, Option<i64>>(3)?.map(WeaponId),
                    ],
                })
            },
        )
        .optional()?
        .unwrap_or_default();

    tx.commit()?;
    Ok(Account {
        id,
        username,
        email,
        balance,
        weapons,
        cosmetics,
        friends,
        loadout,
    })
}

fn id_list(conn: &Connection, sql: &str, id: AccountId) -> Result<Vec<i64>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([id.0], |r| r.get(0))?;
    Ok(rows.collect::<Result<Vec<i64>, _>>()?)
}

fn update_unique(
    conn: &mut Connection,
    id: AccountId,
    column: &'static str,
    value: &str,
) -> Result<(), StoreError> {
    let changed = conn
        .execute(
            &format!("UPDATE players SET {column} = ?1 WHERE id = ?2"),
            params![value, id.0],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Duplicate(column.to_string())
            } else {
                StoreError::Database(e)
            }
        })?;
    if changed == 0 {
        return Err(account_not_found(id));
    }
    Ok(())
}
