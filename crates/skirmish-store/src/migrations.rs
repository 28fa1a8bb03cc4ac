use rusqlite_migration::{M, Migrations};

/// All schema migrations, tracked through SQLite's `user_version` pragma.
pub fn migrations() -> Migrations<'static> {
    Migrations::new(vec![
        M::up(
            "-- Migration 1: accounts, catalog, ownership, loadout

CREATE TABLE players (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    balance INTEGER NOT NULL DEFAULT 0
) STRICT;

CREATE TABLE weapons (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    price INTEGER NOT NULL DEFAULT 0,
    damage INTEGER NOT NULL DEFAULT 0,
    radius INTEGER NOT NULL DEFAULT 0,
    cool_down INTEGER NOT NULL DEFAULT 0,
    reach INTEGER NOT NULL DEFAULT 0,
    velocity INTEGER NOT NULL DEFAULT 0,
    motion_type TEXT NOT NULL DEFAULT '',
    path TEXT NOT NULL DEFAULT '',
    starter INTEGER NOT NULL DEFAULT 0
) STRICT;

CREATE TABLE cosmetics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    price INTEGER NOT NULL DEFAULT 0,
    path TEXT NOT NULL DEFAULT '',
    starter INTEGER NOT NULL DEFAULT 0
) STRICT;

CREATE TABLE game_setup (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    player_id INTEGER NOT NULL UNIQUE REFERENCES players(id),
    skin_id INTEGER REFERENCES cosmetics(id),
    id_weapon_1 INTEGER REFERENCES weapons(id),
    id_weapon_2 INTEGER REFERENCES weapons(id),
    id_weapon_3 INTEGER REFERENCES weapons(id)
) STRICT;

CREATE TABLE player_weapons (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    id_player INTEGER NOT NULL REFERENCES players(id),
    id_weapon INTEGER NOT NULL REFERENCES weapons(id),
    UNIQUE (id_player, id_weapon)
) STRICT;

CREATE TABLE player_cosmetics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    id_player INTEGER NOT NULL REFERENCES players(id),
    id_cosmetic INTEGER NOT NULL REFERENCES cosmetics(id),
    UNIQUE (id_player, id_cosmetic)
) STRICT;

CREATE TABLE friends (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    id_player_a INTEGER NOT NULL REFERENCES players(id),
    id_player_b INTEGER NOT NULL REFERENCES players(id),
    UNIQUE (id_player_a, id_player_b)
) STRICT;

CREATE INDEX idx_player_weapons_player ON player_weapons(id_player);
CREATE INDEX idx_player_cosmetics_player ON player_cosmetics(id_player);
CREATE INDEX idx_friends_a ON friends(id_player_a);
",
        ),
        M::up(
            "-- Migration 2: starter kit granted on registration

INSERT INTO weapons (name, price, damage, radius, cool_down, reach, velocity, motion_type, path, starter)
VALUES
    ('Fists', 0, 5, 0, 300, 1, 0, 'melee', 'assets/weapons/fists.png', 1),
    ('Sword', 0, 12, 0, 600, 2, 0, 'swing', 'assets/weapons/sword.png', 1),
    ('Bow', 0, 8, 0, 900, 12, 14, 'projectile', 'assets/weapons/bow.png', 1);

INSERT INTO cosmetics (name, price, path, starter)
VALUES ('Default', 0, 'assets/skins/default.png', 1);
",
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_valid() {
        assert!(migrations().validate().is_ok());
    }

    #[test]
    fn test_migrations_seed_starter_kit() {
        let mut conn = rusqlite::Connection::open_in_memory().unwrap();
        migrations().to_latest(&mut conn).unwrap();

        let weapons: i64 = conn
            .query_row("SELECT COUNT(*) FROM weapons WHERE starter = 1", [], |r| r.get(0))
            .unwrap();
        let cosmetics: i64 = conn
            .query_row("SELECT COUNT(*) FROM cosmetics WHERE starter = 1", [], |r| r.get(0))
            .unwrap();
        assert_eq!(weapons, 3);
        assert_eq!(cosmetics, 1);
    }
}
