//! Error types for the store layer.

/// Errors returned by [`AccountStore`](crate::AccountStore) operations.
///
/// `Duplicate`, `NotFound`, `NotOwned` and `InvalidInput` are expected
/// outcomes that callers report to the player. The rest are
/// infrastructure failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique field (username or email) is already taken.
    #[error("{0} already taken")]
    Duplicate(String),

    /// The referenced account, weapon or cosmetic does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The account does not own the item it tried to equip.
    #[error("{0} is not owned")]
    NotOwned(String),

    /// The input was rejected before reaching the database.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Hashing a password failed.
    #[error("password hashing failed: {0}")]
    Hash(String),

    /// An SQLite error.
    #[error(transparent)]
    Database(#[from] rusqlite::Error),

    /// Applying schema migrations failed.
    #[error(transparent)]
    Migration(#[from] rusqlite_migration::Error),

    /// The connection mutex was poisoned by a panicking writer.
    #[error("database lock poisoned")]
    Poisoned,

    /// The blocking task running the query panicked or was cancelled.
    #[error("database task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl StoreError {
    /// Returns `true` for outcomes the player caused, as opposed to
    /// infrastructure faults.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            StoreError::Duplicate(_)
                | StoreError::NotFound(_)
                | StoreError::NotOwned(_)
                | StoreError::InvalidInput(_)
        )
    }
}

/// Returns `true` if `err` is a UNIQUE constraint violation.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_are_classified() {
        assert!(StoreError::Duplicate("email".into()).is_rejection());
        assert!(StoreError::NotOwned("weapon W-1".into()).is_rejection());
        assert!(!StoreError::Poisoned.is_rejection());
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            StoreError::Duplicate("username".into()).to_string(),
            "username already taken"
        );
        assert_eq!(
            StoreError::NotOwned("weapon W-4".into()).to_string(),
            "weapon W-4 is not owned"
        );
    }

    #[test]
    fn test_unique_violation_detection() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v TEXT UNIQUE); INSERT INTO t VALUES ('a');")
            .unwrap();
        let err = conn.execute("INSERT INTO t VALUES ('a')", []).unwrap_err();
        assert!(is_unique_violation(&err));

        let other = conn.execute("INSERT INTO missing VALUES (1)", []).unwrap_err();
        assert!(!is_unique_violation(&other));
    }
}
