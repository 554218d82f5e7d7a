use crate::error::Result;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing::debug;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS transactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id),
        type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
        category TEXT NOT NULL,
        amount TEXT NOT NULL,
        date TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT ''
    );
    CREATE TABLE IF NOT EXISTS budget (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id),
        category TEXT NOT NULL,
        amount TEXT NOT NULL,
        month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
        year INTEGER NOT NULL,
        UNIQUE (user_id, category, month, year)
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_user_date ON transactions (user_id, date);
";

/// Handle to the database file. Holds no open connection: every call to
/// [`Database::with_connection`] opens one, runs inside a SQL transaction,
/// commits on success and closes it again.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Self {
            path: path.as_ref().to_path_buf(),
        };
        db.with_connection(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })?;
        debug!(path = %db.path.display(), "database initialised");
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut conn = Connection::open(&self.path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let tx = conn.transaction()?;
        // an early return drops `tx`, which rolls back
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

#[cfg(test)]
pub fn establish_test_database() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db = Database::open(dir.path().join("test_finance.db")).expect("Failed to open test database");
    (dir, db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FinanceError;

    #[test]
    fn test_open_creates_schema() {
        let (_dir, db) = establish_test_database();
        let tables: Vec<String> = db
            .with_connection(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
                )?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<String>>>()?;
                Ok(names)
            })
            .unwrap();
        assert_eq!(tables, vec!["budget", "transactions", "users"]);
    }

    #[test]
    fn test_open_is_idempotent() {
        let (dir, _db) = establish_test_database();
        let reopened = Database::open(dir.path().join("test_finance.db"));
        assert!(reopened.is_ok());
    }

    #[test]
    fn test_error_rolls_back() {
        let (_dir, db) = establish_test_database();
        let result: Result<()> = db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO users (username, password_hash) VALUES ('alice', 'x')",
                [],
            )?;
            Err(FinanceError::validation("abort"))
        });
        assert!(result.is_err());

        let count: i64 = db
            .with_connection(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?)
            })
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let (_dir, db) = establish_test_database();
        let result = db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO transactions (user_id, type, category, amount, date) VALUES (42, 'income', 'Job', '1', '2024-01-01')",
                [],
            )?;
            Ok(())
        });
        assert!(matches!(result, Err(FinanceError::Storage(_))));
    }
}
