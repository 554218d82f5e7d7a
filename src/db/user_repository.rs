use crate::error::Result;
use crate::models::user::User;
use rusqlite::{Connection, OptionalExtension};

pub fn user_exists(conn: &Connection, username: &str) -> Result<bool> {
    let found = conn
        .query_row("SELECT 1 FROM users WHERE username = ?1", [username], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

pub fn add_user(conn: &Connection, username: &str, password_hash: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
        [username, password_hash],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_user_by_name(conn: &Connection, username: &str) -> Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, username, password_hash FROM users WHERE username = ?1",
            [username],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    password_hash: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::establish_test_database;
    use crate::error::FinanceError;

    #[test]
    fn test_add_user_and_lookup() {
        let (_dir, db) = establish_test_database();
        let user = db
            .with_connection(|conn| {
                let id = add_user(conn, "alice", "hash")?;
                assert!(id > 0);
                get_user_by_name(conn, "alice")
            })
            .unwrap()
            .unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.password_hash, "hash");
    }

    #[test]
    fn test_user_exists() {
        let (_dir, db) = establish_test_database();
        db.with_connection(|conn| add_user(conn, "alice", "hash")).unwrap();

        assert!(db.with_connection(|conn| user_exists(conn, "alice")).unwrap());
        assert!(!db.with_connection(|conn| user_exists(conn, "bob")).unwrap());
    }

    #[test]
    fn test_duplicate_username_is_storage_error() {
        let (_dir, db) = establish_test_database();
        db.with_connection(|conn| add_user(conn, "alice", "hash")).unwrap();

        let result = db.with_connection(|conn| add_user(conn, "alice", "other"));
        match result {
            Err(FinanceError::Storage(e)) => assert!(e.to_string().contains("UNIQUE constraint failed")),
            other => panic!("expected storage error, got {:?}", other),
        }
    }

    #[test]
    fn test_get_missing_user() {
        let (_dir, db) = establish_test_database();
        let user = db.with_connection(|conn| get_user_by_name(conn, "ghost")).unwrap();
        assert!(user.is_none());
    }
}
