use crate::db::connection::Database;
use crate::error::{FinanceError, Result};
use std::fs;
use std::path::Path;
use tracing::info;

/// Copies the whole database file to `target`.
pub fn backup_database(db: &Database, target: &Path) -> Result<u64> {
    if same_file(db.path(), target) {
        return Err(FinanceError::validation(
            "Backup path must differ from the database file",
        ));
    }
    let bytes = fs::copy(db.path(), target)?;
    info!(source = %db.path().display(), target = %target.display(), bytes, "backup created");
    Ok(bytes)
}

/// Replaces the database file with the contents of `source`.
pub fn restore_database(db: &Database, source: &Path) -> Result<u64> {
    if !source.is_file() {
        return Err(FinanceError::NotFound(format!(
            "Backup file '{}'",
            source.display()
        )));
    }
    if same_file(db.path(), source) {
        return Err(FinanceError::validation(
            "Restore path must differ from the database file",
        ));
    }
    let bytes = fs::copy(source, db.path())?;
    info!(source = %source.display(), target = %db.path().display(), bytes, "database restored");
    Ok(bytes)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
