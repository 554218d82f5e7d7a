use crate::db::connection::Database;
use crate::db::repository;
use crate::error::Result;
use std::fs::File;
use std::path::Path;
use tracing::info;

const HEADER: [&str; 5] = ["Type", "Category", "Amount", "Date", "Description"];

/// Writes every transaction of the user to a CSV file, header first.
/// Returns the number of data rows written.
pub fn export_transactions_to_csv(db: &Database, user_id: i64, path: &Path) -> Result<usize> {
    let transactions =
        db.with_connection(|conn| repository::get_transactions(conn, user_id, None))?;

    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(HEADER)?;
    for transaction in &transactions {
        let amount = transaction.amount.to_string();
        let date = transaction.date.to_string();
        writer.write_record([
            transaction.transaction_type.as_str(),
            transaction.category.as_str(),
            amount.as_str(),
            date.as_str(),
            transaction.description.as_str(),
        ])?;
    }
    writer.flush()?;

    info!(user_id, rows = transactions.len(), path = %path.display(), "exported transactions");
    Ok(transactions.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::establish_test_database;
    use crate::operations::auth::{Password, register};
    use crate::operations::ledger::TransactionLedger;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    #[test]
    fn test_export_writes_header_and_rows() {
        let (dir, db) = establish_test_database();
        let user = register(&db, "alice", &Password::new("pw")).unwrap();
        let ledger = TransactionLedger::new(&db, user.id);
        let march = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        ledger.add_on(march, "income", "salary", Decimal::new(150000, 2), "March pay").unwrap();
        ledger.add_on(march, "expense", "food", Decimal::new(350, 2), "coffee, large").unwrap();

        let path = dir.path().join("out.csv");
        let rows = export_transactions_to_csv(&db, user.id, &path).unwrap();
        assert_eq!(rows, 2);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "Type,Category,Amount,Date,Description");
        assert_eq!(lines[1], "income,salary,1500.00,2024-03-05,March pay");
        assert_eq!(lines[2], "expense,food,3.50,2024-03-05,\"coffee, large\"");
    }

    #[test]
    fn test_export_only_current_user() {
        let (dir, db) = establish_test_database();
        let alice = register(&db, "alice", &Password::new("pw")).unwrap();
        let bob = register(&db, "bob", &Password::new("pw")).unwrap();
        TransactionLedger::new(&db, bob.id).add("income", "job", Decimal::ONE, "").unwrap();

        let path = dir.path().join("alice.csv");
        assert_eq!(export_transactions_to_csv(&db, alice.id, &path).unwrap(), 0);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }

    #[test]
    fn test_export_to_missing_directory_fails() {
        let (dir, db) = establish_test_database();
        let user = register(&db, "alice", &Password::new("pw")).unwrap();
        let path = dir.path().join("missing").join("out.csv");
        assert!(export_transactions_to_csv(&db, user.id, &path).is_err());
    }
}
