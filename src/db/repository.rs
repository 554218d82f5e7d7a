use crate::error::Result;
use crate::models::period::DateRange;
use crate::models::report::checked_add;
use crate::models::transaction::{NewTransaction, Transaction, TransactionType};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, Row, params};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;

const SELECT_TRANSACTIONS: &str =
    "SELECT id, user_id, type, category, amount, date, description FROM transactions";

pub fn add_transaction(conn: &Connection, transaction: &NewTransaction) -> Result<i64> {
    conn.execute(
        "INSERT INTO transactions (user_id, type, category, amount, date, description) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            transaction.user_id,
            transaction.transaction_type.as_str(),
            &transaction.category,
            transaction.amount.to_string(),
            transaction.date.to_string(),
            &transaction.description,
        ],
    )?;
    let id = conn.last_insert_rowid();
    debug!(id, user_id = transaction.user_id, "inserted transaction");
    Ok(id)
}

/// Transactions of one user in insertion order, optionally limited to an
/// inclusive date range.
pub fn get_transactions(
    conn: &Connection,
    user_id: i64,
    range: Option<&DateRange>,
) -> Result<Vec<Transaction>> {
    let transactions = match range {
        Some(range) => {
            let mut stmt = conn.prepare(&format!(
                "{} WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3 ORDER BY id ASC",
                SELECT_TRANSACTIONS
            ))?;
            let rows = stmt.query_map(
                params![user_id, range.start.to_string(), range.end.to_string()],
                row_to_transaction,
            )?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "{} WHERE user_id = ?1 ORDER BY id ASC",
                SELECT_TRANSACTIONS
            ))?;
            let rows = stmt.query_map([user_id], row_to_transaction)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        }
    };
    debug!(user_id, count = transactions.len(), "loaded transactions");
    Ok(transactions)
}

/// Deletes a row only when it belongs to `user_id`. Returns the number of
/// rows removed (0 or 1).
pub fn remove_transaction(conn: &Connection, user_id: i64, id: i64) -> Result<usize> {
    let rows_affected = conn.execute(
        "DELETE FROM transactions WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    debug!(id, user_id, rows_affected, "delete transaction");
    Ok(rows_affected)
}

/// Sum of expense magnitudes in one category within the range.
pub fn get_category_expense_total(
    conn: &Connection,
    user_id: i64,
    category: &str,
    range: &DateRange,
) -> Result<Decimal> {
    let mut stmt = conn.prepare(
        "SELECT amount FROM transactions
         WHERE user_id = ?1 AND type = 'expense' AND category = ?2 AND date BETWEEN ?3 AND ?4",
    )?;
    let amounts = stmt.query_map(
        params![user_id, category, range.start.to_string(), range.end.to_string()],
        |row| decimal_column(row, 0),
    )?;

    let mut total = Decimal::ZERO;
    for amount in amounts {
        total = checked_add(total, amount?)?;
    }
    Ok(total)
}

fn row_to_transaction(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    let type_str: String = row.get(2)?;
    let transaction_type = TransactionType::from_str(&type_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
    let date_str: String = row.get(5)?;
    let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        transaction_type,
        category: row.get(3)?,
        amount: decimal_column(row, 4)?,
        date,
        description: row.get(6)?,
    })
}

/// Amounts are stored as decimal text.
pub(crate) fn decimal_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let amount_str: String = row.get(idx)?;
    Decimal::from_str(&amount_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::establish_test_database;
    use crate::db::user_repository::add_user;

    fn new_tx(user_id: i64, kind: TransactionType, category: &str, amount: i64, date: NaiveDate) -> NewTransaction {
        NewTransaction {
            user_id,
            transaction_type: kind,
            category: category.to_string(),
            amount: Decimal::from(amount),
            date,
            description: "Test Transaction".to_string(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_add_transaction_and_read_back() {
        let (_dir, db) = establish_test_database();
        let all = db
            .with_connection(|conn| {
                let user_id = add_user(conn, "alice", "hash")?;
                add_transaction(conn, &new_tx(user_id, TransactionType::Expense, "Food", 12, date(2025, 1, 15)))?;
                get_transactions(conn, user_id, None)
            })
            .unwrap();

        assert_eq!(all.len(), 1);
        assert_eq!(all[0].category, "Food");
        assert_eq!(all[0].amount, Decimal::from(12));
        assert_eq!(all[0].transaction_type, TransactionType::Expense);
        assert_eq!(all[0].date, date(2025, 1, 15));
    }

    #[test]
    fn test_get_transactions_in_insertion_order() {
        let (_dir, db) = establish_test_database();
        let all = db
            .with_connection(|conn| {
                let user_id = add_user(conn, "alice", "hash")?;
                add_transaction(conn, &new_tx(user_id, TransactionType::Income, "Job", 10, date(2025, 3, 1)))?;
                add_transaction(conn, &new_tx(user_id, TransactionType::Expense, "Food", 5, date(2025, 1, 1)))?;
                get_transactions(conn, user_id, None)
            })
            .unwrap();

        assert_eq!(all[0].category, "Job");
        assert_eq!(all[1].category, "Food");
        assert!(all[0].id < all[1].id);
    }

    #[test]
    fn test_get_transactions_range_is_inclusive() {
        let (_dir, db) = establish_test_database();
        let found = db
            .with_connection(|conn| {
                let user_id = add_user(conn, "alice", "hash")?;
                for day in [1, 10, 20, 21] {
                    add_transaction(conn, &new_tx(user_id, TransactionType::Expense, "Food", 1, date(2025, 2, day)))?;
                }
                let range = DateRange::new(date(2025, 2, 10), date(2025, 2, 20))?;
                get_transactions(conn, user_id, Some(&range))
            })
            .unwrap();

        let days: Vec<NaiveDate> = found.iter().map(|t| t.date).collect();
        assert_eq!(days, vec![date(2025, 2, 10), date(2025, 2, 20)]);
    }

    #[test]
    fn test_remove_transaction_checks_owner() {
        let (_dir, db) = establish_test_database();
        let (alice, bob, id) = db
            .with_connection(|conn| {
                let alice = add_user(conn, "alice", "hash")?;
                let bob = add_user(conn, "bob", "hash")?;
                let id = add_transaction(conn, &new_tx(alice, TransactionType::Income, "Job", 10, date(2025, 1, 1)))?;
                Ok((alice, bob, id))
            })
            .unwrap();

        assert_eq!(db.with_connection(|conn| remove_transaction(conn, bob, id)).unwrap(), 0);
        assert_eq!(db.with_connection(|conn| remove_transaction(conn, alice, id)).unwrap(), 1);
        assert_eq!(db.with_connection(|conn| remove_transaction(conn, alice, id)).unwrap(), 0);
    }

    #[test]
    fn test_category_expense_total_ignores_income_and_other_months() {
        let (_dir, db) = establish_test_database();
        let total = db
            .with_connection(|conn| {
                let user_id = add_user(conn, "alice", "hash")?;
                add_transaction(conn, &new_tx(user_id, TransactionType::Expense, "Food", 30, date(2024, 6, 1)))?;
                add_transaction(conn, &new_tx(user_id, TransactionType::Expense, "Food", 45, date(2024, 6, 30)))?;
                add_transaction(conn, &new_tx(user_id, TransactionType::Income, "Food", 100, date(2024, 6, 15)))?;
                add_transaction(conn, &new_tx(user_id, TransactionType::Expense, "Food", 7, date(2024, 7, 1)))?;
                add_transaction(conn, &new_tx(user_id, TransactionType::Expense, "Rent", 500, date(2024, 6, 2)))?;
                get_category_expense_total(conn, user_id, "Food", &DateRange::month(2024, 6)?)
            })
            .unwrap();

        assert_eq!(total, Decimal::from(75));
    }

    #[test]
    fn test_corrupt_amount_is_reported() {
        let (_dir, db) = establish_test_database();
        let result = db.with_connection(|conn| {
            let user_id = add_user(conn, "alice", "hash")?;
            conn.execute(
                "INSERT INTO transactions (user_id, type, category, amount, date) VALUES (?1, 'income', 'Job', 'lots', '2024-01-01')",
                [user_id],
            )?;
            get_transactions(conn, user_id, None)
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_category_expense_total_overflow_is_an_error() {
        let (_dir, db) = establish_test_database();
        let result = db.with_connection(|conn| {
            let user_id = add_user(conn, "alice", "hash")?;
            for _ in 0..2 {
                let mut tx = new_tx(user_id, TransactionType::Expense, "Food", 1, date(2024, 6, 1));
                tx.amount = Decimal::MAX;
                add_transaction(conn, &tx)?;
            }
            get_category_expense_total(conn, user_id, "Food", &DateRange::month(2024, 6)?)
        });
        assert!(result.unwrap_err().is_validation());
    }
}
