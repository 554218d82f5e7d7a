use crate::db::repository::decimal_column;
use crate::error::Result;
use crate::models::budget::Budget;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use tracing::debug;

/// Inserts the limit for `(user, category, month, year)` or replaces the
/// amount when that key already exists.
pub fn set_budget(
    conn: &Connection,
    user_id: i64,
    category: &str,
    amount: &Decimal,
    month: u32,
    year: i32,
) -> Result<()> {
    conn.execute(
        "INSERT INTO budget (user_id, category, amount, month, year) VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(user_id, category, month, year) DO UPDATE SET amount = excluded.amount",
        params![user_id, category, amount.to_string(), month, year],
    )?;
    debug!(user_id, category, month, year, "upserted budget");
    Ok(())
}

pub fn get_budgets_for_period(
    conn: &Connection,
    user_id: i64,
    month: u32,
    year: i32,
) -> Result<Vec<Budget>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, category, amount, month, year FROM budget
         WHERE user_id = ?1 AND month = ?2 AND year = ?3
         ORDER BY category ASC",
    )?;

    let iter = stmt.query_map(params![user_id, month, year], |row| {
        Ok(Budget {
            id: row.get(0)?,
            user_id: row.get(1)?,
            category: row.get(2)?,
            amount: decimal_column(row, 3)?,
            month: row.get(4)?,
            year: row.get(5)?,
        })
    })?;

    let mut budgets = Vec::new();
    for budget in iter {
        budgets.push(budget?);
    }
    Ok(budgets)
}
