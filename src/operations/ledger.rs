use crate::db::connection::Database;
use crate::db::repository;
use crate::error::{FinanceError, Result};
use crate::models::period::{DateRange, today};
use crate::models::transaction::{NewTransaction, Transaction, TransactionType};
use crate::operations::report::ReportGenerator;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::info;

const MAX_CATEGORY_LEN: usize = 50;
const MAX_DESCRIPTION_LEN: usize = 255;
/// Upper bound on a single amount.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Income and expense entries of a single user.
pub struct TransactionLedger<'a> {
    db: &'a Database,
    user_id: i64,
}

impl<'a> TransactionLedger<'a> {
    pub fn new(db: &'a Database, user_id: i64) -> Self {
        Self { db, user_id }
    }

    /// Records an entry dated today.
    pub fn add(
        &self,
        kind: &str,
        category: &str,
        amount: Decimal,
        description: &str,
    ) -> Result<Transaction> {
        self.add_on(today(), kind, category, amount, description)
    }

    pub fn add_on(
        &self,
        date: NaiveDate,
        kind: &str,
        category: &str,
        amount: Decimal,
        description: &str,
    ) -> Result<Transaction> {
        let new = validate_transaction(self.user_id, date, kind, category, amount, description)?;
        let id = self
            .db
            .with_connection(|conn| repository::add_transaction(conn, &new))?;
        info!(id, user_id = self.user_id, kind = new.transaction_type.as_str(), "transaction added");

        Ok(Transaction {
            id,
            user_id: new.user_id,
            transaction_type: new.transaction_type,
            category: new.category,
            amount: new.amount,
            date: new.date,
            description: new.description,
        })
    }

    pub fn list(&self, range: Option<DateRange>) -> Result<Vec<Transaction>> {
        self.db
            .with_connection(|conn| repository::get_transactions(conn, self.user_id, range.as_ref()))
    }

    /// Returns `false` when no row with that id belongs to this user.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let removed = self
            .db
            .with_connection(|conn| repository::remove_transaction(conn, self.user_id, id))?;
        if removed > 0 {
            info!(id, user_id = self.user_id, "transaction deleted");
        }
        Ok(removed > 0)
    }

    /// Same value as [`ReportGenerator::total`].
    pub fn balance(&self) -> Result<Decimal> {
        ReportGenerator::new(self.db, self.user_id).total()
    }
}

fn validate_transaction(
    user_id: i64,
    date: NaiveDate,
    kind: &str,
    category: &str,
    amount: Decimal,
    description: &str,
) -> Result<NewTransaction> {
    let transaction_type = TransactionType::from_str(kind)?;

    if amount <= Decimal::ZERO {
        return Err(FinanceError::validation("Amount must be positive"));
    }
    if amount > MAX_AMOUNT {
        return Err(FinanceError::validation(format!(
            "Amount cannot exceed {}",
            MAX_AMOUNT
        )));
    }

    let category = category.trim();
    if category.is_empty() {
        return Err(FinanceError::validation("Category cannot be empty"));
    }
    if category.chars().count() > MAX_CATEGORY_LEN {
        return Err(FinanceError::validation("Category too long"));
    }

    let description = description.trim();
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(FinanceError::validation("Description too long"));
    }

    Ok(NewTransaction {
        user_id,
        transaction_type,
        category: category.to_string(),
        amount,
        date,
        description: description.to_string(),
    })
}
