use crate::error::FinanceError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = FinanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            _ => Err(FinanceError::validation(
                "Invalid transaction type. Use 'income' or 'expense'.",
            )),
        }
    }
}

/// One ledger entry. `amount` is always a positive magnitude; the sign
/// comes from `transaction_type`.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub transaction_type: TransactionType,
    pub category: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: String,
}

impl Transaction {
    pub fn signed_amount(&self) -> Decimal {
        match self.transaction_type {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }

    pub fn is_income(&self) -> bool {
        self.transaction_type == TransactionType::Income
    }
}

/// Validated input for a ledger insert.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: i64,
    pub transaction_type: TransactionType,
    pub category: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: String,
}
