use crate::db::connection::Database;
use crate::db::repository;
use crate::error::Result;
use crate::models::period::{DateRange, current_period};
use crate::models::report::{
    CategoryBreakdown, MonthTotals, PeriodSummary, YearlyReport, checked_add,
};
use crate::models::transaction::{Transaction, TransactionType};
use chrono::Datelike;
use rust_decimal::Decimal;

/// Read-only aggregates over one user's ledger.
pub struct ReportGenerator<'a> {
    db: &'a Database,
    user_id: i64,
}

impl<'a> ReportGenerator<'a> {
    pub fn new(db: &'a Database, user_id: i64) -> Self {
        Self { db, user_id }
    }

    pub fn monthly(&self, month: u32, year: i32) -> Result<PeriodSummary> {
        let window = DateRange::month(year, month)?;
        let transactions = self.load(Some(&window))?;
        summarize(&transactions)
    }

    pub fn yearly(&self, year: i32) -> Result<YearlyReport> {
        let window = DateRange::year(year)?;
        let transactions = self.load(Some(&window))?;

        let mut months: Vec<MonthTotals> = (1..=12)
            .map(|month| MonthTotals {
                month,
                income: Decimal::ZERO,
                expenses: Decimal::ZERO,
            })
            .collect();
        for transaction in &transactions {
            let slot = &mut months[transaction.date.month0() as usize];
            match transaction.transaction_type {
                TransactionType::Income => {
                    slot.income = checked_add(slot.income, transaction.amount)?
                }
                TransactionType::Expense => {
                    slot.expenses = checked_add(slot.expenses, transaction.amount)?
                }
            }
        }

        Ok(YearlyReport {
            year,
            summary: summarize(&transactions)?,
            months,
        })
    }

    /// `month` without `year` means that month of the current year; neither
    /// means all time.
    pub fn category_breakdown(
        &self,
        month: Option<u32>,
        year: Option<i32>,
    ) -> Result<CategoryBreakdown> {
        let window = match (month, year) {
            (Some(_), _) => {
                let (month, year) = current_period(month, year);
                Some(DateRange::month(year, month)?)
            }
            (None, Some(year)) => Some(DateRange::year(year)?),
            (None, None) => None,
        };
        let transactions = self.load(window.as_ref())?;

        let mut breakdown = CategoryBreakdown::default();
        for transaction in &transactions {
            let totals = match transaction.transaction_type {
                TransactionType::Income => &mut breakdown.income,
                TransactionType::Expense => &mut breakdown.expenses,
            };
            let total = totals
                .entry(transaction.category.clone())
                .or_insert(Decimal::ZERO);
            *total = checked_add(*total, transaction.amount)?;
        }
        Ok(breakdown)
    }

    /// All-time net balance.
    pub fn total(&self) -> Result<Decimal> {
        self.load(None)?
            .iter()
            .try_fold(Decimal::ZERO, |total, t| checked_add(total, t.signed_amount()))
    }

    fn load(&self, window: Option<&DateRange>) -> Result<Vec<Transaction>> {
        self.db
            .with_connection(|conn| repository::get_transactions(conn, self.user_id, window))
    }
}

fn summarize(transactions: &[Transaction]) -> Result<PeriodSummary> {
    let (income, expenses) = transactions.iter().try_fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(income, expenses), t| -> Result<(Decimal, Decimal)> {
            match t.transaction_type {
                TransactionType::Income => Ok((checked_add(income, t.amount)?, expenses)),
                TransactionType::Expense => Ok((income, checked_add(expenses, t.amount)?)),
            }
        },
    )?;
    PeriodSummary::from_totals(income, expenses)
}
