use crate::db::budget_repository;
use crate::db::connection::Database;
use crate::db::repository;
use crate::error::{FinanceError, Result};
use crate::models::budget::{BudgetLine, BudgetOverview, BudgetStatus};
use crate::models::period::{DateRange, current_period, validate_month};
use crate::operations::ledger::MAX_AMOUNT;
use rust_decimal::Decimal;
use tracing::info;

/// Monthly spending limits of a single user.
pub struct BudgetTracker<'a> {
    db: &'a Database,
    user_id: i64,
}

impl<'a> BudgetTracker<'a> {
    pub fn new(db: &'a Database, user_id: i64) -> Self {
        Self { db, user_id }
    }

    /// Missing month/year default to the current calendar month.
    pub fn set(
        &self,
        category: &str,
        amount: Decimal,
        month: Option<u32>,
        year: Option<i32>,
    ) -> Result<()> {
        let category = category.trim();
        if category.is_empty() {
            return Err(FinanceError::validation("Category cannot be empty"));
        }
        if amount <= Decimal::ZERO {
            return Err(FinanceError::validation("Budget amount must be positive"));
        }
        if amount > MAX_AMOUNT {
            return Err(FinanceError::validation(format!(
                "Budget amount cannot exceed {}",
                MAX_AMOUNT
            )));
        }
        let (month, year) = current_period(month, year);
        validate_month(month)?;

        self.db.with_connection(|conn| {
            budget_repository::set_budget(conn, self.user_id, category, &amount, month, year)
        })?;
        info!(user_id = self.user_id, category, month, year, "budget set");
        Ok(())
    }

    pub fn status(&self, month: Option<u32>, year: Option<i32>) -> Result<BudgetOverview> {
        let (month, year) = current_period(month, year);
        let window = DateRange::month(year, month)?;

        let lines = self.db.with_connection(|conn| {
            let budgets = budget_repository::get_budgets_for_period(conn, self.user_id, month, year)?;
            let mut lines = Vec::with_capacity(budgets.len());
            for budget in budgets {
                let spent = repository::get_category_expense_total(
                    conn,
                    self.user_id,
                    &budget.category,
                    &window,
                )?;
                lines.push(BudgetLine {
                    status: BudgetStatus::classify(budget.amount, spent),
                    category: budget.category,
                    limit: budget.amount,
                    spent,
                });
            }
            Ok(lines)
        })?;

        Ok(BudgetOverview { month, year, lines })
    }
}
