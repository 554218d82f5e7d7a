use crate::error::{FinanceError, Result};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

fn out_of_range() -> FinanceError {
    FinanceError::validation("Totals out of range")
}

pub fn checked_add(total: Decimal, amount: Decimal) -> Result<Decimal> {
    total.checked_add(amount).ok_or_else(out_of_range)
}

pub fn checked_sub(total: Decimal, amount: Decimal) -> Result<Decimal> {
    total.checked_sub(amount).ok_or_else(out_of_range)
}

/// Totals for one reporting window. `expenses` is a positive magnitude.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodSummary {
    pub income: Decimal,
    pub expenses: Decimal,
    pub balance: Decimal,
    pub savings_rate: Decimal,
}

impl PeriodSummary {
    pub fn from_totals(income: Decimal, expenses: Decimal) -> Result<Self> {
        let balance = checked_sub(income, expenses)?;
        let savings_rate = if income.is_zero() {
            Decimal::ZERO
        } else {
            balance
                .checked_div(income)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                .ok_or_else(out_of_range)?
                .round_dp(2)
        };
        Ok(Self {
            income,
            expenses,
            balance,
            savings_rate,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthTotals {
    pub month: u32,
    pub income: Decimal,
    pub expenses: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct YearlyReport {
    pub year: i32,
    pub summary: PeriodSummary,
    /// January through December, zero-filled.
    pub months: Vec<MonthTotals>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryBreakdown {
    pub income: BTreeMap<String, Decimal>,
    pub expenses: BTreeMap<String, Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_savings_rate() {
        let summary = PeriodSummary::from_totals(Decimal::from(500), Decimal::from(200)).unwrap();
        assert_eq!(summary.balance, Decimal::from(300));
        assert_eq!(summary.savings_rate, Decimal::from(60));
    }

    #[test]
    fn test_summary_zero_income() {
        let summary = PeriodSummary::from_totals(Decimal::ZERO, Decimal::from(40)).unwrap();
        assert_eq!(summary.balance, Decimal::from(-40));
        assert_eq!(summary.savings_rate, Decimal::ZERO);
    }

    #[test]
    fn test_summary_tiny_income_is_out_of_range() {
        let err = PeriodSummary::from_totals(Decimal::new(1, 28), Decimal::from(1000)).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Totals out of range");
    }

    #[test]
    fn test_checked_add_overflow_is_an_error() {
        assert!(checked_add(Decimal::MAX, Decimal::ONE).unwrap_err().is_validation());
        assert!(checked_sub(Decimal::MIN, Decimal::ONE).unwrap_err().is_validation());
        assert_eq!(checked_add(Decimal::ONE, Decimal::TWO).unwrap(), Decimal::from(3));
    }
}
