use crate::error::{FinanceError, Result};
use chrono::{Datelike, Local, NaiveDate};

/// Inclusive calendar date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(FinanceError::validation(
                "Start date must be before end date.",
            ));
        }
        Ok(Self { start, end })
    }

    /// First to last real day of the month.
    pub fn month(year: i32, month: u32) -> Result<Self> {
        validate_month(month)?;
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| FinanceError::validation(format!("Invalid year {}", year)))?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(|| FinanceError::validation(format!("Invalid year {}", year)))?;
        let end = next
            .pred_opt()
            .ok_or_else(|| FinanceError::validation(format!("Invalid year {}", year)))?;
        Ok(Self { start, end })
    }

    pub fn year(year: i32) -> Result<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| FinanceError::validation(format!("Invalid year {}", year)))?;
        let end = NaiveDate::from_ymd_opt(year, 12, 31)
            .ok_or_else(|| FinanceError::validation(format!("Invalid year {}", year)))?;
        Ok(Self { start, end })
    }
}

pub fn validate_month(month: u32) -> Result<()> {
    if !(1..=12).contains(&month) {
        return Err(FinanceError::validation(format!(
            "Invalid month {}. Must be between 1 and 12",
            month
        )));
    }
    Ok(())
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Fills a missing month/year from the current calendar date.
pub fn current_period(month: Option<u32>, year: Option<i32>) -> (u32, i32) {
    let now = today();
    (month.unwrap_or(now.month()), year.unwrap_or(now.year()))
}

/// Parses `YYYY-MM-DD..YYYY-MM-DD` (also accepts a single space-separated pair).
pub fn parse_date_range(input: &str) -> Result<DateRange> {
    let s = input.trim();
    let (from, to) = s
        .split_once("..")
        .or_else(|| s.split_once(' '))
        .ok_or_else(|| {
            FinanceError::validation("Invalid range. Use YYYY-MM-DD..YYYY-MM-DD")
        })?;
    DateRange::new(parse_iso_date(from)?, parse_iso_date(to)?)
}

pub fn parse_iso_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| FinanceError::validation("Invalid date format. Please use YYYY-MM-DD."))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_uses_real_month_end() {
        assert_eq!(DateRange::month(2024, 2).unwrap().end, date(2024, 2, 29));
        assert_eq!(DateRange::month(2023, 2).unwrap().end, date(2023, 2, 28));
        assert_eq!(DateRange::month(2024, 4).unwrap().end, date(2024, 4, 30));
        assert_eq!(DateRange::month(2024, 12).unwrap().end, date(2024, 12, 31));
    }

    #[test]
    fn test_month_rejects_out_of_range() {
        assert!(DateRange::month(2024, 0).unwrap_err().is_validation());
        assert!(DateRange::month(2024, 13).unwrap_err().is_validation());
    }

    #[test]
    fn test_parse_date_range() {
        let range = parse_date_range("2024-01-01..2024-01-31").unwrap();
        assert_eq!(range.start, date(2024, 1, 1));
        assert_eq!(range.end, date(2024, 1, 31));

        let spaced = parse_date_range("2024-01-01 2024-02-01").unwrap();
        assert_eq!(spaced.end, date(2024, 2, 1));
    }

    #[test]
    fn test_parse_date_range_rejects_reversed_and_garbage() {
        assert!(parse_date_range("2024-02-01..2024-01-01").is_err());
        assert!(parse_date_range("yesterday").is_err());
        assert!(parse_date_range("2024-13-01..2024-12-31").is_err());
    }
}
