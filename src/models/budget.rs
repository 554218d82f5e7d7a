use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub struct Budget {
    pub id: i64,
    pub user_id: i64,
    pub category: String,
    pub amount: Decimal,
    pub month: u32,
    pub year: i32,
}

/// Where spending stands against a limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStatus {
    Exceeded { overage: Decimal },
    Warning { remaining: Decimal },
    WithinLimit { remaining: Decimal },
}

impl BudgetStatus {
    /// Spending above 80% of the limit (up to and including it) is a warning.
    pub fn classify(limit: Decimal, spent: Decimal) -> Self {
        let warning_threshold = limit * Decimal::new(8, 1);
        if spent > limit {
            BudgetStatus::Exceeded {
                overage: spent - limit,
            }
        } else if spent > warning_threshold {
            BudgetStatus::Warning {
                remaining: limit - spent,
            }
        } else {
            BudgetStatus::WithinLimit {
                remaining: limit - spent,
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BudgetStatus::Exceeded { .. } => "EXCEEDED",
            BudgetStatus::Warning { .. } => "WARNING",
            BudgetStatus::WithinLimit { .. } => "OK",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetLine {
    pub category: String,
    pub limit: Decimal,
    pub spent: Decimal,
    pub status: BudgetStatus,
}

impl BudgetLine {
    pub fn message(&self) -> String {
        match self.status {
            BudgetStatus::Exceeded { overage } => format!(
                "{}: budget exceeded by ${:.2} (spent ${:.2} of ${:.2})",
                self.category, overage, self.spent, self.limit
            ),
            BudgetStatus::Warning { remaining } => format!(
                "{}: nearing limit, ${:.2} remaining (spent ${:.2} of ${:.2})",
                self.category, remaining, self.spent, self.limit
            ),
            BudgetStatus::WithinLimit { remaining } => format!(
                "{}: within budget, ${:.2} remaining (spent ${:.2} of ${:.2})",
                self.category, remaining, self.spent, self.limit
            ),
        }
    }
}

/// Status of every budget in one month.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetOverview {
    pub month: u32,
    pub year: i32,
    pub lines: Vec<BudgetLine>,
}

impl BudgetOverview {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        if self.lines.is_empty() {
            return vec![format!(
                "No budgets set for {:02}/{}",
                self.month, self.year
            )];
        }
        self.lines.iter().map(BudgetLine::message).collect()
    }
}
