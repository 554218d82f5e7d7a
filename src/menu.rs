use crate::db::connection::Database;
use crate::db::user_repository;
use crate::error::{FinanceError, Result};
use crate::models::budget::BudgetStatus;
use crate::models::period::{DateRange, parse_date_range};
use crate::models::report::PeriodSummary;
use crate::models::transaction::{Transaction, TransactionType};
use crate::models::user::User;
use crate::operations::auth::{self, Password};
use crate::operations::backup::{backup_database, restore_database};
use crate::operations::budget::BudgetTracker;
use crate::operations::export::export_transactions_to_csv;
use crate::operations::ledger::TransactionLedger;
use crate::operations::report::ReportGenerator;
use crate::operations::report_view::run_yearly_chart;
use crate::secret::SecretReader;
use chrono::NaiveDate;
use colored::Colorize;
use rust_decimal::Decimal;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{error, warn};

const DEFAULT_EXPORT_FILE: &str = "transactions.csv";
const DEFAULT_BACKUP_FILE: &str = "finance_backup.db";

const USER_MENU: [&str; 14] = [
    "Add transaction",
    "List transactions",
    "Delete transaction",
    "Show balance",
    "Monthly report",
    "Yearly report",
    "Yearly chart",
    "Category breakdown",
    "Set budget",
    "Check budget",
    "Export transactions to CSV",
    "Backup database",
    "Restore database",
    "Logout",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UserCommand {
    Add,
    List,
    Delete,
    Balance,
    Monthly,
    Yearly,
    Chart,
    Breakdown,
    SetBudget,
    CheckBudget,
    Export,
    Backup,
    Restore,
    Logout,
}

impl UserCommand {
    fn from_choice(choice: usize) -> Option<Self> {
        let command = match choice {
            1 => UserCommand::Add,
            2 => UserCommand::List,
            3 => UserCommand::Delete,
            4 => UserCommand::Balance,
            5 => UserCommand::Monthly,
            6 => UserCommand::Yearly,
            7 => UserCommand::Chart,
            8 => UserCommand::Breakdown,
            9 => UserCommand::SetBudget,
            10 => UserCommand::CheckBudget,
            11 => UserCommand::Export,
            12 => UserCommand::Backup,
            13 => UserCommand::Restore,
            14 => UserCommand::Logout,
            _ => return None,
        };
        Some(command)
    }
}

/// Interactive session over any line-based input and output.
pub struct Menu<'a, R, W> {
    db: &'a Database,
    input: R,
    out: W,
    secrets: Box<dyn SecretReader + 'a>,
    user: Option<User>,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(db: &'a Database, input: R, out: W, secrets: Box<dyn SecretReader + 'a>) -> Self {
        Self {
            db,
            input,
            out,
            secrets,
            user: None,
        }
    }

    /// Runs until the user exits or input ends.
    pub fn run(&mut self) -> io::Result<()> {
        writeln!(self.out, "{}", "Welcome to the personal finance manager!".cyan().bold())?;
        match self.session() {
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                writeln!(self.out)?;
                writeln!(self.out, "Goodbye!")
            }
            other => other,
        }
    }

    fn session(&mut self) -> io::Result<()> {
        loop {
            match self.user.clone() {
                None => {
                    if !self.logged_out_menu()? {
                        writeln!(self.out, "Goodbye!")?;
                        return Ok(());
                    }
                }
                Some(user) => self.user_menu(&user)?,
            }
        }
    }

    /// Returns `false` when the user chose to exit.
    fn logged_out_menu(&mut self) -> io::Result<bool> {
        self.print_header("Main Menu")?;
        writeln!(self.out, "1. Register")?;
        writeln!(self.out, "2. Login")?;
        writeln!(self.out, "3. Exit")?;

        let result = match self.prompt_choice(3)? {
            1 => self.register(),
            2 => self.login(),
            _ => return Ok(false),
        };
        self.handle_result(result)?;
        Ok(true)
    }

    fn user_menu(&mut self, user: &User) -> io::Result<()> {
        self.print_header(&format!("Logged in as {}", user.username))?;
        for (idx, label) in USER_MENU.iter().enumerate() {
            writeln!(self.out, "{}. {}", idx + 1, label)?;
        }

        let choice = self.prompt_choice(USER_MENU.len())?;
        let Some(command) = UserCommand::from_choice(choice) else {
            return Ok(());
        };
        let result = match command {
            UserCommand::Add => self.add_transaction(user),
            UserCommand::List => self.list_transactions(user),
            UserCommand::Delete => self.delete_transaction(user),
            UserCommand::Balance => self.show_balance(user),
            UserCommand::Monthly => self.monthly_report(user),
            UserCommand::Yearly => self.yearly_report(user),
            UserCommand::Chart => self.yearly_chart(user),
            UserCommand::Breakdown => self.category_breakdown(user),
            UserCommand::SetBudget => self.set_budget(user),
            UserCommand::CheckBudget => self.check_budget(user),
            UserCommand::Export => self.export(user),
            UserCommand::Backup => self.backup(),
            UserCommand::Restore => self.restore(user),
            UserCommand::Logout => {
                self.user = None;
                writeln!(self.out, "Logged out.").map_err(FinanceError::from)
            }
        };
        self.handle_result(result)
    }

    /// Prints operation errors and keeps the session alive. Only end of
    /// input propagates.
    fn handle_result(&mut self, result: Result<()>) -> io::Result<()> {
        match result {
            Ok(()) => Ok(()),
            Err(FinanceError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => Err(e),
            Err(e) => {
                match &e {
                    FinanceError::Storage(_) | FinanceError::Io(_) | FinanceError::Csv(_) => {
                        error!(error = %e, "operation failed");
                    }
                    _ => {}
                }
                writeln!(self.out, "{}", format!("Error: {}", e).red())?;
                if e.is_validation() {
                    writeln!(self.out, "Please try again.")?;
                }
                Ok(())
            }
        }
    }

    fn register(&mut self) -> Result<()> {
        let username = self.prompt("Enter username: ")?;
        let password = Password::new(self.secrets.read_secret("Enter password: ")?);
        auth::register(self.db, &username, &password)?;
        writeln!(self.out, "{}", "Registration successful!".green())?;
        Ok(())
    }

    fn login(&mut self) -> Result<()> {
        let username = self.prompt("Enter username: ")?;
        let password = Password::new(self.secrets.read_secret("Enter password: ")?);
        let user = auth::login(self.db, &username, &password)?;
        writeln!(self.out, "{}", "Login successful!".green())?;
        self.user = Some(user);
        Ok(())
    }

    fn add_transaction(&mut self, user: &User) -> Result<()> {
        let kind: TransactionType = self.prompt_parsed("Type (income/expense): ")?;
        let category = self.prompt("Category: ")?;
        let amount: Decimal = self.prompt_parsed("Amount: ")?;
        let description = self.prompt("Description (optional): ")?;
        let date: Option<NaiveDate> = self.prompt_optional("Date (YYYY-MM-DD, blank for today): ")?;

        let ledger = TransactionLedger::new(self.db, user.id);
        let transaction = match date {
            Some(date) => ledger.add_on(date, kind.as_str(), &category, amount, &description)?,
            None => ledger.add(kind.as_str(), &category, amount, &description)?,
        };
        writeln!(
            self.out,
            "{}",
            format!("Transaction #{} added successfully!", transaction.id).green()
        )?;
        Ok(())
    }

    fn list_transactions(&mut self, user: &User) -> Result<()> {
        let range = self.prompt_date_range()?;
        let transactions = TransactionLedger::new(self.db, user.id).list(range)?;
        self.show_transactions(&transactions)?;
        Ok(())
    }

    fn delete_transaction(&mut self, user: &User) -> Result<()> {
        let id: i64 = self.prompt_parsed("Transaction ID to delete: ")?;
        if TransactionLedger::new(self.db, user.id).delete(id)? {
            writeln!(self.out, "{}", "Transaction deleted!".green())?;
        } else {
            writeln!(self.out, "{}", "No transaction found with that ID.".yellow())?;
        }
        Ok(())
    }

    fn show_balance(&mut self, user: &User) -> Result<()> {
        let balance = TransactionLedger::new(self.db, user.id).balance()?;
        writeln!(self.out, "Current balance: {}", colored_amount(balance))?;
        Ok(())
    }

    fn monthly_report(&mut self, user: &User) -> Result<()> {
        let month: u32 = self.prompt_parsed("Month (1-12): ")?;
        let year: i32 = self.prompt_parsed("Year: ")?;
        let summary = ReportGenerator::new(self.db, user.id).monthly(month, year)?;

        self.print_header("Monthly Report")?;
        writeln!(self.out, "Period: {:02}/{}", month, year)?;
        self.show_summary(&summary)?;
        Ok(())
    }

    fn yearly_report(&mut self, user: &User) -> Result<()> {
        let year: i32 = self.prompt_parsed("Year: ")?;
        let report = ReportGenerator::new(self.db, user.id).yearly(year)?;

        self.print_header("Yearly Report")?;
        writeln!(self.out, "Period: {}", year)?;
        self.show_summary(&report.summary)?;
        writeln!(self.out, "{:<6} {:>12} {:>12}", "Month", "Income", "Expenses")?;
        for month in &report.months {
            writeln!(
                self.out,
                "{:<6} {:>12.2} {:>12.2}",
                month.month, month.income, month.expenses
            )?;
        }
        Ok(())
    }

    fn yearly_chart(&mut self, user: &User) -> Result<()> {
        let year: i32 = self.prompt_parsed("Year: ")?;
        let reports = ReportGenerator::new(self.db, user.id);
        let report = reports.yearly(year)?;
        let breakdown = reports.category_breakdown(None, Some(year))?;
        run_yearly_chart(&report, &breakdown)
    }

    fn category_breakdown(&mut self, user: &User) -> Result<()> {
        let month: Option<u32> = self.prompt_optional("Month (1-12, blank for all): ")?;
        let year: Option<i32> = self.prompt_optional("Year (blank for all): ")?;
        let breakdown = ReportGenerator::new(self.db, user.id).category_breakdown(month, year)?;

        self.print_header("Category Breakdown")?;
        for (title, totals) in [("Income", &breakdown.income), ("Expenses", &breakdown.expenses)] {
            writeln!(self.out, "{}", title.bold())?;
            if totals.is_empty() {
                writeln!(self.out, "  (none)")?;
            }
            for (category, amount) in totals {
                writeln!(self.out, "  {:<20} {:>12.2}", category, amount)?;
            }
        }
        Ok(())
    }

    fn set_budget(&mut self, user: &User) -> Result<()> {
        let category = self.prompt("Category: ")?;
        let amount: Decimal = self.prompt_parsed("Monthly limit: ")?;
        let month: Option<u32> = self.prompt_optional("Month (1-12, blank for current): ")?;
        let year: Option<i32> = self.prompt_optional("Year (blank for current): ")?;

        BudgetTracker::new(self.db, user.id).set(&category, amount, month, year)?;
        writeln!(
            self.out,
            "{}",
            format!("Budget for '{}' saved.", category.trim()).green()
        )?;
        Ok(())
    }

    fn check_budget(&mut self, user: &User) -> Result<()> {
        let month: Option<u32> = self.prompt_optional("Month (1-12, blank for current): ")?;
        let year: Option<i32> = self.prompt_optional("Year (blank for current): ")?;
        let overview = BudgetTracker::new(self.db, user.id).status(month, year)?;

        self.print_header(&format!("Budget {:02}/{}", overview.month, overview.year))?;
        if overview.is_empty() {
            for message in overview.messages() {
                writeln!(self.out, "{}", message.yellow())?;
            }
            return Ok(());
        }
        for line in &overview.lines {
            let message = format!("[{}] {}", line.status.label(), line.message());
            let message = match line.status {
                BudgetStatus::Exceeded { .. } => message.red(),
                BudgetStatus::Warning { .. } => message.yellow(),
                BudgetStatus::WithinLimit { .. } => message.green(),
            };
            writeln!(self.out, "{}", message)?;
        }
        Ok(())
    }

    fn export(&mut self, user: &User) -> Result<()> {
        let path = self.prompt_path("Export file", DEFAULT_EXPORT_FILE)?;
        let rows = export_transactions_to_csv(self.db, user.id, &path)?;
        writeln!(
            self.out,
            "{}",
            format!("Exported {} transactions to {}", rows, path.display()).green()
        )?;
        Ok(())
    }

    fn backup(&mut self) -> Result<()> {
        let path = self.prompt_path("Backup file", DEFAULT_BACKUP_FILE)?;
        backup_database(self.db, &path)?;
        writeln!(self.out, "{}", format!("Backup created at {}", path.display()).green())?;
        Ok(())
    }

    fn restore(&mut self, user: &User) -> Result<()> {
        let path = self.prompt_path("Restore from", DEFAULT_BACKUP_FILE)?;
        let confirm = self.prompt("This replaces all current data. Continue? (y/n): ")?;
        if !confirm.eq_ignore_ascii_case("y") {
            writeln!(self.out, "Restore cancelled.")?;
            return Ok(());
        }
        restore_database(self.db, &path)?;
        writeln!(self.out, "{}", "Data restored from backup.".green())?;

        // the restored file may not know the current account
        let current = self
            .db
            .with_connection(|conn| user_repository::get_user_by_name(conn, &user.username))?;
        match current {
            Some(current) if current.id == user.id => self.user = Some(current),
            _ => {
                warn!(username = %user.username, "account missing after restore");
                self.user = None;
                writeln!(
                    self.out,
                    "{}",
                    "Your account is not in the restored data. Logged out.".yellow()
                )?;
            }
        }
        Ok(())
    }

    fn show_transactions(&mut self, transactions: &[Transaction]) -> io::Result<()> {
        if transactions.is_empty() {
            return writeln!(self.out, "{}", "No transactions found.".yellow());
        }

        writeln!(
            self.out,
            "{:<6} {:<8} {:<15} {:>12} {:<10}  {}",
            "ID", "Type", "Category", "Amount", "Date", "Description"
        )?;
        for t in transactions {
            let kind = format!("{:<8}", t.transaction_type.as_str());
            let kind = if t.is_income() { kind.green() } else { kind.red() };
            writeln!(
                self.out,
                "{:<6} {} {:<15} {:>12.2} {:<10}  {}",
                t.id, kind, t.category, t.amount, t.date, t.description
            )?;
        }
        Ok(())
    }

    fn show_summary(&mut self, summary: &PeriodSummary) -> io::Result<()> {
        writeln!(self.out, "{:<14} {:>12.2}", "Income", summary.income)?;
        writeln!(self.out, "{:<14} {:>12.2}", "Expenses", summary.expenses)?;
        writeln!(self.out, "{:<14} {}", "Net Balance", colored_amount(summary.balance))?;
        writeln!(self.out, "{:<14} {:>11.2}%", "Savings rate", summary.savings_rate)
    }

    fn print_header(&mut self, title: &str) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", format!("=== {} ===", title).cyan())
    }

    fn prompt(&mut self, label: &str) -> io::Result<String> {
        write!(self.out, "{}", label)?;
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }
        Ok(line.trim().to_string())
    }

    /// Re-prompts until the answer parses.
    fn prompt_parsed<T: FromStr>(&mut self, label: &str) -> io::Result<T> {
        loop {
            let answer = self.prompt(label)?;
            match answer.parse() {
                Ok(value) => return Ok(value),
                Err(_) => writeln!(self.out, "{}", "Invalid input! Please try again.".red())?,
            }
        }
    }

    /// Blank means `None`; anything else must parse.
    fn prompt_optional<T: FromStr>(&mut self, label: &str) -> io::Result<Option<T>> {
        loop {
            let answer = self.prompt(label)?;
            if answer.is_empty() {
                return Ok(None);
            }
            match answer.parse() {
                Ok(value) => return Ok(Some(value)),
                Err(_) => writeln!(self.out, "{}", "Invalid input! Please try again.".red())?,
            }
        }
    }

    fn prompt_choice(&mut self, max: usize) -> io::Result<usize> {
        loop {
            let choice: usize = self.prompt_parsed("Choose an option: ")?;
            if (1..=max).contains(&choice) {
                return Ok(choice);
            }
            writeln!(self.out, "{}", format!("Please pick a number between 1 and {}.", max).red())?;
        }
    }

    fn prompt_date_range(&mut self) -> io::Result<Option<DateRange>> {
        loop {
            let answer = self.prompt("Date range (YYYY-MM-DD..YYYY-MM-DD, blank for all): ")?;
            if answer.is_empty() {
                return Ok(None);
            }
            match parse_date_range(&answer) {
                Ok(range) => return Ok(Some(range)),
                Err(e) => writeln!(self.out, "{}", e.to_string().red())?,
            }
        }
    }

    fn prompt_path(&mut self, label: &str, default: &str) -> io::Result<PathBuf> {
        let answer = self.prompt(&format!("{} [{}]: ", label, default))?;
        Ok(PathBuf::from(if answer.is_empty() { default } else { answer.as_str() }))
    }
}

fn colored_amount(amount: Decimal) -> colored::ColoredString {
    let text = format!("{:>12.2}", amount);
    if amount < Decimal::ZERO {
        text.red()
    } else {
        text.green()
    }
}
