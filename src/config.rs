use clap::Parser;
use std::path::PathBuf;
use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Startup settings for an interactive session.
#[derive(Debug, Clone, Parser)]
#[command(name = "fino", version, about = "Personal finance manager")]
pub struct Settings {
    /// SQLite database file holding users, transactions and budgets
    #[arg(long, env = "FINANCE_DB_PATH", default_value = "finance.db")]
    pub db_path: PathBuf,

    /// Log filter used when RUST_LOG is not set (e.g. "info", "finance_manager=debug")
    #[arg(long, env = "FINANCE_LOG", default_value = "warn")]
    pub log_level: String,
}

/// Installs the stderr tracing subscriber once per process.
pub fn init_tracing(default_filter: &str) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt};

        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default_filter))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    });
}
