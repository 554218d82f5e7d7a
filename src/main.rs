mod config;
mod db;
mod error;
mod menu;
mod models;
mod operations;
mod secret;

use clap::Parser;
use config::{Settings, init_tracing};
use db::connection::Database;
use menu::Menu;
use secret::TerminalSecretReader;
use std::io;
use std::process::ExitCode;
use tracing::{error, info};

fn main() -> ExitCode {
    let settings = Settings::parse();
    init_tracing(&settings.log_level);

    let db = match Database::open(&settings.db_path) {
        Ok(db) => db,
        Err(e) => {
            error!(error = %e, "failed to open database");
            eprintln!(
                "Failed to open database '{}': {}",
                settings.db_path.display(),
                e
            );
            return ExitCode::FAILURE;
        }
    };
    info!(path = %db.path().display(), "session started");

    let stdin = io::stdin();
    let mut menu = Menu::new(&db, stdin.lock(), io::stdout(), Box::new(TerminalSecretReader));
    if let Err(e) = menu.run() {
        error!(error = %e, "session aborted");
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("session ended");
    ExitCode::SUCCESS
}
