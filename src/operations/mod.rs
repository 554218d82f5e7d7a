pub mod auth;
pub mod backup;
pub mod budget;
pub mod export;
pub mod ledger;
pub mod report;
pub mod report_view;
