pub mod budget;
pub mod period;
pub mod report;
pub mod transaction;
pub mod user;
