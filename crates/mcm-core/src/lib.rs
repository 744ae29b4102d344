pub mod club_db;
pub mod config;
pub mod listing;
pub mod logging;
pub mod manager;
pub mod retry;
pub mod stats;
pub mod targeting;
