//! Club data service (SQLite via sqlx).
//!
//! Stores members and their roles, motorcycles, agenda events, documents
//! with their access log, polls with votes, and the cash-flow ledger. Every
//! call returns [`RemoteResult`](crate::retry::RemoteResult) so callers can
//! drive it through the retry layer.

mod cash_flow;
mod db;
mod documents;
mod events;
mod members;
mod motorcycles;
mod polls;
mod types;

pub use db::ClubDb;
pub use documents::DocumentAccessLog;
pub use polls::PollVotes;
pub use types::*;

#[cfg(test)]
pub(crate) use db::open_memory;
