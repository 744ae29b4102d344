//! Engagement statistics derived at read time (document reads, poll votes).

mod aggregate;
mod types;

pub use aggregate::{compute_statistics, percentage};
pub use types::{
    AccessRow, AccessSource, OrphanPolicy, ParentId, ParentRecord, Statistics, StatsIssue,
};
