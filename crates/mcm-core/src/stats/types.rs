//! Types shared by the statistics aggregator and its data sources.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::club_db::MemberId;
use crate::retry::RemoteResult;
use crate::targeting::{Recipient, Targeting};

/// Id of a document or poll.
pub type ParentId = i64;

/// A record whose engagement statistics are derived at read time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRecord {
    pub id: ParentId,
    pub targeting: Targeting,
}

/// One engagement event (document opened, poll answered).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRow {
    pub parent_id: ParentId,
    pub member_id: MemberId,
    pub member_name: String,
    pub at: i64,
}

/// Batched source of engagement rows for a set of parents.
#[async_trait]
pub trait AccessSource: Send + Sync {
    /// All rows for every id in `parents`, in one round trip.
    async fn access_rows(&self, parents: &[ParentId]) -> RemoteResult<Vec<AccessRow>>;
}

/// How an individual target that no longer resolves is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// Keep the original intent: one recipient, even though nobody can be listed.
    #[default]
    CountAsOne,
    /// Report what exists: zero recipients.
    CountAsZero,
}

/// Why a statistics value is degraded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsIssue {
    /// Individual target points at a member that no longer exists.
    OrphanedRecipient,
    /// Resolving the eligible recipients failed; counts are zeroed.
    ResolveFailed(String),
}

/// Derived engagement numbers for one parent record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statistics {
    pub total_recipients: usize,
    /// Number of access rows (not distinct members).
    pub total_accesses: usize,
    /// `round(100 * accesses / recipients)`, 0 when there are no recipients.
    pub percentage: u32,
    /// Distinct members who engaged, in order of first access.
    pub accessed: Vec<Recipient>,
    /// Eligible members with no access yet.
    pub not_accessed: Vec<Recipient>,
    pub issue: Option<StatsIssue>,
}

impl Statistics {
    pub(crate) fn failed(reason: String) -> Self {
        Self {
            issue: Some(StatsIssue::ResolveFailed(reason)),
            ..Self::default()
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.issue.is_some()
    }
}
