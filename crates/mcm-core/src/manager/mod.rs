//! Page-level controllers for the back-office.
//!
//! Each controller fetches through the retry layer, derives what the view
//! needs (statistics, tallies, totals) and applies filter/sort/pagination.
//! Mutations are followed by a full refetch of the list they affect; nothing
//! is patched in place.

mod cash_flow;
mod documents;
mod events;
mod members;
mod motorcycles;
mod polls;

use std::collections::HashMap;
use std::future::Future;

use anyhow::{Context, Result};

use crate::club_db::ClubDb;
use crate::retry::{execute, RemoteResult, RetryPolicy};
use crate::stats::{
    compute_statistics, AccessSource, OrphanPolicy, ParentId, ParentRecord, Statistics,
};
use crate::targeting::MemberSnapshot;

pub use cash_flow::CashFlowManager;
pub use documents::{DocumentRow, DocumentsManager};
pub use events::EventsManager;
pub use members::{MemberRow, MembersManager};
pub use motorcycles::MotorcyclesManager;
pub use polls::{PollRow, PollsManager};

/// Shared context for the controllers: the data service handle plus policies.
#[derive(Clone)]
pub struct Backoffice {
    db: ClubDb,
    retry: RetryPolicy,
    orphan_policy: OrphanPolicy,
}

impl Backoffice {
    pub fn new(db: ClubDb, retry: RetryPolicy) -> Self {
        Self {
            db,
            retry,
            orphan_policy: OrphanPolicy::default(),
        }
    }

    pub fn with_orphan_policy(mut self, policy: OrphanPolicy) -> Self {
        self.orphan_policy = policy;
        self
    }

    pub fn db(&self) -> &ClubDb {
        &self.db
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn members(&self) -> MembersManager<'_> {
        MembersManager::new(self)
    }

    pub fn motorcycles(&self) -> MotorcyclesManager<'_> {
        MotorcyclesManager::new(self)
    }

    pub fn events(&self) -> EventsManager<'_> {
        EventsManager::new(self)
    }

    pub fn documents(&self) -> DocumentsManager<'_> {
        DocumentsManager::new(self)
    }

    pub fn polls(&self) -> PollsManager<'_> {
        PollsManager::new(self)
    }

    pub fn cash_flow(&self) -> CashFlowManager<'_> {
        CashFlowManager::new(self)
    }

    /// Run one data service call under the retry policy.
    pub(crate) async fn call<T, F, Fut>(&self, what: &str, op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RemoteResult<T>>,
    {
        execute(&self.retry, op)
            .await
            .with_context(|| format!("{what} failed"))
    }

    /// Load every member into a snapshot for bulk targeting resolution.
    pub(crate) async fn roster(&self) -> Result<MemberSnapshot> {
        let db = &self.db;
        let members = self.call("load roster", move || db.list_members()).await?;
        Ok(MemberSnapshot::new(members))
    }

    /// Engagement statistics for `parents`, resolving targets against one roster load.
    pub(crate) async fn statistics<A: AccessSource>(
        &self,
        parents: &[ParentRecord],
        source: &A,
    ) -> Result<HashMap<ParentId, Statistics>> {
        if parents.is_empty() {
            return Ok(HashMap::new());
        }
        let roster = self.roster().await?;
        let roster = &roster;
        let policy = self.orphan_policy;
        self.call("compute statistics", move || {
            compute_statistics(parents, source, roster, policy)
        })
        .await
    }
}
