//! Per-record engagement statistics over a batch of parents.
//!
//! Access rows come from one batched call. Each distinct targeting
//! descriptor is resolved once, all descriptors concurrently, and the
//! results are joined before any statistics are built. A failed descriptor
//! only zeroes the parents that use it.

use std::collections::{HashMap, HashSet};

use futures::future::join_all;

use crate::club_db::MemberId;
use crate::retry::RemoteResult;
use crate::targeting::{Recipient, RecipientResolver, Targeting};

use super::types::{
    AccessRow, AccessSource, OrphanPolicy, ParentId, ParentRecord, Statistics, StatsIssue,
};

/// `round(100 * accesses / recipients)`, or 0 when there are no recipients.
pub fn percentage(accesses: usize, recipients: usize) -> u32 {
    if recipients == 0 {
        return 0;
    }
    (100.0 * accesses as f64 / recipients as f64).round() as u32
}

/// Compute statistics for every parent in `parents`.
///
/// Fails only if the batched access-row call fails; resolver failures are
/// isolated per descriptor and reported through [`StatsIssue::ResolveFailed`].
pub async fn compute_statistics<A, R>(
    parents: &[ParentRecord],
    access: &A,
    resolver: &R,
    orphan_policy: OrphanPolicy,
) -> RemoteResult<HashMap<ParentId, Statistics>>
where
    A: AccessSource + ?Sized,
    R: RecipientResolver + ?Sized,
{
    if parents.is_empty() {
        return Ok(HashMap::new());
    }

    let ids: Vec<ParentId> = parents.iter().map(|p| p.id).collect();
    let mut rows_by_parent: HashMap<ParentId, Vec<AccessRow>> = HashMap::new();
    for row in access.access_rows(&ids).await? {
        rows_by_parent.entry(row.parent_id).or_default().push(row);
    }

    let mut seen = HashSet::new();
    let descriptors: Vec<&Targeting> = parents
        .iter()
        .map(|p| &p.targeting)
        .filter(|t| seen.insert(*t))
        .collect();

    let resolved: HashMap<&Targeting, RemoteResult<Vec<Recipient>>> = join_all(
        descriptors
            .into_iter()
            .map(|t| async move { (t, resolver.resolve(t).await) }),
    )
    .await
    .into_iter()
    .collect();

    let mut out = HashMap::with_capacity(parents.len());
    for parent in parents {
        let rows = rows_by_parent
            .get(&parent.id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let stats = match resolved.get(&parent.targeting) {
            Some(Ok(recipients)) => build(&parent.targeting, recipients, rows, orphan_policy),
            Some(Err(e)) => {
                tracing::warn!(
                    parent_id = parent.id,
                    targeting = %parent.targeting,
                    "recipient resolution failed, using empty statistics: {}",
                    e
                );
                Statistics::failed(e.to_string())
            }
            None => Statistics::failed(format!("targeting {} was not resolved", parent.targeting)),
        };
        out.insert(parent.id, stats);
    }
    Ok(out)
}

fn build(
    targeting: &Targeting,
    recipients: &[Recipient],
    rows: &[AccessRow],
    orphan_policy: OrphanPolicy,
) -> Statistics {
    let mut accessed_ids: HashSet<MemberId> = HashSet::new();
    let mut accessed = Vec::new();
    for row in rows {
        if accessed_ids.insert(row.member_id) {
            accessed.push(Recipient {
                id: row.member_id,
                name: row.member_name.clone(),
            });
        }
    }

    let not_accessed: Vec<Recipient> = recipients
        .iter()
        .filter(|r| !accessed_ids.contains(&r.id))
        .cloned()
        .collect();

    let orphaned = matches!(targeting, Targeting::Individual(_)) && recipients.is_empty();
    let total_recipients = if orphaned {
        match orphan_policy {
            OrphanPolicy::CountAsOne => 1,
            OrphanPolicy::CountAsZero => 0,
        }
    } else {
        recipients.len()
    };
    let total_accesses = rows.len();

    Statistics {
        total_recipients,
        total_accesses,
        percentage: percentage(total_accesses, total_recipients),
        accessed,
        not_accessed,
        issue: orphaned.then_some(StatsIssue::OrphanedRecipient),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RemoteError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct Rows(Vec<AccessRow>);

    #[async_trait]
    impl AccessSource for Rows {
        async fn access_rows(&self, parents: &[ParentId]) -> RemoteResult<Vec<AccessRow>> {
            Ok(self
                .0
                .iter()
                .filter(|r| parents.contains(&r.parent_id))
                .cloned()
                .collect())
        }
    }

    struct FailingRows;

    #[async_trait]
    impl AccessSource for FailingRows {
        async fn access_rows(&self, _parents: &[ParentId]) -> RemoteResult<Vec<AccessRow>> {
            Err(RemoteError::new("permission denied for table document_access"))
        }
    }

    /// Members 1..=n are active; role "board" holds ids listed in `board`;
    /// role "broken" fails. Counts calls.
    struct Roster {
        n: i64,
        board: Vec<i64>,
        calls: AtomicU32,
        latency: Option<Duration>,
    }

    impl Roster {
        fn new(n: i64) -> Self {
            Self {
                n,
                board: Vec::new(),
                calls: AtomicU32::new(0),
                latency: None,
            }
        }
    }

    fn recipient(id: i64) -> Recipient {
        Recipient {
            id,
            name: format!("m{id}"),
        }
    }

    #[async_trait]
    impl RecipientResolver for Roster {
        async fn resolve(&self, targeting: &Targeting) -> RemoteResult<Vec<Recipient>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(d) = self.latency {
                tokio::time::sleep(d).await;
            }
            match targeting {
                Targeting::Broadcast => Ok((1..=self.n).map(recipient).collect()),
                Targeting::Role(r) if r == "broken" => Err(RemoteError::new("role lookup failed")),
                Targeting::Role(_) => Ok(self.board.iter().copied().map(recipient).collect()),
                Targeting::Individual(id) if (1..=self.n).contains(id) => Ok(vec![recipient(*id)]),
                Targeting::Individual(_) => Ok(Vec::new()),
            }
        }
    }

    fn row(parent_id: ParentId, member_id: MemberId) -> AccessRow {
        AccessRow {
            parent_id,
            member_id,
            member_name: format!("m{member_id}"),
            at: 0,
        }
    }

    fn parent(id: ParentId, targeting: Targeting) -> ParentRecord {
        ParentRecord { id, targeting }
    }

    #[test]
    fn percentage_rounds_and_handles_zero() {
        assert_eq!(percentage(4, 10), 40);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(5, 0), 0);
        assert_eq!(percentage(0, 0), 0);
    }

    #[tokio::test]
    async fn broadcast_ten_members_four_accesses() {
        let rows = Rows((1..=4).map(|m| row(1, m)).collect());
        let roster = Roster::new(10);
        let out = compute_statistics(
            &[parent(1, Targeting::Broadcast)],
            &rows,
            &roster,
            OrphanPolicy::default(),
        )
        .await
        .unwrap();
        let s = &out[&1];
        assert_eq!(s.total_recipients, 10);
        assert_eq!(s.total_accesses, 4);
        assert_eq!(s.percentage, 40);
        assert_eq!(s.accessed.len(), 4);
        assert_eq!(s.not_accessed.len(), 6);
        assert!(s.not_accessed.iter().all(|r| r.id > 4));
        assert!(s.issue.is_none());
    }

    #[tokio::test]
    async fn zero_recipients_gives_zero_percentage() {
        let rows = Rows(vec![row(1, 3)]);
        let roster = Roster::new(5);
        let out = compute_statistics(
            &[parent(1, Targeting::Role("board".into()))],
            &rows,
            &roster,
            OrphanPolicy::default(),
        )
        .await
        .unwrap();
        assert_eq!(out[&1].total_recipients, 0);
        assert_eq!(out[&1].percentage, 0);
        assert_eq!(out[&1].total_accesses, 1);
    }

    #[tokio::test]
    async fn failing_descriptor_is_isolated() {
        let rows = Rows(vec![row(1, 1), row(1, 2), row(2, 1)]);
        let roster = Roster::new(4);
        let out = compute_statistics(
            &[
                parent(1, Targeting::Broadcast),
                parent(2, Targeting::Role("broken".into())),
            ],
            &rows,
            &roster,
            OrphanPolicy::default(),
        )
        .await
        .unwrap();

        let a = &out[&1];
        assert_eq!(a.total_recipients, 4);
        assert_eq!(a.total_accesses, 2);
        assert_eq!(a.percentage, 50);
        assert!(a.issue.is_none());

        let b = &out[&2];
        assert_eq!(b.total_recipients, 0);
        assert_eq!(b.total_accesses, 0);
        assert_eq!(
            b.issue,
            Some(StatsIssue::ResolveFailed("role lookup failed".to_string()))
        );
    }

    #[tokio::test]
    async fn access_source_failure_fails_the_batch() {
        let roster = Roster::new(2);
        let err = compute_statistics(
            &[parent(1, Targeting::Broadcast)],
            &FailingRows,
            &roster,
            OrphanPolicy::default(),
        )
        .await
        .unwrap_err();
        assert!(err.message.contains("permission denied"));
    }

    #[tokio::test]
    async fn orphaned_individual_follows_policy() {
        let rows = Rows(Vec::new());
        let roster = Roster::new(2);
        let parents = [parent(7, Targeting::Individual(42))];

        let one = compute_statistics(&parents, &rows, &roster, OrphanPolicy::CountAsOne)
            .await
            .unwrap();
        assert_eq!(one[&7].total_recipients, 1);
        assert_eq!(one[&7].percentage, 0);
        assert!(one[&7].not_accessed.is_empty());
        assert_eq!(one[&7].issue, Some(StatsIssue::OrphanedRecipient));

        let zero = compute_statistics(&parents, &rows, &roster, OrphanPolicy::CountAsZero)
            .await
            .unwrap();
        assert_eq!(zero[&7].total_recipients, 0);
        assert_eq!(zero[&7].issue, Some(StatsIssue::OrphanedRecipient));
    }

    #[tokio::test]
    async fn individual_target_that_read_it() {
        let rows = Rows(vec![row(3, 2), row(3, 2)]);
        let roster = Roster::new(2);
        let out = compute_statistics(
            &[parent(3, Targeting::Individual(2))],
            &rows,
            &roster,
            OrphanPolicy::default(),
        )
        .await
        .unwrap();
        let s = &out[&3];
        assert_eq!(s.total_recipients, 1);
        assert_eq!(s.total_accesses, 2);
        assert_eq!(s.accessed.len(), 1);
        assert!(s.not_accessed.is_empty());
    }

    #[tokio::test]
    async fn identical_descriptors_resolve_once() {
        let rows = Rows(Vec::new());
        let roster = Roster::new(3);
        let parents: Vec<ParentRecord> = (1..=5)
            .map(|id| parent(id, Targeting::Broadcast))
            .chain([parent(6, Targeting::Role("board".into()))])
            .collect();
        let out = compute_statistics(&parents, &rows, &roster, OrphanPolicy::default())
            .await
            .unwrap();
        assert_eq!(out.len(), 6);
        assert_eq!(roster.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn descriptors_resolve_concurrently() {
        let rows = Rows(Vec::new());
        let mut roster = Roster::new(3);
        roster.latency = Some(Duration::from_millis(100));
        let parents = [
            parent(1, Targeting::Broadcast),
            parent(2, Targeting::Role("board".into())),
            parent(3, Targeting::Individual(1)),
        ];
        let start = tokio::time::Instant::now();
        compute_statistics(&parents, &rows, &roster, OrphanPolicy::default())
            .await
            .unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_millis(200), "resolved serially: {elapsed:?}");
    }

    #[tokio::test]
    async fn empty_input_makes_no_calls() {
        let roster = Roster::new(3);
        let out = compute_statistics(&[], &FailingRows, &roster, OrphanPolicy::default())
            .await
            .unwrap();
        assert!(out.is_empty());
        assert_eq!(roster.calls.load(Ordering::SeqCst), 0);
    }
}
