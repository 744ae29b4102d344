use anyhow::{bail, Result};

use crate::club_db::{MemberId, NewPoll, Poll, PollId, PollVotes};
use crate::listing::{paginate, ListQuery, Page};
use crate::stats::{ParentRecord, Statistics};
use crate::targeting::RecipientResolver;

use super::Backoffice;

const SORT_KEYS: &[&str] = &["created", "question", "participation"];

/// A poll with participation statistics and the vote count per option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollRow {
    pub poll: Poll,
    pub stats: Statistics,
    /// Same order as `poll.options`.
    pub tallies: Vec<u32>,
}

pub struct PollsManager<'a> {
    office: &'a Backoffice,
}

impl<'a> PollsManager<'a> {
    pub(crate) fn new(office: &'a Backoffice) -> Self {
        Self { office }
    }

    pub async fn load(&self, query: &ListQuery) -> Result<Page<PollRow>> {
        let db = self.office.db();
        let polls: Vec<Poll> = self
            .office
            .call("list polls", move || db.list_polls())
            .await?
            .into_iter()
            .filter(|p| query.matches([p.question.as_str()]))
            .collect();
        let rows = self.with_results(polls).await?;

        let key = query.sort_key(SORT_KEYS, "created");
        Ok(paginate(
            rows,
            query,
            |_| true,
            |a, b| match key {
                "question" => a.poll.question.to_lowercase().cmp(&b.poll.question.to_lowercase()),
                "participation" => a.stats.percentage.cmp(&b.stats.percentage),
                _ => a
                    .poll
                    .created_at
                    .cmp(&b.poll.created_at)
                    .then(a.poll.id.cmp(&b.poll.id)),
            },
        ))
    }

    pub async fn get(&self, id: PollId) -> Result<Option<PollRow>> {
        let db = self.office.db();
        let Some(poll) = self.office.call("get poll", move || db.get_poll(id)).await? else {
            return Ok(None);
        };
        Ok(self.with_results(vec![poll]).await?.into_iter().next())
    }

    pub async fn create(
        &self,
        new: &NewPoll,
        query: &ListQuery,
    ) -> Result<(PollId, Page<PollRow>)> {
        if new.question.trim().is_empty() {
            bail!("poll question must not be empty");
        }
        let answers = new.options.iter().filter(|o| !o.trim().is_empty()).count();
        if answers < 2 || answers != new.options.len() {
            bail!("a poll needs at least two non-empty options");
        }
        let id = self.office.db().add_poll(new).await?;
        tracing::info!(poll_id = id, targeting = %new.targeting, "poll created");
        Ok((id, self.load(query).await?))
    }

    /// Record `member`'s answer. Voting again replaces the earlier answer.
    pub async fn vote(&self, id: PollId, member: MemberId, option: u32) -> Result<()> {
        let db = self.office.db();
        let Some(poll) = self.office.call("get poll", move || db.get_poll(id)).await? else {
            bail!("poll {id} not found");
        };
        if !poll.open {
            bail!("poll {id} is closed");
        }
        if option as usize >= poll.options.len() {
            bail!(
                "option {option} out of range, poll {id} has {} options",
                poll.options.len()
            );
        }
        let targeting = &poll.targeting;
        let eligible = self
            .office
            .call("resolve voters", move || db.resolve(targeting))
            .await?;
        if !eligible.iter().any(|r| r.id == member) {
            bail!("member {member} is not eligible to vote on poll {id}");
        }
        db.cast_vote(id, member, option).await?;
        tracing::debug!(poll_id = id, member_id = member, option, "vote recorded");
        Ok(())
    }

    pub async fn set_open(
        &self,
        id: PollId,
        open: bool,
        query: &ListQuery,
    ) -> Result<Page<PollRow>> {
        self.office.db().set_poll_open(id, open).await?;
        tracing::info!(poll_id = id, open, "poll status changed");
        self.load(query).await
    }

    pub async fn delete(&self, id: PollId, query: &ListQuery) -> Result<Page<PollRow>> {
        self.office.db().remove_poll(id).await?;
        tracing::info!(poll_id = id, "poll deleted");
        self.load(query).await
    }

    async fn with_results(&self, polls: Vec<Poll>) -> Result<Vec<PollRow>> {
        let db = self.office.db();
        let parents: Vec<ParentRecord> = polls
            .iter()
            .map(|p| ParentRecord {
                id: p.id,
                targeting: p.targeting.clone(),
            })
            .collect();
        let mut stats = self.office.statistics(&parents, &PollVotes(db)).await?;

        let ids: Vec<PollId> = parents.iter().map(|p| p.id).collect();
        let ids = ids.as_slice();
        let mut tallies = self
            .office
            .call("tally votes", move || db.poll_tallies(ids))
            .await?;

        Ok(polls
            .into_iter()
            .map(|poll| {
                let counts = tallies.remove(&poll.id).unwrap_or_default();
                let tallies = (0..poll.options.len() as u32)
                    .map(|i| counts.get(&i).copied().unwrap_or(0))
                    .collect();
                PollRow {
                    stats: stats.remove(&poll.id).unwrap_or_default(),
                    tallies,
                    poll,
                }
            })
            .collect())
    }
}
