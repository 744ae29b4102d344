//! Poll operations: questions, one vote per member, and tallies.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};

use crate::retry::{RemoteError, RemoteResult};
use crate::stats::{AccessRow, AccessSource, ParentId};

use super::db::{unix_timestamp, ClubDb};
use super::documents::{access_row, push_ids, targeting_from_row};
use super::types::{MemberId, NewPoll, Poll, PollId};

fn poll_from_row(row: &SqliteRow) -> RemoteResult<Poll> {
    let options_json: String = row.get("options_json");
    Ok(Poll {
        id: row.get("id"),
        question: row.get("question"),
        options: serde_json::from_str(&options_json)?,
        targeting: targeting_from_row(row)?,
        open: row.get("open"),
        created_at: row.get("created_at"),
    })
}

impl ClubDb {
    /// Insert an open poll.
    pub async fn add_poll(&self, new: &NewPoll) -> RemoteResult<PollId> {
        let options_json = serde_json::to_string(&new.options)?;
        let id = sqlx::query(
            r#"
            INSERT INTO polls (
                question, options_json, target_mode, target_role, target_member_id,
                open, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
            "#,
        )
        .bind(&new.question)
        .bind(options_json)
        .bind(new.targeting.mode())
        .bind(new.targeting.role())
        .bind(new.targeting.member_id())
        .bind(unix_timestamp())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();
        Ok(id)
    }

    pub async fn set_poll_open(&self, id: PollId, open: bool) -> RemoteResult<()> {
        let done = sqlx::query("UPDATE polls SET open = ?1 WHERE id = ?2")
            .bind(open)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(RemoteError::not_found("poll", id));
        }
        Ok(())
    }

    /// Delete a poll and its votes.
    pub async fn remove_poll(&self, id: PollId) -> RemoteResult<()> {
        sqlx::query("DELETE FROM polls WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_poll(&self, id: PollId) -> RemoteResult<Option<Poll>> {
        sqlx::query("SELECT * FROM polls WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(poll_from_row)
            .transpose()
    }

    /// All polls, newest first.
    pub async fn list_polls(&self) -> RemoteResult<Vec<Poll>> {
        sqlx::query("SELECT * FROM polls ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(poll_from_row)
            .collect()
    }

    /// Record a member's answer; a second vote replaces the first.
    pub async fn cast_vote(
        &self,
        poll_id: PollId,
        member_id: MemberId,
        option_index: u32,
    ) -> RemoteResult<()> {
        sqlx::query(
            r#"
            INSERT INTO poll_votes (poll_id, member_id, option_index, voted_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (poll_id, member_id) DO UPDATE
            SET option_index = excluded.option_index,
                voted_at = excluded.voted_at
            "#,
        )
        .bind(poll_id)
        .bind(member_id)
        .bind(i64::from(option_index))
        .bind(unix_timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Vote rows for every listed poll, in one query.
    pub async fn poll_vote_rows(&self, polls: &[PollId]) -> RemoteResult<Vec<AccessRow>> {
        if polls.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT v.poll_id AS parent_id, v.member_id, v.voted_at AS at,
                   m.first_name, m.last_name
            FROM poll_votes v
            JOIN members m ON m.id = v.member_id
            WHERE v.poll_id IN (
            "#,
        );
        push_ids(&mut qb, polls);
        qb.push(") ORDER BY v.voted_at, v.id");
        let rows = qb.build().fetch_all(&self.pool).await?;
        Ok(rows.iter().map(access_row).collect())
    }

    /// Votes per option index for every listed poll, in one query.
    pub async fn poll_tallies(
        &self,
        polls: &[PollId],
    ) -> RemoteResult<HashMap<PollId, HashMap<u32, u32>>> {
        if polls.is_empty() {
            return Ok(HashMap::new());
        }
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT poll_id, option_index, COUNT(*) AS n FROM poll_votes WHERE poll_id IN (",
        );
        push_ids(&mut qb, polls);
        qb.push(") GROUP BY poll_id, option_index");
        let mut out: HashMap<PollId, HashMap<u32, u32>> = HashMap::new();
        for row in qb.build().fetch_all(&self.pool).await? {
            let option: i64 = row.get("option_index");
            let n: i64 = row.get("n");
            out.entry(row.get("poll_id"))
                .or_default()
                .insert(option as u32, n as u32);
        }
        Ok(out)
    }
}

/// Poll votes as an [`AccessSource`]: a vote counts as engagement.
pub struct PollVotes<'a>(pub &'a ClubDb);

#[async_trait]
impl AccessSource for PollVotes<'_> {
    async fn access_rows(&self, parents: &[ParentId]) -> RemoteResult<Vec<AccessRow>> {
        self.0.poll_vote_rows(parents).await
    }
}
