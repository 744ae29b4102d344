//! Agenda events.

use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::retry::{RemoteError, RemoteResult};

use super::db::ClubDb;
use super::types::{Event, EventId, NewEvent};

fn event_from_row(row: &SqliteRow) -> Event {
    Event {
        id: row.get("id"),
        title: row.get("title"),
        location: row.get("location"),
        starts_at: row.get("starts_at"),
        description: row.get("description"),
        published: row.get("published"),
    }
}

impl ClubDb {
    /// Insert an unpublished event.
    pub async fn add_event(&self, new: &NewEvent) -> RemoteResult<EventId> {
        let id = sqlx::query(
            r#"
            INSERT INTO events (title, location, starts_at, description, published)
            VALUES (?1, ?2, ?3, ?4, 0)
            "#,
        )
        .bind(&new.title)
        .bind(&new.location)
        .bind(new.starts_at)
        .bind(&new.description)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();
        Ok(id)
    }

    pub async fn set_event_published(&self, id: EventId, published: bool) -> RemoteResult<()> {
        let done = sqlx::query("UPDATE events SET published = ?1 WHERE id = ?2")
            .bind(published)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(RemoteError::not_found("event", id));
        }
        Ok(())
    }

    pub async fn remove_event(&self, id: EventId) -> RemoteResult<()> {
        sqlx::query("DELETE FROM events WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// All events by start time.
    pub async fn list_events(&self) -> RemoteResult<Vec<Event>> {
        let rows = sqlx::query("SELECT * FROM events ORDER BY starts_at, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(event_from_row).collect())
    }

    /// Published events starting at or after `now`, soonest first.
    pub async fn upcoming_events(&self, now: i64) -> RemoteResult<Vec<Event>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM events
            WHERE published = 1 AND starts_at >= ?1
            ORDER BY starts_at, id
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(event_from_row).collect())
    }
}
