use anyhow::{bail, Result};

use crate::club_db::{Event, EventId, NewEvent};
use crate::listing::{paginate, ListQuery, Page};
use crate::retry::{execute_safe, Outcome, RemoteError, RetryOptions, RetryPolicy};

use super::Backoffice;

const SORT_KEYS: &[&str] = &["date", "title"];

pub struct EventsManager<'a> {
    office: &'a Backoffice,
}

impl<'a> EventsManager<'a> {
    pub(crate) fn new(office: &'a Backoffice) -> Self {
        Self { office }
    }

    /// Public agenda: published events from `now` on.
    ///
    /// Never fails; the last error after retries is carried in the outcome.
    pub async fn agenda(&self, now: i64) -> Outcome<Vec<Event>, RemoteError> {
        self.agenda_under(self.office.retry_policy(), now).await
    }

    /// [`Self::agenda`] with the retry policy adjusted for this call only.
    ///
    /// Fails only if `opts` leave the policy invalid.
    pub async fn agenda_with(
        &self,
        now: i64,
        opts: &RetryOptions,
    ) -> Result<Outcome<Vec<Event>, RemoteError>> {
        let policy = self.office.retry_policy().with_overrides(opts)?;
        Ok(self.agenda_under(&policy, now).await)
    }

    async fn agenda_under(
        &self,
        policy: &RetryPolicy,
        now: i64,
    ) -> Outcome<Vec<Event>, RemoteError> {
        let db = self.office.db();
        let outcome = execute_safe(policy, move || async move {
            Outcome::from(db.upcoming_events(now).await)
        })
        .await;
        if let Some(e) = &outcome.error {
            tracing::warn!("agenda unavailable: {e}");
        }
        outcome
    }

    pub async fn load(&self, query: &ListQuery) -> Result<Page<Event>> {
        let db = self.office.db();
        let events = self.office.call("list events", move || db.list_events()).await?;
        let key = query.sort_key(SORT_KEYS, "date");
        Ok(paginate(
            events,
            query,
            |e| {
                query.matches(
                    [e.title.as_str()]
                        .into_iter()
                        .chain(e.location.as_deref())
                        .chain(e.description.as_deref()),
                )
            },
            |a, b| match key {
                "title" => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
                _ => a.starts_at.cmp(&b.starts_at).then(a.id.cmp(&b.id)),
            },
        ))
    }

    pub async fn create(
        &self,
        new: &NewEvent,
        query: &ListQuery,
    ) -> Result<(EventId, Page<Event>)> {
        if new.title.trim().is_empty() {
            bail!("event title must not be empty");
        }
        let id = self.office.db().add_event(new).await?;
        tracing::info!(event_id = id, starts_at = new.starts_at, "event created");
        Ok((id, self.load(query).await?))
    }

    pub async fn set_published(
        &self,
        id: EventId,
        published: bool,
        query: &ListQuery,
    ) -> Result<Page<Event>> {
        self.office.db().set_event_published(id, published).await?;
        tracing::info!(event_id = id, published, "event visibility changed");
        self.load(query).await
    }

    pub async fn delete(&self, id: EventId, query: &ListQuery) -> Result<Page<Event>> {
        self.office.db().remove_event(id).await?;
        tracing::info!(event_id = id, "event deleted");
        self.load(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::test_support::backoffice;

    fn ride(title: &str, starts_at: i64) -> NewEvent {
        NewEvent {
            title: title.into(),
            starts_at,
            ..NewEvent::default()
        }
    }

    #[tokio::test]
    async fn agenda_lists_published_upcoming_events() {
        let office = backoffice().await;
        let events = office.events();
        let q = ListQuery::default();
        let (spring, _) = events.create(&ride("Spring ride", 5_000), &q).await.unwrap();
        let (old, _) = events.create(&ride("Winter meetup", 100), &q).await.unwrap();
        events.create(&ride("Draft", 6_000), &q).await.unwrap();
        events.set_published(spring, true, &q).await.unwrap();
        events.set_published(old, true, &q).await.unwrap();

        let agenda = events.agenda(1_000).await;
        assert!(agenda.is_ok());
        let listed = agenda.data.expect("agenda data");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, spring);
    }

    #[tokio::test]
    async fn agenda_accepts_per_call_retry_options() {
        let office = backoffice().await;
        let events = office.events();
        let q = ListQuery::default();
        let (id, _) = events.create(&ride("Night ride", 5_000), &q).await.unwrap();
        events.set_published(id, true, &q).await.unwrap();

        let opts = RetryOptions {
            max_retries: Some(0),
            ..RetryOptions::default()
        };
        let agenda = events.agenda_with(1_000, &opts).await.unwrap();
        assert_eq!(agenda.data.expect("agenda data").len(), 1);

        let bad = RetryOptions {
            backoff_multiplier: Some(0.5),
            ..RetryOptions::default()
        };
        assert!(events.agenda_with(1_000, &bad).await.is_err());
    }

    #[tokio::test]
    async fn admin_list_sorts_and_searches() {
        let office = backoffice().await;
        let events = office.events();
        let q = ListQuery::default();
        events.create(&ride("Track day", 300), &q).await.unwrap();
        events.create(&ride("General assembly", 200), &q).await.unwrap();
        let (_, page) = events.create(&ride("Alpine tour", 100), &q).await.unwrap();
        assert_eq!(page.items[0].title, "Alpine tour");

        let q = ListQuery {
            sort: Some("title".into()),
            descending: true,
            ..ListQuery::default()
        };
        let page = events.load(&q).await.unwrap();
        assert_eq!(page.items[0].title, "Track day");

        let q = ListQuery {
            search: Some("assembly".into()),
            ..ListQuery::default()
        };
        assert_eq!(events.load(&q).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn blank_title_is_rejected() {
        let office = backoffice().await;
        assert!(office
            .events()
            .create(&ride(" ", 10), &ListQuery::default())
            .await
            .is_err());
    }
}
