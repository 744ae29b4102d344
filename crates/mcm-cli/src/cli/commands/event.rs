//! `mcm event ...` and `mcm agenda` – club events.

use anyhow::Result;
use clap::Subcommand;
use mcm_core::club_db::{Event, EventId, NewEvent};
use mcm_core::config::McmConfig;
use mcm_core::listing::ListQuery;
use mcm_core::manager::Backoffice;
use mcm_core::retry::RetryOptions;

use super::{now_unix, or_dash, print_footer};
use crate::cli::ListArgs;

#[derive(Debug, Subcommand)]
pub enum EventCommand {
    /// List all events (sort: date, title).
    List {
        #[command(flatten)]
        list: ListArgs,
    },

    /// Create an unpublished event.
    Add {
        title: String,
        /// Start time as unix seconds.
        #[arg(long)]
        at: i64,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },

    /// Show an event on the public agenda.
    Publish { id: EventId },

    /// Hide an event from the public agenda.
    Unpublish { id: EventId },

    /// Delete an event.
    Remove { id: EventId },
}

pub async fn run_event(office: &Backoffice, cfg: &McmConfig, cmd: EventCommand) -> Result<()> {
    let events = office.events();
    let query = ListQuery::with_page_size(cfg.page_size);
    let page = match cmd {
        EventCommand::List { list } => events.load(&list.to_query(cfg)).await?,
        EventCommand::Add {
            title,
            at,
            location,
            description,
        } => {
            let new = NewEvent {
                title,
                location,
                starts_at: at,
                description,
            };
            let (id, page) = events.create(&new, &query).await?;
            println!("Added event {id}");
            page
        }
        EventCommand::Publish { id } => events.set_published(id, true, &query).await?,
        EventCommand::Unpublish { id } => events.set_published(id, false, &query).await?,
        EventCommand::Remove { id } => events.delete(id, &query).await?,
    };
    print_events(&page.items, true);
    print_footer(&page);
    Ok(())
}

/// `mcm agenda`: never fails on a data error, prints it instead.
pub async fn run_agenda(
    office: &Backoffice,
    now: Option<i64>,
    retries: Option<u32>,
) -> Result<()> {
    let now = now.unwrap_or_else(now_unix);
    let events = office.events();
    let outcome = match retries {
        Some(n) => {
            let opts = RetryOptions {
                max_retries: Some(n),
                ..RetryOptions::default()
            };
            events.agenda_with(now, &opts).await?
        }
        None => events.agenda(now).await,
    };
    if let Some(err) = outcome.error {
        println!("Agenda unavailable: {err}");
        return Ok(());
    }
    let events = outcome.data.unwrap_or_default();
    if events.is_empty() {
        println!("No upcoming events.");
    } else {
        print_events(&events, false);
    }
    Ok(())
}

fn print_events(events: &[Event], with_status: bool) {
    println!("{:<6} {:<12} {:<28} {:<20} {}", "ID", "STARTS", "TITLE", "LOCATION", "");
    for e in events {
        let status = match (with_status, e.published) {
            (false, _) => "",
            (true, true) => "published",
            (true, false) => "draft",
        };
        println!(
            "{:<6} {:<12} {:<28} {:<20} {}",
            e.id,
            e.starts_at,
            e.title,
            or_dash(e.location.as_deref()),
            status
        );
    }
}
