//! `mcm poll ...` – polls, votes and participation.

use anyhow::{bail, Result};
use clap::Subcommand;
use mcm_core::club_db::{MemberId, NewPoll, PollId};
use mcm_core::config::McmConfig;
use mcm_core::listing::ListQuery;
use mcm_core::manager::{Backoffice, PollRow};

use super::print_footer;
use crate::cli::{ListArgs, TargetArgs};

#[derive(Debug, Subcommand)]
pub enum PollCommand {
    /// List polls with participation (sort: created, question, participation).
    List {
        #[command(flatten)]
        list: ListArgs,
    },

    /// Create an open poll.
    Add {
        question: String,
        /// An answer option; repeat at least twice.
        #[arg(long = "option", required = true)]
        options: Vec<String>,
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Show one poll with its tallies.
    Show { id: PollId },

    /// Vote for an option (0-based). Voting again replaces the earlier vote.
    Vote {
        id: PollId,
        option: u32,
        #[arg(long)]
        member: MemberId,
    },

    /// Reopen a poll for voting.
    Open { id: PollId },

    /// Stop accepting votes.
    Close { id: PollId },

    /// Delete a poll and its votes.
    Remove { id: PollId },
}

pub async fn run_poll(office: &Backoffice, cfg: &McmConfig, cmd: PollCommand) -> Result<()> {
    let polls = office.polls();
    let query = ListQuery::with_page_size(cfg.page_size);
    let page = match cmd {
        PollCommand::List { list } => polls.load(&list.to_query(cfg)).await?,
        PollCommand::Add {
            question,
            options,
            target,
        } => {
            let new = NewPoll {
                question,
                options,
                targeting: target.to_targeting()?,
            };
            let (id, page) = polls.create(&new, &query).await?;
            println!("Added poll {id}");
            page
        }
        PollCommand::Show { id } => {
            let Some(row) = polls.get(id).await? else {
                bail!("poll {id} not found");
            };
            print_poll(&row);
            return Ok(());
        }
        PollCommand::Vote { id, option, member } => {
            polls.vote(id, member, option).await?;
            println!("Recorded vote of member {member} on poll {id}");
            return Ok(());
        }
        PollCommand::Open { id } => polls.set_open(id, true, &query).await?,
        PollCommand::Close { id } => polls.set_open(id, false, &query).await?,
        PollCommand::Remove { id } => polls.delete(id, &query).await?,
    };

    println!(
        "{:<6} {:<36} {:<14} {:<7} {:>6} {:>6} {:>5}",
        "ID", "QUESTION", "AUDIENCE", "STATUS", "VOTES", "RCPTS", "%"
    );
    for row in &page.items {
        let p = &row.poll;
        println!(
            "{:<6} {:<36} {:<14} {:<7} {:>6} {:>6} {:>5}",
            p.id,
            p.question,
            p.targeting.to_string(),
            if p.open { "open" } else { "closed" },
            row.stats.total_accesses,
            row.stats.total_recipients,
            row.stats.percentage
        );
    }
    print_footer(&page);
    Ok(())
}

fn print_poll(row: &PollRow) {
    let p = &row.poll;
    println!(
        "{} [{}, {}]",
        p.question,
        p.targeting,
        if p.open { "open" } else { "closed" }
    );
    for (i, (option, votes)) in p.options.iter().zip(&row.tallies).enumerate() {
        println!("  {i}. {option:<30} {votes}");
    }
    println!(
        "{} of {} members voted ({}%)",
        row.stats.accessed.len(),
        row.stats.total_recipients,
        row.stats.percentage
    );
    if !row.stats.not_accessed.is_empty() {
        let missing: Vec<&str> = row.stats.not_accessed.iter().map(|r| r.name.as_str()).collect();
        println!("Not voted yet: {}", missing.join(", "));
    }
}
