//! `mcm doc ...` – documents and read statistics.

use anyhow::{bail, Result};
use clap::Subcommand;
use mcm_core::club_db::{DocumentId, MemberId, NewDocument};
use mcm_core::config::McmConfig;
use mcm_core::listing::ListQuery;
use mcm_core::manager::{Backoffice, DocumentRow};
use mcm_core::stats::{Statistics, StatsIssue};

use super::print_footer;
use crate::cli::{ListArgs, TargetArgs};

#[derive(Debug, Subcommand)]
pub enum DocCommand {
    /// List documents with read statistics (sort: title, created, percentage).
    List {
        #[command(flatten)]
        list: ListArgs,
    },

    /// Create an unpublished document.
    Add {
        title: String,
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Change a document's title and audience.
    Edit {
        id: DocumentId,
        title: String,
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Make a document visible to its audience.
    Publish { id: DocumentId },

    /// Hide a document.
    Unpublish { id: DocumentId },

    /// Delete a document and its access log.
    Remove { id: DocumentId },

    /// Show who read a document and who has not.
    Stats { id: DocumentId },

    /// Record that a member opened a document.
    Open {
        id: DocumentId,
        #[arg(long)]
        member: MemberId,
    },
}

pub async fn run_doc(office: &Backoffice, cfg: &McmConfig, cmd: DocCommand) -> Result<()> {
    let docs = office.documents();
    let query = ListQuery::with_page_size(cfg.page_size);
    let page = match cmd {
        DocCommand::List { list } => docs.load(&list.to_query(cfg)).await?,
        DocCommand::Add { title, target } => {
            let new = NewDocument {
                title,
                targeting: target.to_targeting()?,
            };
            let (id, page) = docs.create(&new, &query).await?;
            println!("Added document {id}");
            page
        }
        DocCommand::Edit { id, title, target } => {
            let new = NewDocument {
                title,
                targeting: target.to_targeting()?,
            };
            docs.edit(id, &new, &query).await?
        }
        DocCommand::Publish { id } => docs.set_published(id, true, &query).await?,
        DocCommand::Unpublish { id } => docs.set_published(id, false, &query).await?,
        DocCommand::Remove { id } => docs.delete(id, &query).await?,
        DocCommand::Stats { id } => {
            let Some(row) = docs.stats(id).await? else {
                bail!("document {id} not found");
            };
            print_detail(&row);
            return Ok(());
        }
        DocCommand::Open { id, member } => {
            docs.record_access(id, member).await?;
            println!("Recorded access to document {id} by member {member}");
            return Ok(());
        }
    };

    println!(
        "{:<6} {:<30} {:<14} {:<10} {:>6} {:>6} {:>5}",
        "ID", "TITLE", "AUDIENCE", "STATUS", "READS", "RCPTS", "%"
    );
    for row in &page.items {
        let d = &row.document;
        println!(
            "{:<6} {:<30} {:<14} {:<10} {:>6} {:>6} {:>5}{}",
            d.id,
            d.title,
            d.targeting.to_string(),
            if d.published { "published" } else { "draft" },
            row.stats.total_accesses,
            row.stats.total_recipients,
            row.stats.percentage,
            issue_note(&row.stats)
        );
    }
    print_footer(&page);
    Ok(())
}

fn issue_note(stats: &Statistics) -> String {
    if !stats.is_degraded() {
        return String::new();
    }
    match &stats.issue {
        Some(StatsIssue::ResolveFailed(reason)) => format!("  (statistics unavailable: {reason})"),
        _ => "  (recipient no longer exists)".to_string(),
    }
}

fn print_detail(row: &DocumentRow) {
    let s = &row.stats;
    println!("{} [{}]", row.document.title, row.document.targeting);
    println!(
        "{} reads, {} recipients, {}%{}",
        s.total_accesses,
        s.total_recipients,
        s.percentage,
        issue_note(s)
    );
    println!("Read by:");
    for r in &s.accessed {
        println!("  {:<6} {}", r.id, r.name);
    }
    println!("Not read by:");
    for r in &s.not_accessed {
        println!("  {:<6} {}", r.id, r.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_note_only_for_degraded_statistics() {
        let clean = Statistics::default();
        assert!(!clean.is_degraded());
        assert_eq!(issue_note(&clean), "");

        let orphan = Statistics {
            issue: Some(StatsIssue::OrphanedRecipient),
            ..Statistics::default()
        };
        assert!(orphan.is_degraded());
        assert_eq!(issue_note(&orphan), "  (recipient no longer exists)");

        let failed = Statistics {
            issue: Some(StatsIssue::ResolveFailed("timeout".into())),
            ..Statistics::default()
        };
        assert_eq!(issue_note(&failed), "  (statistics unavailable: timeout)");
    }
}
