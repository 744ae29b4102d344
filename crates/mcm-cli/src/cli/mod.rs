//! CLI for the MCM club back-office.

mod commands;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use mcm_core::club_db::ClubDb;
use mcm_core::config::{self, McmConfig};
use mcm_core::listing::ListQuery;
use mcm_core::manager::Backoffice;
use mcm_core::targeting::Targeting;

pub use commands::{BikeCommand, CashCommand, DocCommand, EventCommand, MemberCommand, PollCommand};

/// Top-level CLI for the MCM club back-office.
#[derive(Debug, Parser)]
#[command(name = "mcm")]
#[command(about = "MCM: motorcycle club back-office", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Manage members, their status and roles.
    #[command(subcommand)]
    Member(MemberCommand),

    /// Manage members' motorcycles.
    #[command(subcommand)]
    Bike(BikeCommand),

    /// Manage agenda events.
    #[command(subcommand)]
    Event(EventCommand),

    /// Show the public agenda (published upcoming events).
    Agenda {
        /// Reference time as unix seconds (default: now).
        #[arg(long)]
        now: Option<i64>,
        /// Retry attempts for this call (default from config).
        #[arg(long)]
        retries: Option<u32>,
    },

    /// Manage documents and see who read them.
    #[command(subcommand)]
    Doc(DocCommand),

    /// Manage polls and record votes.
    #[command(subcommand)]
    Poll(PollCommand),

    /// Record and summarize club income and expenses.
    #[command(subcommand)]
    Cash(CashCommand),
}

/// Filtering, sorting and paging for list commands.
#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    /// Case-insensitive text filter.
    #[arg(long, short)]
    pub search: Option<String>,
    /// Sort key (depends on the list).
    #[arg(long)]
    pub sort: Option<String>,
    /// Reverse the sort order.
    #[arg(long)]
    pub desc: bool,
    /// Page number, starting at 1.
    #[arg(long, default_value = "1")]
    pub page: u32,
    /// Rows per page (default from config).
    #[arg(long)]
    pub per_page: Option<u32>,
}

impl ListArgs {
    pub fn to_query(&self, cfg: &McmConfig) -> ListQuery {
        ListQuery {
            search: self.search.clone(),
            sort: self.sort.clone(),
            descending: self.desc,
            page: self.page,
            per_page: self.per_page.unwrap_or(cfg.page_size),
        }
    }
}

/// Who a document or poll is meant for. Defaults to every active member.
#[derive(Debug, Clone, Default, Args)]
pub struct TargetArgs {
    /// Target active members holding this role.
    #[arg(long, conflicts_with = "member")]
    pub role: Option<String>,
    /// Target a single member by id.
    #[arg(long)]
    pub member: Option<i64>,
}

impl TargetArgs {
    pub fn to_targeting(&self) -> Result<Targeting> {
        match (&self.role, self.member) {
            (Some(_), Some(_)) => bail!("--role and --member are mutually exclusive"),
            (Some(role), None) if role.trim().is_empty() => bail!("--role must not be empty"),
            (Some(role), None) => Ok(Targeting::Role(role.trim().to_string())),
            (None, Some(id)) => Ok(Targeting::Individual(id)),
            (None, None) => Ok(Targeting::Broadcast),
        }
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        let db = match &cfg.database_path {
            Some(path) => ClubDb::open_at(path).await?,
            None => ClubDb::open_default().await?,
        };
        let office =
            Backoffice::new(db, cfg.retry_policy()?).with_orphan_policy(cfg.orphan_policy());

        match cli.command {
            CliCommand::Member(cmd) => commands::run_member(&office, &cfg, cmd).await?,
            CliCommand::Bike(cmd) => commands::run_bike(&office, &cfg, cmd).await?,
            CliCommand::Event(cmd) => commands::run_event(&office, &cfg, cmd).await?,
            CliCommand::Agenda { now, retries } => {
                commands::run_agenda(&office, now, retries).await?
            }
            CliCommand::Doc(cmd) => commands::run_doc(&office, &cfg, cmd).await?,
            CliCommand::Poll(cmd) => commands::run_poll(&office, &cfg, cmd).await?,
            CliCommand::Cash(cmd) => commands::run_cash(&office, &cfg, cmd).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
