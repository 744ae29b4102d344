//! `mcm member ...` – members, status and roles.

use anyhow::Result;
use clap::Subcommand;
use mcm_core::club_db::{MemberId, NewMember};
use mcm_core::config::McmConfig;
use mcm_core::listing::{ListQuery, Page};
use mcm_core::manager::{Backoffice, MemberRow};

use super::{or_dash, print_footer};
use crate::cli::ListArgs;

#[derive(Debug, Subcommand)]
pub enum MemberCommand {
    /// List members (sort: name, joined, email).
    List {
        #[command(flatten)]
        list: ListArgs,
    },

    /// Register a new member.
    Add {
        first_name: String,
        last_name: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        /// Join date as unix seconds (default: now).
        #[arg(long)]
        joined_at: Option<i64>,
    },

    /// Replace a member's details.
    Edit {
        id: MemberId,
        first_name: String,
        last_name: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        joined_at: Option<i64>,
    },

    /// Mark a member active.
    Activate { id: MemberId },

    /// Mark a member inactive; they stop receiving broadcast and role targets.
    Deactivate { id: MemberId },

    /// Give a member a role.
    Grant { id: MemberId, role: String },

    /// Take a role away from a member.
    Revoke { id: MemberId, role: String },

    /// Delete a member with their roles and motorcycles.
    Remove { id: MemberId },
}

pub async fn run_member(office: &Backoffice, cfg: &McmConfig, cmd: MemberCommand) -> Result<()> {
    let members = office.members();
    let query = ListQuery::with_page_size(cfg.page_size);
    let page = match cmd {
        MemberCommand::List { list } => members.load(&list.to_query(cfg)).await?,
        MemberCommand::Add {
            first_name,
            last_name,
            email,
            phone,
            joined_at,
        } => {
            let new = NewMember {
                first_name,
                last_name,
                email,
                phone,
                joined_at,
            };
            let (id, page) = members.add(&new, &query).await?;
            println!("Added member {id}");
            page
        }
        MemberCommand::Edit {
            id,
            first_name,
            last_name,
            email,
            phone,
            joined_at,
        } => {
            let new = NewMember {
                first_name,
                last_name,
                email,
                phone,
                joined_at,
            };
            members.update(id, &new, &query).await?
        }
        MemberCommand::Activate { id } => members.set_active(id, true, &query).await?,
        MemberCommand::Deactivate { id } => members.set_active(id, false, &query).await?,
        MemberCommand::Grant { id, role } => members.assign_role(id, &role, &query).await?,
        MemberCommand::Revoke { id, role } => members.revoke_role(id, &role, &query).await?,
        MemberCommand::Remove { id } => members.remove(id, &query).await?,
    };
    print_members(&page);
    Ok(())
}

fn print_members(page: &Page<MemberRow>) {
    println!(
        "{:<6} {:<24} {:<28} {:<8} {:<6} {}",
        "ID", "NAME", "EMAIL", "STATUS", "BIKES", "ROLES"
    );
    for row in &page.items {
        let m = &row.member;
        println!(
            "{:<6} {:<24} {:<28} {:<8} {:<6} {}",
            m.id,
            m.full_name(),
            or_dash(m.email.as_deref()),
            if m.active { "active" } else { "inactive" },
            row.motorcycles,
            m.roles.join(",")
        );
    }
    print_footer(page);
}
