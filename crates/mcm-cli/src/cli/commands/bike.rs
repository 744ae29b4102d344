//! `mcm bike ...` – motorcycles owned by members.

use anyhow::Result;
use clap::Subcommand;
use mcm_core::club_db::{MemberId, MotorcycleId, NewMotorcycle};
use mcm_core::config::McmConfig;
use mcm_core::listing::ListQuery;
use mcm_core::manager::Backoffice;

use super::{or_dash, print_footer};
use crate::cli::ListArgs;

#[derive(Debug, Subcommand)]
pub enum BikeCommand {
    /// List motorcycles (sort: brand, year, owner).
    List {
        #[command(flatten)]
        list: ListArgs,
    },

    /// Register a motorcycle for a member.
    Add {
        member: MemberId,
        brand: String,
        model: String,
        #[arg(long)]
        year: Option<i64>,
        #[arg(long)]
        plate: Option<String>,
    },

    /// Remove a motorcycle.
    Remove { id: MotorcycleId },
}

pub async fn run_bike(office: &Backoffice, cfg: &McmConfig, cmd: BikeCommand) -> Result<()> {
    let bikes = office.motorcycles();
    let query = ListQuery::with_page_size(cfg.page_size);
    let page = match cmd {
        BikeCommand::List { list } => bikes.load(&list.to_query(cfg)).await?,
        BikeCommand::Add {
            member,
            brand,
            model,
            year,
            plate,
        } => {
            let new = NewMotorcycle {
                member_id: member,
                brand,
                model,
                year,
                plate,
            };
            let (id, page) = bikes.add(&new, &query).await?;
            println!("Added motorcycle {id}");
            page
        }
        BikeCommand::Remove { id } => bikes.remove(id, &query).await?,
    };

    println!(
        "{:<6} {:<14} {:<18} {:<6} {:<10} {}",
        "ID", "BRAND", "MODEL", "YEAR", "PLATE", "OWNER"
    );
    for b in &page.items {
        let year = b.year.map(|y| y.to_string()).unwrap_or_else(|| "-".to_string());
        println!(
            "{:<6} {:<14} {:<18} {:<6} {:<10} {}",
            b.id,
            b.brand,
            b.model,
            year,
            or_dash(b.plate.as_deref()),
            b.owner_name
        );
    }
    print_footer(&page);
    Ok(())
}
