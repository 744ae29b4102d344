//! `mcm cash ...` – income and expense ledger.

use anyhow::Result;
use clap::{Subcommand, ValueEnum};
use mcm_core::club_db::{CashFlowId, CashFlowKind, NewCashFlow};
use mcm_core::config::McmConfig;
use mcm_core::listing::ListQuery;
use mcm_core::manager::Backoffice;

use super::{or_dash, print_footer};
use crate::cli::ListArgs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Income,
    Expense,
}

impl From<KindArg> for CashFlowKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Income => CashFlowKind::Income,
            KindArg::Expense => CashFlowKind::Expense,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CashCommand {
    /// List ledger entries (sort: date, amount).
    List {
        #[command(flatten)]
        list: ListArgs,
    },

    /// Record an income or expense entry.
    Add {
        #[arg(value_enum)]
        kind: KindArg,
        /// Amount such as `12.50`.
        #[arg(value_parser = parse_amount)]
        amount: i64,
        label: String,
        #[arg(long)]
        category: Option<String>,
        /// Date as unix seconds (default: now).
        #[arg(long)]
        at: Option<i64>,
    },

    /// Delete a ledger entry.
    Remove { id: CashFlowId },

    /// Income, expense and balance for a period `[from, to)`.
    Summary {
        #[arg(long)]
        from: Option<i64>,
        #[arg(long)]
        to: Option<i64>,
    },
}

/// Parse a positive decimal amount with at most two fraction digits into cents.
pub fn parse_amount(s: &str) -> Result<i64, String> {
    let s = s.trim();
    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    if whole.is_empty() || frac.len() > 2 {
        return Err(format!("invalid amount {s:?}, expected e.g. 12.50"));
    }
    if !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(format!("invalid amount {s:?}, expected e.g. 12.50"));
    }
    let whole: i64 = whole.parse().map_err(|e| format!("invalid amount {s:?}: {e}"))?;
    let frac: i64 = format!("{frac:0<2}")
        .parse()
        .map_err(|e| format!("invalid amount {s:?}: {e}"))?;
    whole
        .checked_mul(100)
        .and_then(|c| c.checked_add(frac))
        .ok_or_else(|| format!("amount {s:?} is too large"))
}

fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

pub async fn run_cash(office: &Backoffice, cfg: &McmConfig, cmd: CashCommand) -> Result<()> {
    let cash = office.cash_flow();
    let query = ListQuery::with_page_size(cfg.page_size);
    let page = match cmd {
        CashCommand::List { list } => cash.load(&list.to_query(cfg)).await?,
        CashCommand::Add {
            kind,
            amount,
            label,
            category,
            at,
        } => {
            let new = NewCashFlow {
                kind: kind.into(),
                amount_cents: amount,
                label,
                category,
                occurred_at: at,
            };
            let (id, page) = cash.record(&new, &query).await?;
            println!("Recorded entry {id}");
            page
        }
        CashCommand::Remove { id } => cash.remove(id, &query).await?,
        CashCommand::Summary { from, to } => {
            let totals = cash.summary(from, to).await?;
            println!("Income:  {:>12}", format_cents(totals.income_cents));
            println!("Expense: {:>12}", format_cents(totals.expense_cents));
            println!("Balance: {:>12}", format_cents(totals.balance_cents()));
            return Ok(());
        }
    };

    println!(
        "{:<6} {:<12} {:<8} {:>12} {:<14} {}",
        "ID", "DATE", "KIND", "AMOUNT", "CATEGORY", "LABEL"
    );
    for c in &page.items {
        println!(
            "{:<6} {:<12} {:<8} {:>12} {:<14} {}",
            c.id,
            c.occurred_at,
            c.kind.as_str(),
            format_cents(c.amount_cents),
            or_dash(c.category.as_deref()),
            c.label
        );
    }
    print_footer(&page);
    Ok(())
}
