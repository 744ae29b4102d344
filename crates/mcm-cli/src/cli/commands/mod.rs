//! CLI command handlers, one file per command group.

mod bike;
mod cash;
mod doc;
mod event;
mod member;
mod poll;

use std::time::{SystemTime, UNIX_EPOCH};

use mcm_core::listing::Page;

pub use bike::{run_bike, BikeCommand};
pub use cash::{run_cash, CashCommand};
pub use doc::{run_doc, DocCommand};
pub use event::{run_agenda, run_event, EventCommand};
pub use member::{run_member, MemberCommand};
pub use poll::{run_poll, PollCommand};

pub(crate) fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Trailer printed under every list.
pub(crate) fn print_footer<T>(page: &Page<T>) {
    if page.total == 0 {
        println!("(nothing found)");
    } else {
        println!(
            "page {}/{} ({} total)",
            page.page,
            page.total_pages.max(1),
            page.total
        );
    }
}

pub(crate) fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}
