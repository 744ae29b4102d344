use anyhow::{bail, Result};

use crate::club_db::{CashFlow, CashFlowId, CashFlowTotals, NewCashFlow};
use crate::listing::{paginate, ListQuery, Page};

use super::Backoffice;

const SORT_KEYS: &[&str] = &["date", "amount"];

pub struct CashFlowManager<'a> {
    office: &'a Backoffice,
}

impl<'a> CashFlowManager<'a> {
    pub(crate) fn new(office: &'a Backoffice) -> Self {
        Self { office }
    }

    pub async fn load(&self, query: &ListQuery) -> Result<Page<CashFlow>> {
        let db = self.office.db();
        let entries = self
            .office
            .call("list cash flow", move || db.list_cash_flows())
            .await?;
        let key = query.sort_key(SORT_KEYS, "date");
        Ok(paginate(
            entries,
            query,
            |c| {
                query.matches(
                    [c.label.as_str(), c.kind.as_str()]
                        .into_iter()
                        .chain(c.category.as_deref()),
                )
            },
            |a, b| match key {
                "amount" => a.amount_cents.cmp(&b.amount_cents),
                _ => a.occurred_at.cmp(&b.occurred_at).then(a.id.cmp(&b.id)),
            },
        ))
    }

    /// Income, expense and balance for `[from, to)`.
    pub async fn summary(&self, from: Option<i64>, to: Option<i64>) -> Result<CashFlowTotals> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                bail!("period start {from} is after its end {to}");
            }
        }
        let db = self.office.db();
        self.office
            .call("sum cash flow", move || db.cash_flow_totals(from, to))
            .await
    }

    pub async fn record(
        &self,
        new: &NewCashFlow,
        query: &ListQuery,
    ) -> Result<(CashFlowId, Page<CashFlow>)> {
        if new.amount_cents <= 0 {
            bail!("amount must be positive, got {} cents", new.amount_cents);
        }
        if new.label.trim().is_empty() {
            bail!("label must not be empty");
        }
        let id = self.office.db().add_cash_flow(new).await?;
        tracing::info!(
            cash_flow_id = id,
            kind = new.kind.as_str(),
            amount_cents = new.amount_cents,
            "cash flow recorded"
        );
        Ok((id, self.load(query).await?))
    }

    pub async fn remove(&self, id: CashFlowId, query: &ListQuery) -> Result<Page<CashFlow>> {
        self.office.db().remove_cash_flow(id).await?;
        tracing::info!(cash_flow_id = id, "cash flow removed");
        self.load(query).await
    }
}
