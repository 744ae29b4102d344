//! Cash-flow ledger.

use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::retry::{RemoteError, RemoteResult};

use super::db::{unix_timestamp, ClubDb};
use super::types::{CashFlow, CashFlowId, CashFlowKind, CashFlowTotals, NewCashFlow};

fn cash_flow_from_row(row: &SqliteRow) -> RemoteResult<CashFlow> {
    let kind: String = row.get("kind");
    let kind = CashFlowKind::from_str(&kind).ok_or_else(|| {
        RemoteError::with_code(format!("unknown cash-flow kind {kind:?}"), "invalid_payload")
    })?;
    Ok(CashFlow {
        id: row.get("id"),
        kind,
        amount_cents: row.get("amount_cents"),
        label: row.get("label"),
        category: row.get("category"),
        occurred_at: row.get("occurred_at"),
    })
}

impl ClubDb {
    pub async fn add_cash_flow(&self, new: &NewCashFlow) -> RemoteResult<CashFlowId> {
        let id = sqlx::query(
            r#"
            INSERT INTO cash_flows (kind, amount_cents, label, category, occurred_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(new.kind.as_str())
        .bind(new.amount_cents)
        .bind(&new.label)
        .bind(&new.category)
        .bind(new.occurred_at.unwrap_or_else(unix_timestamp))
        .execute(&self.pool)
        .await?
        .last_insert_rowid();
        Ok(id)
    }

    pub async fn remove_cash_flow(&self, id: CashFlowId) -> RemoteResult<()> {
        sqlx::query("DELETE FROM cash_flows WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// All entries, most recent first.
    pub async fn list_cash_flows(&self) -> RemoteResult<Vec<CashFlow>> {
        sqlx::query("SELECT * FROM cash_flows ORDER BY occurred_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(cash_flow_from_row)
            .collect()
    }

    /// Income and expense sums for entries in `[from, to)`; open bounds when `None`.
    pub async fn cash_flow_totals(
        &self,
        from: Option<i64>,
        to: Option<i64>,
    ) -> RemoteResult<CashFlowTotals> {
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN kind = 'income' THEN amount_cents END), 0) AS income,
                COALESCE(SUM(CASE WHEN kind = 'expense' THEN amount_cents END), 0) AS expense
            FROM cash_flows
            WHERE (?1 IS NULL OR occurred_at >= ?1)
              AND (?2 IS NULL OR occurred_at < ?2)
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;
        Ok(CashFlowTotals {
            income_cents: row.get("income"),
            expense_cents: row.get("expense"),
        })
    }
}
