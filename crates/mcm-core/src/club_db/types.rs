//! Row types stored in the club database.

use crate::targeting::Targeting;

pub type MemberId = i64;
pub type MotorcycleId = i64;
pub type EventId = i64;
pub type DocumentId = i64;
pub type PollId = i64;
pub type CashFlowId = i64;

/// Club member with the roles they currently hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: MemberId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub active: bool,
    pub joined_at: i64,
    pub roles: Vec<String>,
}

impl Member {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Fields supplied when creating or editing a member.
#[derive(Debug, Clone, Default)]
pub struct NewMember {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Defaults to now.
    pub joined_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Motorcycle {
    pub id: MotorcycleId,
    pub member_id: MemberId,
    pub owner_name: String,
    pub brand: String,
    pub model: String,
    pub year: Option<i64>,
    pub plate: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewMotorcycle {
    pub member_id: MemberId,
    pub brand: String,
    pub model: String,
    pub year: Option<i64>,
    pub plate: Option<String>,
}

/// Club ride, meeting or rally shown on the agenda.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub location: Option<String>,
    /// Unix seconds.
    pub starts_at: i64,
    pub description: Option<String>,
    pub published: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NewEvent {
    pub title: String,
    pub location: Option<String>,
    pub starts_at: i64,
    pub description: Option<String>,
}

/// Document shared with some or all members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    pub targeting: Targeting,
    pub published: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub title: String,
    pub targeting: Targeting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poll {
    pub id: PollId,
    pub question: String,
    pub options: Vec<String>,
    pub targeting: Targeting,
    pub open: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct NewPoll {
    pub question: String,
    pub options: Vec<String>,
    pub targeting: Targeting,
}

/// Direction of a cash-flow entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CashFlowKind {
    Income,
    Expense,
}

impl CashFlowKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CashFlowKind::Income => "income",
            CashFlowKind::Expense => "expense",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "income" => Some(CashFlowKind::Income),
            "expense" => Some(CashFlowKind::Expense),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CashFlow {
    pub id: CashFlowId,
    pub kind: CashFlowKind,
    /// Always positive; the sign comes from `kind`.
    pub amount_cents: i64,
    pub label: String,
    pub category: Option<String>,
    pub occurred_at: i64,
}

#[derive(Debug, Clone)]
pub struct NewCashFlow {
    pub kind: CashFlowKind,
    pub amount_cents: i64,
    pub label: String,
    pub category: Option<String>,
    /// Defaults to now.
    pub occurred_at: Option<i64>,
}

/// Income and expense totals over a period, in cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CashFlowTotals {
    pub income_cents: i64,
    pub expense_cents: i64,
}

impl CashFlowTotals {
    pub fn balance_cents(&self) -> i64 {
        self.income_cents - self.expense_cents
    }
}
