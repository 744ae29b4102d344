//! Who a document or poll is addressed to, and how that becomes a member set.
//!
//! [`RecipientResolver`] is the seam between statistics and the membership
//! store. `ClubDb` implements it with one query per descriptor;
//! [`MemberSnapshot`] loads the active roster once and answers every
//! descriptor from memory.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::club_db::{Member, MemberId};
use crate::retry::{RemoteError, RemoteResult};

/// Targeting mode of a parent record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Targeting {
    /// Every active member.
    Broadcast,
    /// Active members currently holding the role.
    Role(String),
    /// One named member.
    Individual(MemberId),
}

impl Targeting {
    pub fn mode(&self) -> &'static str {
        match self {
            Targeting::Broadcast => "broadcast",
            Targeting::Role(_) => "role",
            Targeting::Individual(_) => "individual",
        }
    }

    pub fn role(&self) -> Option<&str> {
        match self {
            Targeting::Role(r) => Some(r),
            _ => None,
        }
    }

    pub fn member_id(&self) -> Option<MemberId> {
        match self {
            Targeting::Individual(id) => Some(*id),
            _ => None,
        }
    }

    /// Rebuild from the three stored columns.
    pub fn from_columns(
        mode: &str,
        role: Option<String>,
        member_id: Option<MemberId>,
    ) -> RemoteResult<Self> {
        match (mode, role, member_id) {
            ("broadcast", _, _) => Ok(Targeting::Broadcast),
            ("role", Some(role), _) => Ok(Targeting::Role(role)),
            ("individual", _, Some(id)) => Ok(Targeting::Individual(id)),
            (mode, _, _) => Err(RemoteError::with_code(
                format!("invalid targeting: mode {mode} without its target"),
                "invalid_targeting",
            )),
        }
    }
}

impl std::fmt::Display for Targeting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Targeting::Broadcast => write!(f, "all members"),
            Targeting::Role(r) => write!(f, "role:{r}"),
            Targeting::Individual(id) => write!(f, "member:{id}"),
        }
    }
}

/// A resolved recipient: enough to list who has or has not engaged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Recipient {
    pub id: MemberId,
    pub name: String,
}

impl From<&Member> for Recipient {
    fn from(m: &Member) -> Self {
        Self {
            id: m.id,
            name: m.full_name(),
        }
    }
}

/// Resolves a targeting descriptor to the concrete eligible members.
///
/// For `Individual`, an empty result means the member no longer exists.
#[async_trait]
pub trait RecipientResolver: Send + Sync {
    async fn resolve(&self, targeting: &Targeting) -> RemoteResult<Vec<Recipient>>;
}

/// In-memory roster of active members, loaded with a single query.
///
/// Individual targets may point at inactive members, so those are looked up
/// among every member passed in, not just the active ones.
#[derive(Debug, Clone, Default)]
pub struct MemberSnapshot {
    active: Vec<Member>,
    by_id: HashMap<MemberId, Recipient>,
}

impl MemberSnapshot {
    pub fn new(members: Vec<Member>) -> Self {
        let by_id = members.iter().map(|m| (m.id, Recipient::from(m))).collect();
        let active = members.into_iter().filter(|m| m.active).collect();
        Self { active, by_id }
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    fn resolve_now(&self, targeting: &Targeting) -> Vec<Recipient> {
        match targeting {
            Targeting::Broadcast => self.active.iter().map(Recipient::from).collect(),
            Targeting::Role(role) => self
                .active
                .iter()
                .filter(|m| m.roles.iter().any(|r| r == role))
                .map(Recipient::from)
                .collect(),
            Targeting::Individual(id) => self.by_id.get(id).cloned().into_iter().collect(),
        }
    }
}

#[async_trait]
impl RecipientResolver for MemberSnapshot {
    async fn resolve(&self, targeting: &Targeting) -> RemoteResult<Vec<Recipient>> {
        Ok(self.resolve_now(targeting))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: MemberId, active: bool, roles: &[&str]) -> Member {
        Member {
            id,
            first_name: format!("Rider{id}"),
            last_name: "Test".to_string(),
            email: None,
            phone: None,
            active,
            joined_at: 0,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn snapshot_resolves_each_mode() {
        let snap = MemberSnapshot::new(vec![
            member(1, true, &["board"]),
            member(2, true, &[]),
            member(3, false, &["board"]),
        ]);
        assert_eq!(snap.active_count(), 2);

        let all = snap.resolve(&Targeting::Broadcast).await.unwrap();
        assert_eq!(all.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);

        let board = snap.resolve(&Targeting::Role("board".into())).await.unwrap();
        assert_eq!(board.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1]);

        let inactive = snap.resolve(&Targeting::Individual(3)).await.unwrap();
        assert_eq!(inactive.len(), 1);
        assert_eq!(inactive[0].name, "Rider3 Test");

        let orphan = snap.resolve(&Targeting::Individual(99)).await.unwrap();
        assert!(orphan.is_empty());
    }

    #[test]
    fn columns_roundtrip() {
        for t in [
            Targeting::Broadcast,
            Targeting::Role("treasurer".into()),
            Targeting::Individual(4),
        ] {
            let back =
                Targeting::from_columns(t.mode(), t.role().map(String::from), t.member_id())
                    .unwrap();
            assert_eq!(back, t);
        }
    }

    #[test]
    fn role_mode_without_role_is_invalid() {
        let err = Targeting::from_columns("role", None, None).unwrap_err();
        assert_eq!(err.code.as_deref(), Some("invalid_targeting"));
        assert!(Targeting::from_columns("everyone", None, None).is_err());
    }
}
