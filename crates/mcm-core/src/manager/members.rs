use anyhow::{bail, Result};

use crate::club_db::{Member, MemberId, NewMember};
use crate::listing::{paginate, ListQuery, Page};

use super::Backoffice;

const SORT_KEYS: &[&str] = &["name", "joined", "email"];

/// A member as listed in the admin table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRow {
    pub member: Member,
    pub motorcycles: i64,
}

pub struct MembersManager<'a> {
    office: &'a Backoffice,
}

impl<'a> MembersManager<'a> {
    pub(crate) fn new(office: &'a Backoffice) -> Self {
        Self { office }
    }

    pub async fn load(&self, query: &ListQuery) -> Result<Page<MemberRow>> {
        let db = self.office.db();
        let members = self.office.call("list members", move || db.list_members()).await?;
        let counts = self
            .office
            .call("count motorcycles", move || db.motorcycle_counts())
            .await?;

        let rows: Vec<MemberRow> = members
            .into_iter()
            .map(|member| MemberRow {
                motorcycles: counts.get(&member.id).copied().unwrap_or(0),
                member,
            })
            .collect();

        let key = query.sort_key(SORT_KEYS, "name");
        Ok(paginate(
            rows,
            query,
            |r| {
                let m = &r.member;
                query.matches(
                    [m.first_name.as_str(), m.last_name.as_str()]
                        .into_iter()
                        .chain(m.email.as_deref())
                        .chain(m.roles.iter().map(String::as_str)),
                )
            },
            |a, b| {
                let (a, b) = (&a.member, &b.member);
                match key {
                    "joined" => a.joined_at.cmp(&b.joined_at),
                    "email" => a.email.cmp(&b.email),
                    _ => (a.last_name.to_lowercase(), a.first_name.to_lowercase())
                        .cmp(&(b.last_name.to_lowercase(), b.first_name.to_lowercase())),
                }
            },
        ))
    }

    pub async fn add(
        &self,
        new: &NewMember,
        query: &ListQuery,
    ) -> Result<(MemberId, Page<MemberRow>)> {
        validate(new)?;
        let id = self.office.db().add_member(new).await?;
        tracing::info!(member_id = id, "member added");
        Ok((id, self.load(query).await?))
    }

    pub async fn update(
        &self,
        id: MemberId,
        new: &NewMember,
        query: &ListQuery,
    ) -> Result<Page<MemberRow>> {
        validate(new)?;
        self.office.db().update_member(id, new).await?;
        tracing::info!(member_id = id, "member updated");
        self.load(query).await
    }

    pub async fn set_active(
        &self,
        id: MemberId,
        active: bool,
        query: &ListQuery,
    ) -> Result<Page<MemberRow>> {
        self.office.db().set_member_active(id, active).await?;
        tracing::info!(member_id = id, active, "member status changed");
        self.load(query).await
    }

    pub async fn assign_role(
        &self,
        id: MemberId,
        role: &str,
        query: &ListQuery,
    ) -> Result<Page<MemberRow>> {
        let role = role.trim();
        if role.is_empty() {
            bail!("role name must not be empty");
        }
        self.ensure_exists(id).await?;
        self.office.db().assign_role(id, role).await?;
        tracing::info!(member_id = id, role, "role assigned");
        self.load(query).await
    }

    pub async fn revoke_role(
        &self,
        id: MemberId,
        role: &str,
        query: &ListQuery,
    ) -> Result<Page<MemberRow>> {
        self.office.db().revoke_role(id, role.trim()).await?;
        tracing::info!(member_id = id, role, "role revoked");
        self.load(query).await
    }

    pub async fn remove(&self, id: MemberId, query: &ListQuery) -> Result<Page<MemberRow>> {
        self.office.db().remove_member(id).await?;
        tracing::info!(member_id = id, "member removed");
        self.load(query).await
    }

    async fn ensure_exists(&self, id: MemberId) -> Result<()> {
        let db = self.office.db();
        if self.office.call("get member", move || db.get_member(id)).await?.is_none() {
            bail!("member {id} not found");
        }
        Ok(())
    }
}

fn validate(new: &NewMember) -> Result<()> {
    if new.first_name.trim().is_empty() || new.last_name.trim().is_empty() {
        bail!("first and last name are required");
    }
    Ok(())
}
