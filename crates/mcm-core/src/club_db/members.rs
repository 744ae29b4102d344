//! Member and role operations, and the per-query recipient resolver.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::retry::{RemoteError, RemoteResult};
use crate::targeting::{Recipient, RecipientResolver, Targeting};

use super::db::{unix_timestamp, ClubDb};
use super::types::{Member, MemberId, NewMember};

fn member_from_row(row: &SqliteRow) -> Member {
    Member {
        id: row.get("id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        phone: row.get("phone"),
        active: row.get("active"),
        joined_at: row.get("joined_at"),
        roles: Vec::new(),
    }
}

impl ClubDb {
    pub async fn add_member(&self, new: &NewMember) -> RemoteResult<MemberId> {
        let joined_at = new.joined_at.unwrap_or_else(unix_timestamp);
        let id = sqlx::query(
            r#"
            INSERT INTO members (first_name, last_name, email, phone, active, joined_at)
            VALUES (?1, ?2, ?3, ?4, 1, ?5)
            "#,
        )
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(joined_at)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();
        Ok(id)
    }

    /// Overwrite the editable fields of a member.
    pub async fn update_member(&self, id: MemberId, new: &NewMember) -> RemoteResult<()> {
        let done = sqlx::query(
            r#"
            UPDATE members
            SET first_name = ?1,
                last_name = ?2,
                email = ?3,
                phone = ?4,
                joined_at = COALESCE(?5, joined_at)
            WHERE id = ?6
            "#,
        )
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(new.joined_at)
        .bind(id)
        .execute(&self.pool)
        .await?;
        if done.rows_affected() == 0 {
            return Err(RemoteError::not_found("member", id));
        }
        Ok(())
    }

    pub async fn set_member_active(&self, id: MemberId, active: bool) -> RemoteResult<()> {
        let done = sqlx::query("UPDATE members SET active = ?1 WHERE id = ?2")
            .bind(active)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(RemoteError::not_found("member", id));
        }
        Ok(())
    }

    /// Delete a member; roles, motorcycles, access logs and votes cascade.
    pub async fn remove_member(&self, id: MemberId) -> RemoteResult<()> {
        sqlx::query("DELETE FROM members WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn assign_role(&self, id: MemberId, role: &str) -> RemoteResult<()> {
        sqlx::query("INSERT OR IGNORE INTO member_roles (member_id, role) VALUES (?1, ?2)")
            .bind(id)
            .bind(role)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn revoke_role(&self, id: MemberId, role: &str) -> RemoteResult<()> {
        sqlx::query("DELETE FROM member_roles WHERE member_id = ?1 AND role = ?2")
            .bind(id)
            .bind(role)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_member(&self, id: MemberId) -> RemoteResult<Option<Member>> {
        let row = sqlx::query("SELECT * FROM members WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let mut member = member_from_row(&row);
        member.roles = sqlx::query("SELECT role FROM member_roles WHERE member_id = ?1 ORDER BY role")
            .bind(id)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|r| r.get("role"))
            .collect();
        Ok(Some(member))
    }

    /// All members with their roles, ordered by id.
    pub async fn list_members(&self) -> RemoteResult<Vec<Member>> {
        let mut members: Vec<Member> = sqlx::query("SELECT * FROM members ORDER BY id")
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(member_from_row)
            .collect();

        let mut roles: HashMap<MemberId, Vec<String>> = HashMap::new();
        for row in sqlx::query("SELECT member_id, role FROM member_roles ORDER BY role")
            .fetch_all(&self.pool)
            .await?
        {
            roles
                .entry(row.get("member_id"))
                .or_default()
                .push(row.get("role"));
        }
        for m in &mut members {
            m.roles = roles.remove(&m.id).unwrap_or_default();
        }
        Ok(members)
    }

    /// Number of motorcycles registered per member.
    pub async fn motorcycle_counts(&self) -> RemoteResult<HashMap<MemberId, i64>> {
        let rows = sqlx::query("SELECT member_id, COUNT(*) AS n FROM motorcycles GROUP BY member_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|r| (r.get("member_id"), r.get("n")))
            .collect())
    }
}

fn recipients(rows: Vec<SqliteRow>) -> Vec<Recipient> {
    rows.iter()
        .map(|r| {
            let first: String = r.get("first_name");
            let last: String = r.get("last_name");
            Recipient {
                id: r.get("id"),
                name: format!("{first} {last}"),
            }
        })
        .collect()
}

/// One query per descriptor. Prefer `MemberSnapshot` when resolving many.
#[async_trait]
impl RecipientResolver for ClubDb {
    async fn resolve(&self, targeting: &Targeting) -> RemoteResult<Vec<Recipient>> {
        let rows = match targeting {
            Targeting::Broadcast => {
                sqlx::query("SELECT id, first_name, last_name FROM members WHERE active = 1 ORDER BY id")
                    .fetch_all(&self.pool)
                    .await?
            }
            Targeting::Role(role) => {
                sqlx::query(
                    r#"
                    SELECT m.id, m.first_name, m.last_name
                    FROM members m
                    JOIN member_roles r ON r.member_id = m.id
                    WHERE m.active = 1 AND r.role = ?1
                    ORDER BY m.id
                    "#,
                )
                .bind(role)
                .fetch_all(&self.pool)
                .await?
            }
            Targeting::Individual(id) => {
                sqlx::query("SELECT id, first_name, last_name FROM members WHERE id = ?1")
                    .bind(id)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(recipients(rows))
    }
}
