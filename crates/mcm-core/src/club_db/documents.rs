//! Document operations and the batched access-log source.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};

use crate::retry::{RemoteError, RemoteResult};
use crate::stats::{AccessRow, AccessSource, ParentId};
use crate::targeting::Targeting;

use super::db::{unix_timestamp, ClubDb};
use super::types::{Document, DocumentId, MemberId, NewDocument};

pub(crate) fn targeting_from_row(row: &SqliteRow) -> RemoteResult<Targeting> {
    let mode: String = row.get("target_mode");
    Targeting::from_columns(&mode, row.get("target_role"), row.get("target_member_id"))
}

fn document_from_row(row: &SqliteRow) -> RemoteResult<Document> {
    Ok(Document {
        id: row.get("id"),
        title: row.get("title"),
        targeting: targeting_from_row(row)?,
        published: row.get("published"),
        created_at: row.get("created_at"),
    })
}

impl ClubDb {
    /// Insert an unpublished document.
    pub async fn add_document(&self, new: &NewDocument) -> RemoteResult<DocumentId> {
        let id = sqlx::query(
            r#"
            INSERT INTO documents (
                title, target_mode, target_role, target_member_id, published, created_at
            ) VALUES (?1, ?2, ?3, ?4, 0, ?5)
            "#,
        )
        .bind(&new.title)
        .bind(new.targeting.mode())
        .bind(new.targeting.role())
        .bind(new.targeting.member_id())
        .bind(unix_timestamp())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();
        Ok(id)
    }

    pub async fn update_document(&self, id: DocumentId, new: &NewDocument) -> RemoteResult<()> {
        let done = sqlx::query(
            r#"
            UPDATE documents
            SET title = ?1,
                target_mode = ?2,
                target_role = ?3,
                target_member_id = ?4
            WHERE id = ?5
            "#,
        )
        .bind(&new.title)
        .bind(new.targeting.mode())
        .bind(new.targeting.role())
        .bind(new.targeting.member_id())
        .bind(id)
        .execute(&self.pool)
        .await?;
        if done.rows_affected() == 0 {
            return Err(RemoteError::not_found("document", id));
        }
        Ok(())
    }

    pub async fn set_document_published(
        &self,
        id: DocumentId,
        published: bool,
    ) -> RemoteResult<()> {
        let done = sqlx::query("UPDATE documents SET published = ?1 WHERE id = ?2")
            .bind(published)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(RemoteError::not_found("document", id));
        }
        Ok(())
    }

    /// Delete a document and its access log.
    pub async fn remove_document(&self, id: DocumentId) -> RemoteResult<()> {
        sqlx::query("DELETE FROM documents WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_document(&self, id: DocumentId) -> RemoteResult<Option<Document>> {
        sqlx::query("SELECT * FROM documents WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(document_from_row)
            .transpose()
    }

    /// All documents, newest first.
    pub async fn list_documents(&self) -> RemoteResult<Vec<Document>> {
        sqlx::query("SELECT * FROM documents ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(document_from_row)
            .collect()
    }

    /// Log that a member opened a document.
    pub async fn record_access(
        &self,
        document_id: DocumentId,
        member_id: MemberId,
    ) -> RemoteResult<i64> {
        let id = sqlx::query(
            r#"
            INSERT INTO document_access (document_id, member_id, accessed_at)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(document_id)
        .bind(member_id)
        .bind(unix_timestamp())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();
        Ok(id)
    }

    /// Access-log rows for every listed document, in one query.
    pub async fn document_access_rows(
        &self,
        documents: &[DocumentId],
    ) -> RemoteResult<Vec<AccessRow>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT a.document_id AS parent_id, a.member_id, a.accessed_at AS at,
                   m.first_name, m.last_name
            FROM document_access a
            JOIN members m ON m.id = a.member_id
            WHERE a.document_id IN (
            "#,
        );
        push_ids(&mut qb, documents);
        qb.push(") ORDER BY a.accessed_at, a.id");
        let rows = qb.build().fetch_all(&self.pool).await?;
        Ok(rows.iter().map(access_row).collect())
    }
}

pub(crate) fn push_ids(qb: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) {
    let mut sep = qb.separated(", ");
    for id in ids {
        sep.push_bind(*id);
    }
}

pub(crate) fn access_row(row: &SqliteRow) -> AccessRow {
    let first: String = row.get("first_name");
    let last: String = row.get("last_name");
    AccessRow {
        parent_id: row.get("parent_id"),
        member_id: row.get("member_id"),
        member_name: format!("{first} {last}"),
        at: row.get("at"),
    }
}

/// Document access logs as an [`AccessSource`].
pub struct DocumentAccessLog<'a>(pub &'a ClubDb);

#[async_trait]
impl AccessSource for DocumentAccessLog<'_> {
    async fn access_rows(&self, parents: &[ParentId]) -> RemoteResult<Vec<AccessRow>> {
        self.0.document_access_rows(parents).await
    }
}
