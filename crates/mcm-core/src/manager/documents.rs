use anyhow::{bail, Result};

use crate::club_db::{Document, DocumentAccessLog, DocumentId, MemberId, NewDocument};
use crate::listing::{paginate, ListQuery, Page};
use crate::stats::{ParentRecord, Statistics};
use crate::targeting::RecipientResolver;

use super::Backoffice;

const SORT_KEYS: &[&str] = &["title", "created", "percentage"];

/// A document with its read statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRow {
    pub document: Document,
    pub stats: Statistics,
}

pub struct DocumentsManager<'a> {
    office: &'a Backoffice,
}

impl<'a> DocumentsManager<'a> {
    pub(crate) fn new(office: &'a Backoffice) -> Self {
        Self { office }
    }

    /// One page of documents with statistics.
    ///
    /// Statistics are only computed for the visible page unless the view is
    /// sorted by read percentage.
    pub async fn load(&self, query: &ListQuery) -> Result<Page<DocumentRow>> {
        let db = self.office.db();
        let documents = self
            .office
            .call("list documents", move || db.list_documents())
            .await?;

        let key = query.sort_key(SORT_KEYS, "created");
        let filter = |d: &Document| query.matches([d.title.as_str()]);
        let by_field = |a: &Document, b: &Document| match key {
            "title" => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            _ => a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)),
        };

        if key == "percentage" {
            let rows = self.with_stats(documents).await?;
            return Ok(paginate(
                rows,
                query,
                |r| filter(&r.document),
                |a, b| {
                    a.stats
                        .percentage
                        .cmp(&b.stats.percentage)
                        .then_with(|| by_field(&a.document, &b.document))
                },
            ));
        }

        let Page {
            items,
            page,
            per_page,
            total,
            total_pages,
        } = paginate(documents, query, |d| filter(d), by_field);
        Ok(Page {
            items: self.with_stats(items).await?,
            page,
            per_page,
            total,
            total_pages,
        })
    }

    /// Detail view for one document: who read it and who has not.
    pub async fn stats(&self, id: DocumentId) -> Result<Option<DocumentRow>> {
        let db = self.office.db();
        let Some(document) = self
            .office
            .call("get document", move || db.get_document(id))
            .await?
        else {
            return Ok(None);
        };
        Ok(self.with_stats(vec![document]).await?.into_iter().next())
    }

    pub async fn create(
        &self,
        new: &NewDocument,
        query: &ListQuery,
    ) -> Result<(DocumentId, Page<DocumentRow>)> {
        validate(new)?;
        let id = self.office.db().add_document(new).await?;
        tracing::info!(document_id = id, targeting = %new.targeting, "document created");
        Ok((id, self.load(query).await?))
    }

    pub async fn edit(
        &self,
        id: DocumentId,
        new: &NewDocument,
        query: &ListQuery,
    ) -> Result<Page<DocumentRow>> {
        validate(new)?;
        self.office.db().update_document(id, new).await?;
        tracing::info!(document_id = id, "document edited");
        self.load(query).await
    }

    pub async fn set_published(
        &self,
        id: DocumentId,
        published: bool,
        query: &ListQuery,
    ) -> Result<Page<DocumentRow>> {
        self.office.db().set_document_published(id, published).await?;
        tracing::info!(document_id = id, published, "document visibility changed");
        self.load(query).await
    }

    pub async fn delete(&self, id: DocumentId, query: &ListQuery) -> Result<Page<DocumentRow>> {
        self.office.db().remove_document(id).await?;
        tracing::info!(document_id = id, "document deleted");
        self.load(query).await
    }

    /// Log that `member` opened `id`.
    ///
    /// The document must be published and `member` must be one of its recipients.
    pub async fn record_access(&self, id: DocumentId, member: MemberId) -> Result<()> {
        let db = self.office.db();
        let Some(document) = self
            .office
            .call("get document", move || db.get_document(id))
            .await?
        else {
            bail!("document {id} not found");
        };
        if !document.published {
            bail!("document {id} is not published");
        }
        let targeting = &document.targeting;
        let readers = self
            .office
            .call("resolve readers", move || db.resolve(targeting))
            .await?;
        if !readers.iter().any(|r| r.id == member) {
            bail!("member {member} is not a recipient of document {id}");
        }
        db.record_access(id, member).await?;
        tracing::debug!(document_id = id, member_id = member, "document access recorded");
        Ok(())
    }

    async fn with_stats(&self, documents: Vec<Document>) -> Result<Vec<DocumentRow>> {
        let parents: Vec<ParentRecord> = documents
            .iter()
            .map(|d| ParentRecord {
                id: d.id,
                targeting: d.targeting.clone(),
            })
            .collect();
        let mut stats = self
            .office
            .statistics(&parents, &DocumentAccessLog(self.office.db()))
            .await?;
        Ok(documents
            .into_iter()
            .map(|document| DocumentRow {
                stats: stats.remove(&document.id).unwrap_or_default(),
                document,
            })
            .collect())
    }
}

fn validate(new: &NewDocument) -> Result<()> {
    if new.title.trim().is_empty() {
        bail!("document title must not be empty");
    }
    Ok(())
}
