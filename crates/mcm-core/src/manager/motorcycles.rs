use anyhow::{bail, Result};

use crate::club_db::{Motorcycle, MotorcycleId, NewMotorcycle};
use crate::listing::{paginate, ListQuery, Page};

use super::Backoffice;

const SORT_KEYS: &[&str] = &["brand", "year", "owner"];

pub struct MotorcyclesManager<'a> {
    office: &'a Backoffice,
}

impl<'a> MotorcyclesManager<'a> {
    pub(crate) fn new(office: &'a Backoffice) -> Self {
        Self { office }
    }

    pub async fn load(&self, query: &ListQuery) -> Result<Page<Motorcycle>> {
        let db = self.office.db();
        let bikes = self
            .office
            .call("list motorcycles", move || db.list_motorcycles())
            .await?;
        let key = query.sort_key(SORT_KEYS, "brand");
        Ok(paginate(
            bikes,
            query,
            |m| {
                query.matches(
                    [m.brand.as_str(), m.model.as_str(), m.owner_name.as_str()]
                        .into_iter()
                        .chain(m.plate.as_deref()),
                )
            },
            |a, b| match key {
                "year" => a.year.cmp(&b.year),
                "owner" => a.owner_name.to_lowercase().cmp(&b.owner_name.to_lowercase()),
                _ => (a.brand.to_lowercase(), a.model.to_lowercase())
                    .cmp(&(b.brand.to_lowercase(), b.model.to_lowercase())),
            },
        ))
    }

    pub async fn add(
        &self,
        new: &NewMotorcycle,
        query: &ListQuery,
    ) -> Result<(MotorcycleId, Page<Motorcycle>)> {
        if new.brand.trim().is_empty() || new.model.trim().is_empty() {
            bail!("brand and model are required");
        }
        let db = self.office.db();
        let owner = new.member_id;
        if self.office.call("get member", move || db.get_member(owner)).await?.is_none() {
            bail!("member {owner} not found");
        }
        let id = db.add_motorcycle(new).await?;
        tracing::info!(motorcycle_id = id, member_id = owner, "motorcycle registered");
        Ok((id, self.load(query).await?))
    }

    pub async fn remove(&self, id: MotorcycleId, query: &ListQuery) -> Result<Page<Motorcycle>> {
        self.office.db().remove_motorcycle(id).await?;
        tracing::info!(motorcycle_id = id, "motorcycle removed");
        self.load(query).await
    }
}
