//! Members' motorcycles.

use sqlx::Row;

use crate::retry::RemoteResult;

use super::db::ClubDb;
use super::types::{Motorcycle, MotorcycleId, NewMotorcycle};

impl ClubDb {
    pub async fn add_motorcycle(&self, new: &NewMotorcycle) -> RemoteResult<MotorcycleId> {
        let id = sqlx::query(
            r#"
            INSERT INTO motorcycles (member_id, brand, model, year, plate)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(new.member_id)
        .bind(&new.brand)
        .bind(&new.model)
        .bind(new.year)
        .bind(&new.plate)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();
        Ok(id)
    }

    pub async fn remove_motorcycle(&self, id: MotorcycleId) -> RemoteResult<()> {
        sqlx::query("DELETE FROM motorcycles WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// All motorcycles with their owner's name.
    pub async fn list_motorcycles(&self) -> RemoteResult<Vec<Motorcycle>> {
        let rows = sqlx::query(
            r#"
            SELECT b.id, b.member_id, b.brand, b.model, b.year, b.plate,
                   m.first_name, m.last_name
            FROM motorcycles b
            JOIN members m ON m.id = b.member_id
            ORDER BY b.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let first: String = row.get("first_name");
            let last: String = row.get("last_name");
            out.push(Motorcycle {
                id: row.get("id"),
                member_id: row.get("member_id"),
                owner_name: format!("{first} {last}"),
                brand: row.get("brand"),
                model: row.get("model"),
                year: row.get("year"),
                plate: row.get("plate"),
            });
        }
        Ok(out)
    }
}
