//! SQLite-Implementierung des OrganisationRepository
//!
//! Die Mitgliederliste liegt als JSON-Array in der Spalte `members`.
//! Jedes Ersetzen erhoeht `version`; mit `erwartete_version` wird daraus ein
//! Compare-and-Set, das verlorene Updates bei parallelen Einladungen verhindert.

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{ist_unique_verletzung, DbError, DbResult};
use crate::models::{NeueOrganisation, OrganisationErsatz, OrganisationRecord, OrganisationsMitglied};
use crate::repository::OrganisationRepository;
use crate::sqlite::{pool::SqliteDb, zeit_parsen};

const SPALTEN: &str = "id, name, description, members, version, created_at, updated_at";

#[async_trait]
impl OrganisationRepository for SqliteDb {
    async fn create(&self, data: NeueOrganisation) -> DbResult<OrganisationRecord> {
        let id = data.id_oder_neu();
        let now = Utc::now();
        let now_str = now.to_rfc3339();
        let members_json = serde_json::to_string(&data.members)?;

        sqlx::query(
            "INSERT INTO organizations (id, name, description, members, version, created_at, updated_at)
             VALUES (?, ?, ?, ?, 1, ?, ?)",
        )
        .bind(&id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(&members_json)
        .bind(&now_str)
        .bind(&now_str)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if ist_unique_verletzung(&e) {
                DbError::Eindeutigkeit(format!("Organisation '{id}' existiert bereits"))
            } else {
                DbError::Sqlx(e)
            }
        })?;

        tracing::debug!(organisation_id = %id, "Organisation angelegt");

        Ok(OrganisationRecord {
            id,
            name: data.name,
            description: data.description,
            members: data.members,
            version: 1,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_id(&self, id: &str) -> DbResult<Option<OrganisationRecord>> {
        let sql = format!("SELECT {SPALTEN} FROM organizations WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_organisation(&r)).transpose()
    }

    async fn list(&self) -> DbResult<Vec<OrganisationRecord>> {
        let sql = format!("SELECT {SPALTEN} FROM organizations ORDER BY created_at, id");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter().map(row_to_organisation).collect()
    }

    async fn replace(&self, id: &str, data: OrganisationErsatz) -> DbResult<OrganisationRecord> {
        let members_json = serde_json::to_string(&data.members)?;
        let now_str = Utc::now().to_rfc3339();

        let affected = match data.erwartete_version {
            Some(version) => sqlx::query(
                "UPDATE organizations
                 SET name = ?, description = ?, members = ?, version = version + 1, updated_at = ?
                 WHERE id = ? AND version = ?",
            )
            .bind(&data.name)
            .bind(&data.description)
            .bind(&members_json)
            .bind(&now_str)
            .bind(id)
            .bind(version)
            .execute(&self.pool)
            .await?
            .rows_affected(),
            None => sqlx::query(
                "UPDATE organizations
                 SET name = ?, description = ?, members = ?, version = version + 1, updated_at = ?
                 WHERE id = ?",
            )
            .bind(&data.name)
            .bind(&data.description)
            .bind(&members_json)
            .bind(&now_str)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected(),
        };

        if affected == 0 {
            // Unterscheiden: existiert nicht vs. veraltete Version
            return match self.get_by_id(id).await? {
                None => Err(DbError::nicht_gefunden(format!("Organisation {id}"))),
                Some(aktuell) => Err(DbError::Konflikt(format!(
                    "Organisation {id}: erwartete Version {}, aktuell {}",
                    data.erwartete_version.unwrap_or_default(),
                    aktuell.version
                ))),
            };
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::intern("Organisation nach Update nicht gefunden"))
    }

    async fn delete(&self, id: &str) -> DbResult<bool> {
        let affected = sqlx::query("DELETE FROM organizations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }
}

fn row_to_organisation(row: &sqlx::sqlite::SqliteRow) -> DbResult<OrganisationRecord> {
    use sqlx::Row as _;

    let members_json: String = row.try_get("members")?;
    let members: Vec<OrganisationsMitglied> = serde_json::from_str(&members_json)
        .map_err(|e| DbError::UngueltigeDaten(format!("Mitgliederliste nicht lesbar: {e}")))?;

    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(OrganisationRecord {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        members,
        version: row.try_get("version")?,
        created_at: zeit_parsen("created_at", &created_at)?,
        updated_at: zeit_parsen("updated_at", &updated_at)?,
    })
}
