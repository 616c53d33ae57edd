//! Repository-Trait-Definitionen
//!
//! Das Repository-Pattern entkoppelt die Geschaeftslogik von der konkreten
//! Datenbank-Implementierung. Auth- und Organisations-Flow halten die
//! Repositories als `Arc<dyn ...>`, Tests koennen eigene Fakes einsetzen.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::{
    BenutzerRecord, NeueOrganisation, NeuerBenutzer, OrganisationErsatz, OrganisationRecord,
};

/// Konfiguration fuer die Datenbankverbindung
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Verbindungs-URL (z.B. "sqlite://pforte.db")
    pub url: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen im Pool
    pub max_verbindungen: u32,
    /// Ob WAL-Modus bei SQLite aktiviert werden soll
    pub sqlite_wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://pforte.db".into(),
            max_verbindungen: 5,
            sqlite_wal: true,
        }
    }
}

/// Repository fuer Benutzer-Datenzugriffe
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Legt einen Benutzer an. Doppelte E-Mail -> `DbError::Eindeutigkeit`
    async fn create(&self, data: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord>;

    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<BenutzerRecord>>;

    async fn get_by_email(&self, email: &str) -> DbResult<Option<BenutzerRecord>>;
}

/// Repository fuer Organisations-Datenzugriffe
#[async_trait]
pub trait OrganisationRepository: Send + Sync {
    /// Legt eine Organisation an. Vergebene ID -> `DbError::Eindeutigkeit`
    async fn create(&self, data: NeueOrganisation) -> DbResult<OrganisationRecord>;

    async fn get_by_id(&self, id: &str) -> DbResult<Option<OrganisationRecord>>;

    /// Alle Organisationen, aelteste zuerst
    async fn list(&self) -> DbResult<Vec<OrganisationRecord>>;

    /// Ersetzt alle Felder einer Organisation
    ///
    /// - `DbError::NichtGefunden` wenn die ID nicht existiert
    /// - `DbError::Konflikt` wenn `erwartete_version` nicht passt
    async fn replace(&self, id: &str, data: OrganisationErsatz) -> DbResult<OrganisationRecord>;

    /// Loescht eine Organisation. Gibt `true` zurueck wenn etwas geloescht wurde.
    async fn delete(&self, id: &str) -> DbResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_config_standard() {
        let cfg = DatabaseConfig::default();
        assert!(cfg.sqlite_wal);
        assert_eq!(cfg.max_verbindungen, 5);
        assert!(cfg.url.starts_with("sqlite://"));
    }
}
