//! Datenbankmodelle fuer Pforte
//!
//! Diese Typen repraesentieren Datensaetze aus dem Credential-Store.
//! Organisationen werden mit ihren Wire-Feldnamen serialisiert, damit die
//! REST-Schicht sie direkt ausliefern kann.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Zugriffsstufe, die eine Einladung vergibt
pub const ZUGRIFF_MITGLIED: &str = "member";

// ---------------------------------------------------------------------------
// Benutzer
// ---------------------------------------------------------------------------

/// Benutzer-Datensatz aus der Datenbank
///
/// `password_hash` ist immer ein PHC-String, nie das Klartext-Passwort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenutzerRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Daten zum Erstellen eines neuen Benutzers
#[derive(Debug, Clone)]
pub struct NeuerBenutzer<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}

// ---------------------------------------------------------------------------
// Organisationen
// ---------------------------------------------------------------------------

/// Mitglied einer Organisation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganisationsMitglied {
    pub name: String,
    pub email: String,
    pub access_level: String,
}

impl OrganisationsMitglied {
    /// Erstellt ein Mitglied mit der Zugriffsstufe "member"
    pub fn mitglied(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            access_level: ZUGRIFF_MITGLIED.to_string(),
        }
    }
}

/// Organisations-Datensatz aus der Datenbank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganisationRecord {
    #[serde(rename = "organization_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "organization_members")]
    pub members: Vec<OrganisationsMitglied>,
    /// Optimistischer Nebenlaeufigkeits-Token, jedes Ersetzen erhoeht ihn
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrganisationRecord {
    /// Prueft ob eine E-Mail bereits Mitglied ist (ohne Gross-/Kleinschreibung)
    pub fn hat_mitglied(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.members
            .iter()
            .any(|m| m.email.trim().to_lowercase() == email)
    }
}

/// Daten zum Erstellen einer neuen Organisation
#[derive(Debug, Clone, Default)]
pub struct NeueOrganisation {
    /// Vom Client vorgegebene ID; `None` = Store vergibt eine UUID
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub members: Vec<OrganisationsMitglied>,
}

impl NeueOrganisation {
    /// Gibt die zu verwendende ID zurueck (vorgegeben oder neu generiert)
    pub fn id_oder_neu(&self) -> String {
        match self.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => Uuid::new_v4().to_string(),
        }
    }
}

/// Vollstaendiger Ersatz aller Organisations-Felder
#[derive(Debug, Clone, Default)]
pub struct OrganisationErsatz {
    pub name: String,
    pub description: String,
    pub members: Vec<OrganisationsMitglied>,
    /// Erwartete Version; `None` = bedingungsloses Ersetzen
    pub erwartete_version: Option<i64>,
}
