//! Organisations-Service
//!
//! CRUD auf Organisationen und Einladung bestehender Benutzer. Das Einladen
//! ist ein Read-Modify-Write; das Ersetzen ist an die gelesene Version
//! gebunden, parallele Aenderungen enden mit `AuthError::Konflikt`.

use std::sync::Arc;

use pforte_db::{
    models::{NeueOrganisation, OrganisationErsatz, OrganisationRecord, OrganisationsMitglied},
    repository::{OrganisationRepository, UserRepository},
    DbError,
};

use crate::{
    error::{AuthError, AuthResult},
    service::email_normalisieren,
};

/// Service fuer Organisationen und deren Mitgliederlisten
pub struct OrganisationService {
    org_repo: Arc<dyn OrganisationRepository>,
    user_repo: Arc<dyn UserRepository>,
}

impl OrganisationService {
    pub fn neu(
        org_repo: Arc<dyn OrganisationRepository>,
        user_repo: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            org_repo,
            user_repo,
        }
    }

    /// Legt eine Organisation an und gibt ihre ID zurueck
    pub async fn erstellen(&self, mut daten: NeueOrganisation) -> AuthResult<String> {
        if daten.name.trim().is_empty() {
            return Err(AuthError::eingabe("name is required"));
        }
        mitglieder_normalisieren(&mut daten.members);

        let vorgegebene_id = daten.id.clone();
        let org = self.org_repo.create(daten).await.map_err(|e| match e {
            e if e.ist_eindeutigkeit() => {
                AuthError::OrganisationExistiert(vorgegebene_id.unwrap_or_default())
            }
            other => AuthError::Datenbank(other),
        })?;

        tracing::info!(organisation_id = %org.id, name = %org.name, "Organisation erstellt");
        Ok(org.id)
    }

    pub async fn laden(&self, id: &str) -> AuthResult<OrganisationRecord> {
        self.org_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| AuthError::OrganisationNichtGefunden(id.to_string()))
    }

    /// Alle Organisationen, aelteste zuerst
    pub async fn alle_laden(&self) -> AuthResult<Vec<OrganisationRecord>> {
        Ok(self.org_repo.list().await?)
    }

    /// Ersetzt Name, Beschreibung und Mitgliederliste vollstaendig
    ///
    /// Mit `erwartete_version` wird nur ersetzt, wenn die gespeicherte Version
    /// noch uebereinstimmt.
    pub async fn aktualisieren(
        &self,
        id: &str,
        mut ersatz: OrganisationErsatz,
    ) -> AuthResult<OrganisationRecord> {
        if ersatz.name.trim().is_empty() {
            return Err(AuthError::eingabe("name is required"));
        }
        mitglieder_normalisieren(&mut ersatz.members);

        let org = self
            .org_repo
            .replace(id, ersatz)
            .await
            .map_err(|e| ersetzen_fehler(id, e))?;

        tracing::info!(organisation_id = %org.id, version = org.version, "Organisation aktualisiert");
        Ok(org)
    }

    /// Loescht eine Organisation; eine fehlende ID ist kein Fehler
    pub async fn loeschen(&self, id: &str) -> AuthResult<()> {
        let geloescht = self.org_repo.delete(id).await?;
        if geloescht {
            tracing::info!(organisation_id = %id, "Organisation geloescht");
        } else {
            tracing::debug!(organisation_id = %id, "Organisation zum Loeschen nicht vorhanden");
        }
        Ok(())
    }

    /// Laedt einen registrierten Benutzer als `"member"` in eine Organisation ein
    pub async fn mitglied_einladen(
        &self,
        org_id: &str,
        user_email: &str,
    ) -> AuthResult<OrganisationRecord> {
        let email = email_normalisieren(user_email);
        if email.is_empty() {
            return Err(AuthError::eingabe("user_email is required"));
        }

        let org = self.laden(org_id).await?;

        let benutzer = self
            .user_repo
            .get_by_email(&email)
            .await?
            .ok_or_else(|| AuthError::BenutzerNichtGefunden(email.clone()))?;

        if org.hat_mitglied(&benutzer.email) {
            return Err(AuthError::BereitsMitglied(benutzer.email));
        }

        let mut members = org.members;
        members.push(OrganisationsMitglied::mitglied(
            benutzer.name,
            benutzer.email.clone(),
        ));

        let aktualisiert = self
            .org_repo
            .replace(
                org_id,
                OrganisationErsatz {
                    name: org.name,
                    description: org.description,
                    members,
                    erwartete_version: Some(org.version),
                },
            )
            .await
            .map_err(|e| ersetzen_fehler(org_id, e))?;

        tracing::info!(
            organisation_id = %org_id,
            email = %benutzer.email,
            mitglieder = aktualisiert.members.len(),
            "Benutzer in Organisation eingeladen"
        );
        Ok(aktualisiert)
    }
}

fn mitglieder_normalisieren(mitglieder: &mut [OrganisationsMitglied]) {
    for m in mitglieder {
        m.email = email_normalisieren(&m.email);
    }
}

fn ersetzen_fehler(id: &str, e: DbError) -> AuthError {
    match e {
        DbError::NichtGefunden(_) => AuthError::OrganisationNichtGefunden(id.to_string()),
        DbError::Konflikt(msg) => {
            tracing::warn!(organisation_id = %id, "Versionskonflikt beim Ersetzen");
            AuthError::Konflikt(msg)
        }
        other => AuthError::Datenbank(other),
    }
}
