//! Auth-Service fuer Pforte
//!
//! Zentraler Service fuer Registrierung, Anmeldung und Token-Erneuerung.
//! Credential-Store, Session-Cache und Token-Aussteller werden beim Erstellen
//! injiziert.

use std::{sync::Arc, time::Duration};

use pforte_db::{
    models::{BenutzerRecord, NeuerBenutzer},
    repository::UserRepository,
};

use crate::{
    error::{AuthError, AuthResult},
    password::{passwort_hashen_async, passwort_verifizieren_async, vergleichs_verifikation_async},
    session::{SessionCache, STANDARD_SESSION_TTL},
    token::{Claims, JwtAussteller, TokenArt, TokenPaar},
};

/// Verhalten des Auth-Flows, das ueber die Konfiguration steuerbar ist
#[derive(Debug, Clone)]
pub struct AuthEinstellungen {
    /// Lebensdauer des Refresh-Token-Eintrags im Session-Cache
    pub session_ttl: Duration,
    /// Refresh-Tokens muessen noch im Session-Cache liegen
    ///
    /// Ein Refresh-Token ist dann nur so lange nutzbar wie die kuerzere von
    /// Refresh-TTL und `session_ttl`.
    pub refresh_cache_pruefen: bool,
}

impl Default for AuthEinstellungen {
    fn default() -> Self {
        Self {
            session_ttl: STANDARD_SESSION_TTL,
            refresh_cache_pruefen: true,
        }
    }
}

/// Normalisiert eine E-Mail-Adresse fuer Speicherung und Suche
pub fn email_normalisieren(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Auth-Service – zentraler Einstiegspunkt fuer alle Authentifizierungsvorgaenge
pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    session_cache: Arc<dyn SessionCache>,
    aussteller: Arc<JwtAussteller>,
    einstellungen: AuthEinstellungen,
}

impl AuthService {
    /// Erstellt einen neuen AuthService
    pub fn neu(
        user_repo: Arc<dyn UserRepository>,
        session_cache: Arc<dyn SessionCache>,
        aussteller: Arc<JwtAussteller>,
        einstellungen: AuthEinstellungen,
    ) -> Self {
        Self {
            user_repo,
            session_cache,
            aussteller,
            einstellungen,
        }
    }

    /// Registriert einen neuen Benutzer
    ///
    /// Das Passwort wird vor dem Speichern mit Argon2id gehasht.
    pub async fn registrieren(
        &self,
        name: &str,
        email: &str,
        passwort: &str,
    ) -> AuthResult<BenutzerRecord> {
        let name = name.trim();
        let email = email_normalisieren(email);

        if name.is_empty() {
            return Err(AuthError::eingabe("name is required"));
        }
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::eingabe("email is invalid"));
        }
        if passwort.is_empty() {
            return Err(AuthError::eingabe("password is required"));
        }

        let passwort_hash = passwort_hashen_async(passwort.to_string()).await?;

        let benutzer = self
            .user_repo
            .create(NeuerBenutzer {
                name,
                email: &email,
                password_hash: &passwort_hash,
            })
            .await
            .map_err(|e| match e {
                e if e.ist_eindeutigkeit() => AuthError::EmailVergeben(email.clone()),
                other => AuthError::Datenbank(other),
            })?;

        tracing::info!(
            user_id = %benutzer.id,
            email = %benutzer.email,
            "Neuer Benutzer registriert"
        );

        Ok(benutzer)
    }

    /// Meldet einen Benutzer an
    ///
    /// Unbekannte E-Mail und falsches Passwort liefern denselben Fehler und
    /// durchlaufen beide eine Argon2-Verifikation.
    /// Bei Erfolg liegt das Refresh-Token anschliessend im Session-Cache.
    pub async fn anmelden(&self, email: &str, passwort: &str) -> AuthResult<TokenPaar> {
        let email = email_normalisieren(email);

        let Some(benutzer) = self.user_repo.get_by_email(&email).await? else {
            vergleichs_verifikation_async(passwort.to_string()).await?;
            tracing::warn!(email = %email, "Login-Versuch mit unbekannter E-Mail");
            return Err(AuthError::UngueltigeAnmeldedaten);
        };

        let korrekt =
            passwort_verifizieren_async(passwort.to_string(), benutzer.password_hash.clone())
                .await?;
        if !korrekt {
            tracing::warn!(email = %email, "Fehlgeschlagener Login-Versuch");
            return Err(AuthError::UngueltigeAnmeldedaten);
        }

        let paar = self
            .aussteller
            .token_paar_ausstellen(&benutzer.id.to_string())?;

        self.session_cache
            .refresh_token_speichern(&paar.refresh_token, &benutzer.email, self.einstellungen.session_ttl)
            .await?;

        tracing::info!(
            user_id = %benutzer.id,
            email = %benutzer.email,
            "Benutzer angemeldet"
        );

        Ok(paar)
    }

    /// Stellt ein neues Access-Token gegen ein Refresh-Token aus
    pub async fn token_erneuern(&self, refresh_token: &str) -> AuthResult<String> {
        let refresh_token = refresh_token.trim();
        if refresh_token.is_empty() {
            return Err(AuthError::eingabe("refresh_token is required"));
        }

        if self.einstellungen.refresh_cache_pruefen
            && self
                .session_cache
                .refresh_token_laden(refresh_token)
                .await?
                .is_none()
        {
            tracing::debug!("Refresh-Token nicht (mehr) im Session-Cache");
            return Err(AuthError::TokenUngueltig);
        }

        let access_token = self.aussteller.erneuern(refresh_token)?;
        tracing::debug!("Access-Token erneuert");
        Ok(access_token)
    }

    /// Prueft ein Access-Token (fuer die Bearer-Middleware)
    ///
    /// Refresh-Tokens werden abgelehnt.
    pub fn zugriff_pruefen(&self, access_token: &str) -> AuthResult<Claims> {
        self.aussteller.verifizieren_als(access_token, TokenArt::Access)
    }
}
