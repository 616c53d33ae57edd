//! Fehlertypen fuer Auth- und Organisations-Flow

use thiserror::Error;

/// Alle moeglichen Fehler im Auth-Crate
#[derive(Debug, Error)]
pub enum AuthError {
    // --- Passwort ---
    #[error("Passwort-Hashing fehlgeschlagen: {0}")]
    PasswortHashing(String),

    // --- Authentifizierung ---
    /// Einheitlich fuer unbekannte E-Mail und falsches Passwort
    #[error("Ungueltige Anmeldedaten")]
    UngueltigeAnmeldedaten,

    // --- Tokens ---
    #[error("Token ungueltig")]
    TokenUngueltig,

    #[error("Token abgelaufen")]
    TokenAbgelaufen,

    #[error("Token konnte nicht signiert werden: {0}")]
    TokenSignieren(String),

    #[error("Ungueltige Token-Konfiguration: {0}")]
    Konfiguration(String),

    // --- Session-Cache ---
    #[error("Session-Cache-Fehler: {0}")]
    SessionCache(String),

    // --- Eingaben ---
    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),

    // --- Benutzer & Organisationen ---
    #[error("E-Mail bereits registriert: {0}")]
    EmailVergeben(String),

    #[error("Benutzer nicht gefunden: {0}")]
    BenutzerNichtGefunden(String),

    #[error("Organisation nicht gefunden: {0}")]
    OrganisationNichtGefunden(String),

    #[error("Organisation existiert bereits: {0}")]
    OrganisationExistiert(String),

    #[error("Benutzer ist bereits Mitglied: {0}")]
    BereitsMitglied(String),

    #[error("Gleichzeitige Aenderung: {0}")]
    Konflikt(String),

    // --- Datenbank ---
    #[error("Datenbankfehler: {0}")]
    Datenbank(#[from] pforte_db::DbError),

    // --- Intern ---
    #[error("Interner Fehler: {0}")]
    Intern(String),
}

impl AuthError {
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    pub fn eingabe(msg: impl Into<String>) -> Self {
        Self::UngueltigeEingabe(msg.into())
    }
}

/// Result-Alias fuer das Auth-Crate
pub type AuthResult<T> = Result<T, AuthError>;
