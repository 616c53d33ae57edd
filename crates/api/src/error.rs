//! Fehlertypen fuer die REST-API
//!
//! Jeder Fehler wird als `{"error": "<nachricht>"}` mit passendem Statuscode
//! ausgeliefert. Details interner Fehler landen nur im Log.

use axum::{
    extract::rejection::{FormRejection, JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pforte_auth::AuthError;
use thiserror::Error;

use crate::rest::middleware::fehler_antwort;

/// Alle moeglichen Fehler im API-Crate
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    UngueltigeEingabe(String),

    #[error("{0}")]
    NichtAuthentifiziert(String),

    #[error("{0}")]
    NichtGefunden(String),

    #[error("{0}")]
    Konflikt(String),

    #[error("Interner Fehler: {0}")]
    Intern(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// HTTP-Statuscode fuer REST-Fehler
    pub fn http_status(&self) -> u16 {
        match self {
            Self::UngueltigeEingabe(_) => 400,
            Self::NichtAuthentifiziert(_) => 401,
            Self::NichtGefunden(_) => 404,
            Self::Konflikt(_) => 409,
            Self::Intern(_) => 500,
        }
    }

    /// Nachricht fuer den Client
    pub fn oeffentliche_nachricht(&self) -> &str {
        match self {
            Self::UngueltigeEingabe(m)
            | Self::NichtAuthentifiziert(m)
            | Self::NichtGefunden(m)
            | Self::Konflikt(m) => m,
            Self::Intern(_) => "internal server error",
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::UngueltigeAnmeldedaten => {
                Self::NichtAuthentifiziert("invalid credentials".into())
            }
            AuthError::TokenUngueltig => Self::NichtAuthentifiziert("invalid token".into()),
            AuthError::TokenAbgelaufen => Self::NichtAuthentifiziert("token expired".into()),
            AuthError::UngueltigeEingabe(m) => Self::UngueltigeEingabe(m),
            AuthError::EmailVergeben(_) => Self::Konflikt("email already registered".into()),
            AuthError::BenutzerNichtGefunden(_) => Self::NichtGefunden("user not found".into()),
            AuthError::OrganisationNichtGefunden(_) => {
                Self::NichtGefunden("organization not found".into())
            }
            AuthError::OrganisationExistiert(_) => {
                Self::Konflikt("organization already exists".into())
            }
            AuthError::BereitsMitglied(_) => {
                Self::Konflikt("user is already a member of the organization".into())
            }
            AuthError::Konflikt(_) => {
                Self::Konflikt("organization was modified concurrently".into())
            }
            andere => Self::Intern(andere.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(r: JsonRejection) -> Self {
        Self::UngueltigeEingabe(r.body_text())
    }
}

impl From<FormRejection> for ApiError {
    fn from(r: FormRejection) -> Self {
        Self::UngueltigeEingabe(r.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if let Self::Intern(details) = &self {
            tracing::error!(fehler = %details, "Anfrage mit internem Fehler beendet");
        }

        fehler_antwort(status, self.oeffentliche_nachricht())
    }
}
