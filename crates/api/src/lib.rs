//! pforte-api – REST-Schnittstelle fuer Pforte
//!
//! Oeffentliche Endpunkte fuer Registrierung, Anmeldung und Token-Erneuerung
//! sowie die (per Bearer-Token geschuetzten) Organisations-Endpunkte.

pub mod error;
pub mod rest;

pub use error::{ApiError, ApiResult};
pub use rest::{routes::api_router, ApiState, RestServer, RestServerKonfig};
