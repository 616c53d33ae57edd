//! pforte-auth – Token-Aussteller, Auth-Flow und Organisations-Flow
//!
//! Dieses Crate implementiert:
//! - Passwort-Hashing mit Argon2id
//! - Signierte Access- und Refresh-Tokens (HS256, Schluesselrotation)
//! - Session-Cache fuer Refresh-Tokens (Redis oder in-memory mit TTL)
//! - AuthService (Registrierung, Anmeldung, Token-Erneuerung)
//! - OrganisationService (CRUD, Einladungen mit Versionspruefung)

pub mod error;
pub mod organisation_service;
pub mod password;
pub mod service;
pub mod session;
pub mod token;

// Bequeme Re-Exporte
pub use error::{AuthError, AuthResult};
pub use organisation_service::OrganisationService;
pub use password::{passwort_hashen, passwort_verifizieren};
pub use service::{email_normalisieren, AuthEinstellungen, AuthService};
pub use session::{RedisSessionCache, SessionCache, SpeicherSessionCache, STANDARD_SESSION_TTL};
pub use token::{Claims, JwtAussteller, JwtKonfig, TokenArt, TokenPaar};
