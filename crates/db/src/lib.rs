//! pforte-db – Credential-Store
//!
//! Stellt das Repository-Pattern fuer Benutzer und Organisationen bereit.
//! Die Geschaeftslogik arbeitet ausschliesslich gegen die Traits in
//! [`repository`]; [`SqliteDb`] ist die Standard-Implementierung.

pub mod error;
pub mod models;
pub mod repository;
pub mod sqlite;

pub use error::{DbError, DbResult};
pub use repository::{DatabaseConfig, OrganisationRepository, UserRepository};
pub use sqlite::SqliteDb;
