//! SQLite-Backend-Implementierungen fuer alle Repository-Traits

pub mod organisations;
pub mod pool;
pub mod users;

pub use pool::SqliteDb;

use chrono::{DateTime, Utc};

use crate::error::{DbError, DbResult};

/// Parst einen RFC3339-Zeitstempel aus einer Spalte
pub(crate) fn zeit_parsen(feld: &str, wert: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(wert)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::intern(format!("Ungueltige {feld} '{wert}': {e}")))
}
