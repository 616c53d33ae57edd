//! SQLite-Pool fuer den Credential-Store
//!
//! Dateibasierte Datenbanken laufen standardmaessig im WAL-Modus. Eine
//! In-Memory-URL (`sqlite::memory:` oder `mode=memory`) wird auf genau eine
//! dauerhaft offene Verbindung begrenzt, sonst saehe jede weitere Verbindung
//! eine eigene, leere Datenbank.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{info, warn};

use crate::error::DbError;
use crate::repository::DatabaseConfig;

/// Wartezeit auf gesperrte Tabellen, bevor SQLite `SQLITE_BUSY` meldet
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const IN_MEMORY_URL: &str = "sqlite::memory:";

/// Wrapper um den SQLite Connection Pool
#[derive(Debug, Clone)]
pub struct SqliteDb {
    pub(crate) pool: SqlitePool,
}

fn ist_in_memory(url: &str) -> bool {
    url == IN_MEMORY_URL || url.contains(":memory:") || url.contains("mode=memory")
}

impl SqliteDb {
    /// Oeffnet den Pool laut Konfiguration und fuehrt Migrationen aus
    pub async fn oeffnen(config: &DatabaseConfig) -> Result<Self, DbError> {
        let url = config.url.trim();
        if config.max_verbindungen == 0 {
            return Err(DbError::UngueltigeDaten(
                "max_verbindungen muss mindestens 1 sein".into(),
            ));
        }

        let mut opts = SqliteConnectOptions::from_str(url)?
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool_optionen = if ist_in_memory(url) {
            if config.max_verbindungen > 1 || config.sqlite_wal {
                warn!(
                    url,
                    "In-Memory-Datenbank: Pool auf eine Verbindung ohne WAL begrenzt"
                );
            }
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            opts = opts.create_if_missing(true).journal_mode(if config.sqlite_wal {
                SqliteJournalMode::Wal
            } else {
                SqliteJournalMode::Delete
            });
            SqlitePoolOptions::new().max_connections(config.max_verbindungen)
        };

        let pool = pool_optionen.connect_with(opts).await?;
        info!(url, wal = config.sqlite_wal, "SQLite-Pool geoeffnet");

        let db = Self { pool };
        db.migrationen_ausfuehren().await?;
        Ok(db)
    }

    /// Fuehrt alle ausstehenden Migrationen aus
    pub async fn migrationen_ausfuehren(&self) -> Result<(), DbError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Datenbank-Migrationen abgeschlossen");
        Ok(())
    }

    /// Prueft ob die Datenbank erreichbar ist (fuer den Health-Check)
    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    /// Leere In-Memory-Datenbank mit allen Migrationen
    pub async fn in_memory() -> Result<Self, DbError> {
        Self::oeffnen(&DatabaseConfig {
            url: IN_MEMORY_URL.into(),
            max_verbindungen: 1,
            sqlite_wal: false,
        })
        .await
    }
}
