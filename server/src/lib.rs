//! pforte-server – Bibliotheks-Root
//!
//! Verdrahtet Credential-Store, Session-Cache, Token-Aussteller und die
//! Services zur REST-API und startet alle Listener.

pub mod config;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{ServerConfig, BACKEND_SPEICHER};
use pforte_api::{ApiState, RestServer, RestServerKonfig};
use pforte_auth::{
    AuthService, JwtAussteller, OrganisationService, RedisSessionCache, SessionCache,
    SpeicherSessionCache,
};
use pforte_db::SqliteDb;
use pforte_observability::{HealthState, PforteMetrics};
use tokio::sync::watch;

/// Alle verdrahteten Abhaengigkeiten eines Server-Prozesses
pub struct Dienste {
    pub state: ApiState,
    pub db: Arc<SqliteDb>,
    pub session_cache: Arc<dyn SessionCache>,
}

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Oeffnet alle Backends und baut die Services auf
    pub async fn dienste_aufbauen(&self) -> Result<Dienste> {
        let db = Arc::new(
            SqliteDb::oeffnen(&self.config.datenbank_konfig())
                .await
                .context("Datenbank konnte nicht geoeffnet werden")?,
        );

        let session_cache = session_cache_verbinden(&self.config).await?;

        let aussteller = Arc::new(
            JwtAussteller::neu(&self.config.jwt_konfig())
                .context("Token-Aussteller konnte nicht erstellt werden")?,
        );

        let auth = Arc::new(AuthService::neu(
            db.clone(),
            session_cache.clone(),
            aussteller,
            self.config.auth_einstellungen(),
        ));
        let organisationen = Arc::new(OrganisationService::neu(db.clone(), db.clone()));

        let state = ApiState::neu(
            auth,
            organisationen,
            PforteMetrics::neu()?,
            HealthState::neu(),
            self.config.api.auth_erforderlich,
        );

        Ok(Dienste {
            state,
            db,
            session_cache,
        })
    }

    /// Startet alle Server-Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Datenbank oeffnen und migrieren
    /// 2. Session-Cache verbinden
    /// 3. Health-Pruefung und Observability-Server starten
    /// 4. REST-API starten
    /// 5. Auf Ctrl-C / SIGTERM warten
    pub async fn starten(self) -> Result<()> {
        let api_addr = self.config.api_bind_adresse()?;

        tracing::info!(
            api = %api_addr,
            datenbank = %self.config.datenbank.url,
            session_cache = %self.config.session_cache.backend,
            auth_erforderlich = self.config.api.auth_erforderlich,
            "Server startet"
        );

        let dienste = self.dienste_aufbauen().await?;
        let (stop_tx, stop_rx) = watch::channel(false);

        let health_task = tokio::spawn(health_pruefung(
            dienste.db.clone(),
            dienste.session_cache.clone(),
            dienste.state.health.clone(),
            Duration::from_secs(self.config.observability.health_intervall_sekunden.max(1)),
            stop_rx.clone(),
        ));

        let observability_task = if self.config.observability.aktiviert {
            let addr = self.config.observability_bind_adresse()?;
            let metriken = dienste.state.metriken.clone();
            let health = dienste.state.health.clone();
            let stop = auf_stop_warten(stop_rx.clone());
            Some(tokio::spawn(async move {
                if let Err(e) =
                    pforte_observability::observability_server_starten(addr, metriken, health, stop)
                        .await
                {
                    tracing::error!("Observability-Server fehlgeschlagen: {e:#}");
                }
            }))
        } else {
            None
        };

        tokio::spawn(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
            let _ = stop_tx.send(true);
        });

        let rest = RestServer::neu(RestServerKonfig {
            bind_addr: api_addr,
            cors_origins: self.config.api.cors_origins.clone(),
        });
        let ergebnis = rest.starten(dienste.state, auf_stop_warten(stop_rx)).await;

        if let Some(task) = observability_task {
            let _ = task.await;
        }
        let _ = health_task.await;

        tracing::info!("Server beendet");
        ergebnis
    }
}

/// Verbindet den konfigurierten Session-Cache
pub async fn session_cache_verbinden(config: &ServerConfig) -> Result<Arc<dyn SessionCache>> {
    if config.session_cache.backend == BACKEND_SPEICHER {
        tracing::warn!("In-Memory-Session-Cache aktiv, Refresh-Tokens ueberleben keinen Neustart");
        let cache: Arc<dyn SessionCache> =
            SpeicherSessionCache::mit_cleanup(SpeicherSessionCache::neu());
        return Ok(cache);
    }

    let cache = RedisSessionCache::verbinden(&config.session_cache.redis_url)
        .await
        .context("Session-Cache nicht erreichbar")?;
    Ok(Arc::new(cache))
}

/// Aktualisiert periodisch die Health-Flags
async fn health_pruefung(
    db: Arc<SqliteDb>,
    cache: Arc<dyn SessionCache>,
    health: HealthState,
    intervall: Duration,
    mut stop: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(intervall);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let db_ok = db.ping().await;
                let cache_ok = cache.ping().await;
                if db_ok != health.db_verbunden() || cache_ok != health.cache_verbunden() {
                    tracing::warn!(db = db_ok, cache = cache_ok, "Backend-Status geaendert");
                }
                health.db_status_setzen(db_ok);
                health.cache_status_setzen(cache_ok);
            }
            _ = stop.changed() => break,
        }
    }
}

fn auf_stop_warten(mut stop: watch::Receiver<bool>) -> impl Future<Output = ()> + Send + 'static {
    async move {
        let _ = stop.wait_for(|gestoppt| *gestoppt).await;
    }
}

/// Wartet auf Ctrl-C oder SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Ctrl-C-Handler konnte nicht installiert werden: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("SIGTERM-Handler konnte nicht installiert werden: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ServerConfig {
        let mut cfg = ServerConfig::default();
        cfg.datenbank.url = "sqlite::memory:".into();
        cfg.datenbank.max_verbindungen = 1;
        cfg.datenbank.sqlite_wal = false;
        cfg.session_cache.backend = BACKEND_SPEICHER.into();
        cfg.jwt.secret = "server-test-secret-mit-mindestens-32-bytes".into();
        cfg
    }

    #[tokio::test]
    async fn dienste_mit_speicher_backend() {
        let cfg = test_config();
        cfg.validieren().unwrap();

        let dienste = Server::neu(cfg).dienste_aufbauen().await.unwrap();
        assert!(dienste.db.ping().await);
        assert!(dienste.session_cache.ping().await);
        assert!(dienste.state.auth_erforderlich);

        let benutzer = dienste
            .state
            .auth
            .registrieren("Ada", "ada@example.com", "pw")
            .await
            .unwrap();
        let paar = dienste.state.auth.anmelden("ada@example.com", "pw").await.unwrap();
        let claims = dienste.state.auth.zugriff_pruefen(&paar.access_token).unwrap();
        assert_eq!(claims.user_id, benutzer.id.to_string());
    }

    #[tokio::test]
    async fn unerreichbarer_redis_bricht_aufbau_ab() {
        let mut cfg = test_config();
        cfg.session_cache.backend = config::BACKEND_REDIS.into();
        cfg.session_cache.redis_url = "redis://127.0.0.1:1/".into();

        assert!(Server::neu(cfg).dienste_aufbauen().await.is_err());
    }

    #[tokio::test]
    async fn health_pruefung_aktualisiert_und_endet_bei_stop() {
        let db = Arc::new(SqliteDb::in_memory().await.unwrap());
        let cache: Arc<dyn SessionCache> = SpeicherSessionCache::neu();
        let health = HealthState::neu();
        health.db_status_setzen(false);
        health.cache_status_setzen(false);

        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(health_pruefung(
            db,
            cache,
            health.clone(),
            Duration::from_secs(30),
            stop_rx,
        ));

        // Der erste Tick feuert sofort
        for _ in 0..100 {
            if health.db_verbunden() && health.cache_verbunden() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(health.db_verbunden());
        assert!(health.cache_verbunden());

        stop_tx.send(true).unwrap();
        task.await.unwrap();
    }
}
