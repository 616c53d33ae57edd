//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder ausser dem
//! JWT-Secret haben sinnvolle Standardwerte. Umgebungsvariablen mit dem
//! Praefix `PFORTE_` ueberschreiben einzelne Werte aus der Datei.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context};
use pforte_auth::{AuthEinstellungen, JwtKonfig};
use pforte_db::DatabaseConfig;
use pforte_observability::logging::{log_filter_gueltig, log_format_gueltig};
use serde::{Deserialize, Serialize};

pub const ENV_CONFIG: &str = "PFORTE_CONFIG";
pub const ENV_DATABASE_URL: &str = "PFORTE_DATABASE_URL";
pub const ENV_REDIS_URL: &str = "PFORTE_REDIS_URL";
pub const ENV_JWT_SECRET: &str = "PFORTE_JWT_SECRET";
pub const ENV_JWT_PREVIOUS_SECRETS: &str = "PFORTE_JWT_PREVIOUS_SECRETS";

pub const BACKEND_REDIS: &str = "redis";
pub const BACKEND_SPEICHER: &str = "speicher";

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Datenbank-Einstellungen (Credential-Store)
    pub datenbank: DatenbankEinstellungen,
    /// Session-Cache fuer Refresh-Tokens
    pub session_cache: SessionCacheEinstellungen,
    /// Signierschluessel und Token-Lebensdauer
    pub jwt: JwtEinstellungen,
    /// Verhalten des Auth-Flows
    pub auth: AuthFlowEinstellungen,
    /// REST-API
    pub api: ApiEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
    /// Observability-Einstellungen (Metriken, Health)
    pub observability: ObservabilityEinstellungen,
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse fuer alle Listener
    pub bind_adresse: String,
    /// Port fuer die REST-API
    pub api_port: u16,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            api_port: 8080,
        }
    }
}

/// Datenbank-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatenbankEinstellungen {
    /// Verbindungs-URL
    pub url: String,
    /// Maximale Verbindungspool-Groesse
    pub max_verbindungen: u32,
    /// WAL-Modus fuer SQLite
    pub sqlite_wal: bool,
}

impl Default for DatenbankEinstellungen {
    fn default() -> Self {
        let standard = DatabaseConfig::default();
        Self {
            url: standard.url,
            max_verbindungen: standard.max_verbindungen,
            sqlite_wal: standard.sqlite_wal,
        }
    }
}

/// Session-Cache-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionCacheEinstellungen {
    /// Backend: "redis" oder "speicher" (nur ein Prozess, nicht persistent)
    pub backend: String,
    /// Redis-URL (nur fuer Backend "redis")
    pub redis_url: String,
    /// Lebensdauer eines Refresh-Token-Eintrags in Sekunden
    pub ttl_sekunden: u64,
}

impl Default for SessionCacheEinstellungen {
    fn default() -> Self {
        Self {
            backend: BACKEND_REDIS.into(),
            redis_url: "redis://127.0.0.1:6379/".into(),
            ttl_sekunden: pforte_auth::STANDARD_SESSION_TTL.as_secs(),
        }
    }
}

/// JWT-Einstellungen
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtEinstellungen {
    /// Aktueller Signierschluessel (mindestens 32 Bytes)
    pub secret: String,
    /// Fruehere Schluessel, nur noch zur Verifikation
    pub vorherige_secrets: Vec<String>,
    pub access_ttl_sekunden: u64,
    pub refresh_ttl_sekunden: u64,
}

impl Default for JwtEinstellungen {
    fn default() -> Self {
        Self {
            secret: String::new(),
            vorherige_secrets: vec![],
            access_ttl_sekunden: pforte_auth::token::STANDARD_ACCESS_TTL.as_secs(),
            refresh_ttl_sekunden: pforte_auth::token::STANDARD_REFRESH_TTL.as_secs(),
        }
    }
}

impl std::fmt::Debug for JwtEinstellungen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEinstellungen")
            .field("secret", &"[REDACTED]")
            .field("vorherige_secrets", &self.vorherige_secrets.len())
            .field("access_ttl_sekunden", &self.access_ttl_sekunden)
            .field("refresh_ttl_sekunden", &self.refresh_ttl_sekunden)
            .finish()
    }
}

/// Auth-Flow-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthFlowEinstellungen {
    /// Refresh-Tokens muessen noch im Session-Cache liegen
    pub refresh_cache_pruefen: bool,
}

impl Default for AuthFlowEinstellungen {
    fn default() -> Self {
        Self {
            refresh_cache_pruefen: true,
        }
    }
}

/// REST-API-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiEinstellungen {
    /// Organisations-Routen verlangen `Authorization: Bearer <access token>`
    pub auth_erforderlich: bool,
    /// CORS-Origins fuer REST (leer = alle erlaubt)
    pub cors_origins: Vec<String>,
}

impl Default for ApiEinstellungen {
    fn default() -> Self {
        Self {
            auth_erforderlich: true,
            cors_origins: vec![],
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level oder EnvFilter-Direktive
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Observability-Einstellungen (Metriken + Health-Check)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityEinstellungen {
    /// Aktiviert den Observability-Server
    pub aktiviert: bool,
    /// Port fuer Metriken und Health (Standard: 9300)
    pub port: u16,
    /// Intervall der Erreichbarkeitspruefung von Datenbank und Cache
    pub health_intervall_sekunden: u64,
}

impl Default for ObservabilityEinstellungen {
    fn default() -> Self {
        Self {
            aktiviert: true,
            port: 9300,
            health_intervall_sekunden: 30,
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Uebernimmt `PFORTE_*`-Umgebungsvariablen
    pub fn umgebung_anwenden(&mut self) {
        self.umgebung_anwenden_mit(|name| std::env::var(name).ok());
    }

    /// Wie [`Self::umgebung_anwenden`], mit austauschbarer Quelle
    pub fn umgebung_anwenden_mit(&mut self, lesen: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lesen(ENV_DATABASE_URL) {
            self.datenbank.url = url;
        }
        if let Some(url) = lesen(ENV_REDIS_URL) {
            self.session_cache.redis_url = url;
        }
        if let Some(secret) = lesen(ENV_JWT_SECRET) {
            self.jwt.secret = secret;
        }
        if let Some(liste) = lesen(ENV_JWT_PREVIOUS_SECRETS) {
            self.jwt.vorherige_secrets = liste
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
    }

    /// Prueft die Konfiguration; jeder Fehler bricht den Start ab
    pub fn validieren(&self) -> anyhow::Result<()> {
        if self.datenbank.url.trim().is_empty() {
            bail!("datenbank.url darf nicht leer sein");
        }
        if self.datenbank.max_verbindungen == 0 {
            bail!("datenbank.max_verbindungen muss groesser 0 sein");
        }

        match self.session_cache.backend.as_str() {
            BACKEND_REDIS => {
                let url = self.session_cache.redis_url.trim();
                if !(url.starts_with("redis://") || url.starts_with("rediss://")) {
                    bail!("session_cache.redis_url ist keine gueltige Redis-URL: '{url}'");
                }
            }
            BACKEND_SPEICHER => {}
            anderes => bail!(
                "session_cache.backend '{anderes}' unbekannt (erlaubt: {BACKEND_REDIS}, {BACKEND_SPEICHER})"
            ),
        }
        if self.session_cache.ttl_sekunden == 0 {
            bail!("session_cache.ttl_sekunden muss groesser 0 sein");
        }

        self.jwt_konfig()
            .validieren()
            .context("jwt-Konfiguration ungueltig")?;

        if !log_filter_gueltig(&self.logging.level) {
            bail!("logging.level '{}' ist kein gueltiger Filter", self.logging.level);
        }
        if !log_format_gueltig(&self.logging.format) {
            bail!("logging.format '{}' unbekannt (text oder json)", self.logging.format);
        }

        self.api_bind_adresse()?;
        if self.observability.aktiviert {
            self.observability_bind_adresse()?;
        }

        Ok(())
    }

    /// Gibt die Bind-Adresse fuer den REST-Server zurueck
    pub fn api_bind_adresse(&self) -> anyhow::Result<SocketAddr> {
        bind_adresse(&self.netzwerk.bind_adresse, self.netzwerk.api_port)
    }

    /// Gibt die Bind-Adresse fuer den Observability-Server zurueck
    pub fn observability_bind_adresse(&self) -> anyhow::Result<SocketAddr> {
        bind_adresse(&self.netzwerk.bind_adresse, self.observability.port)
    }

    pub fn datenbank_konfig(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.datenbank.url.clone(),
            max_verbindungen: self.datenbank.max_verbindungen,
            sqlite_wal: self.datenbank.sqlite_wal,
        }
    }

    pub fn jwt_konfig(&self) -> JwtKonfig {
        JwtKonfig {
            secret: self.jwt.secret.clone(),
            vorherige_secrets: self.jwt.vorherige_secrets.clone(),
            access_ttl: Duration::from_secs(self.jwt.access_ttl_sekunden),
            refresh_ttl: Duration::from_secs(self.jwt.refresh_ttl_sekunden),
        }
    }

    pub fn auth_einstellungen(&self) -> AuthEinstellungen {
        AuthEinstellungen {
            session_ttl: Duration::from_secs(self.session_cache.ttl_sekunden),
            refresh_cache_pruefen: self.auth.refresh_cache_pruefen,
        }
    }
}

fn bind_adresse(host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    format!("{host}:{port}")
        .parse()
        .with_context(|| format!("Ungueltige Bind-Adresse '{host}:{port}'"))
}
