//! Session-Cache fuer Refresh-Tokens
//!
//! Nach jeder Anmeldung wird das Refresh-Token mit eigener TTL abgelegt
//! (Schluessel = Token-String, Wert = E-Mail des Benutzers). Ein erneutes
//! Ablegen desselben Tokens ueberschreibt den Eintrag.
//!
//! - [`RedisSessionCache`]: Produktions-Backend (Key-Value-Store)
//! - [`SpeicherSessionCache`]: In-Memory-Backend fuer Entwicklung und Tests

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tokio::{sync::RwLock, time::Instant};

use crate::error::{AuthError, AuthResult};

/// Standard-Lebensdauer eines Cache-Eintrags: 24 Stunden
pub const STANDARD_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Intervall fuer den automatischen Cleanup-Task: 15 Minuten
const CLEANUP_INTERVALL: Duration = Duration::from_secs(15 * 60);

/// Key-Value-Store fuer ausgestellte Refresh-Tokens
#[async_trait]
pub trait SessionCache: Send + Sync {
    /// Legt `token -> email` mit der gegebenen TTL ab
    async fn refresh_token_speichern(&self, token: &str, email: &str, ttl: Duration)
        -> AuthResult<()>;

    /// Gibt die E-Mail zurueck, falls das Token noch im Cache liegt
    async fn refresh_token_laden(&self, token: &str) -> AuthResult<Option<String>>;

    /// Prueft ob das Backend erreichbar ist
    async fn ping(&self) -> bool;
}

// ---------------------------------------------------------------------------
// Redis
// ---------------------------------------------------------------------------

/// Redis-Backend; der `ConnectionManager` verbindet sich bei Abbruch selbst neu
#[derive(Clone)]
pub struct RedisSessionCache {
    verbindung: ConnectionManager,
}

impl RedisSessionCache {
    /// Oeffnet die Verbindung zum Key-Value-Store
    ///
    /// Schlaegt fehl wenn die URL ungueltig oder der Server nicht erreichbar ist.
    pub async fn verbinden(url: &str) -> AuthResult<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| AuthError::SessionCache(format!("Ungueltige Redis-URL: {e}")))?;

        let verbindung = ConnectionManager::new(client)
            .await
            .map_err(|e| AuthError::SessionCache(format!("Redis nicht erreichbar: {e}")))?;

        tracing::info!("Redis-Session-Cache verbunden");
        Ok(Self { verbindung })
    }
}

#[async_trait]
impl SessionCache for RedisSessionCache {
    async fn refresh_token_speichern(
        &self,
        token: &str,
        email: &str,
        ttl: Duration,
    ) -> AuthResult<()> {
        let mut conn = self.verbindung.clone();
        redis::cmd("SETEX")
            .arg(token)
            .arg(ttl.as_secs().max(1))
            .arg(email)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| AuthError::SessionCache(format!("Redis SETEX fehlgeschlagen: {e}")))
    }

    async fn refresh_token_laden(&self, token: &str) -> AuthResult<Option<String>> {
        let mut conn = self.verbindung.clone();
        redis::cmd("GET")
            .arg(token)
            .query_async::<Option<String>>(&mut conn)
            .await
            .map_err(|e| AuthError::SessionCache(format!("Redis GET fehlgeschlagen: {e}")))
    }

    async fn ping(&self) -> bool {
        let mut conn = self.verbindung.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .is_ok()
    }
}

// ---------------------------------------------------------------------------
// In-Memory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Eintrag {
    email: String,
    laeuft_ab_am: Instant,
}

/// In-Memory Session-Cache mit TTL-Unterstuetzung
#[derive(Debug, Default)]
pub struct SpeicherSessionCache {
    /// token -> Eintrag
    eintraege: RwLock<HashMap<String, Eintrag>>,
}

impl SpeicherSessionCache {
    /// Erstellt einen neuen leeren Cache
    pub fn neu() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Startet den Cleanup-Task fuer einen bestehenden Cache
    pub fn mit_cleanup(cache: Arc<Self>) -> Arc<Self> {
        let cache_klon = Arc::clone(&cache);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(CLEANUP_INTERVALL).await;
                let entfernt = cache_klon.cleanup_abgelaufene().await;
                if entfernt > 0 {
                    tracing::debug!(anzahl = entfernt, "Abgelaufene Refresh-Tokens bereinigt");
                }
            }
        });
        cache
    }

    /// Bereinigt abgelaufene Eintraege und gibt deren Anzahl zurueck
    pub async fn cleanup_abgelaufene(&self) -> usize {
        let jetzt = Instant::now();
        let mut eintraege = self.eintraege.write().await;
        let vorher = eintraege.len();
        eintraege.retain(|_, e| e.laeuft_ab_am > jetzt);
        vorher - eintraege.len()
    }

    /// Anzahl der nicht abgelaufenen Eintraege
    pub async fn anzahl_aktive(&self) -> usize {
        let jetzt = Instant::now();
        let eintraege = self.eintraege.read().await;
        eintraege.values().filter(|e| e.laeuft_ab_am > jetzt).count()
    }
}

#[async_trait]
impl SessionCache for SpeicherSessionCache {
    async fn refresh_token_speichern(
        &self,
        token: &str,
        email: &str,
        ttl: Duration,
    ) -> AuthResult<()> {
        let eintrag = Eintrag {
            email: email.to_string(),
            laeuft_ab_am: Instant::now() + ttl,
        };
        self.eintraege.write().await.insert(token.to_string(), eintrag);
        Ok(())
    }

    async fn refresh_token_laden(&self, token: &str) -> AuthResult<Option<String>> {
        let eintraege = self.eintraege.read().await;
        Ok(eintraege
            .get(token)
            .filter(|e| e.laeuft_ab_am > Instant::now())
            .map(|e| e.email.clone()))
    }

    async fn ping(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn speichern_und_laden() {
        let cache = SpeicherSessionCache::neu();
        cache
            .refresh_token_speichern("tok", "ada@example.com", STANDARD_SESSION_TTL)
            .await
            .unwrap();

        assert_eq!(
            cache.refresh_token_laden("tok").await.unwrap().as_deref(),
            Some("ada@example.com")
        );
        assert!(cache.refresh_token_laden("anderes").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn erneutes_speichern_ueberschreibt() {
        let cache = SpeicherSessionCache::neu();
        cache
            .refresh_token_speichern("tok", "alt@example.com", STANDARD_SESSION_TTL)
            .await
            .unwrap();
        cache
            .refresh_token_speichern("tok", "neu@example.com", STANDARD_SESSION_TTL)
            .await
            .unwrap();

        assert_eq!(
            cache.refresh_token_laden("tok").await.unwrap().as_deref(),
            Some("neu@example.com")
        );
        assert_eq!(cache.anzahl_aktive().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn eintraege_laufen_ab() {
        let cache = SpeicherSessionCache::neu();
        cache
            .refresh_token_speichern("kurz", "a@example.com", Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .refresh_token_speichern("lang", "b@example.com", STANDARD_SESSION_TTL)
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;

        assert!(cache.refresh_token_laden("kurz").await.unwrap().is_none());
        assert!(cache.refresh_token_laden("lang").await.unwrap().is_some());
        assert_eq!(cache.cleanup_abgelaufene().await, 1);
        assert_eq!(cache.anzahl_aktive().await, 1);
    }

    #[tokio::test]
    async fn speicher_cache_ist_immer_erreichbar() {
        assert!(SpeicherSessionCache::neu().ping().await);
    }

    // Benoetigt einen laufenden Redis-Server
    #[tokio::test]
    #[ignore]
    async fn redis_speichern_und_laden() {
        let cache = RedisSessionCache::verbinden("redis://127.0.0.1/")
            .await
            .unwrap();
        assert!(cache.ping().await);

        cache
            .refresh_token_speichern("pforte-test-token", "ada@example.com", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(
            cache.refresh_token_laden("pforte-test-token").await.unwrap().as_deref(),
            Some("ada@example.com")
        );
    }

    #[tokio::test]
    async fn ungueltige_redis_url_schlaegt_fehl() {
        let ergebnis = RedisSessionCache::verbinden("kein-redis://").await;
        assert!(matches!(ergebnis, Err(AuthError::SessionCache(_))));
    }
}
