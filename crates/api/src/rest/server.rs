//! Axum HTTP-Server fuer die REST-API

use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};

use anyhow::Result;
use axum::http::{HeaderValue, Method};
use pforte_observability::request_timing_layer;
use tower_http::cors::CorsLayer;

use crate::rest::{routes::api_router, ApiState};

/// REST-Server-Konfiguration
#[derive(Debug, Clone)]
pub struct RestServerKonfig {
    pub bind_addr: SocketAddr,
    /// Erlaubte CORS-Origins. Leer = alle Origins erlaubt (nur fuer Entwicklung).
    pub cors_origins: Vec<String>,
}

impl Default for RestServerKonfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            cors_origins: vec![],
        }
    }
}

/// Axum HTTP-Server fuer die REST-API
pub struct RestServer {
    konfig: RestServerKonfig,
}

impl RestServer {
    pub fn neu(konfig: RestServerKonfig) -> Self {
        Self { konfig }
    }

    fn cors_layer(&self) -> CorsLayer {
        // CORS konfigurieren: entweder spezifische Origins oder Any
        if self.konfig.cors_origins.is_empty() {
            return CorsLayer::permissive();
        }

        let origins: Vec<HeaderValue> = self
            .konfig
            .cors_origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(h) => Some(h),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ungueltiger CORS-Origin wird ignoriert");
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers(tower_http::cors::Any)
    }

    /// Startet den REST-Server und laeuft bis `shutdown` fertig ist
    pub async fn starten(
        self,
        state: ApiState,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let app = api_router(state)
            .layer(request_timing_layer())
            .layer(self.cors_layer());

        let listener = tokio::net::TcpListener::bind(self.konfig.bind_addr).await?;
        tracing::info!(addr = %self.konfig.bind_addr, "REST-Server gestartet");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("REST-Server beendet");
        Ok(())
    }
}
