//! Prometheus-kompatible Metriken fuer Pforte
//!
//! Registrierte Metriken:
//! - `pforte_http_requests_total` – Counter: HTTP-Anfragen (method, path, status)
//! - `pforte_http_request_duration_seconds` – Histogram: HTTP-Antwortzeit
//! - `pforte_auth_ereignisse_total` – Counter: Auth-Ereignisse (ereignis)

use anyhow::Result;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Label-Werte fuer `pforte_auth_ereignisse_total`
pub mod ereignis {
    pub const REGISTRIERT: &str = "registriert";
    pub const ANMELDUNG_ERFOLG: &str = "anmeldung_erfolg";
    pub const ANMELDUNG_FEHLGESCHLAGEN: &str = "anmeldung_fehlgeschlagen";
    pub const TOKEN_ERNEUERT: &str = "token_erneuert";
    pub const TOKEN_ABGELEHNT: &str = "token_abgelehnt";
}

/// Alle Pforte-Prometheus-Metriken
#[derive(Clone)]
pub struct PforteMetrics {
    pub registry: Arc<Registry>,

    // HTTP-Metriken
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,

    // Auth-Metriken
    pub auth_ereignisse_total: IntCounterVec,
}

impl PforteMetrics {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        // --- HTTP-Metriken ---
        let http_requests_total = IntCounterVec::new(
            Opts::new("pforte_http_requests_total", "Gesamtanzahl HTTP-Anfragen"),
            &["method", "path", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "pforte_http_request_duration_seconds",
                "HTTP-Antwortzeit in Sekunden",
            )
            // Argon2 liegt bei ~100 ms, daher reichen die Buckets bis 2.5 s
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
            &["method", "path"],
        )?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        // --- Auth-Metriken ---
        let auth_ereignisse_total = IntCounterVec::new(
            Opts::new(
                "pforte_auth_ereignisse_total",
                "Registrierungen, Anmeldungen und Token-Erneuerungen",
            ),
            &["ereignis"],
        )?;
        registry.register(Box::new(auth_ereignisse_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            http_requests_total,
            http_request_duration_seconds,
            auth_ereignisse_total,
        })
    }

    /// Zaehlt ein Auth-Ereignis (siehe [`ereignis`])
    pub fn auth_ereignis(&self, name: &str) {
        self.auth_ereignisse_total.with_label_values(&[name]).inc();
    }

    /// Zeichnet eine abgeschlossene HTTP-Anfrage auf
    pub fn http_anfrage(&self, methode: &str, pfad: &str, status: u16, dauer_sekunden: f64) {
        self.http_requests_total
            .with_label_values(&[methode, pfad, &status.to_string()])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[methode, pfad])
            .observe(dauer_sekunden);
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Axum-Router fuer den `/metrics`-Endpunkt
pub fn metrics_router(metriken: PforteMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metriken)
}

async fn metrics_handler(State(metriken): State<PforteMetrics>) -> impl IntoResponse {
    match metriken.exportieren() {
        Ok(text) => (
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Metriken-Export fehlgeschlagen: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
