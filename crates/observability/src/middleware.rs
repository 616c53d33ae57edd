//! Request-Timing Middleware fuer Axum
//!
//! Misst die Antwortzeit jeder HTTP-Anfrage, protokolliert sie als
//! strukturiertes Log-Event und schreibt sie in die Prometheus-Metriken.

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{Request, Response},
    middleware::Next,
};
use std::time::Instant;

use crate::metrics::PforteMetrics;

/// TraceLayer fuer HTTP-Spans (Methode, URI, Status, Latenz)
pub fn request_timing_layer() -> tower_http::trace::TraceLayer<
    tower_http::classify::SharedClassifier<tower_http::classify::ServerErrorsAsFailures>,
> {
    tower_http::trace::TraceLayer::new_for_http()
}

/// Axum-Middleware-Funktion: misst Antwortzeit, loggt strukturiert und zaehlt.
///
/// Als Pfad-Label dient das Routen-Muster (`/organization/:organization_id`),
/// nicht die konkrete URI.
///
/// Verwendung:
/// ```ignore
/// Router::new()
///     .route("/", get(handler))
///     .layer(axum::middleware::from_fn_with_state(metriken, timing_middleware))
/// ```
pub async fn timing_middleware(
    State(metriken): State<PforteMetrics>,
    req: Request<Body>,
    next: Next,
) -> Response<Body> {
    let methode = req.method().to_string();
    let pfad = routen_label(&req);
    let start = Instant::now();

    let response = next.run(req).await;

    let dauer = start.elapsed();
    let status = response.status().as_u16();

    metriken.http_anfrage(&methode, &pfad, status, dauer.as_secs_f64());

    tracing::info!(
        method = %methode,
        path = %pfad,
        status = status,
        duration_ms = dauer.as_millis(),
        "HTTP-Anfrage abgeschlossen"
    );

    response
}

fn routen_label(req: &Request<Body>) -> String {
    req.extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "<unbekannt>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};
    use tower::ServiceExt;

    fn app(metriken: PforteMetrics) -> Router {
        Router::new()
            .route("/organization/:organization_id", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(
                metriken,
                timing_middleware,
            ))
    }

    #[tokio::test]
    async fn anfragen_werden_mit_routen_muster_gezaehlt() {
        let metriken = PforteMetrics::neu().unwrap();
        let app = app(metriken.clone());

        for id in ["a", "b"] {
            let antwort = app
                .clone()
                .oneshot(
                    Request::get(format!("/organization/{id}"))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(antwort.status(), StatusCode::OK);
        }

        let wert = metriken
            .http_requests_total
            .with_label_values(&["GET", "/organization/:organization_id", "200"])
            .get();
        assert_eq!(wert, 2);
    }

    #[tokio::test]
    async fn unbekannte_route_wird_zusammengefasst() {
        let metriken = PforteMetrics::neu().unwrap();
        let antwort = app(metriken.clone())
            .oneshot(Request::get("/gibt-es-nicht").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(antwort.status(), StatusCode::NOT_FOUND);

        let wert = metriken
            .http_requests_total
            .with_label_values(&["GET", "<unbekannt>", "404"])
            .get();
        assert_eq!(wert, 1);
    }
}
