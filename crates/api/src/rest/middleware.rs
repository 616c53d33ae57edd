//! Axum-Middleware fuer Bearer-Authentifizierung

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use pforte_auth::Claims;
use serde_json::json;

use crate::error::ApiError;
use crate::rest::ApiState;

/// Fehlerantwort fuer REST-API
pub fn fehler_antwort(status: StatusCode, nachricht: &str) -> Response {
    (status, Json(json!({ "error": nachricht }))).into_response()
}

/// Extrahiert Bearer-Token aus Authorization-Header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Identitaet aus einem gueltigen Access-Token (als Extension gespeichert)
#[derive(Debug, Clone)]
pub struct AuthIdentitaet(pub Claims);

/// Prueft das Access-Token, sofern `auth_erforderlich` gesetzt ist
pub async fn zugriff_middleware(
    State(state): State<ApiState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if !state.auth_erforderlich {
        return next.run(req).await;
    }

    let Some(token) = bearer_token(req.headers()) else {
        return ApiError::NichtAuthentifiziert("missing bearer token".into()).into_response();
    };

    match state.auth.zugriff_pruefen(token) {
        Ok(claims) => {
            tracing::debug!(user_id = %claims.user_id, "Access-Token akzeptiert");
            req.extensions_mut().insert(AuthIdentitaet(claims));
            next.run(req).await
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}
