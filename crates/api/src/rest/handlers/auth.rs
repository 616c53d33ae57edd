//! REST-Handler fuer Registrierung, Anmeldung und Token-Erneuerung

use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Json},
    Form,
};
use pforte_auth::AuthError;
use pforte_observability::ereignis;
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiResult;
use crate::rest::ApiState;

#[derive(Debug, Deserialize)]
pub struct SignupBody {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// `POST /signup`
pub async fn signup(
    State(state): State<ApiState>,
    payload: Result<Json<SignupBody>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = payload?;

    state
        .auth
        .registrieren(&body.name, &body.email, &body.password)
        .await?;
    state.metriken.auth_ereignis(ereignis::REGISTRIERT);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "user created successfully" })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct SigninBody {
    pub email: String,
    pub password: String,
}

/// `POST /signin`
pub async fn signin(
    State(state): State<ApiState>,
    payload: Result<Json<SigninBody>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = payload?;

    match state.auth.anmelden(&body.email, &body.password).await {
        Ok(paar) => {
            state.metriken.auth_ereignis(ereignis::ANMELDUNG_ERFOLG);
            Ok((StatusCode::OK, Json(paar)))
        }
        Err(e) => {
            if matches!(e, AuthError::UngueltigeAnmeldedaten) {
                state.metriken.auth_ereignis(ereignis::ANMELDUNG_FEHLGESCHLAGEN);
            }
            Err(e.into())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RefreshBody {
    #[serde(default)]
    pub refresh_token: String,
}

/// `POST /refresh-token` (Formularfeld `refresh_token`)
pub async fn refresh_token(
    State(state): State<ApiState>,
    payload: Result<Form<RefreshBody>, FormRejection>,
) -> ApiResult<impl IntoResponse> {
    let Form(body) = payload?;

    match state.auth.token_erneuern(&body.refresh_token).await {
        Ok(access_token) => {
            state.metriken.auth_ereignis(ereignis::TOKEN_ERNEUERT);
            Ok((StatusCode::OK, Json(json!({ "access_token": access_token }))))
        }
        Err(e) => {
            if matches!(e, AuthError::TokenUngueltig | AuthError::TokenAbgelaufen) {
                state.metriken.auth_ereignis(ereignis::TOKEN_ABGELEHNT);
            }
            Err(e.into())
        }
    }
}
