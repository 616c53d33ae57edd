//! REST-Handler fuer Organisations-Endpunkte

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use pforte_db::models::{NeueOrganisation, OrganisationErsatz, OrganisationsMitglied};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiResult;
use crate::rest::{middleware::AuthIdentitaet, ApiState};

#[derive(Debug, Deserialize)]
pub struct OrganisationErstellenBody {
    #[serde(default)]
    pub organization_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub organization_members: Vec<OrganisationsMitglied>,
}

/// `POST /organization`
pub async fn create_organization(
    State(state): State<ApiState>,
    payload: Result<Json<OrganisationErstellenBody>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = payload?;

    let id = state
        .organisationen
        .erstellen(NeueOrganisation {
            id: body.organization_id,
            name: body.name,
            description: body.description,
            members: body.organization_members,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "organization_id": id }))))
}

/// `GET /organization/:organization_id`
pub async fn get_organization(
    State(state): State<ApiState>,
    Path(organization_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let org = state.organisationen.laden(&organization_id).await?;
    Ok((StatusCode::OK, Json(org)))
}

/// `GET /organization`
pub async fn list_organizations(State(state): State<ApiState>) -> ApiResult<impl IntoResponse> {
    let alle = state.organisationen.alle_laden().await?;
    Ok((StatusCode::OK, Json(alle)))
}

#[derive(Debug, Deserialize)]
pub struct OrganisationBearbeitenBody {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub organization_members: Vec<OrganisationsMitglied>,
    /// Optional: nur ersetzen wenn die gespeicherte Version uebereinstimmt
    #[serde(default)]
    pub version: Option<i64>,
}

/// `PUT /organization/:organization_id`
pub async fn update_organization(
    State(state): State<ApiState>,
    Path(organization_id): Path<String>,
    payload: Result<Json<OrganisationBearbeitenBody>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = payload?;

    let org = state
        .organisationen
        .aktualisieren(
            &organization_id,
            OrganisationErsatz {
                name: body.name,
                description: body.description,
                members: body.organization_members,
                erwartete_version: body.version,
            },
        )
        .await?;

    Ok((StatusCode::OK, Json(org)))
}

/// `DELETE /organization/:organization_id`
pub async fn delete_organization(
    State(state): State<ApiState>,
    Path(organization_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.organisationen.loeschen(&organization_id).await?;
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "organization deleted successfully" })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct EinladungBody {
    pub user_email: String,
}

/// `POST /organization/:organization_id/invite`
pub async fn invite_user(
    State(state): State<ApiState>,
    Path(organization_id): Path<String>,
    identitaet: Option<Extension<AuthIdentitaet>>,
    payload: Result<Json<EinladungBody>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    // Unbekannte Organisation hat Vorrang vor einem kaputten Body
    state.organisationen.laden(&organization_id).await?;
    let Json(body) = payload?;

    if let Some(Extension(AuthIdentitaet(claims))) = &identitaet {
        tracing::debug!(
            organisation_id = %organization_id,
            eingeladen_von = %claims.user_id,
            "Einladung angefordert"
        );
    }

    state
        .organisationen
        .mitglied_einladen(&organization_id, &body.user_email)
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "user invited to organization successfully" })),
    ))
}
