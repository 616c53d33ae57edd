//! REST-Interface fuer Pforte

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

use std::sync::Arc;

use axum::extract::FromRef;
use pforte_auth::{AuthService, OrganisationService};
use pforte_observability::{HealthState, PforteMetrics};

/// Axum-State fuer den REST-Server
#[derive(Clone)]
pub struct ApiState {
    pub auth: Arc<AuthService>,
    pub organisationen: Arc<OrganisationService>,
    pub metriken: PforteMetrics,
    pub health: HealthState,
    /// Organisations-Routen verlangen ein Access-Token
    pub auth_erforderlich: bool,
}

impl ApiState {
    pub fn neu(
        auth: Arc<AuthService>,
        organisationen: Arc<OrganisationService>,
        metriken: PforteMetrics,
        health: HealthState,
        auth_erforderlich: bool,
    ) -> Self {
        Self {
            auth,
            organisationen,
            metriken,
            health,
            auth_erforderlich,
        }
    }
}

impl FromRef<ApiState> for HealthState {
    fn from_ref(state: &ApiState) -> Self {
        state.health.clone()
    }
}

pub use server::{RestServer, RestServerKonfig};
