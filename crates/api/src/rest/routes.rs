//! Route-Definitionen fuer die REST-API

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use pforte_observability::{health::health_handler, timing_middleware};

use crate::rest::{handlers, middleware::zugriff_middleware, ApiState};

/// Erstellt den vollstaendigen Router inklusive State
pub fn api_router(state: ApiState) -> Router {
    let oeffentlich = Router::new()
        .route("/signup", post(handlers::auth::signup))
        .route("/signin", post(handlers::auth::signin))
        .route("/refresh-token", post(handlers::auth::refresh_token))
        .route("/health", get(health_handler));

    let organisationen = Router::new()
        .route(
            "/organization",
            post(handlers::organisationen::create_organization)
                .get(handlers::organisationen::list_organizations),
        )
        .route(
            "/organization/:organization_id",
            get(handlers::organisationen::get_organization)
                .put(handlers::organisationen::update_organization)
                .delete(handlers::organisationen::delete_organization),
        )
        .route(
            "/organization/:organization_id/invite",
            post(handlers::organisationen::invite_user),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            zugriff_middleware,
        ));

    Router::new()
        .merge(oeffentlich)
        .merge(organisationen)
        .layer(middleware::from_fn_with_state(
            state.metriken.clone(),
            timing_middleware,
        ))
        .with_state(state)
}
