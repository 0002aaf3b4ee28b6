// src/routes/config_routes.rs

use axum::{extract::State, routing::get, Router};

use super::{ok, ApiResult};
use crate::{
    models::{AppState, ConfigEntry},
    store::ConfigTable,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/config/tattoo-sizes", get(tattoo_sizes))
        .route("/config/reference-types", get(reference_types))
        .route("/config/appointment-statuses", get(appointment_statuses))
        .route("/config/client-statuses", get(client_statuses))
}

pub async fn tattoo_sizes(State(state): State<AppState>) -> ApiResult<Vec<ConfigEntry>> {
    ok(state.store.config(ConfigTable::TattooSizes))
}

pub async fn reference_types(State(state): State<AppState>) -> ApiResult<Vec<ConfigEntry>> {
    ok(state.store.config(ConfigTable::ReferenceTypes))
}

pub async fn appointment_statuses(State(state): State<AppState>) -> ApiResult<Vec<ConfigEntry>> {
    ok(state.store.config(ConfigTable::AppointmentStatuses))
}

pub async fn client_statuses(State(state): State<AppState>) -> ApiResult<Vec<ConfigEntry>> {
    ok(state.store.config(ConfigTable::ClientStatuses))
}
