// src/routes/client_routes.rs

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, patch, post},
    Json, Router,
};

use super::{body, ok, ApiResult};
use crate::{
    error::ApiError,
    models::{AppState, Client, ClientId, ClientResolution, ClientUpdate, ResolveClientRequest},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/clients", post(resolve_client))
        .route("/clients/all", get(list_clients))
        .route("/clients/mobile/{mobile}", get(get_client_by_mobile))
        .route("/clients/{client_id}", patch(update_client))
}

/* ============================================================
   POST /clients  (find-or-create by mobile)
   ============================================================ */

pub async fn resolve_client(
    State(state): State<AppState>,
    payload: Result<Json<ResolveClientRequest>, JsonRejection>,
) -> ApiResult<ClientResolution> {
    let req = body(payload)?;
    ok(state.store.resolve_client(&req.mobile)?)
}

pub async fn get_client_by_mobile(
    State(state): State<AppState>,
    Path(mobile): Path<String>,
) -> ApiResult<Client> {
    let client = state
        .store
        .client_by_mobile(&mobile)
        .ok_or_else(ApiError::client_not_found)?;
    ok(client)
}

pub async fn list_clients(State(state): State<AppState>) -> ApiResult<Vec<Client>> {
    ok(state.store.clients())
}

pub async fn update_client(
    State(state): State<AppState>,
    Path(client_id): Path<ClientId>,
    payload: Result<Json<ClientUpdate>, JsonRejection>,
) -> ApiResult<Client> {
    let update = body(payload)?;
    if update.is_empty() {
        return Err(ApiError::BadRequest(
            "one of name, gender, location is required".into(),
        ));
    }
    ok(state.store.update_client(client_id, update)?)
}
