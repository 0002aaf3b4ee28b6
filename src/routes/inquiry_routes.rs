// src/routes/inquiry_routes.rs

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};

use super::{body, ok, ApiResult};
use crate::models::{AppState, ClientId, Inquiry, NewInquiry};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/inquiries", post(create_inquiry))
        .route("/inquiries/client/{client_id}", get(list_client_inquiries))
}

pub async fn create_inquiry(
    State(state): State<AppState>,
    payload: Result<Json<NewInquiry>, JsonRejection>,
) -> ApiResult<Inquiry> {
    let req = body(payload)?;
    let inquiry = state.store.create_inquiry(req)?;
    tracing::info!(inquiry_id = inquiry.id, client_id = inquiry.client_id, "inquiry recorded");
    ok(inquiry)
}

pub async fn list_client_inquiries(
    State(state): State<AppState>,
    Path(client_id): Path<ClientId>,
) -> ApiResult<Vec<Inquiry>> {
    ok(state.store.inquiries_for(client_id))
}
