use axum::{Json, Router, extract::rejection::JsonRejection};

use crate::error::ApiError;
use crate::models::{AppState, Envelope};

pub mod appointment_routes;
pub mod client_routes;
pub mod config_routes;
pub mod inquiry_routes;

pub type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(Envelope::ok(data)))
}

/// Keep malformed bodies inside the envelope contract.
pub fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(v)| v)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(client_routes::router())
        .merge(inquiry_routes::router())
        .merge(appointment_routes::router())
        .merge(config_routes::router());

    Router::new().nest("/v1", api).with_state(state)
}
