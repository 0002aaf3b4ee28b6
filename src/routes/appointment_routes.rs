// src/routes/appointment_routes.rs

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, patch, post},
    Json, Router,
};

use super::{body, ok, ApiResult};
use crate::models::{
    AppState, Appointment, AppointmentId, AppointmentStatus, ClientId, NewAppointment,
    RescheduleRequest,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/appointments/upcoming", get(list_upcoming))
        .route("/appointments/client/{client_id}", get(list_client_appointments))
        .route("/appointments/new", post(create_appointment))
        .route("/appointments/reschedule/{appointment_id}", patch(reschedule))
        .route("/appointments/cancel/{appointment_id}", patch(cancel))
        .route("/appointments/no-show/{appointment_id}", patch(mark_no_show))
        .route("/appointments/complete/{appointment_id}", patch(complete))
}

/* ============================================================
   Lists
   ============================================================ */

pub async fn list_upcoming(State(state): State<AppState>) -> ApiResult<Vec<Appointment>> {
    ok(state.store.upcoming())
}

pub async fn list_client_appointments(
    State(state): State<AppState>,
    Path(client_id): Path<ClientId>,
) -> ApiResult<Vec<Appointment>> {
    ok(state.store.appointments_for(client_id))
}

/* ============================================================
   Create
   ============================================================ */

pub async fn create_appointment(
    State(state): State<AppState>,
    payload: Result<Json<NewAppointment>, JsonRejection>,
) -> ApiResult<Appointment> {
    let req = body(payload)?;
    let appt = state.store.create_appointment(req)?;
    tracing::info!(appointment_id = appt.id, client_id = appt.client_id, "appointment booked");
    ok(appt)
}

/* ============================================================
   Status transitions (only from SCHEDULED)
   ============================================================ */

pub async fn reschedule(
    State(state): State<AppState>,
    Path(appointment_id): Path<AppointmentId>,
    payload: Result<Json<RescheduleRequest>, JsonRejection>,
) -> ApiResult<Appointment> {
    let req = body(payload)?;
    ok(state.store.transition(
        appointment_id,
        AppointmentStatus::Rescheduled,
        Some(req.reschedule_time),
    )?)
}

pub async fn cancel(
    State(state): State<AppState>,
    Path(appointment_id): Path<AppointmentId>,
) -> ApiResult<Appointment> {
    ok(state
        .store
        .transition(appointment_id, AppointmentStatus::Cancelled, None)?)
}

pub async fn mark_no_show(
    State(state): State<AppState>,
    Path(appointment_id): Path<AppointmentId>,
) -> ApiResult<Appointment> {
    ok(state
        .store
        .transition(appointment_id, AppointmentStatus::NoShow, None)?)
}

pub async fn complete(
    State(state): State<AppState>,
    Path(appointment_id): Path<AppointmentId>,
) -> ApiResult<Appointment> {
    ok(state
        .store
        .transition(appointment_id, AppointmentStatus::Completed, None)?)
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{app, request, send};
    use serde_json::json;

    #[tokio::test]
    async fn upcoming_carries_client_brief() {
        let app = app();
        let (status, body) = send(&app, request("GET", "/v1/appointments/upcoming", None)).await;
        assert_eq!(status, 200);
        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0]["id"], json!(203));
        assert_eq!(rows[0]["appointmentStatus"], json!("SCHEDULED"));
        assert_eq!(rows[0]["client"]["name"], json!("Karan Mehta"));
    }

    #[tokio::test]
    async fn reschedule_keeps_id_and_moves_instant() {
        let app = app();
        let (status, body) = send(
            &app,
            request(
                "PATCH",
                "/v1/appointments/reschedule/205",
                Some(json!({ "rescheduleTime": "2026-01-04T12:30:00Z" })),
            ),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(body["data"]["id"], json!(205));
        assert_eq!(body["data"]["appointmentStatus"], json!("RESCHEDULED"));
        assert_eq!(body["data"]["appointmentAt"], json!("2026-01-04T12:30:00Z"));
    }

    #[tokio::test]
    async fn reschedule_without_time_is_bad_request() {
        let app = app();
        let (status, body) = send(&app, request("PATCH", "/v1/appointments/reschedule/205", Some(json!({})))).await;
        assert_eq!(status, 400);
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn closed_appointments_conflict() {
        let app = app();
        let (status, body) = send(&app, request("PATCH", "/v1/appointments/cancel/202", None)).await;
        assert_eq!(status, 409);
        assert_eq!(body["message"], json!("Appointment already completed"));

        let (status, _) = send(&app, request("PATCH", "/v1/appointments/complete/999", None)).await;
        assert_eq!(status, 404);
    }

    #[tokio::test]
    async fn create_then_list_by_client() {
        let app = app();
        let (status, created) = send(
            &app,
            request(
                "POST",
                "/v1/appointments/new",
                Some(json!({
                    "clientId": 4,
                    "inquiryId": 105,
                    "appointmentAt": "2026-01-08T09:00:00Z",
                    "tattooDetail": "Mandala, second sitting"
                })),
            ),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(created["data"]["id"], json!(209));

        let (_, listed) = send(&app, request("GET", "/v1/appointments/client/4", None)).await;
        let ids: Vec<i64> = listed["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![204, 209]);
    }
}
