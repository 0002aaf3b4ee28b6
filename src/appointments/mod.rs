//! Appointment lifecycle: the remote transitions, the list queries, and the
//! client-side helpers screens build on.
//!
//! Legal moves are `SCHEDULED -> {RESCHEDULED, CANCELLED, NO_SHOW, COMPLETED}`.
//! This layer does not pre-check the current status before calling; the
//! backend is the arbiter and its rejection message is passed through.

use chrono::{DateTime, Utc};

use crate::gateway::{Gateway, GatewayError};
use crate::notify::NotificationBus;
use crate::reference::ReferenceData;
use crate::models::{
    Appointment, AppointmentId, AppointmentStatus, ClientId, NewAppointment, RescheduleRequest,
};

pub mod board;
pub mod lock;
pub mod schedule;

pub use board::{ActionError, AppointmentAction, AppointmentBoard, ListSource, Prompt, RefreshOutcome};
pub use lock::{ProcessingGuard, ProcessingLock};
pub use schedule::{ScheduleError, combine, filter_appointments};

/// A mutating operation on an existing appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Reschedule(DateTime<Utc>),
    Cancel,
    NoShow,
    Complete,
}

impl Transition {
    pub fn target_status(self) -> AppointmentStatus {
        match self {
            Transition::Reschedule(_) => AppointmentStatus::Rescheduled,
            Transition::Cancel => AppointmentStatus::Cancelled,
            Transition::NoShow => AppointmentStatus::NoShow,
            Transition::Complete => AppointmentStatus::Completed,
        }
    }

    /// Verb used in prompts ("Failed to {verb} appointment").
    pub fn verb(self) -> &'static str {
        match self {
            Transition::Reschedule(_) => "reschedule",
            Transition::Cancel => "cancel",
            Transition::NoShow => "mark no-show for",
            Transition::Complete => "complete",
        }
    }

    /// Notice shown once the backend accepted the transition.
    pub fn success_message(self) -> &'static str {
        match self {
            Transition::Reschedule(_) => "Appointment rescheduled successfully",
            Transition::Cancel => "Appointment cancelled",
            Transition::NoShow => "Marked as no-show",
            Transition::Complete => "Appointment completed",
        }
    }

    fn path(self, id: AppointmentId) -> String {
        match self {
            Transition::Reschedule(_) => format!("/appointments/reschedule/{id}"),
            Transition::Cancel => format!("/appointments/cancel/{id}"),
            Transition::NoShow => format!("/appointments/no-show/{id}"),
            Transition::Complete => format!("/appointments/complete/{id}"),
        }
    }
}

#[derive(Clone)]
pub struct AppointmentService {
    gateway: Gateway,
    reference: Option<ReferenceData>,
}

impl AppointmentService {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            reference: None,
        }
    }

    /// Resolve statuses that arrive as a config id only.
    pub fn with_reference(mut self, reference: ReferenceData) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn bus(&self) -> &NotificationBus {
        self.gateway.bus()
    }

    /// New appointments always start SCHEDULED. No double-booking check.
    /// `None` when the backend accepted the booking without echoing it.
    pub async fn create(&self, req: &NewAppointment) -> Result<Option<Appointment>, GatewayError> {
        let appt: Option<Appointment> = self.gateway.post("/appointments/new", req).await?;
        tracing::info!(
            appointment_id = appt.as_ref().map(|a| a.id),
            client_id = req.client_id,
            at = %req.appointment_at,
            "appointment scheduled"
        );
        Ok(self.resolved(appt))
    }

    /// Moves the same record; the id never changes.
    pub async fn reschedule(
        &self,
        id: AppointmentId,
        at: DateTime<Utc>,
    ) -> Result<Option<Appointment>, GatewayError> {
        self.apply(id, Transition::Reschedule(at)).await
    }

    pub async fn cancel(&self, id: AppointmentId) -> Result<Option<Appointment>, GatewayError> {
        self.apply(id, Transition::Cancel).await
    }

    pub async fn mark_no_show(&self, id: AppointmentId) -> Result<Option<Appointment>, GatewayError> {
        self.apply(id, Transition::NoShow).await
    }

    pub async fn complete(&self, id: AppointmentId) -> Result<Option<Appointment>, GatewayError> {
        self.apply(id, Transition::Complete).await
    }

    pub async fn apply(
        &self,
        id: AppointmentId,
        transition: Transition,
    ) -> Result<Option<Appointment>, GatewayError> {
        let path = transition.path(id);
        let appt: Option<Appointment> = match transition {
            Transition::Reschedule(at) => {
                self.gateway
                    .patch(&path, &RescheduleRequest { reschedule_time: at })
                    .await?
            }
            _ => self.gateway.patch_empty(&path).await?,
        };

        if let Some(returned) = appt.as_ref().map(|a| a.id).filter(|r| *r != id) {
            tracing::warn!(requested = id, returned, "backend returned a different appointment");
        }
        tracing::info!(
            appointment_id = id,
            status = transition.target_status().code(),
            echoed = appt.is_some(),
            "appointment {}",
            transition.target_status().label().to_lowercase()
        );
        Ok(self.resolved(appt))
    }

    /// Earliest first.
    pub async fn list_upcoming(&self) -> Result<Vec<Appointment>, GatewayError> {
        let list = self.gateway.get_list("/appointments/upcoming").await?;
        Ok(self.sorted(list))
    }

    pub async fn list_by_client(&self, client_id: ClientId) -> Result<Vec<Appointment>, GatewayError> {
        let list = self
            .gateway
            .get_list(&format!("/appointments/client/{client_id}"))
            .await?;
        Ok(self.sorted(list))
    }

    fn sorted(&self, mut list: Vec<Appointment>) -> Vec<Appointment> {
        if let Some(reference) = &self.reference {
            list.iter_mut().for_each(|a| reference.resolve_appointment(a));
        }
        list.sort_by_key(|a| (a.appointment_at, a.id));
        list
    }

    fn resolved(&self, mut appt: Option<Appointment>) -> Option<Appointment> {
        if let (Some(reference), Some(a)) = (&self.reference, appt.as_mut()) {
            reference.resolve_appointment(a);
        }
        appt
    }
}
