//! Presentation adapter for the appointment list and detail screens.
//!
//! The board owns the processing lock and the last applied list. Lists are
//! always refetched from the server after a successful mutation; nothing is
//! patched locally. Refreshes are sequence-numbered so a slow response to an
//! older refresh cannot overwrite a newer one.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use super::schedule::filter_appointments;
use super::{AppointmentService, ProcessingLock, Transition};
use crate::gateway::{ERROR_TITLE, GatewayError};
use crate::models::{Appointment, AppointmentId, AppointmentStatus, ClientId};
use crate::notify::Notification;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListSource {
    Upcoming,
    Client(ClientId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { count: usize },
    /// A newer refresh was dispatched while this one was in flight.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentAction {
    Reschedule,
    Cancel,
    NoShow,
    Complete,
}

/// What a user may do with one appointment at `now`.
///
/// Only SCHEDULED appointments have actions. Upcoming ones can be moved or
/// cancelled; ones whose time has passed can be closed out.
pub fn actions_for(appt: &Appointment, now: DateTime<Utc>) -> Vec<AppointmentAction> {
    if appt.appointment_status != Some(AppointmentStatus::Scheduled) {
        return Vec::new();
    }
    if appt.appointment_at > now {
        vec![AppointmentAction::Reschedule, AppointmentAction::Cancel]
    } else {
        vec![AppointmentAction::NoShow, AppointmentAction::Complete]
    }
}

/// Confirmation-style message for a failed action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub title: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("appointment {requested} must wait, {processing:?} is still being updated")]
    Busy {
        requested: AppointmentId,
        processing: Option<AppointmentId>,
    },
    #[error("Failed to {action} appointment: {source}")]
    Failed {
        action: &'static str,
        #[source]
        source: GatewayError,
    },
}

impl ActionError {
    pub fn gateway_error(&self) -> Option<&GatewayError> {
        match self {
            ActionError::Failed { source, .. } => Some(source),
            ActionError::Busy { .. } => None,
        }
    }

    pub fn prompt(&self) -> Prompt {
        Prompt {
            title: ERROR_TITLE.to_string(),
            message: self.to_string(),
        }
    }
}

#[derive(Debug)]
struct BoardState {
    source: ListSource,
    applied_seq: u64,
    appointments: Vec<Appointment>,
}

pub struct AppointmentBoard {
    service: AppointmentService,
    lock: ProcessingLock,
    dispatched: AtomicU64,
    state: Mutex<BoardState>,
}

impl AppointmentBoard {
    pub fn new(service: AppointmentService, source: ListSource) -> Self {
        Self {
            service,
            lock: ProcessingLock::new(),
            dispatched: AtomicU64::new(0),
            state: Mutex::new(BoardState {
                source,
                applied_seq: 0,
                appointments: Vec::new(),
            }),
        }
    }

    pub fn source(&self) -> ListSource {
        self.state().source
    }

    /// Point the board at another list; the next refresh fetches it.
    pub fn set_source(&self, source: ListSource) {
        self.state().source = source;
    }

    /// Re-issue the list query, as on every screen focus.
    pub async fn refresh(&self) -> Result<RefreshOutcome, GatewayError> {
        let source = self.source();
        let seq = self.dispatched.fetch_add(1, Ordering::SeqCst) + 1;

        let list = match source {
            ListSource::Upcoming => self.service.list_upcoming().await?,
            ListSource::Client(id) => self.service.list_by_client(id).await?,
        };

        let latest = self.dispatched.load(Ordering::SeqCst);
        if seq < latest {
            tracing::debug!(seq, latest, "discarding stale appointment list");
            return Ok(RefreshOutcome::Stale);
        }

        let mut state = self.state();
        if seq < state.applied_seq {
            return Ok(RefreshOutcome::Stale);
        }
        state.applied_seq = seq;
        state.appointments = list;
        Ok(RefreshOutcome::Applied {
            count: state.appointments.len(),
        })
    }

    pub fn appointments(&self) -> Vec<Appointment> {
        self.state().appointments.clone()
    }

    /// The current list narrowed by day (in `tz`) and free-text query.
    pub fn visible<Tz: TimeZone>(&self, day: Option<NaiveDate>, query: &str, tz: &Tz) -> Vec<Appointment> {
        let state = self.state();
        filter_appointments(&state.appointments, day, query, tz)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn processing(&self) -> Option<AppointmentId> {
        self.lock.current()
    }

    /// Actions to render for `appt`; none at all while any transition is
    /// in flight.
    pub fn available_actions(&self, appt: &Appointment, now: DateTime<Utc>) -> Vec<AppointmentAction> {
        if self.lock.is_locked() {
            return Vec::new();
        }
        actions_for(appt, now)
    }

    pub async fn reschedule(&self, id: AppointmentId, at: DateTime<Utc>) -> Result<Option<Appointment>, ActionError> {
        self.run(id, Transition::Reschedule(at)).await
    }

    pub async fn cancel(&self, id: AppointmentId) -> Result<Option<Appointment>, ActionError> {
        self.run(id, Transition::Cancel).await
    }

    pub async fn mark_no_show(&self, id: AppointmentId) -> Result<Option<Appointment>, ActionError> {
        self.run(id, Transition::NoShow).await
    }

    pub async fn complete(&self, id: AppointmentId) -> Result<Option<Appointment>, ActionError> {
        self.run(id, Transition::Complete).await
    }

    /// `Ok(None)` when the backend accepted the transition without echoing
    /// the row; the refetch still runs.
    async fn run(&self, id: AppointmentId, transition: Transition) -> Result<Option<Appointment>, ActionError> {
        let result = {
            let Some(_guard) = self.lock.acquire(id) else {
                let processing = self.lock.current();
                tracing::warn!(requested = id, ?processing, "transition refused, another is in flight");
                return Err(ActionError::Busy {
                    requested: id,
                    processing,
                });
            };
            self.service.apply(id, transition).await
        };

        let appt = result.map_err(|source| ActionError::Failed {
            action: transition.verb(),
            source,
        })?;

        self.service
            .bus()
            .emit(Notification::success(transition.success_message()));
        if let Err(e) = self.refresh().await {
            tracing::warn!(error = %e, "refresh after transition failed");
        }
        Ok(appt)
    }

    fn state(&self) -> std::sync::MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
