//! In-memory backing store for the stub backend, seeded with sample studio
//! data so the client layer can be exercised end to end.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::error::ApiError;
use crate::models::{
    Appointment, AppointmentId, AppointmentStatus, Client, ClientId, ClientResolution,
    ClientStatus, ClientUpdate, ConfigEntry, Inquiry, InquiryId, NewAppointment, NewInquiry,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigTable {
    TattooSizes,
    ReferenceTypes,
    AppointmentStatuses,
    ClientStatuses,
}

#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<Mutex<StoreData>>,
}

#[derive(Default)]
struct StoreData {
    clients: BTreeMap<ClientId, Client>,
    inquiries: BTreeMap<InquiryId, Inquiry>,
    appointments: BTreeMap<AppointmentId, Appointment>,
    tattoo_sizes: Vec<ConfigEntry>,
    reference_types: Vec<ConfigEntry>,
}

fn entry(id: i64, label: &str) -> ConfigEntry {
    ConfigEntry {
        id,
        code: Some(label.to_string()),
        label: label.to_string(),
        is_active: true,
    }
}

fn ts(s: &str) -> DateTime<Utc> {
    s.parse().unwrap_or_default()
}

fn is_mobile(s: &str) -> bool {
    s.len() == 10 && s.bytes().all(|b| b.is_ascii_digit())
}

/// Row id of a status in the served config table.
fn appointment_status_id(status: AppointmentStatus) -> i64 {
    AppointmentStatus::ALL.iter().position(|s| *s == status).map_or(0, |i| i as i64 + 1)
}

fn client_status_id(status: ClientStatus) -> i64 {
    ClientStatus::ALL.iter().position(|s| *s == status).map_or(0, |i| i as i64 + 1)
}

fn clean(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl Store {
    /// Store with lookup tables but no clients.
    pub fn empty() -> Self {
        let data = StoreData {
            tattoo_sizes: vec![entry(1, "SMALL"), entry(2, "MEDIUM"), entry(3, "LARGE")],
            reference_types: vec![entry(1, "INSTAGRAM"), entry(2, "GOOGLE")],
            ..Default::default()
        };
        Self {
            inner: Arc::new(Mutex::new(data)),
        }
    }

    pub fn seeded() -> Self {
        let store = Self::empty();
        {
            let mut data = store.data();
            let clients = [
                (1, "Aman Verma", "9876543210"),
                (2, "Rohit Singh", "9123456789"),
                (3, "Karan Mehta", "9988776655"),
                (4, "Neha Kapoor", "9090909090"),
                (5, "Pooja Sharma", "9812345678"),
                (6, "Arjun Patel", "9345612789"),
            ];
            for (id, name, mobile) in clients {
                let at = ts("2025-12-01T09:00:00Z");
                data.clients.insert(
                    id,
                    Client {
                        id,
                        name: Some(name.to_string()),
                        mobile: mobile.to_string(),
                        gender: None,
                        location: None,
                        current_status_id: Some(client_status_id(ClientStatus::Active)),
                        current_status: Some(ClientStatus::Active),
                        created_at: at,
                        updated_at: at,
                    },
                );
            }

            let inquiries = [
                (101, 1, "Forearm dragon tattoo", "Black and grey", 2, 1, "2025-12-20T10:00:00Z"),
                (102, 2, "Back piece tribal design", "Full back coverage", 3, 2, "2025-12-21T12:00:00Z"),
                (103, 3, "Minimal wrist tattoo", "Small symbol", 1, 1, "2025-12-22T15:00:00Z"),
                (104, 1, "Cover-up old tattoo", "Chest area", 2, 1, "2025-12-23T11:30:00Z"),
                (105, 4, "Mandala shoulder design", "Detailed work", 2, 2, "2025-12-24T17:00:00Z"),
                (106, 5, "Name tattoo on collarbone", "Cursive font", 1, 1, "2025-12-25T14:00:00Z"),
                (107, 6, "Full sleeve tattoo", "Japanese style", 3, 2, "2025-12-26T16:00:00Z"),
            ];
            for (id, client_id, intent, remark, size, reference, at) in inquiries {
                data.inquiries.insert(
                    id,
                    Inquiry {
                        id,
                        client_id,
                        tattoo_size_id: Some(size),
                        reference_type_id: Some(reference),
                        intent: Some(intent.to_string()),
                        remark: Some(remark.to_string()),
                        created_at: ts(at),
                    },
                );
            }

            use AppointmentStatus::*;
            let appointments = [
                (201, 1, 101, "2025-12-30T11:00:00Z", Scheduled, "Forearm dragon - black and grey shading"),
                (202, 2, 102, "2025-12-28T13:00:00Z", Completed, "Back tribal design completed"),
                (203, 3, 103, "2025-12-29T16:00:00Z", Scheduled, "Minimal wrist symbol"),
                (204, 4, 105, "2025-12-27T10:00:00Z", NoShow, "Mandala shoulder design"),
                (205, 5, 106, "2025-12-31T18:00:00Z", Scheduled, "Name tattoo - cursive font"),
                (206, 6, 107, "2025-12-30T14:30:00Z", Scheduled, "Full sleeve - Japanese style (session 1)"),
                (207, 1, 104, "2026-01-02T15:00:00Z", Scheduled, "Cover-up chest tattoo"),
                (208, 2, 102, "2025-12-26T11:30:00Z", Cancelled, "Back tribal (cancelled - rescheduled)"),
            ];
            for (id, client_id, inquiry_id, at, status, detail) in appointments {
                let created = ts("2025-12-20T10:00:00Z");
                data.appointments.insert(
                    id,
                    Appointment {
                        id,
                        client_id,
                        inquiry_id,
                        appointment_at: ts(at),
                        tattoo_detail: Some(detail.to_string()),
                        appointment_status_id: Some(appointment_status_id(status)),
                        appointment_status: Some(status),
                        client: None,
                        created_at: created,
                        updated_at: created,
                    },
                );
            }
        }
        store
    }

    /* -------------------------
       Clients
    --------------------------*/

    pub fn resolve_client(&self, mobile: &str) -> Result<ClientResolution, ApiError> {
        let mobile = mobile.trim();
        if !is_mobile(mobile) {
            return Err(ApiError::BadRequest("mobile must be a 10-digit number".into()));
        }

        let mut data = self.data();
        let existing = data.clients.values().find(|c| c.mobile == mobile).cloned();
        let client = match existing {
            Some(c) => c,
            None => {
                let id = data.clients.keys().next_back().copied().unwrap_or(0) + 1;
                let now = Utc::now();
                let client = Client {
                    id,
                    name: None,
                    mobile: mobile.to_string(),
                    gender: None,
                    location: None,
                    current_status_id: Some(client_status_id(ClientStatus::New)),
                    current_status: Some(ClientStatus::New),
                    created_at: now,
                    updated_at: now,
                };
                data.clients.insert(id, client.clone());
                tracing::info!(client_id = id, "client created on first contact");
                client
            }
        };

        let latest_inquiry = data
            .inquiries
            .values()
            .filter(|i| i.client_id == client.id)
            .max_by_key(|i| (i.created_at, i.id))
            .cloned();
        Ok(ClientResolution {
            client,
            latest_inquiry,
        })
    }

    pub fn client_by_mobile(&self, mobile: &str) -> Option<Client> {
        self.data().clients.values().find(|c| c.mobile == mobile.trim()).cloned()
    }

    /// Newest first.
    pub fn clients(&self) -> Vec<Client> {
        let mut clients: Vec<Client> = self.data().clients.values().cloned().collect();
        clients.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        clients
    }

    pub fn update_client(&self, id: ClientId, update: ClientUpdate) -> Result<Client, ApiError> {
        let mut data = self.data();
        let client = data.clients.get_mut(&id).ok_or_else(ApiError::client_not_found)?;
        if let Some(name) = update.name {
            client.name = clean(Some(name));
        }
        if let Some(gender) = update.gender {
            client.gender = clean(Some(gender));
        }
        if let Some(location) = update.location {
            client.location = clean(Some(location));
        }
        client.updated_at = Utc::now();
        Ok(client.clone())
    }

    /* -------------------------
       Inquiries
    --------------------------*/

    pub fn create_inquiry(&self, req: NewInquiry) -> Result<Inquiry, ApiError> {
        let mut data = self.data();
        if !data.clients.contains_key(&req.client_id) {
            return Err(ApiError::BadRequest(format!("Client {} does not exist", req.client_id)));
        }
        if let Some(size) = req.tattoo_size_id {
            if !data.tattoo_sizes.iter().any(|e| e.id == size) {
                return Err(ApiError::BadRequest(format!("Unknown tattoo size {size}")));
            }
        }
        if let Some(reference) = req.reference_type_id {
            if !data.reference_types.iter().any(|e| e.id == reference) {
                return Err(ApiError::BadRequest(format!("Unknown reference type {reference}")));
            }
        }

        let id = data.inquiries.keys().next_back().copied().unwrap_or(100) + 1;
        let inquiry = Inquiry {
            id,
            client_id: req.client_id,
            tattoo_size_id: req.tattoo_size_id,
            reference_type_id: req.reference_type_id,
            intent: clean(req.intent),
            remark: clean(req.remark),
            created_at: Utc::now(),
        };
        data.inquiries.insert(id, inquiry.clone());
        Ok(inquiry)
    }

    /// Newest first.
    pub fn inquiries_for(&self, client_id: ClientId) -> Vec<Inquiry> {
        let mut list: Vec<Inquiry> = self
            .data()
            .inquiries
            .values()
            .filter(|i| i.client_id == client_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        list
    }

    /* -------------------------
       Appointments
    --------------------------*/

    pub fn create_appointment(&self, req: NewAppointment) -> Result<Appointment, ApiError> {
        let mut data = self.data();
        if !data.clients.contains_key(&req.client_id) {
            return Err(ApiError::BadRequest(format!("Client {} does not exist", req.client_id)));
        }
        match data.inquiries.get(&req.inquiry_id) {
            None => {
                return Err(ApiError::BadRequest(format!("Inquiry {} does not exist", req.inquiry_id)));
            }
            Some(i) if i.client_id != req.client_id => {
                return Err(ApiError::BadRequest(format!(
                    "Inquiry {} belongs to another client",
                    req.inquiry_id
                )));
            }
            Some(_) => {}
        }

        let id = data.appointments.keys().next_back().copied().unwrap_or(200) + 1;
        let now = Utc::now();
        let appt = Appointment {
            id,
            client_id: req.client_id,
            inquiry_id: req.inquiry_id,
            appointment_at: req.appointment_at,
            tattoo_detail: clean(req.tattoo_detail),
            appointment_status_id: Some(appointment_status_id(AppointmentStatus::Scheduled)),
            appointment_status: Some(AppointmentStatus::Scheduled),
            client: None,
            created_at: now,
            updated_at: now,
        };
        data.appointments.insert(id, appt.clone());
        Ok(data.with_client(appt))
    }

    /// Everything not yet closed out, earliest first.
    pub fn upcoming(&self) -> Vec<Appointment> {
        self.appointments_where(|a| a.appointment_status.is_some_and(|s| !s.is_terminal()))
    }

    pub fn appointments_for(&self, client_id: ClientId) -> Vec<Appointment> {
        self.appointments_where(|a| a.client_id == client_id)
    }

    /// Move a SCHEDULED appointment to `target`. A reschedule also moves the
    /// instant; the id never changes.
    pub fn transition(
        &self,
        id: AppointmentId,
        target: AppointmentStatus,
        reschedule_to: Option<DateTime<Utc>>,
    ) -> Result<Appointment, ApiError> {
        let mut data = self.data();
        let appt = data
            .appointments
            .get_mut(&id)
            .ok_or_else(|| ApiError::appointment_not_found(id))?;

        let current = appt
            .appointment_status
            .ok_or_else(|| ApiError::Internal(format!("appointment {id} has no status")))?;
        if !current.can_transition_to(target) {
            let message = match current {
                AppointmentStatus::Completed => "Appointment already completed",
                AppointmentStatus::Cancelled => "Appointment already cancelled",
                AppointmentStatus::NoShow => "Appointment already marked as no-show",
                AppointmentStatus::Rescheduled => "Appointment already rescheduled",
                AppointmentStatus::Scheduled => "Appointment is already scheduled",
            };
            tracing::warn!(appointment_id = id, from = current.code(), to = target.code(), "transition refused");
            return Err(ApiError::Conflict(message.into()));
        }

        if let Some(at) = reschedule_to {
            appt.appointment_at = at;
        }
        appt.appointment_status_id = Some(appointment_status_id(target));
        appt.appointment_status = Some(target);
        appt.updated_at = Utc::now();
        let appt = appt.clone();
        tracing::info!(appointment_id = id, to = target.code(), "appointment transitioned");
        Ok(data.with_client(appt))
    }

    /* -------------------------
       Configuration
    --------------------------*/

    pub fn config(&self, table: ConfigTable) -> Vec<ConfigEntry> {
        match table {
            ConfigTable::TattooSizes => self.data().tattoo_sizes.clone(),
            ConfigTable::ReferenceTypes => self.data().reference_types.clone(),
            ConfigTable::AppointmentStatuses => AppointmentStatus::ALL
                .into_iter()
                .map(|s| ConfigEntry {
                    id: appointment_status_id(s),
                    code: Some(s.code().to_string()),
                    label: s.label().to_string(),
                    is_active: true,
                })
                .collect(),
            ConfigTable::ClientStatuses => ClientStatus::ALL
                .into_iter()
                .map(|s| ConfigEntry {
                    id: client_status_id(s),
                    code: Some(s.code().to_string()),
                    label: s.label().to_string(),
                    is_active: true,
                })
                .collect(),
        }
    }

    fn appointments_where<F>(&self, keep: F) -> Vec<Appointment>
    where
        F: Fn(&Appointment) -> bool,
    {
        let data = self.data();
        let mut list: Vec<Appointment> = data
            .appointments
            .values()
            .filter(|a| keep(a))
            .cloned()
            .map(|a| data.with_client(a))
            .collect();
        list.sort_by_key(|a| (a.appointment_at, a.id));
        list
    }

    fn data(&self) -> MutexGuard<'_, StoreData> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StoreData {
    /// Attach the current client name and mobile.
    fn with_client(&self, mut appt: Appointment) -> Appointment {
        appt.client = self.clients.get(&appt.client_id).map(Client::brief);
        appt
    }
}
