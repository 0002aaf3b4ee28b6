//! Session-scoped configuration lookups, fetched once and shared read-only.

use std::sync::Arc;

use crate::gateway::{Gateway, GatewayError};
use crate::models::{Appointment, AppointmentStatus, Client, ClientStatus, ConfigEntry};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceTables {
    pub tattoo_sizes: Vec<ConfigEntry>,
    pub reference_types: Vec<ConfigEntry>,
    pub appointment_statuses: Vec<ConfigEntry>,
    pub client_statuses: Vec<ConfigEntry>,
}

/// Cheap to clone; every clone sees the same immutable tables.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    tables: Arc<ReferenceTables>,
}

impl ReferenceData {
    pub fn new(tables: ReferenceTables) -> Self {
        Self {
            tables: Arc::new(tables),
        }
    }

    /// Fetch all four tables concurrently; any failure fails the load.
    pub async fn load(gateway: &Gateway) -> Result<Self, GatewayError> {
        let (tattoo_sizes, reference_types, appointment_statuses, client_statuses) = tokio::try_join!(
            gateway.get_list::<ConfigEntry>("/config/tattoo-sizes"),
            gateway.get_list::<ConfigEntry>("/config/reference-types"),
            gateway.get_list::<ConfigEntry>("/config/appointment-statuses"),
            gateway.get_list::<ConfigEntry>("/config/client-statuses"),
        )?;

        tracing::info!(
            tattoo_sizes = tattoo_sizes.len(),
            reference_types = reference_types.len(),
            "reference data loaded"
        );
        Ok(Self::new(ReferenceTables {
            tattoo_sizes,
            reference_types,
            appointment_statuses,
            client_statuses,
        }))
    }

    pub fn tables(&self) -> &ReferenceTables {
        &self.tables
    }

    pub fn tattoo_size(&self, id: i64) -> Option<&ConfigEntry> {
        self.tables.tattoo_sizes.iter().find(|e| e.id == id)
    }

    pub fn reference_type(&self, id: i64) -> Option<&ConfigEntry> {
        self.tables.reference_types.iter().find(|e| e.id == id)
    }

    /// Status named by a config row id, matched on the row's code, or on
    /// its label when the row carries no code.
    pub fn appointment_status(&self, id: i64) -> Option<AppointmentStatus> {
        status_code(&self.tables.appointment_statuses, id).and_then(AppointmentStatus::from_code)
    }

    pub fn client_status(&self, id: i64) -> Option<ClientStatus> {
        status_code(&self.tables.client_statuses, id).and_then(ClientStatus::from_code)
    }

    /// Fill in a status that arrived as an id only.
    pub fn resolve_appointment(&self, appt: &mut Appointment) {
        if appt.appointment_status.is_none() {
            appt.appointment_status = appt.appointment_status_id.and_then(|id| self.appointment_status(id));
        }
    }

    pub fn resolve_client(&self, client: &mut Client) {
        if client.current_status.is_none() {
            client.current_status = client.current_status_id.and_then(|id| self.client_status(id));
        }
    }

    /// Active rows only, for pickers.
    pub fn active_tattoo_sizes(&self) -> impl Iterator<Item = &ConfigEntry> {
        self.tables.tattoo_sizes.iter().filter(|e| e.is_active)
    }

    pub fn active_reference_types(&self) -> impl Iterator<Item = &ConfigEntry> {
        self.tables.reference_types.iter().filter(|e| e.is_active)
    }
}

fn status_code(rows: &[ConfigEntry], id: i64) -> Option<&str> {
    rows.iter()
        .find(|e| e.id == id)
        .map(|e| e.code.as_deref().unwrap_or(&e.label))
}
