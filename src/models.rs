use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub type ClientId = i64;
pub type InquiryId = i64;
pub type AppointmentId = i64;

#[derive(Clone)]
pub struct AppState {
    pub store: crate::store::Store,
}

/* -------------------------
   Response envelope
--------------------------*/

/// Wrapper every backend response travels in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

/* -------------------------
   Status enums
--------------------------*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Scheduled,
    Rescheduled,
    Cancelled,
    NoShow,
    Completed,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 5] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::Rescheduled,
        AppointmentStatus::Cancelled,
        AppointmentStatus::NoShow,
        AppointmentStatus::Completed,
    ];

    pub fn code(self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "SCHEDULED",
            AppointmentStatus::Rescheduled => "RESCHEDULED",
            AppointmentStatus::Cancelled => "CANCELLED",
            AppointmentStatus::NoShow => "NO_SHOW",
            AppointmentStatus::Completed => "COMPLETED",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code().eq_ignore_ascii_case(code.trim()))
    }

    pub fn label(self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "Scheduled",
            AppointmentStatus::Rescheduled => "Rescheduled",
            AppointmentStatus::Cancelled => "Cancelled",
            AppointmentStatus::NoShow => "No-Show",
            AppointmentStatus::Completed => "Completed",
        }
    }

    /// Badge colour for list rows.
    pub fn color(self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "secondary",
            AppointmentStatus::Completed => "success",
            AppointmentStatus::Cancelled => "error",
            AppointmentStatus::Rescheduled | AppointmentStatus::NoShow => "textLight",
        }
    }

    /// CANCELLED, NO_SHOW and COMPLETED accept no further transition.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AppointmentStatus::Cancelled | AppointmentStatus::NoShow | AppointmentStatus::Completed
        )
    }

    /// Only SCHEDULED appointments may move anywhere.
    pub fn can_transition_to(self, next: AppointmentStatus) -> bool {
        self == AppointmentStatus::Scheduled && next != AppointmentStatus::Scheduled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientStatus {
    New,
    Active,
    Inactive,
}

impl ClientStatus {
    pub const ALL: [ClientStatus; 3] = [ClientStatus::New, ClientStatus::Active, ClientStatus::Inactive];

    pub fn code(self) -> &'static str {
        match self {
            ClientStatus::New => "NEW",
            ClientStatus::Active => "ACTIVE",
            ClientStatus::Inactive => "INACTIVE",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code().eq_ignore_ascii_case(code.trim()))
    }

    pub fn label(self) -> &'static str {
        match self {
            ClientStatus::New => "New",
            ClientStatus::Active => "Active",
            ClientStatus::Inactive => "Inactive",
        }
    }
}

/// Status arrives either as a bare code or as a `{ id, code, label }` row.
#[derive(Deserialize)]
#[serde(untagged)]
enum StatusRepr {
    Code(String),
    Row { code: String },
}

impl StatusRepr {
    fn into_code(self) -> String {
        match self {
            StatusRepr::Code(c) => c,
            StatusRepr::Row { code } => code,
        }
    }
}

/// Absent and `null` both mean the backend sent only the status id.
fn deserialize_appointment_status<'de, D>(deserializer: D) -> Result<Option<AppointmentStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(code) = Option::<StatusRepr>::deserialize(deserializer)?.map(StatusRepr::into_code) else {
        return Ok(None);
    };
    AppointmentStatus::from_code(&code)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("unknown appointment status `{code}`")))
}

fn deserialize_client_status<'de, D>(deserializer: D) -> Result<Option<ClientStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(code) = Option::<StatusRepr>::deserialize(deserializer)?.map(StatusRepr::into_code) else {
        return Ok(None);
    };
    ClientStatus::from_code(&code)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("unknown client status `{code}`")))
}

/* -------------------------
   Entities
--------------------------*/

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: ClientId,
    #[serde(default)]
    pub name: Option<String>,
    pub mobile: String,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_status_id: Option<i64>,
    /// `None` when only the id came over the wire; see
    /// [`crate::reference::ReferenceData::resolve_client`].
    #[serde(
        default,
        deserialize_with = "deserialize_client_status",
        skip_serializing_if = "Option::is_none"
    )]
    pub current_status: Option<ClientStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().filter(|n| !n.trim().is_empty()).unwrap_or(&self.mobile)
    }

    pub fn brief(&self) -> ClientBrief {
        ClientBrief {
            id: self.id,
            name: self.name.clone(),
            mobile: self.mobile.clone(),
        }
    }
}

/// Client summary embedded in appointment rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientBrief {
    pub id: ClientId,
    #[serde(default)]
    pub name: Option<String>,
    pub mobile: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inquiry {
    pub id: InquiryId,
    pub client_id: ClientId,
    #[serde(default)]
    pub tattoo_size_id: Option<i64>,
    #[serde(default)]
    pub reference_type_id: Option<i64>,
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub remark: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: AppointmentId,
    pub client_id: ClientId,
    pub inquiry_id: InquiryId,
    pub appointment_at: DateTime<Utc>,
    #[serde(default)]
    pub tattoo_detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_status_id: Option<i64>,
    #[serde(
        default,
        deserialize_with = "deserialize_appointment_status",
        skip_serializing_if = "Option::is_none"
    )]
    pub appointment_status: Option<AppointmentStatus>,
    #[serde(default)]
    pub client: Option<ClientBrief>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Resolve-by-mobile payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientResolution {
    pub client: Client,
    #[serde(default)]
    pub latest_inquiry: Option<Inquiry>,
}

/// One row of a configuration lookup table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigEntry {
    pub id: i64,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(alias = "name")]
    pub label: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/* -------------------------
   Request DTOs
--------------------------*/

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveClientRequest {
    pub mobile: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl ClientUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.gender.is_none() && self.location.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInquiry {
    pub client_id: ClientId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tattoo_size_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_type_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub client_id: ClientId,
    pub inquiry_id: InquiryId,
    pub appointment_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tattoo_detail: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleRequest {
    pub reschedule_time: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn appointment_json(status: serde_json::Value) -> serde_json::Value {
        json!({
            "id": 201,
            "clientId": 1,
            "inquiryId": 101,
            "appointmentAt": "2025-12-30T11:00:00.000Z",
            "appointmentStatus": status,
            "createdAt": "2025-12-20T10:00:00Z",
            "updatedAt": "2025-12-20T10:00:00Z"
        })
    }

    #[test]
    fn status_accepts_bare_code() {
        let appt: Appointment = serde_json::from_value(appointment_json(json!("NO_SHOW"))).unwrap();
        assert_eq!(appt.appointment_status, Some(AppointmentStatus::NoShow));
        assert!(appt.client.is_none());
    }

    #[test]
    fn status_accepts_structured_row() {
        let appt: Appointment = serde_json::from_value(appointment_json(json!({
            "id": 3,
            "code": "COMPLETED",
            "label": "Completed",
            "isActive": true
        })))
        .unwrap();
        assert_eq!(appt.appointment_status, Some(AppointmentStatus::Completed));
    }

    #[test]
    fn null_or_missing_status_keeps_only_the_id() {
        let mut row = appointment_json(json!(null));
        row["appointmentStatusId"] = json!(4);
        let appt: Appointment = serde_json::from_value(row.clone()).unwrap();
        assert_eq!(appt.appointment_status, None);
        assert_eq!(appt.appointment_status_id, Some(4));

        row.as_object_mut().unwrap().remove("appointmentStatus");
        let appt: Appointment = serde_json::from_value(row).unwrap();
        assert_eq!(appt.appointment_status, None);
        assert_eq!(appt.appointment_status_id, Some(4));
    }

    #[test]
    fn badge_colours_follow_status() {
        assert_eq!(AppointmentStatus::Scheduled.color(), "secondary");
        assert_eq!(AppointmentStatus::Completed.color(), "success");
        assert_eq!(AppointmentStatus::Cancelled.color(), "error");
        assert_eq!(AppointmentStatus::NoShow.color(), AppointmentStatus::Rescheduled.color());
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = serde_json::from_value::<Appointment>(appointment_json(json!("PENDING"))).unwrap_err();
        assert!(err.to_string().contains("PENDING"));
    }

    #[test]
    fn status_serializes_as_code() {
        let v = serde_json::to_value(AppointmentStatus::NoShow).unwrap();
        assert_eq!(v, json!("NO_SHOW"));
        for s in AppointmentStatus::ALL {
            assert_eq!(AppointmentStatus::from_code(s.code()), Some(s));
        }
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for from in [
            AppointmentStatus::Cancelled,
            AppointmentStatus::NoShow,
            AppointmentStatus::Completed,
        ] {
            assert!(from.is_terminal());
            for to in AppointmentStatus::ALL {
                assert!(!from.can_transition_to(to));
            }
        }
        assert!(AppointmentStatus::Scheduled.can_transition_to(AppointmentStatus::Rescheduled));
        assert!(!AppointmentStatus::Scheduled.can_transition_to(AppointmentStatus::Scheduled));
        assert!(!AppointmentStatus::Rescheduled.is_terminal());
    }

    #[test]
    fn client_status_parses_code_row_or_null() {
        let client: Client = serde_json::from_value(json!({
            "id": 7,
            "mobile": "9876543210",
            "createdAt": "2025-12-20T10:00:00Z",
            "updatedAt": "2025-12-20T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(client.current_status, None);
        assert_eq!(client.display_name(), "9876543210");

        let client: Client = serde_json::from_value(json!({
            "id": 7,
            "mobile": "9876543210",
            "currentStatusId": 1,
            "currentStatus": null,
            "createdAt": "2025-12-20T10:00:00Z",
            "updatedAt": "2025-12-20T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(client.current_status, None);
        assert_eq!(client.current_status_id, Some(1));

        let client: Client = serde_json::from_value(json!({
            "id": 7,
            "name": "Aman Verma",
            "mobile": "9876543210",
            "currentStatus": { "id": 2, "code": "ACTIVE", "label": "Active" },
            "createdAt": "2025-12-20T10:00:00Z",
            "updatedAt": "2025-12-20T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(client.current_status, Some(ClientStatus::Active));
        assert_eq!(client.display_name(), "Aman Verma");
    }

    #[test]
    fn envelope_without_data_parses() {
        let env: Envelope<Vec<Client>> = serde_json::from_value(json!({ "success": true })).unwrap();
        assert!(env.success);
        assert!(env.data.is_none());

        // Payload types need not implement Default.
        let env: Envelope<ClientResolution> =
            serde_json::from_value(json!({ "success": true, "data": null })).unwrap();
        assert!(env.data.is_none());
    }

    #[test]
    fn config_entry_accepts_name_alias() {
        let entry: ConfigEntry =
            serde_json::from_value(json!({ "id": 1, "name": "INSTAGRAM", "isActive": false })).unwrap();
        assert_eq!(entry.label, "INSTAGRAM");
        assert!(!entry.is_active);
    }

    #[test]
    fn empty_update_skips_fields() {
        let update = ClientUpdate {
            name: Some("Neha".into()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({ "name": "Neha" }));
        assert!(ClientUpdate::default().is_empty());
    }
}
