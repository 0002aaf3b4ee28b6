use crate::clients::{ClientService, validate_mobile};
use crate::gateway::{Gateway, GatewayError};
use crate::models::{Client, ClientId, ClientResolution, Inquiry, NewInquiry};
use crate::reference::ReferenceData;

pub const NO_CLIENT_MESSAGE: &str = "Resolve a client by mobile number before saving the inquiry";

/// Editable intake form contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InquiryDraft {
    pub tattoo_size_id: Option<i64>,
    pub reference_type_id: Option<i64>,
    pub intent: String,
    pub remark: String,
}

impl InquiryDraft {
    /// Prefill from the client's most recent inquiry, if any.
    pub fn prefilled(latest: Option<&Inquiry>) -> Self {
        match latest {
            Some(i) => Self {
                tattoo_size_id: i.tattoo_size_id,
                reference_type_id: i.reference_type_id,
                intent: i.intent.clone().unwrap_or_default(),
                remark: i.remark.clone().unwrap_or_default(),
            },
            None => Self::default(),
        }
    }

    pub fn into_request(self, client_id: ClientId) -> NewInquiry {
        let text = |s: String| {
            let s = s.trim().to_string();
            (!s.is_empty()).then_some(s)
        };
        NewInquiry {
            client_id,
            tattoo_size_id: self.tattoo_size_id,
            reference_type_id: self.reference_type_id,
            intent: text(self.intent),
            remark: text(self.remark),
        }
    }
}

/// Most recently created inquiry; ties keep the higher id.
pub fn latest_of(inquiries: &[Inquiry]) -> Option<&Inquiry> {
    inquiries.iter().max_by_key(|i| (i.created_at, i.id))
}

#[derive(Clone)]
pub struct InquiryService {
    gateway: Gateway,
}

impl InquiryService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Inquiries are immutable once created; there is no update call.
    pub async fn create(
        &self,
        client: Option<&Client>,
        draft: InquiryDraft,
    ) -> Result<Option<Inquiry>, GatewayError> {
        let Some(client) = client else {
            return Err(self.gateway.reject_locally(NO_CLIENT_MESSAGE));
        };
        let inquiry: Option<Inquiry> = self
            .gateway
            .post("/inquiries", &draft.into_request(client.id))
            .await?;
        tracing::info!(
            inquiry_id = inquiry.as_ref().map(|i| i.id),
            client_id = client.id,
            "inquiry recorded"
        );
        Ok(inquiry)
    }

    /// Newest first.
    pub async fn list_by_client(&self, client_id: ClientId) -> Result<Vec<Inquiry>, GatewayError> {
        let mut inquiries: Vec<Inquiry> = self
            .gateway
            .get_list(&format!("/inquiries/client/{client_id}"))
            .await?;
        inquiries.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(inquiries)
    }
}

/// Walk-in intake: validate the number, resolve the client, then record
/// the inquiry. Each step waits for the previous one.
#[derive(Clone)]
pub struct Intake {
    clients: ClientService,
    inquiries: InquiryService,
    gateway: Gateway,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntakeOutcome {
    pub resolution: ClientResolution,
    /// `None` when the backend saved without echoing the row.
    pub inquiry: Option<Inquiry>,
}

impl Intake {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            clients: ClientService::new(gateway.clone()),
            inquiries: InquiryService::new(gateway.clone()),
            gateway,
        }
    }

    pub fn with_reference(mut self, reference: ReferenceData) -> Self {
        self.clients = self.clients.with_reference(reference);
        self
    }

    /// Front-desk entry: returns the client and a form prefilled from its
    /// latest inquiry. `None` when the backend resolved without a payload.
    pub async fn start(&self, mobile: &str) -> Result<Option<(ClientResolution, InquiryDraft)>, GatewayError> {
        let mobile = validate_mobile(mobile).map_err(|m| self.gateway.reject_locally(m))?;
        let resolution = self.clients.resolve_by_mobile(mobile).await?;
        Ok(resolution.map(|r| {
            let draft = InquiryDraft::prefilled(r.latest_inquiry.as_ref());
            (r, draft)
        }))
    }

    pub async fn record(&self, mobile: &str, draft: InquiryDraft) -> Result<IntakeOutcome, GatewayError> {
        let Some((resolution, _)) = self.start(mobile).await? else {
            return Err(self.gateway.reject_locally(NO_CLIENT_MESSAGE));
        };
        let inquiry = self.inquiries.create(Some(&resolution.client), draft).await?;
        Ok(IntakeOutcome { resolution, inquiry })
    }
}
