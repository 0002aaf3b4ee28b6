//! Client resolution: mobile number in, durable client identity out.

use crate::gateway::{Gateway, GatewayError};
use crate::models::{Client, ClientId, ClientResolution, ClientUpdate, ResolveClientRequest};
use crate::reference::ReferenceData;

/// Front-desk convention for a complete mobile number.
pub const MOBILE_DIGITS: usize = 10;
pub const INVALID_MOBILE_MESSAGE: &str = "Please enter a valid mobile number";

/// Caller-side check run before any lookup: exactly ten ASCII digits.
pub fn validate_mobile(mobile: &str) -> Result<&str, String> {
    let mobile = mobile.trim();
    if mobile.len() == MOBILE_DIGITS && mobile.bytes().all(|b| b.is_ascii_digit()) {
        Ok(mobile)
    } else {
        Err(INVALID_MOBILE_MESSAGE.to_string())
    }
}

#[derive(Clone)]
pub struct ClientService {
    gateway: Gateway,
    reference: Option<ReferenceData>,
}

impl ClientService {
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

    /// Find-or-create by mobile. The backend creates the client on first
    /// touch, so a second call with the same number returns the same id.
    /// `None` when the backend acknowledged without a payload.
    pub async fn resolve_by_mobile(&self, mobile: &str) -> Result<Option<ClientResolution>, GatewayError> {
        let mobile = mobile.trim();
        if mobile.is_empty() {
            return Err(self.gateway.reject_locally(INVALID_MOBILE_MESSAGE));
        }

        let resolution: Option<ClientResolution> = self
            .gateway
            .post(
                "/clients",
                &ResolveClientRequest {
                    mobile: mobile.to_string(),
                },
            )
            .await?;

        let Some(mut resolution) = resolution else {
            tracing::warn!("client resolution returned no data");
            return Ok(None);
        };
        self.resolve_status(&mut resolution.client);
        tracing::info!(
            client_id = resolution.client.id,
            has_inquiry = resolution.latest_inquiry.is_some(),
            "client resolved"
        );
        Ok(Some(resolution))
    }

    /// Lookup without creation; `None` when nobody has this number. Input
    /// that is not all digits cannot match a stored mobile and is answered
    /// locally.
    pub async fn get_by_mobile(&self, mobile: &str) -> Result<Option<Client>, GatewayError> {
        let mobile = mobile.trim();
        if mobile.is_empty() || !mobile.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(None);
        }
        let mut client: Option<Client> = self
            .gateway
            .get_optional(&format!("/clients/mobile/{mobile}"))
            .await?;
        if let Some(c) = client.as_mut() {
            self.resolve_status(c);
        }
        Ok(client)
    }

    pub async fn get_all(&self) -> Result<Vec<Client>, GatewayError> {
        let mut clients: Vec<Client> = self.gateway.get_list("/clients/all").await?;
        clients.iter_mut().for_each(|c| self.resolve_status(c));
        Ok(clients)
    }

    pub async fn update(&self, id: ClientId, update: &ClientUpdate) -> Result<Option<Client>, GatewayError> {
        if update.is_empty() {
            return Err(self.gateway.reject_locally("Nothing to update"));
        }
        let mut client: Option<Client> = self.gateway.patch(&format!("/clients/{id}"), update).await?;
        if let Some(c) = client.as_mut() {
            self.resolve_status(c);
        }
        tracing::info!(client_id = id, "client updated");
        Ok(client)
    }

    /// Live search as typed into the clients screen: a full number hits the
    /// lookup endpoint, an empty query lists everyone, anything else narrows
    /// the full list by name or mobile substring.
    pub async fn search(&self, query: &str) -> Result<Vec<Client>, GatewayError> {
        let query = query.trim();
        if query.is_empty() {
            return self.get_all().await;
        }
        if validate_mobile(query).is_ok() {
            return Ok(self.get_by_mobile(query).await?.into_iter().collect());
        }

        let needle = query.to_lowercase();
        Ok(self
            .get_all()
            .await?
            .into_iter()
            .filter(|c| {
                c.mobile.contains(&needle)
                    || c
                        .name
                        .as_deref()
                        .is_some_and(|n| n.to_lowercase().contains(&needle))
            })
            .collect())
    }

    fn resolve_status(&self, client: &mut Client) {
        if let Some(reference) = &self.reference {
            reference.resolve_client(client);
        }
    }
}
