//! Remote data gateway: the only code that talks to the backend.
//!
//! Every call goes through [`Gateway::request`], which unwraps the
//! `{ success, data, message }` envelope and turns every failure into a
//! [`GatewayError`]. Each failure is also published once on the
//! [`NotificationBus`] so screens never have to display it themselves.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{Config, DEFAULT_TIMEOUT_SECS};
use crate::models::Envelope;
use crate::notify::{Notification, NotificationBus};

pub mod http;
#[cfg(test)]
pub mod mock;

pub use http::HttpTransport;

pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection.";
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";
pub const ERROR_TITLE: &str = "Error";
pub const VALIDATION_TITLE: &str = "Validation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Patch,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What came back over the wire, before any envelope handling.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            body: body.to_string().into_bytes(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// No response was received.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("transport error: {0}")]
    Other(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<RawResponse, TransportError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("{}", NETWORK_ERROR_MESSAGE)]
    Network,
    #[error("{message}")]
    Application { status: u16, message: String },
    #[error("{0}")]
    Validation(String),
}

impl GatewayError {
    /// Text shown to the user, identical to the `Display` output.
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Application { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure bodies: the envelope shape, or `{ error: { message } }`.
#[derive(Deserialize)]
struct FailureBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<FailureDetail>,
}

#[derive(Deserialize)]
struct FailureDetail {
    #[serde(default)]
    message: Option<String>,
}

fn failure_message(body: &[u8]) -> String {
    serde_json::from_slice::<FailureBody>(body)
        .ok()
        .and_then(|b| b.message.or_else(|| b.error.and_then(|e| e.message)))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string())
}

#[derive(Clone)]
pub struct Gateway {
    transport: Arc<dyn Transport>,
    bus: NotificationBus,
    timeout: Duration,
}

impl Gateway {
    pub fn new(transport: Arc<dyn Transport>, bus: NotificationBus) -> Self {
        Self {
            transport,
            bus,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Gateway backed by reqwest, pointed at the configured base URL.
    pub fn http(config: &Config, bus: NotificationBus) -> anyhow::Result<Self> {
        let transport = HttpTransport::new(&config.api_base_url, config.request_timeout())?;
        Ok(Self::new(Arc::new(transport), bus).with_timeout(config.request_timeout()))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn bus(&self) -> &NotificationBus {
        &self.bus
    }

    /// Issue one request and unwrap the envelope payload.
    ///
    /// `Ok(None)` means the server reported success without `data`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<T>, GatewayError> {
        match self.exchange(method, path, body).await {
            Ok(raw) => self.unwrap_envelope(method, path, raw),
            Err(e) => Err(self.fail(method, path, e)),
        }
    }

    /// Missing `data` on a list endpoint is an empty list.
    pub async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, GatewayError> {
        Ok(self.request(Method::Get, path, None).await?.unwrap_or_default())
    }

    /// Lookup where "not found" is an expected answer: a 404 yields `Ok(None)`
    /// and nothing is published on the bus.
    pub async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<T>, GatewayError> {
        match self.exchange(Method::Get, path, None).await {
            Ok(raw) if raw.status == 404 => {
                tracing::debug!(path, "lookup found nothing");
                Ok(None)
            }
            Ok(raw) => self.unwrap_envelope(Method::Get, path, raw),
            Err(e) => Err(self.fail(Method::Get, path, e)),
        }
    }

    /// `Ok(None)` when the server acknowledged the write without echoing
    /// the entity.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<Option<T>, GatewayError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self.encode(Method::Post, path, body)?;
        self.request(Method::Post, path, Some(body)).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<Option<T>, GatewayError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self.encode(Method::Patch, path, body)?;
        self.request(Method::Patch, path, Some(body)).await
    }

    /// PATCH with no body, used by the status transitions.
    pub async fn patch_empty<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, GatewayError> {
        self.request(Method::Patch, path, None).await
    }

    /// Fail a caller-side check without touching the network.
    pub fn reject_locally(&self, message: impl Into<String>) -> GatewayError {
        let message = message.into();
        tracing::debug!(%message, "validation failed locally");
        self.bus
            .emit(Notification::error(VALIDATION_TITLE, message.clone()));
        GatewayError::Validation(message)
    }

    async fn exchange(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<RawResponse, GatewayError> {
        tracing::debug!(%method, path, "gateway request");
        match tokio::time::timeout(self.timeout, self.transport.send(method, path, body)).await {
            Ok(Ok(raw)) => Ok(raw),
            Ok(Err(e)) => {
                tracing::warn!(%method, path, error = %e, "no response received");
                Err(GatewayError::Network)
            }
            Err(_) => {
                tracing::warn!(%method, path, timeout = ?self.timeout, "request timed out");
                Err(GatewayError::Network)
            }
        }
    }

    fn unwrap_envelope<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        raw: RawResponse,
    ) -> Result<Option<T>, GatewayError> {
        if !raw.is_success() {
            let err = GatewayError::Application {
                status: raw.status,
                message: failure_message(&raw.body),
            };
            return Err(self.fail(method, path, err));
        }

        if raw.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let envelope: Envelope<T> = match serde_json::from_slice(&raw.body) {
            Ok(env) => env,
            Err(e) => {
                tracing::warn!(%method, path, error = %e, "undecodable response body");
                let err = GatewayError::Application {
                    status: raw.status,
                    message: GENERIC_ERROR_MESSAGE.to_string(),
                };
                return Err(self.fail(method, path, err));
            }
        };

        if !envelope.success {
            let err = GatewayError::Application {
                status: raw.status,
                message: envelope
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string()),
            };
            return Err(self.fail(method, path, err));
        }

        Ok(envelope.data)
    }

    fn encode<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Value, GatewayError> {
        serde_json::to_value(body).map_err(|e| {
            tracing::warn!(%method, path, error = %e, "request body not serializable");
            self.reject_locally(GENERIC_ERROR_MESSAGE)
        })
    }

    fn fail(&self, method: Method, path: &str, err: GatewayError) -> GatewayError {
        tracing::warn!(%method, path, error = %err, "gateway call failed");
        self.bus.emit(Notification::error(ERROR_TITLE, err.message()));
        err
    }
}
