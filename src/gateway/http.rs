use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::{Method, RawResponse, Transport, TransportError};

/// reqwest-backed transport for the studio backend.
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<RawResponse, TransportError> {
        let verb = match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
        };

        let mut request = self
            .client
            .request(verb, self.url(path))
            .header(reqwest::header::ACCEPT, "application/json")
            .header("X-Request-Id", Uuid::new_v4().to_string());
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else if e.is_connect() {
                TransportError::Connect(self.base_url.clone())
            } else {
                TransportError::Other(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Other(format!(
                    "reading body failed after {}s budget: {e}",
                    self.timeout.as_secs()
                ))
            }
        })?;

        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_trims_trailing_slash() {
        let t = HttpTransport::new("http://localhost:8080/v1/", Duration::from_secs(10)).unwrap();
        assert_eq!(t.base_url(), "http://localhost:8080/v1");
        assert_eq!(t.url("/clients/all"), "http://localhost:8080/v1/clients/all");
        assert_eq!(t.url("clients/all"), "http://localhost:8080/v1/clients/all");
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        // Port 9 (discard) on loopback is closed on any sane test machine.
        let t = HttpTransport::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = t.send(Method::Get, "/clients/all", None).await.unwrap_err();
        assert!(matches!(err, TransportError::Connect(_) | TransportError::Other(_) | TransportError::Timeout));
    }
}
