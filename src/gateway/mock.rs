//! Scripted in-process transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Notify;

use super::{Method, RawResponse, Transport, TransportError};

#[derive(Debug, Clone)]
pub enum MockReply {
    Json { status: u16, body: Value },
    Raw { status: u16, body: String },
    NetworkFailure,
    /// Never completes.
    Hang,
    /// Waits for the gate to open, then answers with the inner reply.
    Gated { gate: Arc<Notify>, reply: Box<MockReply> },
}

impl MockReply {
    pub fn ok(data: Value) -> Self {
        MockReply::Json {
            status: 200,
            body: json!({ "success": true, "data": data }),
        }
    }

    pub fn json(status: u16, body: Value) -> Self {
        MockReply::Json { status, body }
    }

    pub fn failure(status: u16, message: &str) -> Self {
        MockReply::Json {
            status,
            body: json!({ "success": false, "message": message }),
        }
    }

    pub fn raw(status: u16, body: &str) -> Self {
        MockReply::Raw {
            status,
            body: body.to_string(),
        }
    }

    pub fn gated(gate: Arc<Notify>, reply: MockReply) -> Self {
        MockReply::Gated {
            gate,
            reply: Box::new(reply),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
    Started(String),
    Finished(String),
}

#[derive(Default)]
struct MockState {
    replies: HashMap<(Method, String), VecDeque<MockReply>>,
    calls: Vec<RecordedCall>,
    events: Vec<CallEvent>,
}

/// Replies are queued per `(method, path)`; the last queued reply repeats.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, method: Method, path: &str, reply: MockReply) {
        if let Ok(mut state) = self.state.lock() {
            state
                .replies
                .entry((method, path.to_string()))
                .or_default()
                .push_back(reply);
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().map(|s| s.calls.clone()).unwrap_or_default()
    }

    pub fn events(&self) -> Vec<CallEvent> {
        self.state.lock().map(|s| s.events.clone()).unwrap_or_default()
    }

    pub fn call_count(&self, method: Method, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }

    fn next_reply(&self, method: Method, path: &str, body: Option<Value>) -> Option<MockReply> {
        let mut state = self.state.lock().ok()?;
        let key = format!("{method} {path}");
        state.calls.push(RecordedCall {
            method,
            path: path.to_string(),
            body,
        });
        state.events.push(CallEvent::Started(key));
        let queue = state.replies.get_mut(&(method, path.to_string()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }

    fn finish(&self, method: Method, path: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.events.push(CallEvent::Finished(format!("{method} {path}")));
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<RawResponse, TransportError> {
        let mut reply = self.next_reply(method, path, body).unwrap_or_else(|| {
            MockReply::failure(404, &format!("No mock for {method} {path}"))
        });

        let result = loop {
            match reply {
                MockReply::Json { status, body } => break Ok(RawResponse::json(status, &body)),
                MockReply::Raw { status, body } => {
                    break Ok(RawResponse {
                        status,
                        body: body.into_bytes(),
                    });
                }
                MockReply::NetworkFailure => {
                    break Err(TransportError::Connect("mock network failure".into()));
                }
                MockReply::Hang => std::future::pending::<()>().await,
                MockReply::Gated { gate, reply: inner } => {
                    gate.notified().await;
                    reply = *inner;
                }
            }
        };

        self.finish(method, path);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn last_reply_repeats() {
        let mock = MockTransport::new();
        mock.reply(Method::Get, "/x", MockReply::ok(json!(1)));
        mock.reply(Method::Get, "/x", MockReply::ok(json!(2)));

        let bodies: Vec<String> = {
            let mut out = Vec::new();
            for _ in 0..3 {
                let raw = mock.send(Method::Get, "/x", None).await.unwrap();
                out.push(String::from_utf8(raw.body).unwrap());
            }
            out
        };
        assert!(bodies[0].contains("\"data\":1"));
        assert!(bodies[1].contains("\"data\":2"));
        assert!(bodies[2].contains("\"data\":2"));
        assert_eq!(mock.call_count(Method::Get, "/x"), 3);
    }

    #[tokio::test]
    async fn unscripted_path_is_404() {
        let mock = MockTransport::new();
        let raw = mock.send(Method::Patch, "/nope", None).await.unwrap();
        assert_eq!(raw.status, 404);
        assert_eq!(
            mock.events(),
            vec![
                CallEvent::Started("PATCH /nope".into()),
                CallEvent::Finished("PATCH /nope".into())
            ]
        );
    }
}
