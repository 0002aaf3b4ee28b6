//! Notification bus: the gateway publishes one event per failed call, the
//! appointment board one per completed transition, and whatever UI shell
//! owns the bus decides how to show them.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            title: "Success".to_string(),
            message: message.into(),
        }
    }
}

pub trait Subscriber: Send + Sync {
    fn on_notification(&self, notification: &Notification);
}

impl<F> Subscriber for F
where
    F: Fn(&Notification) + Send + Sync,
{
    fn on_notification(&self, notification: &Notification) {
        self(notification)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Typed publish/subscribe channel. Cloning shares the same subscriber set.
#[derive(Clone, Default)]
pub struct NotificationBus {
    inner: Arc<BusInner>,
}

#[derive(Default)]
struct BusInner {
    next_id: AtomicU64,
    subscribers: Mutex<BTreeMap<SubscriptionId, Arc<dyn Subscriber>>>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, subscriber: Arc<dyn Subscriber>) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().insert(id, subscriber);
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.lock().remove(&id).is_some()
    }

    pub fn emit(&self, notification: Notification) {
        // Snapshot so a subscriber may (un)subscribe from inside its callback.
        let subscribers: Vec<Arc<dyn Subscriber>> = self.lock().values().cloned().collect();
        tracing::debug!(
            title = %notification.title,
            subscribers = subscribers.len(),
            "notification emitted"
        );
        for s in subscribers {
            s.on_notification(&notification);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<SubscriptionId, Arc<dyn Subscriber>>> {
        // A panicking subscriber must not take the bus down with it.
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Subscriber that keeps every notification it sees.
#[derive(Default)]
pub struct CapturingSubscriber {
    seen: Mutex<Vec<Notification>>,
}

impl CapturingSubscriber {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.notifications().into_iter().map(|n| n.message).collect()
    }

    /// Messages of error notifications only.
    pub fn errors(&self) -> Vec<String> {
        self.notifications()
            .into_iter()
            .filter(|n| n.kind == NotificationKind::Error)
            .map(|n| n.message)
            .collect()
    }
}

impl Subscriber for CapturingSubscriber {
    fn on_notification(&self, notification: &Notification) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(notification.clone());
        }
    }
}
