//! Toast-style user notifications.
//!
//! One `NotificationCenter` per process, owned by the composition root and
//! cloned into whoever reports to the user. Subscribers see the whole list
//! on every change.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::time::Instant;

pub const DEFAULT_DURATION: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: Option<String>,
    /// `None` means the notification stays until dismissed.
    #[serde(skip)]
    pub duration: Option<Duration>,
    pub dismissible: bool,
    #[serde(skip)]
    pub created_at: Instant,
}

impl Notification {
    pub fn is_expired(&self, now: Instant) -> bool {
        self.duration
            .is_some_and(|d| now.saturating_duration_since(self.created_at) >= d)
    }
}

struct Inner {
    next_id: AtomicU64,
    tx: watch::Sender<Vec<Notification>>,
}

#[derive(Clone)]
pub struct NotificationCenter {
    inner: Arc<Inner>,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationCenter {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(Inner {
                next_id: AtomicU64::new(0),
                tx,
            }),
        }
    }

    pub fn success(&self, title: &str, message: Option<&str>) -> String {
        self.push(NotificationKind::Success, title, message, Some(DEFAULT_DURATION))
    }

    /// Errors stay until dismissed.
    pub fn error(&self, title: &str, message: Option<&str>) -> String {
        self.push(NotificationKind::Error, title, message, None)
    }

    pub fn warning(&self, title: &str, message: Option<&str>) -> String {
        self.push(NotificationKind::Warning, title, message, Some(DEFAULT_DURATION))
    }

    pub fn info(&self, title: &str, message: Option<&str>) -> String {
        self.push(NotificationKind::Info, title, message, Some(DEFAULT_DURATION))
    }

    /// Add a notification with an explicit duration. A zero duration is
    /// treated as sticky.
    pub fn push(
        &self,
        kind: NotificationKind,
        title: &str,
        message: Option<&str>,
        duration: Option<Duration>,
    ) -> String {
        let n = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let id = format!("notification-{n}");
        let duration = duration.filter(|d| !d.is_zero());

        let notification = Notification {
            id: id.clone(),
            kind,
            title: title.to_string(),
            message: message.map(str::to_string),
            duration,
            dismissible: true,
            created_at: Instant::now(),
        };
        self.inner.tx.send_modify(|list| list.push(notification));

        if let Some(duration) = duration {
            self.schedule_dismiss(id.clone(), duration);
        }
        id
    }

    /// Auto-dismiss needs a runtime; without one, callers use `expire`.
    fn schedule_dismiss(&self, id: String, after: Duration) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        handle.spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(inner) = weak.upgrade() {
                NotificationCenter { inner }.dismiss(&id);
            }
        });
    }

    pub fn dismiss(&self, id: &str) {
        self.inner.tx.send_if_modified(|list| {
            let before = list.len();
            list.retain(|n| n.id != id);
            list.len() != before
        });
    }

    pub fn dismiss_all(&self) {
        self.inner.tx.send_if_modified(|list| {
            let had_any = !list.is_empty();
            list.clear();
            had_any
        });
    }

    /// Drop every timed notification whose duration has elapsed at `now`.
    pub fn expire(&self, now: Instant) {
        self.inner.tx.send_if_modified(|list| {
            let before = list.len();
            list.retain(|n| !n.is_expired(now));
            list.len() != before
        });
    }

    pub fn current(&self) -> Vec<Notification> {
        self.inner.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.inner.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.tx.receiver_count()
    }
}

/// Live view of the notification list. Dropping it unsubscribes.
pub struct Subscription {
    rx: watch::Receiver<Vec<Notification>>,
}

impl Subscription {
    pub fn snapshot(&self) -> Vec<Notification> {
        self.rx.borrow().clone()
    }

    /// Wait for the next change and return the new list. `None` once the
    /// center is gone.
    pub async fn changed(&mut self) -> Option<Vec<Notification>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}
