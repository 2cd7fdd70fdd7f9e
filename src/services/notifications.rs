//! Toast-style notification queue.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use crate::{
    error::AppError,
    types::{NoticeKind, NoticeLevel, Notification},
};

/// Upper bound on queued notifications; the oldest are dropped first.
const MAX_NOTIFICATIONS: usize = 32;

#[derive(Debug, Default)]
struct NoticeQueue {
    next_id: u64,
    items: VecDeque<Notification>,
}

/// Shared, non-blocking notification center.
///
/// Notifications expire after the configured ttl and can be dismissed early.
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    queue: Arc<Mutex<NoticeQueue>>,
    ttl: Duration,
}

impl NotificationCenter {
    pub fn new(ttl: Duration) -> Self {
        Self { queue: Arc::new(Mutex::new(NoticeQueue::default())), ttl }
    }

    /// Queue a notification of `kind` and return its id.
    pub fn push(&self, kind: NoticeKind, description: Option<String>) -> u64 {
        let level = kind.level();
        match level {
            NoticeLevel::Error => {
                tracing::warn!(kind = ?kind, description = ?description, "Notifying user of failure")
            }
            NoticeLevel::Warning => {
                tracing::warn!(kind = ?kind, description = ?description, "Notifying user")
            }
            NoticeLevel::Info | NoticeLevel::Success => {
                tracing::info!(kind = ?kind, description = ?description, "Notifying user")
            }
        }

        let mut queue = self.lock();
        queue.next_id += 1;
        let id = queue.next_id;
        queue.items.push_back(Notification {
            id,
            level,
            kind,
            title: kind.title().to_string(),
            description,
            dismissible: true,
            ttl_ms: self.ttl.as_millis() as u64,
            created_at: Instant::now(),
        });
        while queue.items.len() > MAX_NOTIFICATIONS {
            queue.items.pop_front();
        }
        id
    }

    /// Queue a notification describing `err`.
    pub fn notify_error(&self, err: &AppError) -> u64 {
        self.push(err.notice_kind(), Some(err.to_string()))
    }

    /// Remove a notification before it expires.
    pub fn dismiss(&self, id: u64) -> bool {
        let mut queue = self.lock();
        let before = queue.items.len();
        queue.items.retain(|n| n.id != id);
        queue.items.len() != before
    }

    /// Notifications still alive now.
    pub fn active(&self) -> Vec<Notification> {
        self.active_at(Instant::now())
    }

    /// Notifications still alive at `now`; expired ones are dropped.
    pub fn active_at(&self, now: Instant) -> Vec<Notification> {
        let mut queue = self.lock();
        queue.items.retain(|n| !n.is_expired_at(now));
        queue.items.iter().cloned().collect()
    }

    /// Every queued notification, expired or not.
    #[cfg(test)]
    fn history(&self) -> Vec<Notification> {
        self.lock().items.iter().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, NoticeQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_NOTIFICATION_TTL)
    }
}
