//! User-facing notifications.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How long a transient notification stays visible.
pub const TRANSIENT_SECONDS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationAction {
    Retry,
    Dismiss,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub level: NotificationLevel,
    pub message: String,
    pub action: Option<NotificationAction>,
    /// Transient notifications expire on their own.
    pub transient: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            id: 0,
            level,
            message: message.into(),
            action: None,
            transient: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_action(mut self, action: NotificationAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.transient && now - self.created_at >= Duration::seconds(TRANSIENT_SECONDS)
    }
}

/// Ordered notification list with stable ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notifications {
    items: Vec<Notification>,
    next_id: u64,
}

impl Notifications {
    pub fn push(&mut self, mut notification: Notification) -> u64 {
        self.next_id += 1;
        notification.id = self.next_id;
        self.items.push(notification);
        self.next_id
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    /// Drop transient notifications older than [`TRANSIENT_SECONDS`].
    pub fn expire(&mut self, now: DateTime<Utc>) {
        self.items.retain(|n| !n.is_expired(now));
    }

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.items.last()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_assigns_increasing_ids() {
        let mut list = Notifications::default();
        let a = list.push(Notification::new(NotificationLevel::Info, "a"));
        let b = list.push(Notification::new(NotificationLevel::Error, "b"));
        assert!(b > a);
        assert!(list.dismiss(a));
        assert!(!list.dismiss(a));
        assert_eq!(list.items().len(), 1);
    }

    #[test]
    fn test_transient_notifications_expire() {
        let mut list = Notifications::default();
        list.push(Notification::new(NotificationLevel::Warning, "gone").transient());
        list.push(Notification::new(NotificationLevel::Error, "stays"));
        list.expire(Utc::now() + Duration::seconds(TRANSIENT_SECONDS + 1));
        assert_eq!(list.items().len(), 1);
        assert_eq!(list.items()[0].message, "stays");
    }
}
