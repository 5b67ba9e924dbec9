//! Notification model.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A notification as listed by `/notifications`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    /// Creation time as sent by the backend (RFC 3339 or naive ISO 8601)
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub appointment_id: Option<i64>,
}

impl NotificationRecord {
    /// Creation time, if present and parseable. Naive timestamps are taken as UTC.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.created_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }
}

/// Body of `/notifications/unread-count`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UnreadCount {
    #[serde(default)]
    pub unread_count: u64,
}
