// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Notification polling and panel rendering.
//!
//! The poller has two states. `start` runs one fetch cycle right away and
//! then repeats it on an interval until `stop`. Each cycle fetches the list
//! and the unread counter concurrently and publishes a rendered panel on a
//! watch channel only when both succeed, so a failed cycle never blanks the
//! previous panel.

use crate::error::{ClientError, Result};
use crate::models::NotificationRecord;
use crate::services::backend::BackendClient;
use crate::services::redirect::RedirectGate;
use crate::services::session::SessionGateway;
use crate::time_utils::format_notification_date;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Default polling period (5 minutes).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(300_000);

/// Notifications shown on the dashboard panel.
pub const DEFAULT_NOTIFICATION_LIMIT: u32 = 5;

// ─────────────────────────────────────────────────────────────────────────────
// Rendering
// ─────────────────────────────────────────────────────────────────────────────

/// One line of the notification panel.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedNotification {
    pub id: i64,
    pub summary: String,
    pub is_read: bool,
    pub date_label: Option<String>,
    pub appointment_id: Option<i64>,
}

/// A fully rendered panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationPanel {
    pub items: Vec<RenderedNotification>,
    pub unread_count: u64,
}

impl NotificationPanel {
    /// Number of notifications listed.
    pub fn total(&self) -> usize {
        self.items.len()
    }

    /// Unread badge value; hidden (None) at zero.
    pub fn badge(&self) -> Option<u64> {
        (self.unread_count > 0).then_some(self.unread_count)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Human-readable summary for a notification message.
pub fn summarize(message: &str) -> String {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return "You have a new notification".to_string();
    }

    let lower = trimmed.to_lowercase();
    if lower.contains("appointment") {
        if lower.contains("confirmed") {
            return "✅ Your appointment has been confirmed".to_string();
        }
        if lower.contains("cancelled") {
            return "❌ An appointment has been cancelled".to_string();
        }
        if lower.contains("reminder") {
            return "⏰ Appointment reminder".to_string();
        }
        if lower.contains("scheduled") {
            return "📅 New appointment scheduled".to_string();
        }
    }
    trimmed.to_string()
}

pub fn render_notification(record: &NotificationRecord) -> RenderedNotification {
    RenderedNotification {
        id: record.id,
        summary: summarize(&record.message),
        is_read: record.is_read,
        date_label: record.created_at_utc().map(format_notification_date),
        appointment_id: record.appointment_id,
    }
}

pub fn render_panel(records: &[NotificationRecord], unread_count: u64) -> NotificationPanel {
    NotificationPanel {
        items: records.iter().map(render_notification).collect(),
        unread_count,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Poller
// ─────────────────────────────────────────────────────────────────────────────

/// Poller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Polling,
}

/// Result of a single fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A new panel was published.
    Rendered,
    /// Fetch failed; the previous panel is untouched.
    Failed,
    /// The session is gone and a login redirect has been requested.
    AuthRequired,
}

struct PollerShared {
    gateway: SessionGateway,
    redirect: Arc<RedirectGate>,
    limit: u32,
    panel: watch::Sender<Option<NotificationPanel>>,
    cycles: AtomicU64,
}

impl PollerShared {
    async fn run_cycle(&self) -> CycleOutcome {
        let cycle = self.cycles.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(cycle, "Fetching notifications");

        let Some(token) = self.gateway.store().get() else {
            return self.handle_auth_failure().await;
        };

        let client = self.gateway.client();
        let (list, unread) = tokio::join!(
            client.notifications(&token, self.limit, false),
            client.unread_count(&token),
        );

        match (list, unread) {
            (Ok(records), Ok(unread_count)) => {
                let panel = render_panel(&records, unread_count);
                tracing::debug!(
                    total = panel.total(),
                    unread = panel.unread_count,
                    "Notifications refreshed"
                );
                self.panel.send_replace(Some(panel));
                CycleOutcome::Rendered
            }
            (Err(ClientError::AuthRequired(_)), _) | (_, Err(ClientError::AuthRequired(_))) => {
                tracing::warn!("Authentication failed for notifications");
                self.handle_auth_failure().await
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "Failed to refresh notifications");
                CycleOutcome::Failed
            }
        }
    }

    /// Let the session gateway decide whether the session is really gone.
    async fn handle_auth_failure(&self) -> CycleOutcome {
        match self.gateway.ensure_session().await {
            Err(ClientError::AuthRequired(reason)) => {
                self.redirect.request(reason);
                CycleOutcome::AuthRequired
            }
            Ok(_) => CycleOutcome::Failed,
            Err(e) => {
                tracing::warn!(error = %e, "Session check after notification failure failed");
                CycleOutcome::Failed
            }
        }
    }
}

struct PollerTask {
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Periodic notification fetcher.
pub struct NotificationPoller {
    shared: Arc<PollerShared>,
    task: Option<PollerTask>,
}

impl NotificationPoller {
    pub fn new(gateway: SessionGateway, redirect: Arc<RedirectGate>, limit: u32) -> Self {
        let (panel, _rx) = watch::channel(None);
        Self {
            shared: Arc::new(PollerShared {
                gateway,
                redirect,
                limit,
                panel,
                cycles: AtomicU64::new(0),
            }),
            task: None,
        }
    }

    pub fn state(&self) -> PollerState {
        match &self.task {
            Some(task) if !task.handle.is_finished() => PollerState::Polling,
            _ => PollerState::Idle,
        }
    }

    /// Fetch cycles run so far.
    pub fn cycles(&self) -> u64 {
        self.shared.cycles.load(Ordering::SeqCst)
    }

    /// Last published panel.
    pub fn panel(&self) -> Option<NotificationPanel> {
        self.shared.panel.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<NotificationPanel>> {
        self.shared.panel.subscribe()
    }

    /// Run one cycle now and repeat it every `every` until [`stop`](Self::stop).
    ///
    /// Returns the outcome of the immediate cycle, or None if the poller was
    /// already running or `every` is zero. If the immediate cycle ends in a
    /// login redirect the poller stays idle.
    pub async fn start(&mut self, every: Duration) -> Option<CycleOutcome> {
        if every.is_zero() {
            tracing::warn!("Refusing to poll notifications with a zero interval");
            return None;
        }
        if self.state() == PollerState::Polling {
            tracing::debug!("Notification poller already running");
            return None;
        }

        let first = self.shared.run_cycle().await;
        if first == CycleOutcome::AuthRequired {
            return Some(first);
        }

        let (cancel, mut cancelled) = watch::channel(false);
        let shared = self.shared.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.changed() => break,
                    _ = ticker.tick() => {
                        if shared.redirect.pending().is_some() {
                            break;
                        }
                        if shared.run_cycle().await == CycleOutcome::AuthRequired {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("Notification poller loop exited");
        });

        tracing::info!(interval_ms = every.as_millis() as u64, "Notification polling started");
        self.task = Some(PollerTask { cancel, handle });
        Some(first)
    }

    /// Stop polling. No cycle runs after this returns.
    pub async fn stop(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };

        let _ = task.cancel.send(true);
        task.handle.abort();
        if let Err(e) = task.handle.await {
            if !e.is_cancelled() {
                tracing::error!(error = %e, "Notification poller task failed");
            }
        }
        tracing::info!("Notification polling stopped");
    }

    /// Run one cycle on demand.
    pub async fn refresh(&self) -> CycleOutcome {
        self.shared.run_cycle().await
    }

    /// Run one cycle and return the panel it produced.
    ///
    /// A cycle that ends in a login redirect yields `AuthRequired` with the
    /// redirect's reason; any other failure yields `Transient`.
    pub async fn fetch_once(&self) -> Result<NotificationPanel> {
        let outcome = self.refresh().await;
        if let Some(redirect) = self.shared.redirect.pending() {
            return Err(ClientError::AuthRequired(redirect.reason));
        }

        match (outcome, self.panel()) {
            (CycleOutcome::Rendered, Some(panel)) => Ok(panel),
            _ => Err(ClientError::Transient(
                "Notifications could not be loaded".to_string(),
            )),
        }
    }

    /// Mark one notification read, then refresh the panel.
    pub async fn mark_read(&self, notification_id: i64) -> Result<CycleOutcome> {
        self.acknowledge(move |client, token| async move {
            client.mark_notification_read(&token, notification_id).await
        })
        .await
    }

    /// Mark every notification read, then refresh the panel.
    pub async fn mark_all_read(&self) -> Result<CycleOutcome> {
        self.acknowledge(|client, token| async move {
            client.mark_all_notifications_read(&token).await
        })
        .await
    }

    async fn acknowledge<F, Fut>(&self, call: F) -> Result<CycleOutcome>
    where
        F: FnOnce(BackendClient, String) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        match self.shared.gateway.authorized(call).await {
            Ok(()) => Ok(self.refresh().await),
            Err(ClientError::AuthRequired(reason)) => {
                self.shared.redirect.request(reason);
                Err(ClientError::AuthRequired(reason))
            }
            Err(e) => Err(e),
        }
    }
}

impl Drop for NotificationPoller {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, message: &str, is_read: bool) -> NotificationRecord {
        NotificationRecord {
            id,
            message: message.to_string(),
            is_read,
            created_at: Some("2026-03-04T09:30:00Z".to_string()),
            appointment_id: Some(40 + id),
        }
    }

    #[test]
    fn test_summarize_keywords() {
        assert_eq!(
            summarize("Your appointment with Dr. Karim has been confirmed"),
            "✅ Your appointment has been confirmed"
        );
        assert_eq!(
            summarize("Appointment on 2026-03-04 was cancelled by the doctor"),
            "❌ An appointment has been cancelled"
        );
        assert_eq!(
            summarize("reminder: appointment tomorrow at 10:00"),
            "⏰ Appointment reminder"
        );
        assert_eq!(
            summarize("A new appointment has been scheduled"),
            "📅 New appointment scheduled"
        );
    }

    #[test]
    fn test_summarize_pass_through() {
        assert_eq!(summarize("Profile updated"), "Profile updated");
        assert_eq!(
            summarize("Your appointment notes were edited"),
            "Your appointment notes were edited"
        );
        assert_eq!(summarize("   "), "You have a new notification");
    }

    #[test]
    fn test_render_panel() {
        let records = vec![
            record(1, "Your appointment has been confirmed", false),
            record(2, "Welcome!", true),
        ];
        let panel = render_panel(&records, 1);

        assert_eq!(panel.total(), 2);
        assert_eq!(panel.badge(), Some(1));
        assert_eq!(panel.items[0].date_label.as_deref(), Some("Mar 4, 09:30"));
        assert_eq!(panel.items[0].appointment_id, Some(41));
        assert!(panel.items[1].is_read);
        assert_eq!(panel.items[1].summary, "Welcome!");
    }

    #[test]
    fn test_empty_panel_hides_badge() {
        let panel = render_panel(&[], 0);
        assert!(panel.is_empty());
        assert_eq!(panel.badge(), None);
    }
}
