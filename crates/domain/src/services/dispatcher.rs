//! Notification dispatcher.
//!
//! Resolves recipients for an event (by role) or for a broadcast (all active
//! users), applies each recipient's channel preferences and delivers over the
//! in-app and email channels concurrently. Neither entry point can fail:
//! lookup failures are logged and produce an empty [`DispatchSummary`], and
//! channel failures are isolated per recipient and per channel.

use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use metrics::counter;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::channels::{ChannelOutcome, EmailChannel, InAppChannel};
use super::ports::{EmailSender, NotificationStore, PreferenceStore, RealtimeTransport, UserDirectory};
use super::preferences::PreferenceResolver;
use super::role_map::RoleMap;
use crate::models::{
    EventType, NotificationRequest, RealtimeMessage, SystemSettings, User, UserStatus,
};

/// Dispatcher tuning.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Upper bound for any single channel call.
    pub channel_timeout: Duration,
    /// Recipients processed at once.
    pub max_concurrent_recipients: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            channel_timeout: Duration::from_secs(10),
            max_concurrent_recipients: 16,
        }
    }
}

/// Startup wiring errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WiringError {
    #[error("Realtime transport is already attached")]
    RealtimeAlreadyAttached,
}

/// How recipients were selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchKind {
    Trigger,
    Broadcast,
}

impl DispatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchKind::Trigger => "trigger",
            DispatchKind::Broadcast => "broadcast",
        }
    }
}

/// Per-recipient outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipientReport {
    pub user_id: Uuid,
    pub in_app: ChannelOutcome,
    pub email: ChannelOutcome,
}

impl RecipientReport {
    fn skipped(user_id: Uuid) -> Self {
        Self {
            user_id,
            in_app: ChannelOutcome::Skipped,
            email: ChannelOutcome::Skipped,
        }
    }

    fn failed(user_id: Uuid, reason: String) -> Self {
        Self {
            user_id,
            in_app: ChannelOutcome::Failed(reason.clone()),
            email: ChannelOutcome::Failed(reason),
        }
    }

    /// Both channels were disabled for this recipient.
    pub fn is_skipped(&self) -> bool {
        self.in_app == ChannelOutcome::Skipped && self.email == ChannelOutcome::Skipped
    }
}

/// Aggregate result of one trigger or broadcast.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchSummary {
    pub kind: DispatchKind,
    /// `None` when the event identifier could not be parsed.
    pub event_type: Option<EventType>,
    pub recipients: Vec<RecipientReport>,
}

impl DispatchSummary {
    fn empty(kind: DispatchKind, event_type: Option<EventType>) -> Self {
        Self {
            kind,
            event_type,
            recipients: Vec::new(),
        }
    }

    pub fn recipient_count(&self) -> usize {
        self.recipients.len()
    }

    pub fn in_app_delivered(&self) -> usize {
        self.recipients
            .iter()
            .filter(|r| r.in_app.is_delivered())
            .count()
    }

    pub fn email_delivered(&self) -> usize {
        self.recipients
            .iter()
            .filter(|r| r.email.is_delivered())
            .count()
    }

    pub fn failures(&self) -> usize {
        self.recipients
            .iter()
            .flat_map(|r| [&r.in_app, &r.email])
            .filter(|outcome| matches!(outcome, ChannelOutcome::Failed(_)))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.recipients.iter().filter(|r| r.is_skipped()).count()
    }

    pub fn report_for(&self, user_id: Uuid) -> Option<&RecipientReport> {
        self.recipients.iter().find(|r| r.user_id == user_id)
    }
}

/// Event-driven, role-targeted, multi-channel notification fan-out.
///
/// Built once at startup and shared as `Arc`. The real-time transport is
/// attached in a second step with [`attach_realtime`](Self::attach_realtime);
/// dispatches before that still persist in-app records but skip the push.
pub struct NotificationDispatcher {
    users: Arc<dyn UserDirectory>,
    preferences: PreferenceResolver,
    notifications: Arc<dyn NotificationStore>,
    email_sender: Arc<dyn EmailSender>,
    role_map: RoleMap,
    config: DispatcherConfig,
    realtime: OnceLock<Arc<dyn RealtimeTransport>>,
}

impl NotificationDispatcher {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        preferences: Arc<dyn PreferenceStore>,
        notifications: Arc<dyn NotificationStore>,
        email_sender: Arc<dyn EmailSender>,
    ) -> Self {
        Self {
            users,
            preferences: PreferenceResolver::new(preferences),
            notifications,
            email_sender,
            role_map: RoleMap::default(),
            config: DispatcherConfig::default(),
            realtime: OnceLock::new(),
        }
    }

    pub fn with_role_map(mut self, role_map: RoleMap) -> Self {
        self.role_map = role_map;
        self
    }

    pub fn with_config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach the real-time transport. Allowed once.
    pub fn attach_realtime(&self, transport: Arc<dyn RealtimeTransport>) -> Result<(), WiringError> {
        self.realtime
            .set(transport)
            .map_err(|_| WiringError::RealtimeAlreadyAttached)?;
        info!("Realtime transport attached to notification dispatcher");
        Ok(())
    }

    pub fn has_realtime(&self) -> bool {
        self.realtime.get().is_some()
    }

    pub fn role_map(&self) -> &RoleMap {
        &self.role_map
    }

    /// Notify every user whose role is mapped to `event_type`.
    ///
    /// Unknown identifiers and events without an audience are no-ops.
    pub async fn trigger_notification(
        &self,
        event_type: &str,
        request: NotificationRequest,
    ) -> DispatchSummary {
        match EventType::from_str(event_type) {
            Ok(event_type) => self.trigger(event_type, request).await,
            Err(e) => {
                debug!(event_type = %event_type, error = %e, "Ignoring notification trigger");
                DispatchSummary::empty(DispatchKind::Trigger, None)
            }
        }
    }

    /// Typed form of [`trigger_notification`](Self::trigger_notification).
    pub async fn trigger(&self, event_type: EventType, request: NotificationRequest) -> DispatchSummary {
        let roles = self.role_map.roles_for(event_type);
        if roles.is_empty() {
            debug!(event_type = %event_type, "No roles mapped for event, nothing to dispatch");
            return DispatchSummary::empty(DispatchKind::Trigger, Some(event_type));
        }

        let recipients = match self.users.find_by_roles(&roles).await {
            Ok(users) => users,
            Err(e) => {
                error!(
                    event_type = %event_type,
                    error = %e,
                    "Failed to resolve notification recipients"
                );
                return DispatchSummary::empty(DispatchKind::Trigger, Some(event_type));
            }
        };

        self.fan_out(DispatchKind::Trigger, event_type, recipients, &request)
            .await
    }

    /// Notify every active user with a `system` notification.
    pub async fn broadcast_notification(&self, request: NotificationRequest) -> DispatchSummary {
        let recipients = match self.users.find_active().await {
            Ok(users) => users
                .into_iter()
                .filter(|user| user.status == UserStatus::Active)
                .collect(),
            Err(e) => {
                error!(error = %e, "Failed to resolve broadcast recipients");
                return DispatchSummary::empty(DispatchKind::Broadcast, Some(EventType::System));
            }
        };

        self.fan_out(DispatchKind::Broadcast, EventType::System, recipients, &request)
            .await
    }

    /// Run a trigger in the background.
    pub fn spawn_trigger(
        self: &Arc<Self>,
        event_type: impl Into<String>,
        request: NotificationRequest,
    ) -> JoinHandle<DispatchSummary> {
        let dispatcher = Arc::clone(self);
        let event_type = event_type.into();
        tokio::spawn(async move { dispatcher.trigger_notification(&event_type, request).await })
    }

    /// Run a broadcast in the background.
    pub fn spawn_broadcast(self: &Arc<Self>, request: NotificationRequest) -> JoinHandle<DispatchSummary> {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move { dispatcher.broadcast_notification(request).await })
    }

    /// Tell connected clients that system settings changed.
    pub async fn signal_settings_changed(&self, settings: &SystemSettings) {
        let Some(transport) = self.realtime.get() else {
            debug!("Realtime transport not attached, skipping settings signal");
            return;
        };

        let message = RealtimeMessage::settings_changed(settings);
        match tokio::time::timeout(self.config.channel_timeout, transport.broadcast(message)).await {
            Ok(Ok(())) => debug!(maintenance_mode = settings.maintenance_mode, "Settings change signalled"),
            Ok(Err(e)) => warn!(error = %e, "Failed to signal settings change"),
            Err(_) => warn!("Timed out signalling settings change"),
        }
    }

    async fn fan_out(
        &self,
        kind: DispatchKind,
        event_type: EventType,
        recipients: Vec<User>,
        request: &NotificationRequest,
    ) -> DispatchSummary {
        let reports: Vec<RecipientReport> = stream::iter(recipients)
            .map(|user| self.deliver_to(user, event_type, request))
            .buffer_unordered(self.config.max_concurrent_recipients.max(1))
            .collect()
            .await;

        let summary = DispatchSummary {
            kind,
            event_type: Some(event_type),
            recipients: reports,
        };

        counter!("notification_dispatches_total", "kind" => kind.as_str()).increment(1);
        info!(
            kind = kind.as_str(),
            event_type = %event_type,
            recipients = summary.recipient_count(),
            in_app_delivered = summary.in_app_delivered(),
            email_delivered = summary.email_delivered(),
            skipped = summary.skipped(),
            failures = summary.failures(),
            "Notification dispatch complete"
        );

        summary
    }

    async fn deliver_to(
        &self,
        user: User,
        event_type: EventType,
        request: &NotificationRequest,
    ) -> RecipientReport {
        let preference = match self.preferences.resolve(user.id, event_type).await {
            Ok(preference) => preference,
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Failed to resolve notification preferences");
                return RecipientReport::failed(user.id, e.to_string());
            }
        };

        if preference.is_muted() {
            debug!(user_id = %user.id, event_type = %event_type, "Recipient muted this event");
            return RecipientReport::skipped(user.id);
        }

        let notification = request.to_new_notification(user.id, event_type);
        let (record_tx, record_rx) = oneshot::channel();

        let in_app = InAppChannel::new(self.notifications.clone(), self.config.channel_timeout);
        let email = EmailChannel::new(
            self.email_sender.clone(),
            self.notifications.clone(),
            self.config.channel_timeout,
        );
        let realtime = self.realtime.get().cloned();
        let in_app_copy = notification.clone();

        let in_app_branch = async move {
            if preference.in_app {
                in_app.deliver(in_app_copy, realtime, record_tx).await
            } else {
                drop(record_tx);
                ChannelOutcome::Skipped
            }
        };
        let email_branch = async {
            if preference.email {
                email.deliver(&user, &notification, record_rx).await
            } else {
                ChannelOutcome::Skipped
            }
        };

        let (in_app_outcome, email_outcome) = tokio::join!(in_app_branch, email_branch);

        record_outcome(&user, "in_app", &in_app_outcome);
        record_outcome(&user, "email", &email_outcome);

        RecipientReport {
            user_id: user.id,
            in_app: in_app_outcome,
            email: email_outcome,
        }
    }
}

fn record_outcome(user: &User, channel: &'static str, outcome: &ChannelOutcome) {
    counter!(
        "notification_channel_deliveries_total",
        "channel" => channel,
        "outcome" => outcome.label()
    )
    .increment(1);

    if let ChannelOutcome::Failed(reason) = outcome {
        warn!(
            user_id = %user.id,
            channel = channel,
            reason = %reason,
            "Notification channel delivery failed"
        );
    }
}
