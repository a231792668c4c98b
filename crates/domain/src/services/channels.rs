//! Delivery channels used by the dispatcher.
//!
//! Each channel reports a [`ChannelOutcome`] and never returns an error, so
//! one channel failing cannot affect another.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, warn};
use uuid::Uuid;

use super::ports::{EmailSender, NotificationStore, OutgoingEmail, RealtimeTransport};
use crate::models::{
    DeliveryChannel, NewNotification, NotificationPriority, RealtimeMessage, User,
};

/// Result of one channel for one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelOutcome {
    Delivered,
    /// Disabled by the recipient's preferences.
    Skipped,
    Failed(String),
}

impl ChannelOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ChannelOutcome::Delivered => "delivered",
            ChannelOutcome::Skipped => "skipped",
            ChannelOutcome::Failed(_) => "failed",
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, ChannelOutcome::Delivered)
    }
}

async fn bounded<T>(limit: Duration, fut: impl Future<Output = T>) -> Result<T, String> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| format!("timed out after {}ms", limit.as_millis()))
}

/// Persists the notification record and pushes it to the recipient.
#[derive(Clone)]
pub struct InAppChannel {
    store: Arc<dyn NotificationStore>,
    timeout: Duration,
}

impl InAppChannel {
    pub fn new(store: Arc<dyn NotificationStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Persist then push. The id of the persisted record is sent on `record`
    /// so the email channel can tag exactly this notification.
    pub async fn deliver(
        &self,
        notification: NewNotification,
        realtime: Option<Arc<dyn RealtimeTransport>>,
        record: oneshot::Sender<Option<Uuid>>,
    ) -> ChannelOutcome {
        let recipient_id = notification.recipient_id;

        let created = match bounded(self.timeout, self.store.create(notification)).await {
            Ok(Ok(created)) => created,
            Ok(Err(e)) => {
                let _ = record.send(None);
                return ChannelOutcome::Failed(e.to_string());
            }
            Err(reason) => {
                let _ = record.send(None);
                return ChannelOutcome::Failed(reason);
            }
        };

        let _ = record.send(Some(created.id));
        let notification_id = created.id;

        match realtime {
            Some(transport) => {
                let message = RealtimeMessage::Notification {
                    notification: created,
                };
                match bounded(self.timeout, transport.push_to_user(recipient_id, message)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!(
                        recipient_id = %recipient_id,
                        notification_id = %notification_id,
                        error = %e,
                        "Realtime push failed; notification kept"
                    ),
                    Err(reason) => warn!(
                        recipient_id = %recipient_id,
                        notification_id = %notification_id,
                        reason = %reason,
                        "Realtime push failed; notification kept"
                    ),
                }
            }
            None => debug!(
                notification_id = %notification_id,
                "Realtime transport not attached, skipping push"
            ),
        }

        ChannelOutcome::Delivered
    }
}

/// Renders and sends the email copy of a notification.
#[derive(Clone)]
pub struct EmailChannel {
    sender: Arc<dyn EmailSender>,
    store: Arc<dyn NotificationStore>,
    timeout: Duration,
}

impl EmailChannel {
    pub fn new(
        sender: Arc<dyn EmailSender>,
        store: Arc<dyn NotificationStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            sender,
            store,
            timeout,
        }
    }

    /// Send the email, then append `email` to the record announced on
    /// `record`, if any.
    pub async fn deliver(
        &self,
        recipient: &User,
        notification: &NewNotification,
        record: oneshot::Receiver<Option<Uuid>>,
    ) -> ChannelOutcome {
        if shared::validation::validate_email_address(&recipient.email).is_err() {
            return ChannelOutcome::Failed("invalid recipient address".to_string());
        }

        let email = render_email(recipient, notification);
        let receipt = match bounded(self.timeout, self.sender.send(email)).await {
            Ok(receipt) => receipt,
            Err(reason) => return ChannelOutcome::Failed(reason),
        };

        if !receipt.success {
            return ChannelOutcome::Failed(
                receipt
                    .error
                    .unwrap_or_else(|| "email provider rejected message".to_string()),
            );
        }

        debug!(
            recipient_id = %recipient.id,
            message_id = ?receipt.message_id,
            "Notification email sent"
        );

        // A closed channel means the in-app branch never persisted a record.
        let Ok(Some(notification_id)) = record.await else {
            return ChannelOutcome::Delivered;
        };

        match bounded(
            self.timeout,
            self.store
                .append_channel(notification_id, DeliveryChannel::Email),
        )
        .await
        {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!(
                notification_id = %notification_id,
                error = %e,
                "Email sent but channel could not be recorded"
            ),
            Err(reason) => warn!(
                notification_id = %notification_id,
                reason = %reason,
                "Email sent but channel could not be recorded"
            ),
        }

        ChannelOutcome::Delivered
    }
}

/// Build the outgoing email for a notification.
pub fn render_email(recipient: &User, notification: &NewNotification) -> OutgoingEmail {
    let subject = match notification.priority {
        NotificationPriority::Urgent => format!("[Urgent] {}", notification.title),
        NotificationPriority::High => format!("[Important] {}", notification.title),
        _ => notification.title.clone(),
    };

    let greeting = match recipient.greeting_name() {
        Some(name) => format!("Hi {},", name),
        None => "Hello,".to_string(),
    };
    let footer = format!(
        "You are receiving this because {} notifications are enabled for your account.",
        notification.event_type.label().to_lowercase()
    );

    let text_body = format!(
        "{}\n\n{}\n\n{}\n\n--\n{}",
        greeting, notification.title, notification.message, footer
    );

    let html_body = format!(
        "<p>{}</p><h2>{}</h2><p>{}</p><hr><p style=\"color:#666;font-size:12px\">{}</p>",
        escape_html(&greeting),
        escape_html(&notification.title),
        escape_html(&notification.message).replace('\n', "<br>"),
        escape_html(&footer)
    );

    OutgoingEmail {
        to: recipient.email.clone(),
        to_name: recipient.greeting_name().map(str::to_string),
        subject,
        text_body,
        html_body,
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
