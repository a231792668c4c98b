//! Notification preference entity (one row per user and event type).

use chrono::{DateTime, Utc};
use domain::models::{ChannelPreference, EventType, NotificationPreferences};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Database row mapping for the notification_preferences table.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationPreferenceEntity {
    pub user_id: Uuid,
    pub event_type: String,
    pub in_app: bool,
    pub email: bool,
    pub updated_at: DateTime<Utc>,
}

/// Fold a user's rows into one record set. Returns `None` for no rows.
/// Rows for retired event types are ignored.
pub fn collect_preferences(
    user_id: Uuid,
    rows: Vec<NotificationPreferenceEntity>,
) -> Option<NotificationPreferences> {
    let updated_at = rows.iter().map(|row| row.updated_at).max()?;

    let events = rows
        .into_iter()
        .filter_map(|row| match EventType::from_str(&row.event_type) {
            Ok(event_type) => Some((
                event_type,
                ChannelPreference {
                    in_app: row.in_app,
                    email: row.email,
                },
            )),
            Err(_) => {
                tracing::debug!(
                    user_id = %user_id,
                    event_type = %row.event_type,
                    "Ignoring preference row for unknown event type"
                );
                None
            }
        })
        .collect();

    Some(NotificationPreferences {
        user_id,
        events,
        updated_at,
    })
}
