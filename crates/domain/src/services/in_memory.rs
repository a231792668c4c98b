//! In-memory collaborators for tests.
//!
//! Compiled only for this crate's tests or with the `test-util` feature.
//!
//! Each type implements one of the port traits over a `tokio::sync::Mutex`
//! and can be told to simulate failures.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use shared::pagination::{Cursor, Page};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::ports::{
    EmailReceipt, EmailSender, NotificationStore, OutgoingEmail, PreferenceStore,
    RealtimeTransport, SettingsStore, UserDirectory,
};
use crate::error::StoreError;
use crate::models::{
    ChannelPreference, DeliveryChannel, EventType, NewNotification, Notification,
    NotificationPreferences, RealtimeMessage, Role, SystemSettings, User, UserStatus,
};

/// User directory over a fixed list.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: Mutex<Vec<User>>,
    unavailable: bool,
}

impl InMemoryUserDirectory {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users: Mutex::new(users),
            unavailable: false,
        }
    }

    /// A directory whose lookups always fail.
    pub fn unavailable() -> Self {
        Self {
            users: Mutex::new(Vec::new()),
            unavailable: true,
        }
    }

    pub async fn insert(&self, user: User) {
        self.users.lock().await.push(user);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("user directory offline".into()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_roles(&self, roles: &[Role]) -> Result<Vec<User>, StoreError> {
        self.check()?;
        let users = self.users.lock().await;
        Ok(users
            .iter()
            .filter(|user| roles.contains(&user.role))
            .cloned()
            .collect())
    }

    async fn find_active(&self) -> Result<Vec<User>, StoreError> {
        self.check()?;
        let users = self.users.lock().await;
        Ok(users
            .iter()
            .filter(|user| user.status == UserStatus::Active)
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default)]
struct PreferenceState {
    records: HashMap<Uuid, NotificationPreferences>,
    created: usize,
}

/// Preference store with upsert semantics matching the Postgres repository.
#[derive(Debug, Default)]
pub struct InMemoryPreferenceStore {
    state: Mutex<PreferenceState>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one event's switches, creating an all-enabled record set first if needed.
    pub async fn set_preference(
        &self,
        user_id: Uuid,
        event_type: EventType,
        preference: ChannelPreference,
    ) {
        let now = Utc::now();
        let mut state = self.state.lock().await;
        state
            .records
            .entry(user_id)
            .or_insert_with(|| NotificationPreferences::defaults(user_id, &EventType::ALL, now))
            .set(event_type, preference, now);
    }

    /// Mute every event for a user.
    pub async fn mute_all(&self, user_id: Uuid) {
        for event_type in EventType::ALL {
            self.set_preference(user_id, event_type, ChannelPreference::MUTED)
                .await;
        }
    }

    /// Record sets inserted through `create_default`.
    pub async fn creation_count(&self) -> usize {
        self.state.lock().await.created
    }

    pub async fn record_count(&self) -> usize {
        self.state.lock().await.records.len()
    }
}

#[async_trait::async_trait]
impl PreferenceStore for InMemoryPreferenceStore {
    async fn get(&self, user_id: Uuid) -> Result<Option<NotificationPreferences>, StoreError> {
        Ok(self.state.lock().await.records.get(&user_id).cloned())
    }

    async fn create_default(
        &self,
        user_id: Uuid,
        event_types: &[EventType],
    ) -> Result<NotificationPreferences, StoreError> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state.records.get(&user_id) {
            return Ok(existing.clone());
        }

        let preferences = NotificationPreferences::defaults(user_id, event_types, Utc::now());
        state.records.insert(user_id, preferences.clone());
        state.created += 1;
        Ok(preferences)
    }
}

/// Notification store over a vector.
#[derive(Debug, Default)]
pub struct InMemoryNotificationStore {
    records: Mutex<Vec<Notification>>,
    failing_recipients: HashSet<Uuid>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every `create` for this recipient.
    pub fn with_failing_recipient(mut self, recipient_id: Uuid) -> Self {
        self.failing_recipients.insert(recipient_id);
        self
    }

    pub async fn all(&self) -> Vec<Notification> {
        self.records.lock().await.clone()
    }

    pub async fn for_recipient(&self, recipient_id: Uuid) -> Vec<Notification> {
        self.records
            .lock()
            .await
            .iter()
            .filter(|n| n.recipient_id == recipient_id)
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn create(&self, notification: NewNotification) -> Result<Notification, StoreError> {
        if self.failing_recipients.contains(&notification.recipient_id) {
            return Err(StoreError::Unavailable("notification store rejected write".into()));
        }

        let mut records = self.records.lock().await;
        if records.iter().any(|n| n.id == notification.id) {
            return Err(StoreError::Conflict(format!(
                "notification {} already exists",
                notification.id
            )));
        }

        let created = notification.into_notification(Utc::now());
        records.push(created.clone());
        Ok(created)
    }

    async fn append_channel(
        &self,
        notification_id: Uuid,
        channel: DeliveryChannel,
    ) -> Result<Notification, StoreError> {
        let mut records = self.records.lock().await;
        let record = records
            .iter_mut()
            .find(|n| n.id == notification_id)
            .ok_or_else(|| StoreError::NotFound(format!("notification {}", notification_id)))?;
        record.append_channel(channel);
        Ok(record.clone())
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        cursor: Option<Cursor>,
        limit: u32,
    ) -> Result<Page<Notification>, StoreError> {
        let records = self.records.lock().await;
        let mut items: Vec<Notification> = records
            .iter()
            .filter(|n| n.recipient_id == user_id)
            .filter(|n| match &cursor {
                Some(c) => (n.created_at, n.id) < (c.created_at, c.id),
                None => true,
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        items.truncate(limit as usize + 1);

        Ok(Page::from_overfetch(items, limit, |n| {
            Cursor::new(n.created_at, n.id)
        }))
    }

    async fn mark_read(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<Notification, StoreError> {
        let mut records = self.records.lock().await;
        let record = records
            .iter_mut()
            .find(|n| n.id == notification_id && n.recipient_id == user_id)
            .ok_or_else(|| StoreError::NotFound(format!("notification {}", notification_id)))?;
        record.mark_read(Utc::now());
        Ok(record.clone())
    }
}

/// Settings store holding a single record.
#[derive(Debug)]
pub struct InMemorySettingsStore {
    settings: Mutex<SystemSettings>,
}

impl InMemorySettingsStore {
    pub fn new(initial: SystemSettings) -> Self {
        Self {
            settings: Mutex::new(initial),
        }
    }
}

impl Default for InMemorySettingsStore {
    fn default() -> Self {
        Self::new(SystemSettings::initial(Utc::now()))
    }
}

#[async_trait::async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn get(&self) -> Result<SystemSettings, StoreError> {
        Ok(self.settings.lock().await.clone())
    }

    async fn save(&self, settings: &SystemSettings) -> Result<(), StoreError> {
        *self.settings.lock().await = settings.clone();
        Ok(())
    }

    async fn clear_maintenance(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<SystemSettings>, StoreError> {
        let mut settings = self.settings.lock().await;
        if !settings.auto_resolve_due(now) {
            return Ok(None);
        }
        settings.maintenance_mode = false;
        settings.updated_by = None;
        settings.updated_at = now;
        Ok(Some(settings.clone()))
    }
}

/// Email sender that records messages instead of sending them.
#[derive(Debug, Default)]
pub struct MockEmailSender {
    sent: Mutex<Vec<OutgoingEmail>>,
    attempts: Mutex<usize>,
    failing_addresses: HashSet<String>,
    delay: Option<Duration>,
}

impl MockEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject mail to this address.
    pub fn with_failing_address(mut self, address: impl Into<String>) -> Self {
        self.failing_addresses.insert(address.into());
        self
    }

    /// Sleep before answering each send.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Successfully sent messages.
    pub async fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().await.clone()
    }

    pub async fn attempts(&self) -> usize {
        *self.attempts.lock().await
    }
}

#[async_trait::async_trait]
impl EmailSender for MockEmailSender {
    async fn send(&self, email: OutgoingEmail) -> EmailReceipt {
        *self.attempts.lock().await += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing_addresses.contains(&email.to) {
            tracing::warn!(to = %email.to, "Mock email sender simulating failure");
            return EmailReceipt::failed("Simulated failure");
        }

        tracing::info!(to = %email.to, subject = %email.subject, "Mock: Would send email");
        let message_id = format!("mock-{}", Uuid::new_v4());
        self.sent.lock().await.push(email);
        EmailReceipt::delivered(Some(message_id))
    }
}

/// Real-time transport that records pushes.
#[derive(Debug, Default)]
pub struct MockRealtimeTransport {
    pushes: Mutex<Vec<(Uuid, RealtimeMessage)>>,
    broadcasts: Mutex<Vec<RealtimeMessage>>,
    simulate_failure: bool,
}

impl MockRealtimeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose pushes always fail.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    pub async fn pushes(&self) -> Vec<(Uuid, RealtimeMessage)> {
        self.pushes.lock().await.clone()
    }

    pub async fn broadcasts(&self) -> Vec<RealtimeMessage> {
        self.broadcasts.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl RealtimeTransport for MockRealtimeTransport {
    async fn push_to_user(&self, user_id: Uuid, message: RealtimeMessage) -> Result<(), StoreError> {
        if self.simulate_failure {
            return Err(StoreError::Unavailable("realtime transport offline".into()));
        }
        self.pushes.lock().await.push((user_id, message));
        Ok(())
    }

    async fn broadcast(&self, message: RealtimeMessage) -> Result<(), StoreError> {
        if self.simulate_failure {
            return Err(StoreError::Unavailable("realtime transport offline".into()));
        }
        self.broadcasts.lock().await.push(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MaintenanceWindow, NotificationRequest};

    fn user(role: Role, status: UserStatus) -> User {
        User {
            id: Uuid::new_v4(),
            email: "crew@example.com".into(),
            display_name: None,
            role,
            status,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_user_directory_filters() {
        let directory = InMemoryUserDirectory::new(vec![
            user(Role::Admin, UserStatus::Active),
            user(Role::SalesRep, UserStatus::Inactive),
            user(Role::Accountant, UserStatus::Pending),
        ]);

        let sales = directory.find_by_roles(&[Role::SalesRep]).await.unwrap();
        assert_eq!(sales.len(), 1);

        let active = directory.find_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].role, Role::Admin);
    }

    #[tokio::test]
    async fn test_unavailable_directory_errors() {
        let directory = InMemoryUserDirectory::unavailable();
        assert!(matches!(
            directory.find_active().await,
            Err(StoreError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_create_default_returns_existing() {
        let store = InMemoryPreferenceStore::new();
        let user_id = Uuid::new_v4();
        store
            .set_preference(user_id, EventType::LeadHot, ChannelPreference::MUTED)
            .await;

        let prefs = store.create_default(user_id, &EventType::ALL).await.unwrap();
        assert!(prefs.for_event(EventType::LeadHot).is_muted());
        assert_eq!(store.creation_count().await, 0);
    }

    #[tokio::test]
    async fn test_notification_listing_pages_newest_first() {
        let store = InMemoryNotificationStore::new();
        let recipient = Uuid::new_v4();
        for i in 0..5 {
            let request = NotificationRequest::new(format!("Task {}", i), "Pour slab");
            store
                .create(request.to_new_notification(recipient, EventType::TaskAssigned))
                .await
                .unwrap();
        }

        let first = store.list_for_user(recipient, None, 3).await.unwrap();
        assert_eq!(first.items.len(), 3);
        let next = first.next_cursor.clone().unwrap();

        let second = store
            .list_for_user(recipient, Some(Cursor::decode(&next).unwrap()), 3)
            .await
            .unwrap();
        assert_eq!(second.items.len(), 2);
        assert!(second.next_cursor.is_none());

        let first_ids: HashSet<Uuid> = first.items.iter().map(|n| n.id).collect();
        assert!(second.items.iter().all(|n| !first_ids.contains(&n.id)));
    }

    #[tokio::test]
    async fn test_mark_read_requires_owner() {
        let store = InMemoryNotificationStore::new();
        let recipient = Uuid::new_v4();
        let created = store
            .create(NotificationRequest::default().to_new_notification(recipient, EventType::System))
            .await
            .unwrap();

        assert!(store.mark_read(created.id, Uuid::new_v4()).await.is_err());
        let read = store.mark_read(created.id, recipient).await.unwrap();
        assert!(read.is_read);
    }

    #[tokio::test]
    async fn test_clear_maintenance_is_compare_and_set() {
        let now = Utc::now();
        let mut initial = SystemSettings::initial(now);
        initial.maintenance_mode = true;
        initial.maintenance_window = Some(MaintenanceWindow {
            start: now - chrono::Duration::hours(2),
            end: now - chrono::Duration::minutes(5),
            message: None,
        });
        let store = InMemorySettingsStore::new(initial);

        assert!(store.clear_maintenance(now).await.unwrap().is_some());
        assert!(store.clear_maintenance(now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_maintenance_requires_ended_window() {
        let now = Utc::now();
        let mut initial = SystemSettings::initial(now);
        initial.maintenance_mode = true;
        initial.maintenance_window = Some(MaintenanceWindow {
            start: now - chrono::Duration::hours(1),
            end: now + chrono::Duration::hours(1),
            message: None,
        });
        let store = InMemorySettingsStore::new(initial);

        assert!(store.clear_maintenance(now).await.unwrap().is_none());
        assert!(store.get().await.unwrap().maintenance_mode);
    }

    #[tokio::test]
    async fn test_mock_email_sender_failures() {
        let sender = MockEmailSender::new().with_failing_address("bounce@example.com");
        let email = OutgoingEmail {
            to: "bounce@example.com".into(),
            to_name: None,
            subject: "s".into(),
            text_body: "t".into(),
            html_body: "h".into(),
        };

        let receipt = sender.send(email).await;
        assert!(!receipt.success);
        assert_eq!(sender.attempts().await, 1);
        assert!(sender.sent().await.is_empty());
    }
}
