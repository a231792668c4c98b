//! In-process real-time hub.
//!
//! Each connected user gets a dedicated broadcast channel; a global channel
//! carries messages for everyone. Delivery is best-effort and at-most-once:
//! messages for users with no live subscription are dropped.

use async_trait::async_trait;
use domain::error::StoreError;
use domain::models::RealtimeMessage;
use domain::services::RealtimeTransport;
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, trace};
use uuid::Uuid;

/// Default per-channel buffer. Slow subscribers lag past this.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

pub struct RealtimeHub {
    capacity: usize,
    users: RwLock<HashMap<Uuid, broadcast::Sender<RealtimeMessage>>>,
    global: broadcast::Sender<RealtimeMessage>,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (global, _) = broadcast::channel(capacity);
        Self {
            capacity,
            users: RwLock::new(HashMap::new()),
            global,
        }
    }

    /// Subscribe to one user's channel, creating it on first use.
    pub async fn subscribe_user(&self, user_id: Uuid) -> broadcast::Receiver<RealtimeMessage> {
        let mut users = self.users.write().await;
        users
            .entry(user_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Subscribe to the global channel.
    pub fn subscribe_all(&self) -> broadcast::Receiver<RealtimeMessage> {
        self.global.subscribe()
    }

    /// Users with at least one live subscription.
    pub async fn connected_users(&self) -> usize {
        self.users
            .read()
            .await
            .values()
            .filter(|sender| sender.receiver_count() > 0)
            .count()
    }

    async fn prune(&self, user_id: Uuid) {
        let mut users = self.users.write().await;
        if users
            .get(&user_id)
            .is_some_and(|sender| sender.receiver_count() == 0)
        {
            users.remove(&user_id);
            trace!(user_id = %user_id, "Dropped idle realtime channel");
        }
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RealtimeTransport for RealtimeHub {
    async fn push_to_user(&self, user_id: Uuid, message: RealtimeMessage) -> Result<(), StoreError> {
        let delivered = {
            let users = self.users.read().await;
            match users.get(&user_id) {
                Some(sender) => sender.send(message).is_ok(),
                None => false,
            }
        };

        if !delivered {
            debug!(user_id = %user_id, "No live realtime subscriber, message dropped");
            self.prune(user_id).await;
        }
        Ok(())
    }

    async fn broadcast(&self, message: RealtimeMessage) -> Result<(), StoreError> {
        let receivers = self.global.send(message).unwrap_or(0);
        debug!(receivers, "Realtime broadcast sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::models::SystemSettings;

    fn settings_message() -> RealtimeMessage {
        RealtimeMessage::settings_changed(&SystemSettings::initial(Utc::now()))
    }

    #[tokio::test]
    async fn test_push_reaches_only_that_user() {
        let hub = RealtimeHub::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let mut alice_rx = hub.subscribe_user(alice).await;
        let mut bob_rx = hub.subscribe_user(bob).await;

        hub.push_to_user(alice, settings_message()).await.unwrap();

        assert!(matches!(
            alice_rx.recv().await.unwrap(),
            RealtimeMessage::SettingsChanged { .. }
        ));
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_push_without_subscriber_is_ok() {
        let hub = RealtimeHub::new();
        let user = Uuid::new_v4();

        assert!(hub.push_to_user(user, settings_message()).await.is_ok());
        assert_eq!(hub.connected_users().await, 0);
    }

    #[tokio::test]
    async fn test_dropped_subscriber_is_pruned() {
        let hub = RealtimeHub::new();
        let user = Uuid::new_v4();
        let rx = hub.subscribe_user(user).await;
        assert_eq!(hub.connected_users().await, 1);

        drop(rx);
        hub.push_to_user(user, settings_message()).await.unwrap();

        assert_eq!(hub.connected_users().await, 0);
        assert!(hub.users.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_reaches_global_subscribers() {
        let hub = RealtimeHub::new();
        let mut first = hub.subscribe_all();
        let mut second = hub.subscribe_all();

        hub.broadcast(settings_message()).await.unwrap();

        assert!(matches!(
            first.recv().await.unwrap(),
            RealtimeMessage::SettingsChanged { .. }
        ));
        assert!(matches!(
            second.recv().await.unwrap(),
            RealtimeMessage::SettingsChanged { .. }
        ));
    }

    #[tokio::test]
    async fn test_broadcast_without_subscribers_is_ok() {
        let hub = RealtimeHub::new();
        assert!(hub.broadcast(settings_message()).await.is_ok());
    }
}
