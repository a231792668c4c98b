//! Preference resolution with lazy default creation.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use super::ports::PreferenceStore;
use crate::error::StoreError;
use crate::models::{ChannelPreference, EventType};

/// Resolves the effective channel switches for a (user, event) pair.
#[derive(Clone)]
pub struct PreferenceResolver {
    store: Arc<dyn PreferenceStore>,
}

impl PreferenceResolver {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    /// Load the user's record set, creating all-enabled defaults on first use.
    pub async fn resolve(
        &self,
        user_id: Uuid,
        event_type: EventType,
    ) -> Result<ChannelPreference, StoreError> {
        let preferences = match self.store.get(user_id).await? {
            Some(preferences) => preferences,
            None => {
                debug!(user_id = %user_id, "Creating default notification preferences");
                self.store.create_default(user_id, &EventType::ALL).await?
            }
        };

        Ok(preferences.for_event(event_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::in_memory::InMemoryPreferenceStore;

    #[tokio::test]
    async fn test_resolve_creates_defaults_once() {
        let store = Arc::new(InMemoryPreferenceStore::new());
        let resolver = PreferenceResolver::new(store.clone());
        let user_id = Uuid::new_v4();

        let first = resolver.resolve(user_id, EventType::LeadCreated).await.unwrap();
        let second = resolver.resolve(user_id, EventType::TaskAssigned).await.unwrap();

        assert_eq!(first, ChannelPreference::default());
        assert_eq!(second, ChannelPreference::default());
        assert_eq!(store.creation_count().await, 1);
    }

    #[tokio::test]
    async fn test_resolve_respects_stored_preferences() {
        let store = Arc::new(InMemoryPreferenceStore::new());
        let user_id = Uuid::new_v4();
        store
            .set_preference(user_id, EventType::LeadUpdated, ChannelPreference::MUTED)
            .await;

        let resolver = PreferenceResolver::new(store.clone());
        let resolved = resolver.resolve(user_id, EventType::LeadUpdated).await.unwrap();

        assert!(resolved.is_muted());
        assert_eq!(store.creation_count().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_first_resolves_converge() {
        let store = Arc::new(InMemoryPreferenceStore::new());
        let resolver = PreferenceResolver::new(store.clone());
        let user_id = Uuid::new_v4();

        let (a, b) = tokio::join!(
            resolver.resolve(user_id, EventType::LeadCreated),
            resolver.resolve(user_id, EventType::LeadCreated)
        );

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(store.record_count().await, 1);
    }
}
