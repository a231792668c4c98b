//! Default notification audience per event type.

use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use crate::models::{EventType, Role};

/// Static mapping from event type to the roles notified by default.
#[derive(Debug, Clone)]
pub struct RoleMap {
    routes: HashMap<EventType, BTreeSet<Role>>,
}

impl RoleMap {
    /// An empty map; every event resolves to no recipients.
    pub fn empty() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Replace the audience for one event type.
    pub fn with_route(mut self, event_type: EventType, roles: &[Role]) -> Self {
        self.routes
            .insert(event_type, roles.iter().copied().collect());
        self
    }

    /// Roles for an event, in a stable order. Unmapped events yield an empty list.
    pub fn roles_for(&self, event_type: EventType) -> Vec<Role> {
        self.routes
            .get(&event_type)
            .map(|roles| roles.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Roles for a raw event identifier. Unknown identifiers yield an empty list.
    pub fn roles_for_identifier(&self, identifier: &str) -> Vec<Role> {
        EventType::from_str(identifier)
            .map(|event_type| self.roles_for(event_type))
            .unwrap_or_default()
    }
}

impl Default for RoleMap {
    fn default() -> Self {
        use EventType::*;
        use Role::*;

        RoleMap::empty()
            .with_route(LeadCreated, &[Admin, SalesManager, SalesRep])
            .with_route(LeadUpdated, &[SalesManager, SalesRep])
            .with_route(LeadHot, &[Admin, SalesManager, SalesRep])
            .with_route(UserCreated, &[Admin])
            .with_route(HazardReported, &[Admin, ProjectManager, SiteSupervisor])
            .with_route(TaskAssigned, &[ProjectManager, SiteSupervisor])
            .with_route(ProjectStatusChanged, &[Admin, ProjectManager])
            .with_route(InvoiceOverdue, &[Admin, Accountant])
            .with_route(SettingsChanged, &[Admin])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_routes() {
        let map = RoleMap::default();
        assert_eq!(
            map.roles_for(EventType::HazardReported),
            vec![Role::Admin, Role::ProjectManager, Role::SiteSupervisor]
        );
        assert_eq!(map.roles_for(EventType::UserCreated), vec![Role::Admin]);
    }

    #[test]
    fn test_system_event_has_no_default_audience() {
        assert!(RoleMap::default().roles_for(EventType::System).is_empty());
    }

    #[test]
    fn test_unknown_identifier_is_empty() {
        let map = RoleMap::default();
        assert!(map.roles_for_identifier("nonexistent_event").is_empty());
        assert_eq!(
            map.roles_for_identifier("invoice_overdue"),
            vec![Role::Admin, Role::Accountant]
        );
    }

    #[test]
    fn test_with_route_overrides_and_dedupes() {
        let map = RoleMap::default().with_route(
            EventType::LeadUpdated,
            &[Role::SalesRep, Role::SalesRep, Role::Admin],
        );
        assert_eq!(
            map.roles_for(EventType::LeadUpdated),
            vec![Role::Admin, Role::SalesRep]
        );
    }

    #[test]
    fn test_field_workers_receive_nothing_by_default() {
        let map = RoleMap::default();
        for event in EventType::ALL {
            assert!(!map.roles_for(event).contains(&Role::FieldWorker));
        }
    }
}
