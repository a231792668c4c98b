//! Domain services.

pub mod channels;
pub mod dispatcher;
#[cfg(any(test, feature = "test-util"))]
pub mod in_memory;
pub mod lead_notifications;
pub mod lead_scoring;
pub mod maintenance;
pub mod ports;
pub mod preferences;
pub mod role_map;

pub use channels::ChannelOutcome;
pub use dispatcher::{
    DispatchKind, DispatchSummary, DispatcherConfig, NotificationDispatcher, RecipientReport,
    WiringError,
};
pub use lead_notifications::notify_lead_scored;
pub use lead_scoring::{calculate_lead_score, HOT_THRESHOLD, WARM_THRESHOLD};
pub use maintenance::{MaintenanceError, MaintenanceService, TickOutcome};
pub use ports::{
    EmailReceipt, EmailSender, NotificationStore, OutgoingEmail, PreferenceStore,
    RealtimeTransport, SettingsStore, UserDirectory,
};
pub use preferences::PreferenceResolver;
pub use role_map::RoleMap;
