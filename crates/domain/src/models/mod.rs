//! Domain models for Builder Ops.

pub mod event;
pub mod lead;
pub mod notification;
pub mod preference;
pub mod system_settings;
pub mod user;

pub use event::{EventType, UnknownEventType};
pub use lead::{EngagementSignal, EngagementSignals, Lead, LeadScore, LeadTemperature, ScoreChange};
pub use notification::{
    DeliveryChannel, NewNotification, Notification, NotificationPriority, NotificationRequest,
    RealtimeMessage,
};
pub use preference::{ChannelPreference, NotificationPreferences};
pub use system_settings::{MaintenancePhase, MaintenanceUpdate, MaintenanceWindow, SystemSettings};
pub use user::{Role, User, UserStatus};
