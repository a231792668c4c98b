//! Database entity definitions.
//!
//! Entities are direct mappings to database rows. Conversions into domain
//! models parse stored strings once, at this boundary.

pub mod notification;
pub mod notification_preference;
pub mod system_settings;
pub mod user;

pub use notification::NotificationEntity;
pub use notification_preference::NotificationPreferenceEntity;
pub use system_settings::SystemSettingsEntity;
pub use user::UserEntity;
