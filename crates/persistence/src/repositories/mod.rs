//! Repository implementations of the domain port traits.

pub mod notification;
pub mod notification_preference;
pub mod system_settings;
pub mod user;

pub use notification::NotificationRepository;
pub use notification_preference::NotificationPreferenceRepository;
pub use system_settings::SystemSettingsRepository;
pub use user::UserRepository;
