//! Infrastructure adapters for the notification dispatcher.

pub mod email;
pub mod realtime;

pub use email::{EmailError, EmailService};
pub use realtime::RealtimeHub;
