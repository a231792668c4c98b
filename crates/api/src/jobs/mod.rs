//! Background job scheduler and job implementations.

mod maintenance;
mod scheduler;

pub use maintenance::MaintenanceAutoResolveJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
