//! Domain layer for the Builder Ops backend.
//!
//! This crate contains:
//! - Domain models (Lead, User, Notification, SystemSettings)
//! - The lead scoring engine and the notification dispatcher
//! - Collaborator ports implemented by the persistence and api crates
//! - Domain error types

pub mod error;
pub mod models;
pub mod services;

pub use error::StoreError;
