//! Persistence layer for Builder Ops.
//!
//! This crate contains:
//! - Database connection management and migrations
//! - Entity definitions (database row mappings)
//! - Repository implementations of the domain port traits

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;

/// Embedded SQL migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./src/migrations");
