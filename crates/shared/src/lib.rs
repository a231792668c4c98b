//! Shared utilities and common types for the Builder Ops backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Cursor pagination for notification inbox listings
//! - Common validation logic (email addresses, maintenance windows)

pub mod pagination;
pub mod validation;
