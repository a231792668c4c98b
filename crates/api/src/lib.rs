//! HTTP process for the Builder Ops notification core: configuration,
//! logging, metrics, email and realtime adapters, background jobs and health
//! routes.

pub mod app;
pub mod config;
pub mod jobs;
pub mod middleware;
pub mod routes;
pub mod services;
