//! Keeps local groups, project roles and organization roles in step with
//! group membership held by an external identity governance provider.
//!
//! Membership flows one way, from the provider into local state, through:
//! - scheduled or on-demand full reconciliation of every mapping,
//! - single-user access events pushed by the provider to a webhook.

pub mod config;
pub mod db;
pub mod identity;
pub mod jobs;
pub mod models;
#[cfg(feature = "server")]
pub mod observability;
pub mod routes;
pub mod secrets;
pub mod services;

use std::sync::Arc;

pub use routes::build_app;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::AppConfig>,
    pub db: Arc<db::DbPool>,
    pub services: services::Services,
}
