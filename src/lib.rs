//! Earthquake alert configuration and locale presets.
//!
//! - [`alerts`]: alert configuration model and its validation engine
//! - [`locale`]: locale presets behind a TTL cache over a document store
//! - [`api`]: HTTP surface over both
//! - [`webhook`]: delivery of alert payloads to Slack/generic webhooks

pub mod alerts;
pub mod api;
pub mod config;
pub mod geo;
pub mod locale;
pub mod retry;
pub mod secrets;
pub mod webhook;
