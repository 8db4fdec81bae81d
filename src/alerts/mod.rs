//! Alerting configuration model and its integrity checks.
//!
//! # Architecture
//!
//! - `config`: the assembled [`Config`] aggregate and its JSON loader
//! - `rules`: alert channels and their trigger rules
//! - `similarity`: string similarity for "did you mean" suggestions
//! - `validation`: pure checks producing a [`ValidationResult`]
//!
//! # Example
//!
//! ```rust,ignore
//! use quake_alerts::alerts::{validate_config, Config};
//!
//! let config = Config::load("config/alerts.json")?;
//! let result = validate_config(&config);
//! if !result.valid {
//!     for error in result.critical_errors() {
//!         eprintln!("{}: {}", error.context, error.message);
//!     }
//! }
//! ```

mod config;
mod rules;
mod similarity;
mod validation;

pub use config::{Config, MonitoringRegion};
pub use rules::{AlertChannel, AlertRule, ChannelType};
pub use similarity::{best_match, similarity, SUGGESTION_THRESHOLD};
pub use validation::{
    checks_for, validate_bounds, validate_config, validate_coordinates, validate_poi_references,
    ChannelCheck, Severity, ValidationError, ValidationResult,
};
