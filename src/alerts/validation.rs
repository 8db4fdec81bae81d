//! Configuration integrity checks.
//!
//! Every check is a pure function returning findings. Nothing here fails or
//! short-circuits: [`validate_config`] reports every problem in one pass, in a
//! stable order (regions, points of interest, channels, cross-references,
//! global advisories).

use crate::alerts::config::Config;
use crate::alerts::rules::{AlertChannel, AlertRule, ChannelType};
use crate::alerts::similarity::best_match;
use crate::geo::{BoundingBox, PointOfInterest};
use crate::secrets::is_placeholder;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use url::Url;

const MIN_MAGNITUDE: f64 = 0.0;
const MAX_MAGNITUDE: f64 = 10.0;
const SLACK_WEBHOOK_HOST: &str = "hooks.slack.com";

/// Whether a finding blocks activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    /// Where the problem was found (e.g. `region 'Bay Area'`)
    pub context: String,
    pub severity: Severity,
    pub message: String,
}

impl ValidationError {
    pub fn error(context: &str, message: impl Into<String>) -> Self {
        Self {
            context: context.to_string(),
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(context: &str, message: impl Into<String>) -> Self {
        Self {
            context: context.to_string(),
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Outcome of validating a whole configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    /// True iff no finding has [`Severity::Error`]
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn from_findings(errors: Vec<ValidationError>) -> Self {
        let valid = !errors.iter().any(ValidationError::is_error);
        Self { valid, errors }
    }

    pub fn warnings(&self) -> Vec<&ValidationError> {
        self.errors
            .iter()
            .filter(|e| e.severity == Severity::Warning)
            .collect()
    }

    pub fn critical_errors(&self) -> Vec<&ValidationError> {
        self.errors.iter().filter(|e| e.is_error()).collect()
    }
}

/// Check that a latitude/longitude pair lies within the legal ranges.
///
/// Boundary values are valid. Both coordinates are checked independently.
pub fn validate_coordinates(lat: f64, lng: f64, context: &str) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if !(-90.0..=90.0).contains(&lat) {
        errors.push(ValidationError::error(
            context,
            format!("Latitude {} out of range [-90, 90]", lat),
        ));
    }
    if !(-180.0..=180.0).contains(&lng) {
        errors.push(ValidationError::error(
            context,
            format!("Longitude {} out of range [-180, 180]", lng),
        ));
    }

    errors
}

/// Check both corners of a box and that `min < max` on each axis.
pub fn validate_bounds(bounds: &BoundingBox, context: &str) -> Vec<ValidationError> {
    let mut errors = validate_coordinates(bounds.min_latitude, bounds.min_longitude, context);
    errors.extend(validate_coordinates(
        bounds.max_latitude,
        bounds.max_longitude,
        context,
    ));

    if bounds.min_latitude >= bounds.max_latitude {
        errors.push(ValidationError::error(
            context,
            format!(
                "min_latitude ({}) must be less than max_latitude ({})",
                bounds.min_latitude, bounds.max_latitude
            ),
        ));
    }
    if bounds.min_longitude >= bounds.max_longitude {
        errors.push(ValidationError::error(
            context,
            format!(
                "min_longitude ({}) must be less than max_longitude ({})",
                bounds.min_longitude, bounds.max_longitude
            ),
        ));
    }

    errors
}

/// Warn about referenced point-of-interest names that do not exist.
///
/// One warning per unknown name; when a known name is close enough the
/// warning carries a "Did you mean" suggestion instead.
pub fn validate_poi_references(
    referenced: &BTreeSet<String>,
    known_pois: &[PointOfInterest],
    context: &str,
) -> Vec<ValidationError> {
    let known: HashSet<&str> = known_pois.iter().map(|p| p.name.as_str()).collect();

    referenced
        .iter()
        .filter(|name| !known.contains(name.as_str()))
        .map(|name| {
            let candidates = known_pois.iter().map(|p| p.name.as_str());
            let message = match best_match(name, candidates) {
                Some(suggestion) => format!(
                    "Point of interest '{}' not found. Did you mean '{}'?",
                    name, suggestion
                ),
                None => format!("Point of interest '{}' not found", name),
            };
            ValidationError::warning(context, message)
        })
        .collect()
}

fn validate_point_of_interest(poi: &PointOfInterest, context: &str) -> Vec<ValidationError> {
    let mut errors = validate_coordinates(poi.latitude, poi.longitude, context);

    if poi.radius_km < 0.0 || poi.radius_km.is_nan() {
        errors.push(ValidationError::error(
            context,
            format!("Radius {} must be non-negative", poi.radius_km),
        ));
    }

    errors
}

fn validate_rule(rule: &AlertRule, context: &str) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let magnitude_range = MIN_MAGNITUDE..=MAX_MAGNITUDE;

    if !magnitude_range.contains(&rule.min_magnitude) {
        errors.push(ValidationError::error(
            context,
            format!("min_magnitude {} out of range [0, 10]", rule.min_magnitude),
        ));
    }

    if let Some(max) = rule.max_magnitude {
        if !magnitude_range.contains(&max) {
            errors.push(ValidationError::error(
                context,
                format!("max_magnitude {} out of range [0, 10]", max),
            ));
        }
        if rule.min_magnitude > max {
            errors.push(ValidationError::error(
                context,
                format!(
                    "min_magnitude ({}) must be less than or equal to max_magnitude ({})",
                    rule.min_magnitude, max
                ),
            ));
        }
    }

    errors
}

// ==================== Channel Checks ====================

/// A check applied to a channel whose target is a resolved value.
pub type ChannelCheck = fn(&AlertChannel, &str) -> Vec<ValidationError>;

/// Type-specific checks for a channel type.
pub fn checks_for(channel_type: ChannelType) -> &'static [ChannelCheck] {
    match channel_type {
        ChannelType::Slack => &[check_https_target, check_slack_host],
        ChannelType::Webhook => &[check_http_target],
    }
}

fn parse_target(channel: &AlertChannel, context: &str) -> Result<Url, ValidationError> {
    Url::parse(&channel.webhook_url).map_err(|e| {
        ValidationError::error(
            context,
            format!("Webhook URL '{}' is not a valid URL: {}", channel.webhook_url, e),
        )
    })
}

fn check_http_target(channel: &AlertChannel, context: &str) -> Vec<ValidationError> {
    match parse_target(channel, context) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Vec::new(),
        Ok(_) => vec![ValidationError::error(
            context,
            format!("Webhook URL '{}' must be an http(s) URL", channel.webhook_url),
        )],
        Err(error) => vec![error],
    }
}

fn check_https_target(channel: &AlertChannel, context: &str) -> Vec<ValidationError> {
    match parse_target(channel, context) {
        Ok(url) if url.scheme() == "https" => Vec::new(),
        Ok(_) => vec![ValidationError::error(
            context,
            format!("Slack webhook URL '{}' must use https", channel.webhook_url),
        )],
        Err(error) => vec![error],
    }
}

/// Unparseable or non-https targets are already reported by `check_https_target`.
fn check_slack_host(channel: &AlertChannel, context: &str) -> Vec<ValidationError> {
    let Ok(url) = Url::parse(&channel.webhook_url) else {
        return Vec::new();
    };
    if url.scheme() != "https" {
        return Vec::new();
    }

    match url.host_str() {
        Some(SLACK_WEBHOOK_HOST) => Vec::new(),
        host => vec![ValidationError::warning(
            context,
            format!(
                "Slack webhook host '{}' is not {}",
                host.unwrap_or_default(),
                SLACK_WEBHOOK_HOST
            ),
        )],
    }
}

fn validate_channel(channel: &AlertChannel, context: &str) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if channel.name.trim().is_empty() {
        errors.push(ValidationError::error(context, "Channel name is required"));
    }

    errors.extend(validate_rule(&channel.rule, context));

    if is_placeholder(&channel.webhook_url) {
        errors.push(ValidationError::warning(
            context,
            format!(
                "Webhook URL is an unresolved placeholder: {}",
                channel.webhook_url
            ),
        ));
    } else {
        for check in checks_for(channel.channel_type) {
            errors.extend(check(channel, context));
        }
    }

    errors
}

/// Validate a fully assembled configuration.
pub fn validate_config(config: &Config) -> ValidationResult {
    let mut errors = Vec::new();

    for region in &config.monitoring_regions {
        let context = format!("region '{}'", region.name);
        errors.extend(validate_bounds(&region.bounds, &context));
    }

    let mut seen_pois = HashSet::new();
    for poi in &config.points_of_interest {
        let context = format!("point of interest '{}'", poi.name);
        errors.extend(validate_point_of_interest(poi, &context));
        if !seen_pois.insert(poi.name.as_str()) {
            errors.push(ValidationError::error(
                &context,
                format!("Duplicate point of interest name '{}'", poi.name),
            ));
        }
    }

    for channel in &config.alert_channels {
        let context = format!("channel '{}'", channel.name);
        errors.extend(validate_channel(channel, &context));
    }

    for channel in &config.alert_channels {
        let context = format!("channel '{}'", channel.name);
        errors.extend(validate_poi_references(
            &channel.rule.points_of_interest,
            &config.points_of_interest,
            &context,
        ));
    }

    if config.alert_channels.is_empty() {
        errors.push(ValidationError::warning(
            "config",
            "No alert channels configured; no alerts will be sent",
        ));
    }

    ValidationResult::from_findings(errors)
}
