use crate::alerts::rules::AlertChannel;
use crate::geo::{BoundingBox, PointOfInterest};
use crate::secrets::SecretResolver;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Internal geographic scope used to gate alert evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringRegion {
    pub name: String,
    pub bounds: BoundingBox,
}

impl MonitoringRegion {
    pub fn new(name: impl Into<String>, bounds: BoundingBox) -> Self {
        Self {
            name: name.into(),
            bounds,
        }
    }
}

/// Fully assembled alerting configuration.
///
/// Must pass [`crate::alerts::validate_config`] before it drives dispatch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub monitoring_regions: Vec<MonitoringRegion>,
    #[serde(default)]
    pub points_of_interest: Vec<PointOfInterest>,
    #[serde(default)]
    pub alert_channels: Vec<AlertChannel>,
}

impl Config {
    /// Parse a configuration from its JSON representation.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse alert configuration JSON")
    }

    /// Load a configuration file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read alert configuration at {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("Invalid alert configuration in {}", path.display()))
    }

    /// Return a copy with every channel target passed through the resolver.
    ///
    /// Values the resolver cannot resolve stay as placeholders and surface as
    /// validation warnings.
    pub fn resolve_secrets(&self, resolver: &dyn SecretResolver) -> Self {
        let mut resolved = self.clone();
        for channel in &mut resolved.alert_channels {
            channel.webhook_url = resolver.resolve(&channel.webhook_url);
        }
        resolved
    }

    pub fn find_channel(&self, name: &str) -> Option<&AlertChannel> {
        self.alert_channels.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::rules::ChannelType;
    use std::io::Write;
    use tempfile::NamedTempFile;

    struct FixedResolver;

    impl SecretResolver for FixedResolver {
        fn resolve(&self, value: &str) -> String {
            if crate::secrets::is_placeholder(value) {
                "https://resolved.example.com".to_string()
            } else {
                value.to_string()
            }
        }
    }

    const SAMPLE: &str = r#"{
        "monitoring_regions": [
            {"name": "Bay Area", "bounds": {"min_latitude": 37.0, "max_latitude": 38.5, "min_longitude": -123.0, "max_longitude": -121.5}}
        ],
        "points_of_interest": [
            {"name": "Office", "latitude": 37.78, "longitude": -121.98, "radius_km": 25.0}
        ],
        "alert_channels": [
            {"name": "ops", "channel_type": "slack", "webhook_url": "${secret:ops-webhook}", "rules": {"min_magnitude": 3.0}}
        ]
    }"#;

    #[test]
    fn test_from_json_str_parses_all_sections() {
        let config = Config::from_json_str(SAMPLE).unwrap();
        assert_eq!(config.monitoring_regions.len(), 1);
        assert_eq!(config.points_of_interest.len(), 1);
        assert_eq!(config.alert_channels[0].channel_type, ChannelType::Slack);
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let config = Config::from_json_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.monitoring_regions[0].name, "Bay Area");
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = Config::load("/nonexistent/alerts.json");
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_secrets_replaces_placeholders() {
        let config = Config::from_json_str(SAMPLE).unwrap();
        let resolved = config.resolve_secrets(&FixedResolver);

        assert_eq!(resolved.alert_channels[0].webhook_url, "https://resolved.example.com");
        // Original is untouched
        assert_eq!(config.alert_channels[0].webhook_url, "${secret:ops-webhook}");
    }

    #[test]
    fn test_find_channel() {
        let config = Config::from_json_str(SAMPLE).unwrap();
        assert!(config.find_channel("ops").is_some());
        assert!(config.find_channel("Ops").is_none());
    }
}
