use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

fn default_min_magnitude() -> f64 {
    2.5
}

/// Trigger thresholds for a single channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    #[serde(default = "default_min_magnitude")]
    pub min_magnitude: f64,
    #[serde(default)]
    pub max_magnitude: Option<f64>,
    /// Names of points of interest the rule is scoped to (empty = unscoped)
    #[serde(default)]
    pub points_of_interest: BTreeSet<String>,
}

impl AlertRule {
    pub fn new(min_magnitude: f64) -> Self {
        Self {
            min_magnitude,
            max_magnitude: None,
            points_of_interest: BTreeSet::new(),
        }
    }

    pub fn with_max_magnitude(mut self, max_magnitude: f64) -> Self {
        self.max_magnitude = Some(max_magnitude);
        self
    }

    pub fn with_points_of_interest<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.points_of_interest = names.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for AlertRule {
    fn default() -> Self {
        Self::new(default_min_magnitude())
    }
}

/// Delivery mechanism of an alert channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    /// Slack incoming webhook
    Slack,
    /// Generic JSON webhook
    Webhook,
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelType::Slack => write!(f, "slack"),
            ChannelType::Webhook => write!(f, "webhook"),
        }
    }
}

/// A named alert destination together with its trigger rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertChannel {
    pub name: String,
    pub channel_type: ChannelType,
    /// Delivery target; may still be a `${...}` placeholder
    pub webhook_url: String,
    #[serde(rename = "rules", default)]
    pub rule: AlertRule,
}

impl AlertChannel {
    pub fn new(
        name: impl Into<String>,
        channel_type: ChannelType,
        webhook_url: impl Into<String>,
        rule: AlertRule,
    ) -> Self {
        Self {
            name: name.into(),
            channel_type,
            webhook_url: webhook_url.into(),
            rule,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_defaults() {
        let rule: AlertRule = serde_json::from_str("{}").unwrap();
        assert_eq!(rule.min_magnitude, 2.5);
        assert_eq!(rule.max_magnitude, None);
        assert!(rule.points_of_interest.is_empty());
    }

    #[test]
    fn test_channel_deserializes_rules_key() {
        let json = r#"{
            "name": "ops",
            "channel_type": "slack",
            "webhook_url": "${secret:ops-webhook}",
            "rules": {"min_magnitude": 3.0, "max_magnitude": 6.0, "points_of_interest": ["Office"]}
        }"#;
        let channel: AlertChannel = serde_json::from_str(json).unwrap();

        assert_eq!(channel.channel_type, ChannelType::Slack);
        assert_eq!(channel.rule.min_magnitude, 3.0);
        assert_eq!(channel.rule.max_magnitude, Some(6.0));
        assert!(channel.rule.points_of_interest.contains("Office"));
    }

    #[test]
    fn test_unknown_channel_type_is_rejected() {
        let json = r#"{"name": "x", "channel_type": "pager", "webhook_url": "https://x"}"#;
        assert!(serde_json::from_str::<AlertChannel>(json).is_err());
    }

    #[test]
    fn test_channel_type_display() {
        assert_eq!(ChannelType::Slack.to_string(), "slack");
        assert_eq!(ChannelType::Webhook.to_string(), "webhook");
    }

    #[test]
    fn test_rule_builders() {
        let rule = AlertRule::new(3.0)
            .with_max_magnitude(5.0)
            .with_points_of_interest(["Home", "Office"]);
        assert_eq!(rule.max_magnitude, Some(5.0));
        assert_eq!(rule.points_of_interest.len(), 2);
    }
}
