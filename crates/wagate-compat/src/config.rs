//! Gateway and forwarding configuration sections.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::vocabulary::Vocabulary;

/// Environment variable that supplies the forwarding URL.
pub const INBOUND_URL_ENV: &str = "RAPIDPRO_INBOUND_URL";

/// Compatibility gateway settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Client vocabulary to serve.
    #[serde(default)]
    pub vocabulary: Vocabulary,

    /// Static admin token. Empty disables the check.
    #[serde(default)]
    pub admin_token: String,
}

/// Inbound forwarding settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardingConfig {
    /// External inbox endpoint. Unset disables forwarding.
    #[serde(default)]
    pub inbound_url: Option<String>,

    /// Deadline for one forwarding POST in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Probability of warning about a missing URL, per message.
    #[serde(default = "default_warn_sample_rate")]
    pub warn_sample_rate: f64,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            inbound_url: None,
            timeout_ms: default_timeout_ms(),
            warn_sample_rate: default_warn_sample_rate(),
        }
    }
}

impl ForwardingConfig {
    /// Returns the forwarding deadline.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Returns the URL, treating an empty string as unset.
    pub fn url(&self) -> Option<&str> {
        self.inbound_url.as_deref().filter(|u| !u.is_empty())
    }

    /// Reads the URL from [`INBOUND_URL_ENV`] if it is set.
    pub fn with_env_url(mut self) -> Self {
        if let Ok(url) = std::env::var(INBOUND_URL_ENV) {
            self.inbound_url = Some(url);
        }
        self
    }
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_warn_sample_rate() -> f64 {
    0.01
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_config_yaml() {
        let yaml = r#"
vocabulary: wuzapi
admin_token: "s3cret"
"#;
        let config: GatewayConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.vocabulary, Vocabulary::Wuzapi);
        assert_eq!(config.admin_token, "s3cret");
    }

    #[test]
    fn test_gateway_config_defaults() {
        let config: GatewayConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.vocabulary, Vocabulary::RapidPro);
        assert!(config.admin_token.is_empty());
    }

    #[test]
    fn test_forwarding_config_yaml() {
        let yaml = r#"
inbound_url: "https://rapidpro.example/c/wa/receive"
timeout_ms: 2500
"#;
        let config: ForwardingConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.url(), Some("https://rapidpro.example/c/wa/receive"));
        assert_eq!(config.timeout(), Duration::from_millis(2500));
        assert_eq!(config.warn_sample_rate, 0.01);
    }

    #[test]
    fn test_empty_url_is_unset() {
        let config = ForwardingConfig {
            inbound_url: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(config.url(), None);
        assert_eq!(ForwardingConfig::default().timeout_ms, 10_000);
    }
}
