//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{ServerConfig, WagateConfig};
use wagate_compat::ForwardingConfig;

/// Validates the entire configuration.
pub fn validate_config(config: &WagateConfig) -> ConfigResult<()> {
    validate_server_config(&config.server)?;
    validate_forwarding_config(&config.forwarding)?;
    Ok(())
}

fn validate_server_config(server: &ServerConfig) -> ConfigResult<()> {
    if server.host.is_empty() {
        return Err(ConfigError::validation("Server host cannot be empty"));
    }
    validate_port(server.port)
}

fn validate_forwarding_config(forwarding: &ForwardingConfig) -> ConfigResult<()> {
    if forwarding.timeout_ms == 0 {
        return Err(ConfigError::validation(
            "Forwarding timeout must be greater than 0",
        ));
    }

    if !(0.0..=1.0).contains(&forwarding.warn_sample_rate) {
        return Err(ConfigError::validation(format!(
            "Warning sample rate must be between 0 and 1, got {}",
            forwarding.warn_sample_rate
        )));
    }

    if let Some(url) = forwarding.url() {
        validate_url(url)?;
    }

    Ok(())
}

/// Validates an HTTP URL.
fn validate_url(url: &str) -> ConfigResult<()> {
    let valid_schemes = ["http://", "https://"];
    if !valid_schemes.iter().any(|s| url.starts_with(s)) {
        return Err(ConfigError::invalid_url(
            url,
            format!("URL must start with one of: {valid_schemes:?}"),
        ));
    }
    Ok(())
}

/// Validates a port number.
fn validate_port(port: u16) -> ConfigResult<()> {
    if port == 0 {
        return Err(ConfigError::InvalidPort(port));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&WagateConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero() {
        let mut config = WagateConfig::default();
        config.server.port = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidPort(0))
        ));
    }

    #[test]
    fn test_validate_sample_rate_range() {
        let mut config = WagateConfig::default();
        config.forwarding.warn_sample_rate = 1.5;
        assert!(validate_config(&config).is_err());
        config.forwarding.warn_sample_rate = -0.1;
        assert!(validate_config(&config).is_err());
        config.forwarding.warn_sample_rate = 1.0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = WagateConfig::default();
        config.forwarding.timeout_ms = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_validate_url_scheme() {
        let mut config = WagateConfig::default();
        config.forwarding.inbound_url = Some("ftp://inbox".into());
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidUrl { .. })
        ));

        config.forwarding.inbound_url = Some("https://inbox.example/receive".into());
        assert!(validate_config(&config).is_ok());

        config.forwarding.inbound_url = Some(String::new());
        assert!(validate_config(&config).is_ok());
    }
}
