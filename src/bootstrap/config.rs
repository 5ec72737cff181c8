//! Configuration loader.
//!
//! Reads a TOML file and maps it onto [`GreeterConfig`]. Missing keys fall
//! back to defaults inside the DTO; nothing here validates values.

use std::path::Path;

use anyhow::Context;
use sg_core::config::GreeterConfig;

/// Load configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid TOML.
pub fn load_config(config_path: impl AsRef<Path>) -> anyhow::Result<GreeterConfig> {
    let config_path = config_path.as_ref();
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let toml_value: toml::Value =
        toml::from_str(&content).context("Failed to parse config as TOML")?;
    GreeterConfig::from_toml(&toml_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_reads_valid_toml() {
        let toml_content = r#"
            [invitation]
            ttl_secs = 120

            [notarize]
            write_timeout_ms = 2500

            [channel]
            max_concurrent_connections = 4
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = load_config(temp_file.path()).unwrap();

        assert_eq!(config.invitation_ttl, Duration::from_secs(120));
        assert_eq!(config.write_timeout, Duration::from_millis(2500));
        assert_eq!(config.channel.max_concurrent_connections, 4);
        assert_eq!(config.pin_digits, GreeterConfig::defaults().pin_digits);
    }

    #[test]
    fn test_load_config_fails_on_missing_file() {
        let err = load_config("/nonexistent/spacegreet.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_load_config_fails_on_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[invitation\nttl_secs = ").unwrap();

        let err = load_config(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config as TOML"));
    }
}
