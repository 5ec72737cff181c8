//! Greeter configuration DTO.
//!
//! Maps a TOML document onto [`GreeterConfig`]. Missing keys take the values
//! from [`GreeterConfig::defaults`].

use std::time::Duration;

use anyhow::{anyhow, ensure};

use crate::crypto::SecretHashParams;

/// Longest PIN the greeter will generate.
pub const MAX_PIN_DIGITS: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreeterConfig {
    /// Lifetime of an unfinished invitation
    pub invitation_ttl: Duration,

    /// How often expired invitations are swept
    pub sweep_interval: Duration,

    /// Upper bound on the notarization callback
    pub write_timeout: Duration,

    /// Argon2id cost for hashed secrets
    pub secret_hash: SecretHashParams,

    /// Digits in generated PIN secrets
    pub pin_digits: usize,

    pub channel: ChannelConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    pub max_frame_bytes: usize,
    pub idle_timeout: Duration,
    pub max_concurrent_connections: usize,
}

impl GreeterConfig {
    /// v1 defaults
    pub fn defaults() -> Self {
        Self {
            invitation_ttl: Duration::from_secs(300),
            sweep_interval: Duration::from_secs(30),
            write_timeout: Duration::from_millis(10_000),
            secret_hash: SecretHashParams::defaults(),
            pin_digits: 4,
            channel: ChannelConfig::defaults(),
        }
    }

    /// Create a config from a parsed TOML value.
    ///
    /// Negative or out-of-range integers are rejected rather than wrapped.
    pub fn from_toml(toml_value: &toml::Value) -> anyhow::Result<Self> {
        let defaults = Self::defaults();
        let secs = |section: &str, key: &str, default: Duration| {
            Ok::<_, anyhow::Error>(
                read_int::<u64>(toml_value, section, key)?
                    .map(Duration::from_secs)
                    .unwrap_or(default),
            )
        };
        let millis = |section: &str, key: &str, default: Duration| {
            Ok::<_, anyhow::Error>(
                read_int::<u64>(toml_value, section, key)?
                    .map(Duration::from_millis)
                    .unwrap_or(default),
            )
        };

        let pin_digits =
            read_int::<usize>(toml_value, "secret", "pin_digits")?.unwrap_or(defaults.pin_digits);
        ensure!(
            (1..=MAX_PIN_DIGITS).contains(&pin_digits),
            "secret.pin_digits must be between 1 and {MAX_PIN_DIGITS}, got {pin_digits}"
        );

        Ok(Self {
            invitation_ttl: secs("invitation", "ttl_secs", defaults.invitation_ttl)?,
            sweep_interval: secs("invitation", "sweep_interval_secs", defaults.sweep_interval)?,
            write_timeout: millis("notarize", "write_timeout_ms", defaults.write_timeout)?,
            secret_hash: SecretHashParams {
                memory_kib: read_int(toml_value, "secret", "memory_kib")?
                    .unwrap_or(defaults.secret_hash.memory_kib),
                iterations: read_int(toml_value, "secret", "iterations")?
                    .unwrap_or(defaults.secret_hash.iterations),
                lanes: read_int(toml_value, "secret", "lanes")?
                    .unwrap_or(defaults.secret_hash.lanes),
            },
            pin_digits,
            channel: ChannelConfig {
                max_frame_bytes: read_int(toml_value, "channel", "max_frame_bytes")?
                    .unwrap_or(defaults.channel.max_frame_bytes),
                idle_timeout: millis("channel", "idle_timeout_ms", defaults.channel.idle_timeout)?,
                max_concurrent_connections: read_int(
                    toml_value,
                    "channel",
                    "max_concurrent_connections",
                )?
                .unwrap_or(defaults.channel.max_concurrent_connections),
            },
        })
    }
}

/// Read `[section] key` as an integer of type `T`. Missing keys are `None`.
fn read_int<T>(toml_value: &toml::Value, section: &str, key: &str) -> anyhow::Result<Option<T>>
where
    T: TryFrom<i64>,
{
    let Some(raw) = toml_value
        .get(section)
        .and_then(|s| s.get(key))
        .and_then(|v| v.as_integer())
    else {
        return Ok(None);
    };
    T::try_from(raw)
        .map(Some)
        .map_err(|_| anyhow!("{section}.{key} is out of range: {raw}"))
}

impl Default for GreeterConfig {
    fn default() -> Self {
        Self::defaults()
    }
}

impl ChannelConfig {
    pub fn defaults() -> Self {
        Self {
            max_frame_bytes: 64 * 1024,
            idle_timeout: Duration::from_millis(30_000),
            max_concurrent_connections: 64,
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::defaults()
    }
}
