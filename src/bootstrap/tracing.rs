//! Tracing subscriber initialization.
//!
//! `RUST_LOG` wins when set; otherwise debug builds log at `debug` and
//! release builds at `info`.

use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

fn is_development() -> bool {
    cfg!(debug_assertions)
}

fn build_filter_directives(is_dev: bool) -> Vec<String> {
    vec![
        if is_dev { "debug" } else { "info" }.to_string(),
        if is_dev {
            "sg_platform=debug"
        } else {
            "sg_platform=info"
        }
        .to_string(),
    ]
}

/// Register the global subscriber. Call once, before any logging.
///
/// # Errors
///
/// Fails if a global subscriber is already registered.
pub fn init_tracing_subscriber() -> anyhow::Result<()> {
    let filter_directives = build_filter_directives(is_development());
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives.join(",")));

    let stdout_layer = fmt::layer()
        .with_timer(fmt::time::ChronoUtc::new(
            "%Y-%m-%d %H:%M:%S%.3f".to_string(),
        ))
        .with_level(true)
        .with_target(true)
        .with_ansi(cfg!(not(test)));

    registry().with(env_filter).with(stdout_layer).try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_directives_default_to_info() {
        let directives = build_filter_directives(false);
        assert_eq!(directives[0], "info");
        assert!(directives.contains(&"sg_platform=info".to_string()));
    }

    #[test]
    fn dev_directives_default_to_debug() {
        let directives = build_filter_directives(true);
        assert_eq!(directives[0], "debug");
    }
}
