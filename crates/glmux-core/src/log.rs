//! Tracing subscriber setup for hosts that do not install their own.

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

static INSTALLED: OnceCell<()> = OnceCell::new();

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Directive used when `RUST_LOG` is unset or invalid.
    pub default_directive: String,
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_directive: "info".to_owned(),
            with_target: false,
        }
    }
}

/// Install a fmt subscriber filtered by `RUST_LOG`. Only the first call in a
/// process has an effect; a subscriber installed by the host is left alone.
pub fn init(config: LogConfig) {
    INSTALLED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.default_directive));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(config.with_target)
            .try_init();
    });
}

pub fn init_default() {
    init(LogConfig::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        init(LogConfig {
            default_directive: "debug".to_owned(),
            with_target: true,
        });
        init_default();
        tracing::debug!("still logging");
        assert!(INSTALLED.get().is_some());
    }
}
