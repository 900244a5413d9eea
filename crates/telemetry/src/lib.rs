//! Tracing bootstrap for ATLAS services.

use anyhow::anyhow;
use atlas_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter from `RUST_LOG`, falling back to the configured level.
fn env_filter(settings: &TelemetrySettings) -> anyhow::Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .map_err(|e| anyhow!("invalid log filter '{}': {}", settings.log_level, e))
}

/// Install the global tracing subscriber.
///
/// A second call leaves the installed subscriber in place and only logs
/// at debug level.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let filter = env_filter(settings)?;

    let installed = match settings.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true),
            )
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init(),
    };

    match installed {
        Ok(()) => tracing::info!(
            target: "atlas-telemetry",
            format = ?settings.log_format,
            "telemetry initialized"
        ),
        Err(e) => tracing::debug!(
            target: "atlas-telemetry",
            error = %e,
            "tracing subscriber already installed"
        ),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_is_accepted() {
        let settings = TelemetrySettings::default();
        assert!(env_filter(&settings).is_ok());
    }

    #[test]
    fn init_twice_does_not_fail() {
        let settings = TelemetrySettings::default();
        assert!(init(&settings).is_ok());
        assert!(init(&settings).is_ok());
    }
}
