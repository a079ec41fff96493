use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_FILTER: &str = "warn,biomarker_cart=info";

/// Installs the CLI subscriber. Logs go to stderr; stdout is reserved for data.
///
/// Precedence: `RUST_LOG`, then `configured`, then the default. `verbose`
/// raises the crate to `debug` when no explicit filter is set. Once a global
/// subscriber is installed, later calls leave it in place.
pub fn init_cli_logger(verbose: bool, configured: Option<&str>) {
    let fallback = match (configured, verbose) {
        (Some(filter), _) => filter.to_string(),
        (None, true) => "warn,biomarker_cart=debug".to_string(),
        (None, false) => DEFAULT_FILTER.to_string(),
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(false)
                .compact(),
        )
        .try_init();
    if let Err(e) = installed {
        tracing::debug!(error = %e, "logger already installed");
    }
}
