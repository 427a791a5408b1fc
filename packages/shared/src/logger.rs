//! Logger setup shared by every binary.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence. Without it, the binary's own crate logs at
/// `default_level` and everything else at `info`.
///
/// # Arguments
///
/// * `bin_name` - Binary name (usually `env!("CARGO_BIN_NAME")`)
/// * `default_level` - Level used for the binary when `RUST_LOG` is unset
pub fn setup_logger(bin_name: &str, default_level: &str) {
    let crate_target = bin_name.replace('-', "_");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "info,{crate_target}={default_level},quizcast_client={default_level},quizcast_broker={default_level}"
        ))
    });

    // try_init so tests and embedders that already installed a subscriber keep theirs
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .try_init();
    match installed {
        Ok(()) => tracing::debug!("Logger initialized for {}", bin_name),
        Err(_) => tracing::debug!("Global subscriber already set, keeping it"),
    }
}
