//! Logging setup utilities for the relay binaries.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Library crates whose log output is enabled alongside the binary's own.
const WORKSPACE_CRATES: [&str; 3] = ["hikyaku_shared", "hikyaku_server", "hikyaku_client"];

/// Build the default `EnvFilter` directive used when `RUST_LOG` is not set.
///
/// Crate names are normalized to their target form (`-` replaced with `_`).
pub fn default_filter_directive(binary_name: &str, default_log_level: &str) -> String {
    let mut directives: Vec<String> = WORKSPACE_CRATES
        .iter()
        .map(|name| format!("{}={}", name, default_log_level))
        .collect();

    let binary_target = binary_name.replace('-', "_");
    if !WORKSPACE_CRATES.contains(&binary_target.as_str()) {
        directives.push(format!("{}={}", binary_target, default_log_level));
    }
    directives.push(format!("tower_http={}", default_log_level));

    directives.join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "hikyaku-server")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use hikyaku_shared::logger::setup_logger;
///
/// setup_logger("hikyaku-server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    let (filter, source) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, "RUST_LOG"),
        Err(_) => (
            EnvFilter::new(default_filter_directive(binary_name, default_log_level)),
            "default",
        ),
    };
    let directive = filter.to_string();

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::debug!("Log filter ({}): {}", source, directive);
}
