//! Log output for the `utasker` binary.
//!
//! Logs go to stderr so stdout stays machine-readable. `RUST_LOG` takes
//! precedence over the configured level.

use tracing_subscriber::EnvFilter;

/// Filter used by `--verbose`.
pub const VERBOSE_FILTER: &str = "utasker=debug,info";

/// Pick the filter directives: `--verbose`, else `RUST_LOG`, else `configured`.
#[must_use]
pub fn filter_directives(configured: &str, verbose: bool) -> String {
    if verbose {
        return VERBOSE_FILTER.to_string();
    }
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => configured.to_string(),
    }
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(configured: &str, verbose: bool) {
    let directives = filter_directives(configured, verbose);
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("info"));

    // Fails only if a subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[serial_test::serial]
    fn test_verbose_wins() {
        std::env::set_var(EnvFilter::DEFAULT_ENV, "warn");
        assert_eq!(filter_directives("info", true), VERBOSE_FILTER);
        std::env::remove_var(EnvFilter::DEFAULT_ENV);
    }

    #[test]
    #[serial_test::serial]
    fn test_rust_log_beats_config() {
        std::env::set_var(EnvFilter::DEFAULT_ENV, "utasker=trace");
        assert_eq!(filter_directives("info", false), "utasker=trace");
        std::env::remove_var(EnvFilter::DEFAULT_ENV);
        assert_eq!(filter_directives("error", false), "error");
    }

    #[test]
    #[serial_test::serial]
    fn test_init_twice_is_harmless() {
        std::env::remove_var(EnvFilter::DEFAULT_ENV);
        init("not a [valid filter", false);
        init("debug", true);
    }
}
