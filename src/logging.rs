//! Diagnostic logging.
//!
//! Diagnostics go to stderr through `tracing`; stdout belongs to the program's
//! terminal stream.

use tracing_subscriber::EnvFilter;

use crate::config::DEFAULT_LOG_FILTER;

/// Installs the global fmt subscriber. Returns `false` if one was already set.
pub fn init(filter: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}

fn build_filter(filter: &str) -> EnvFilter {
    EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

#[cfg(test)]
mod tests {
    use super::init;

    #[test]
    fn second_init_is_rejected() {
        init("warn");
        assert!(!init("debug"));
    }
}
