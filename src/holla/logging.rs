//! Diagnostic logging to stderr.
//!
//! Command output owns stdout, so tracing always writes to stderr. The filter
//! comes from `HOLLA_LOG` (an `EnvFilter` directive) or, failing that, from the
//! number of `-v` flags.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding a tracing filter directive, e.g. `holla=debug`.
pub const LOG_ENV: &str = "HOLLA_LOG";

fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "holla=info,warn",
        _ => "holla=debug,info",
    }
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init_tracing(verbosity: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbosity > 1)
                .without_time()
                .compact(),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(default_directive(0), "warn");
        assert_eq!(default_directive(1), "holla=info,warn");
        assert_eq!(default_directive(5), "holla=debug,info");
    }
}
