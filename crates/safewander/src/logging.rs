//! Logging setup.
//!
//! Everything goes to stderr through `tracing`, so table, JSON and GeoJSON
//! output on stdout can be piped. Degradations (cache or sample fallbacks)
//! are logged at `warn`, retries at `debug`.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Crates whose own logging is only interesting when something breaks.
const NOISY_DEPENDENCIES: [&str; 4] = ["hyper", "reqwest", "rustls", "rusqlite"];

/// How chatty the client is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Info and above, which includes degradation warnings.
    #[default]
    Normal,
    /// Debug: retries, cache refreshes, request outcomes.
    Verbose,
    /// Everything.
    Trace,
}

impl Verbosity {
    /// Map `-q` and the number of `-v` flags to a level. `-q` wins.
    #[must_use]
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Trace,
        }
    }

    #[must_use]
    pub fn level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// The default `EnvFilter` directive for this level.
    ///
    /// Dependencies stay at `warn` unless tracing everything.
    #[must_use]
    pub fn directive(self) -> String {
        let mut directive = format!("safewander={}", self.level());
        if self != Self::Trace {
            for dependency in NOISY_DEPENDENCIES {
                directive.push_str(&format!(",{dependency}=warn"));
            }
        }
        directive
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG`, when set and valid, replaces the directive derived from
/// `verbosity`. Calling this twice is harmless.
///
/// ```no_run
/// use safewander::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::from_flags(false, 1));
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false),
    );

    // Already installed by an earlier call.
    let _ = subscriber.try_init();
}

/// Route warnings from code under test into the test harness output.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("safewander=warn")
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flags() {
        assert_eq!(Verbosity::from_flags(true, 2), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, 0), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(false, 1), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, 5), Verbosity::Trace);
    }

    #[test]
    fn test_level() {
        assert_eq!(Verbosity::Quiet.level(), Level::ERROR);
        assert_eq!(Verbosity::default().level(), Level::INFO);
        assert_eq!(Verbosity::Trace.level(), Level::TRACE);
    }

    #[test]
    fn test_directive_quiets_dependencies() {
        let directive = Verbosity::Verbose.directive();
        assert!(directive.starts_with("safewander=DEBUG"));
        assert!(directive.contains("reqwest=warn"));
        assert!(directive.contains("rusqlite=warn"));
        assert_eq!(Verbosity::Trace.directive(), "safewander=TRACE");
    }

    #[test]
    fn test_directives_parse() {
        for verbosity in [
            Verbosity::Quiet,
            Verbosity::Normal,
            Verbosity::Verbose,
            Verbosity::Trace,
        ] {
            assert!(EnvFilter::try_new(verbosity.directive()).is_ok());
        }
    }

    #[test]
    fn test_init_logging_twice() {
        init_logging(Verbosity::Quiet);
        init_logging(Verbosity::Trace);
    }
}
