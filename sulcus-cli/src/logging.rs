//! Tracing setup for the sulcus binary.
//!
//! Diagnostics go to stderr, either as human-readable lines or as one JSON
//! object per event, selected through `SULCUS_LOG_FORMAT`; the payload on
//! stdout stays parseable either way. The `log` facade is bridged so
//! dependencies using either API land in the same stream, and `RUST_LOG`
//! drives filtering with `info` as the fallback.

use std::env;
use std::str::FromStr;

use thiserror::Error;
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable selecting the diagnostic encoding.
pub const FORMAT_ENV: &str = "SULCUS_LOG_FORMAT";

/// Output encodings for the diagnostic stream.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LogFormat {
    /// Compact human-readable lines.
    #[default]
    Human,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            _ => Err(LoggingError::BadFormat {
                value: raw.trim().to_owned(),
            }),
        }
    }
}

/// Errors raised while reading the logging configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoggingError {
    /// The format variable held something other than `human` or `json`.
    #[error("SULCUS_LOG_FORMAT must be `human` or `json`, not `{value}`")]
    BadFormat {
        /// The rejected value.
        value: String,
    },
    /// The format variable was set but is not valid UTF-8.
    #[error("SULCUS_LOG_FORMAT is not valid UTF-8")]
    NonUnicodeFormat,
}

/// Installs the process-wide subscriber according to the environment.
///
/// When another subscriber already claimed the global slot, the first
/// configuration wins and this call still succeeds; calling it more than
/// once is therefore harmless.
///
/// # Errors
/// Returns [`LoggingError`] when `SULCUS_LOG_FORMAT` is set to an
/// unsupported value or contains invalid UTF-8.
pub fn init() -> Result<(), LoggingError> {
    install(format_from_env()?);
    Ok(())
}

fn format_from_env() -> Result<LogFormat, LoggingError> {
    match env::var(FORMAT_ENV) {
        Ok(raw) => raw.parse(),
        Err(env::VarError::NotPresent) => Ok(LogFormat::default()),
        Err(env::VarError::NotUnicode(_)) => Err(LoggingError::NonUnicodeFormat),
    }
}

fn install(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(filter);

    // Both registrations tolerate losing the race to an earlier logger.
    let _ = LogTracer::init();
    let _ = match format {
        LogFormat::Human => registry.with(stderr).try_init(),
        LogFormat::Json => registry.with(stderr.json()).try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case("human", LogFormat::Human)]
    #[case("Json", LogFormat::Json)]
    #[case("  JSON  ", LogFormat::Json)]
    fn formats_parse_ignoring_case_and_whitespace(
        #[case] raw: &str,
        #[case] expected: LogFormat,
    ) {
        assert_eq!(raw.parse::<LogFormat>().expect("format is supported"), expected);
    }

    #[test]
    fn unknown_formats_are_rejected_with_the_offending_value() {
        let err = "pretty"
            .parse::<LogFormat>()
            .expect_err("pretty is not an encoding");
        assert_eq!(
            err,
            LoggingError::BadFormat {
                value: "pretty".to_owned(),
            }
        );
    }

    #[test]
    fn the_fallback_encoding_is_human_readable() {
        assert_eq!(LogFormat::default(), LogFormat::Human);
    }

    #[test]
    fn repeated_initialisation_succeeds() {
        init().expect("first initialisation");
        init().expect("second initialisation");
    }
}
