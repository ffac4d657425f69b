//! Logging format selection shared by the binaries.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Supported logging output formats.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Human-readable single line output for interactive use.
    #[default]
    Compact,
    /// Structured JSON suitable for ingestion by logging stacks.
    Json,
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::LogFormat;

    #[rstest]
    #[case("compact", LogFormat::Compact)]
    #[case("json", LogFormat::Json)]
    #[case("JSON", LogFormat::Json)]
    fn parses_known_formats(#[case] text: &str, #[case] expected: LogFormat) {
        assert_eq!(text.parse::<LogFormat>(), Ok(expected));
    }

    #[rstest]
    fn rejects_unknown_format() {
        assert!("yaml".parse::<LogFormat>().is_err());
    }

    #[rstest]
    fn renders_snake_case() {
        assert_eq!(LogFormat::Compact.to_string(), "compact");
        assert_eq!(LogFormat::Json.to_string(), "json");
    }
}
