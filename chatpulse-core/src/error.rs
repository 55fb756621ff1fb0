//! Error types for chatpulse-core
//!
//! Empty windows, zero totals and short histories are expected in real chat
//! groups and are answered with fallback values by the analyzers. The variants
//! here are reserved for malformed input.

use thiserror::Error;

/// Main error type for the chatpulse-core library
#[derive(Error, Debug)]
pub enum Error {
    /// A date string could not be parsed
    #[error("cannot parse date {input:?}: expected {expected}")]
    DateParse { input: String, expected: &'static str },

    /// Window failed validation (negative count, end < start, stray dates, ...)
    #[error("invalid analysis window: {0}")]
    InvalidWindow(String),

    /// User-authored insight formula failed
    #[error("formula error: {0}")]
    Formula(#[from] FormulaError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON decoding/encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while parsing or evaluating a custom insight formula.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    /// Identifiers that are not part of the metric variable namespace
    #[error("unresolved variables: {}", .0.join(", "))]
    UnresolvedVariables(Vec<String>),

    /// Tokenizer or parser rejected the expression
    #[error("syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },

    /// Operator applied to the wrong kind of value
    #[error("type error: {0}")]
    Type(String),

    #[error("division by zero")]
    DivisionByZero,
}

/// Result type alias for chatpulse-core
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_variables_message_names_all() {
        let err = FormulaError::UnresolvedVariables(vec!["foo".into(), "bar".into()]);
        assert_eq!(err.to_string(), "unresolved variables: foo, bar");

        let wrapped: Error = err.into();
        assert!(wrapped.to_string().contains("foo, bar"));
    }

    #[test]
    fn test_date_parse_message() {
        let err = Error::DateParse {
            input: "2024-13-01".to_string(),
            expected: "YYYY-MM-DD",
        };
        assert_eq!(
            err.to_string(),
            "cannot parse date \"2024-13-01\": expected YYYY-MM-DD"
        );
    }
}
