//! Error types.
//!
//! Two kinds of failure exist in the pipeline:
//!
//! - [`ParseError`]: the SQL text could not be turned into statements. This is
//!   the only error a public entry point returns, and only from the parser
//!   wrapper; [`crate::generate_diagram`] reports it as a `PARSE_ERROR` issue.
//! - [`ExtractError`]: the statements held nothing that could become a stage.
//!   It never leaves the crate as an `Err`; the extractor turns it into an
//!   empty [`crate::DiagramSpec`] and the pipeline into an `INPUT_UNUSABLE`
//!   issue.
//!
//! Everything else (unreconstructable expressions, dependencies that resolve
//! to no stage) degrades silently and is recorded as an
//! [`crate::types::Issue`] or a debug log line at most.

use crate::types::Dialect;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;
#[cfg(feature = "tracing")]
use tracing::trace;

/// Error encountered while parsing SQL text.
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Human-readable error message.
    pub message: String,
    /// Location of the error, if the parser reported one.
    pub position: Option<Position>,
    /// Dialect in effect when parsing failed.
    pub dialect: Option<Dialect>,
}

/// Line/column location of a parse error (both 1-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
            dialect: None,
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Pull `Line: X, Column: Y` out of a sqlparser error message.
    ///
    /// Coupled to sqlparser's message format; returns `None` when the format
    /// is not found.
    fn parse_position_from_message(message: &str) -> Option<Position> {
        static POSITION_REGEX: OnceLock<Regex> = OnceLock::new();
        let re = POSITION_REGEX.get_or_init(|| {
            Regex::new(r"Line:\s*(\d+)\s*,\s*Column:\s*(\d+)").expect("Invalid regex pattern")
        });

        let position = re.captures(message).and_then(|caps| {
            let line = caps.get(1)?.as_str().parse().ok()?;
            let column = caps.get(2)?.as_str().parse().ok()?;
            Some(Position { line, column })
        });

        #[cfg(feature = "tracing")]
        if position.is_none() && (message.contains("Line") || message.contains("Column")) {
            trace!("No position recovered from parse error message: {}", message);
        }

        position
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parse error")?;
        if let Some(dialect) = self.dialect {
            write!(f, " ({dialect:?})")?;
        }
        if let Some(pos) = self.position {
            write!(f, " at line {}, column {}", pos.line, pos.column)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for ParseError {}

impl From<sqlparser::parser::ParserError> for ParseError {
    fn from(err: sqlparser::parser::ParserError) -> Self {
        let message = err.to_string();
        Self {
            position: Self::parse_position_from_message(&message),
            dialect: None,
            message,
        }
    }
}

/// The statements contained nothing that could become a stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("no statements to extract stages from")]
    EmptyInput,

    #[error("no stages discovered ({skipped} statement(s) skipped as unsupported)")]
    NoStages { skipped: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_position_from_message() {
        let msg = "Expected SELECT, found 'INSERT' at Line: 1, Column: 5";
        assert_eq!(
            ParseError::parse_position_from_message(msg),
            Some(Position { line: 1, column: 5 })
        );
    }

    #[test]
    fn test_parse_position_tolerates_spacing() {
        assert_eq!(
            ParseError::parse_position_from_message("Error at Line:1,Column:5"),
            Some(Position { line: 1, column: 5 })
        );
        assert_eq!(
            ParseError::parse_position_from_message("Error at Line:  42 ,  Column:   99"),
            Some(Position {
                line: 42,
                column: 99
            })
        );
    }

    #[test]
    fn test_parse_position_malformed() {
        for msg in [
            "Unexpected token",
            "Error at Line: abc, Column: 5",
            "Error at Line: 5",
            "Error at Column: 5, Line: 1",
            "Error at Line: -1, Column: -5",
        ] {
            assert_eq!(ParseError::parse_position_from_message(msg), None, "{msg}");
        }
    }

    #[test]
    fn test_display_with_dialect_and_position() {
        let err = ParseError {
            position: Some(Position { line: 1, column: 5 }),
            ..ParseError::new("Bad syntax")
        }
        .with_dialect(Dialect::Mssql);
        assert_eq!(
            err.to_string(),
            "Parse error (Mssql) at line 1, column 5: Bad syntax"
        );
        assert_eq!(
            ParseError::new("Bad syntax").to_string(),
            "Parse error: Bad syntax"
        );
    }

    #[test]
    fn test_extract_error_messages() {
        assert_eq!(
            ExtractError::NoStages { skipped: 2 }.to_string(),
            "no stages discovered (2 statement(s) skipped as unsupported)"
        );
        assert_eq!(
            ExtractError::EmptyInput.to_string(),
            "no statements to extract stages from"
        );
    }
}
