//! Common types shared between request and response.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A normalized identifier used to decide whether two raw names refer to the
/// same stage.
///
/// Values are produced by [`crate::naming::canonicalize`]; they are never shown
/// to users.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct CanonicalName(String);

impl CanonicalName {
    /// Wraps a string that is already in canonical form.
    pub(crate) fn from_canonical(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for `#name` temp-table identifiers.
    pub fn is_temp_table(&self) -> bool {
        self.0.starts_with('#')
    }
}

impl AsRef<str> for CanonicalName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An issue encountered while building a diagram.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Severity level
    pub severity: Severity,

    /// Machine-readable issue code
    pub code: String,

    /// Human-readable message
    pub message: String,

    /// Optional: which statement index this issue relates to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement_index: Option<usize>,

    /// Optional: source file name where the issue occurred
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
}

impl Issue {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    fn new(severity: Severity, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: code.into(),
            message: message.into(),
            statement_index: None,
            source_name: None,
        }
    }

    pub fn with_statement(mut self, index: usize) -> Self {
        self.statement_index = Some(index);
        self
    }

}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Summary statistics for a diagram result.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Number of parsed statements
    pub statement_count: usize,

    /// Number of stages in the diagram
    pub stage_count: usize,

    /// Number of inferred stage-to-stage dependency edges
    pub dependency_count: usize,

    /// Issue counts by severity
    pub issue_count: IssueCount,

    /// Quick check: true if any errors were encountered
    pub has_errors: bool,
}

/// Counts of issues by severity level.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct IssueCount {
    /// Number of error-level issues
    pub errors: usize,
    /// Number of warning-level issues
    pub warnings: usize,
}

impl IssueCount {
    pub fn from_issues(issues: &[Issue]) -> Self {
        let mut count = Self::default();
        for issue in issues {
            match issue.severity {
                Severity::Error => count.errors += 1,
                Severity::Warning => count.warnings += 1,
            }
        }
        count
    }
}

/// Machine-readable issue codes.
pub mod issue_codes {
    pub const PARSE_ERROR: &str = "PARSE_ERROR";
    pub const INPUT_UNUSABLE: &str = "INPUT_UNUSABLE";
    pub const UNSUPPORTED_STATEMENT: &str = "UNSUPPORTED_STATEMENT";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_creation() {
        let issue = Issue::warning(issue_codes::UNSUPPORTED_STATEMENT, "DROP TABLE skipped")
            .with_statement(2);

        assert_eq!(issue.severity, Severity::Warning);
        assert_eq!(issue.code, "UNSUPPORTED_STATEMENT");
        assert_eq!(issue.statement_index, Some(2));
    }

    #[test]
    fn test_issue_count() {
        let issues = vec![
            Issue::error(issue_codes::PARSE_ERROR, "bad"),
            Issue::warning(issue_codes::UNSUPPORTED_STATEMENT, "skip"),
            Issue::warning(issue_codes::UNSUPPORTED_STATEMENT, "skip"),
        ];
        let count = IssueCount::from_issues(&issues);
        assert_eq!(count.errors, 1);
        assert_eq!(count.warnings, 2);
    }

    #[test]
    fn test_canonical_name_serializes_as_string() {
        let name = CanonicalName::from_canonical("#temp".to_string());
        assert!(name.is_temp_table());
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"#temp\"");
    }
}
