//! Validation report types.
//!
//! The validator never raises on malformed financial data; everything it has
//! to say comes back as severity-tagged issues inside a [`ValidationResult`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Severity of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Arithmetic is wrong beyond tolerance; the statement should not be trusted.
    Error,
    /// A check could not be performed or a weak check failed.
    Warning,
    /// Informational, e.g. a rounding-level difference within tolerance.
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "ERROR"),
            Self::Warning => write!(f, "WARNING"),
            Self::Info => write!(f, "INFO"),
        }
    }
}

/// How deep validation goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationLevel {
    /// Only the fundamental accounting equation.
    Fundamental,
    /// Fundamental equation plus current/non-current section rollups.
    Sections,
}

impl fmt::Display for ValidationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fundamental => write!(f, "fundamental"),
            Self::Sections => write!(f, "sections"),
        }
    }
}

/// Well-known issue codes emitted by the validator.
pub mod codes {
    /// Assets do not equal liabilities plus equity beyond tolerance.
    pub const EQUATION_IMBALANCE: &str = "EQUATION_IMBALANCE";
    /// A nonzero difference within tolerance, attributed to rounding.
    pub const ROUNDING_ADJUSTMENT: &str = "ROUNDING_ADJUSTMENT";
    /// Required totals were not found; the check was skipped.
    pub const INCOMPLETE_DATA: &str = "INCOMPLETE_DATA";
    /// Current plus non-current subtotals disagree with the stated total.
    pub const SECTION_MISMATCH: &str = "SECTION_MISMATCH";
    /// The input could not be coerced into a label-indexed table.
    pub const CONVERSION_ERROR: &str = "CONVERSION_ERROR";
}

/// A single finding from validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Issue severity
    pub severity: Severity,
    /// Machine-readable issue code, see [`codes`]
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Numeric context: operands, deltas, period names
    pub details: Value,
}

impl ValidationIssue {
    /// Create an issue with no details payload.
    pub fn new(severity: Severity, code: &str, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: code.to_string(),
            message: message.into(),
            details: Value::Null,
        }
    }

    /// Attach a details payload.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.code, self.message)
    }
}

/// Outcome of validating one statement.
///
/// Validity depends only on error-severity issues: warnings and
/// informational notes never invalidate a statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// True when no error-severity issue was recorded
    pub is_valid: bool,
    /// All recorded issues, in emission order
    pub issues: Vec<ValidationIssue>,
    /// Names of the checks that were actually performed
    pub checks_performed: Vec<String>,
    /// Free-form run metadata (tolerances used, periods examined)
    pub metadata: HashMap<String, Value>,
}

impl ValidationResult {
    /// Create an empty, valid result.
    pub fn new() -> Self {
        Self {
            is_valid: true,
            ..Self::default()
        }
    }

    /// Create a result carrying a single error, used when the input cannot
    /// be coerced into a table at all.
    pub fn from_error(code: &str, message: impl Into<String>) -> Self {
        let mut result = Self::new();
        result.push(ValidationIssue::new(Severity::Error, code, message));
        result
    }

    /// Record an issue, updating validity.
    pub fn push(&mut self, issue: ValidationIssue) {
        if issue.severity == Severity::Error {
            self.is_valid = false;
        }
        self.issues.push(issue);
    }

    /// Record that a named check ran.
    pub fn record_check(&mut self, name: &str) {
        if !self.checks_performed.iter().any(|c| c == name) {
            self.checks_performed.push(name.to_string());
        }
    }

    /// Returns true when any error-severity issue was recorded.
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    /// Issues of the given severity, in emission order.
    pub fn issues_at(&self, severity: Severity) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |i| i.severity == severity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_result_is_valid() {
        let result = ValidationResult::new();
        assert!(result.is_valid);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_warnings_do_not_invalidate() {
        let mut result = ValidationResult::new();
        result.push(ValidationIssue::new(
            Severity::Warning,
            codes::INCOMPLETE_DATA,
            "no liabilities total found",
        ));
        result.push(ValidationIssue::new(
            Severity::Info,
            codes::ROUNDING_ADJUSTMENT,
            "difference of 0.50 within tolerance",
        ));

        assert!(result.is_valid);
        assert!(!result.has_errors());
        assert_eq!(result.issues_at(Severity::Warning).count(), 1);
    }

    #[test]
    fn test_error_invalidates() {
        let mut result = ValidationResult::new();
        result.push(ValidationIssue::new(
            Severity::Error,
            codes::EQUATION_IMBALANCE,
            "assets do not balance",
        ));

        assert!(!result.is_valid);
        assert!(result.has_errors());
    }

    #[test]
    fn test_record_check_dedupes() {
        let mut result = ValidationResult::new();
        result.record_check("fundamental_equation");
        result.record_check("fundamental_equation");
        assert_eq!(result.checks_performed.len(), 1);
    }
}
