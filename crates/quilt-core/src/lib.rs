#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/quiltfin/quilt/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod period;
pub mod report;
pub mod statement;

pub use error::{QuiltError, Result};
pub use period::{EntityInfo, FiscalPeriod, PeriodDescriptor, PeriodInfo, PeriodKey, PeriodKind};
pub use report::{Severity, ValidationIssue, ValidationLevel, ValidationResult, codes};
pub use statement::{
    ConceptStandardizer, Filing, LineItem, StatementSnapshot, StatementType, StitchedLineItem,
    StitchedPeriod, StitchedStatement,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
