#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/quiltfin/quilt/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod classify;
pub mod periods;
pub mod stitch;
pub mod validate;

// Re-export the shared data model
pub use quilt_core::{
    ConceptStandardizer, EntityInfo, Filing, FiscalPeriod, LineItem, PeriodDescriptor, PeriodInfo,
    PeriodKey, PeriodKind, QuiltError, Result, Severity, StatementSnapshot, StatementType,
    StitchedLineItem, StitchedPeriod, StitchedStatement, ValidationIssue, ValidationLevel,
    ValidationResult, codes,
};

pub use cache::{StitchCache, StitchKey};
pub use classify::{ConceptClassifier, is_abstract_concept};
pub use periods::{SelectionConfig, determine_optimal_periods};
pub use stitch::{PeriodPolicy, PeriodSelection, StatementStitcher, StitchConfig, stitch_statements};
pub use validate::{ToleranceConfig, validate_balance_sheet, validate_balance_sheet_frame};

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
