//! Balance sheet validation: the fundamental accounting identity and
//! section rollups.
//!
//! Validation is read-only and never raises on malformed financial data.
//! Missing totals downgrade a check to a warning, arithmetic mismatches come
//! back as severity-tagged issues with full numeric context, and a failed
//! table conversion becomes a single-error result.

use polars::prelude::*;
use quilt_core::{
    Severity, StitchedStatement, ValidationIssue, ValidationLevel, ValidationResult, codes,
};
use serde_json::json;
use tracing::debug;

/// Numeric tolerances for validation checks.
///
/// An error fires only when a difference exceeds *both* bounds: a large
/// statement can be off by more than the absolute dollar tolerance while
/// still being within rounding noise relative to its magnitude.
#[derive(Debug, Clone)]
pub struct ToleranceConfig {
    /// Absolute tolerance in reporting currency units.
    pub absolute: f64,
    /// Relative tolerance as a fraction of the left-hand operand.
    pub relative: f64,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            absolute: 1.0,
            relative: 0.001,
        }
    }
}

/// Label synonyms per canonical quantity, in resolution priority order.
/// Compared case-insensitively against trimmed row labels.
const TOTAL_ASSETS: &[&str] = &["total assets", "assets"];
const TOTAL_LIABILITIES: &[&str] = &["total liabilities", "liabilities"];
const STOCKHOLDERS_EQUITY: &[&str] = &[
    "total stockholders' equity",
    "total stockholders equity",
    "stockholders' equity",
    "stockholders equity",
    "total shareholders' equity",
    "shareholders' equity",
    "total equity attributable to parent",
];
const TOTAL_EQUITY: &[&str] = &[
    "total equity",
    "total stockholders' equity including noncontrolling interest",
    "stockholders' equity including portion attributable to noncontrolling interest",
    "total equity including noncontrolling interest",
];
const NONCONTROLLING_INTEREST: &[&str] = &[
    "noncontrolling interest",
    "noncontrolling interests",
    "minority interest",
];
const LIABILITIES_AND_EQUITY: &[&str] = &[
    "total liabilities and stockholders' equity",
    "total liabilities and stockholders equity",
    "total liabilities and equity",
    "liabilities and stockholders' equity",
    "liabilities and equity",
    "total liabilities and shareholders' equity",
];
const CURRENT_ASSETS: &[&str] = &["total current assets", "current assets"];
const NONCURRENT_ASSETS: &[&str] = &[
    "total non-current assets",
    "total noncurrent assets",
    "non-current assets",
    "noncurrent assets",
];
const CURRENT_LIABILITIES: &[&str] = &["total current liabilities", "current liabilities"];
const NONCURRENT_LIABILITIES: &[&str] = &[
    "total non-current liabilities",
    "total noncurrent liabilities",
    "non-current liabilities",
    "noncurrent liabilities",
];

/// Label-indexed view of the statement table: lowercased labels plus one
/// value vector per period column.
struct LabelTable {
    labels: Vec<String>,
    periods: Vec<(String, Vec<Option<f64>>)>,
}

impl LabelTable {
    fn from_frame(df: &DataFrame) -> quilt_core::Result<Self> {
        let label_col = df.column("label")?.str()?;
        let labels: Vec<String> = (0..df.height())
            .map(|i| label_col.get(i).unwrap_or("").trim().to_lowercase())
            .collect();

        let mut periods = Vec::new();
        for column in df.get_columns() {
            if column.name().as_str() == "label" {
                continue;
            }
            let values = column.cast(&DataType::Float64)?;
            let values = values.f64()?;
            periods.push((
                column.name().to_string(),
                (0..values.len()).map(|i| values.get(i)).collect(),
            ));
        }

        Ok(Self { labels, periods })
    }

    /// Resolve a canonical quantity: the first synonym matching a row with a
    /// non-null value in any period column wins.
    fn resolve(&self, synonyms: &[&str]) -> Option<Vec<Option<f64>>> {
        for synonym in synonyms {
            if let Some(row) = self.labels.iter().position(|label| label == synonym) {
                let values: Vec<Option<f64>> =
                    self.periods.iter().map(|(_, col)| col[row]).collect();
                if values.iter().any(Option::is_some) {
                    return Some(values);
                }
            }
        }
        None
    }

    fn period_names(&self) -> Vec<&str> {
        self.periods.iter().map(|(name, _)| name.as_str()).collect()
    }
}

/// Validate a stitched balance sheet.
///
/// Conversion failure never escapes; it comes back as a result carrying a
/// single [`codes::CONVERSION_ERROR`] issue.
///
/// # Examples
///
/// ```
/// use quilt::{ToleranceConfig, ValidationLevel, validate_balance_sheet};
/// use quilt_core::StitchedStatement;
///
/// let result = validate_balance_sheet(
///     &StitchedStatement::default(),
///     ValidationLevel::Fundamental,
///     &ToleranceConfig::default(),
/// );
/// // Nothing to check is incomplete data, not an error.
/// assert!(result.is_valid);
/// ```
pub fn validate_balance_sheet(
    statement: &StitchedStatement,
    level: ValidationLevel,
    tolerances: &ToleranceConfig,
) -> ValidationResult {
    match statement.to_frame() {
        Ok(df) => validate_balance_sheet_frame(&df, level, tolerances),
        Err(err) => ValidationResult::from_error(
            codes::CONVERSION_ERROR,
            format!("failed to convert statement to a table: {err}"),
        ),
    }
}

/// Validate a raw label-indexed table directly.
///
/// The frame must carry a string `label` column; every other column is
/// treated as one period of numeric values.
pub fn validate_balance_sheet_frame(
    df: &DataFrame,
    level: ValidationLevel,
    tolerances: &ToleranceConfig,
) -> ValidationResult {
    let table = match LabelTable::from_frame(df) {
        Ok(table) => table,
        Err(err) => {
            return ValidationResult::from_error(
                codes::CONVERSION_ERROR,
                format!("failed to read statement table: {err}"),
            );
        }
    };

    let mut result = ValidationResult::new();
    result.metadata.insert("level".to_string(), json!(level.to_string()));
    result
        .metadata
        .insert("tolerance".to_string(), json!(tolerances.absolute));
    result
        .metadata
        .insert("tolerance_pct".to_string(), json!(tolerances.relative));
    result
        .metadata
        .insert("periods".to_string(), json!(table.period_names()));

    check_fundamental_equation(&table, tolerances, &mut result);

    if level == ValidationLevel::Sections {
        check_section_rollups(&table, tolerances, &mut result);
    }

    result
}

/// Assets = Liabilities + Equity, preferring an explicit combined total over
/// reconstruction.
fn check_fundamental_equation(
    table: &LabelTable,
    tolerances: &ToleranceConfig,
    result: &mut ValidationResult,
) {
    let assets = table.resolve(TOTAL_ASSETS);
    let liabilities_and_equity = table.resolve(LIABILITIES_AND_EQUITY);
    let liabilities = table.resolve(TOTAL_LIABILITIES);
    let total_equity = table.resolve(TOTAL_EQUITY);
    let stockholders_equity = table.resolve(STOCKHOLDERS_EQUITY);
    let nci = table.resolve(NONCONTROLLING_INTEREST);

    let at = |row: &Option<Vec<Option<f64>>>, j: usize| -> Option<f64> {
        row.as_ref().and_then(|values| values.get(j).copied().flatten())
    };

    let mut performed = false;
    for (j, period) in table.period_names().iter().enumerate() {
        let Some(assets_value) = at(&assets, j) else {
            continue;
        };

        // Prefer the explicit combined total; otherwise reconstruct from
        // liabilities plus equity. Comprehensive equity already embeds the
        // noncontrolling interest, so NCI is added only alongside the
        // parent-only figure.
        let right_hand_side = if let Some(combined) = at(&liabilities_and_equity, j) {
            Some(combined)
        } else if let Some(liabilities_value) = at(&liabilities, j) {
            if let Some(equity) = at(&total_equity, j) {
                Some(liabilities_value + equity)
            } else {
                at(&stockholders_equity, j)
                    .map(|equity| liabilities_value + equity + at(&nci, j).unwrap_or(0.0))
            }
        } else {
            None
        };

        let Some(rhs) = right_hand_side else {
            continue;
        };
        performed = true;

        let difference = assets_value - rhs;
        if difference == 0.0 {
            continue;
        }

        let details = json!({
            "period": period,
            "assets": assets_value,
            "liabilities_and_equity": rhs,
            "difference": difference,
        });

        if exceeds_tolerance(difference, assets_value, tolerances) {
            debug!(%period, difference, "accounting equation imbalance");
            result.push(
                ValidationIssue::new(
                    Severity::Error,
                    codes::EQUATION_IMBALANCE,
                    format!(
                        "assets ({assets_value:.2}) do not equal liabilities and equity ({rhs:.2}) in period {period}"
                    ),
                )
                .with_details(details),
            );
        } else {
            result.push(
                ValidationIssue::new(
                    Severity::Info,
                    codes::ROUNDING_ADJUSTMENT,
                    format!(
                        "difference of {difference:.2} in period {period} is within tolerance"
                    ),
                )
                .with_details(details),
            );
        }
    }

    if performed {
        result.record_check("fundamental_equation");
    } else {
        result.push(ValidationIssue::new(
            Severity::Warning,
            codes::INCOMPLETE_DATA,
            "insufficient totals to check the accounting equation; check skipped",
        ));
    }
}

/// Current + non-current subtotals against the stated section totals.
/// Always a warning, never an error: subtotal labeling is far less reliable
/// than the statement-level totals.
fn check_section_rollups(
    table: &LabelTable,
    tolerances: &ToleranceConfig,
    result: &mut ValidationResult,
) {
    let sections: [(&str, &[&str], &[&str], &[&str]); 2] = [
        ("assets", TOTAL_ASSETS, CURRENT_ASSETS, NONCURRENT_ASSETS),
        (
            "liabilities",
            TOTAL_LIABILITIES,
            CURRENT_LIABILITIES,
            NONCURRENT_LIABILITIES,
        ),
    ];

    let mut performed = false;
    for (section, total_synonyms, current_synonyms, noncurrent_synonyms) in sections {
        let total = table.resolve(total_synonyms);
        let current = table.resolve(current_synonyms);
        let noncurrent = table.resolve(noncurrent_synonyms);
        let (Some(total), Some(current), Some(noncurrent)) = (total, current, noncurrent) else {
            continue;
        };

        for (j, period) in table.period_names().iter().enumerate() {
            let (Some(total_value), Some(current_value), Some(noncurrent_value)) = (
                total.get(j).copied().flatten(),
                current.get(j).copied().flatten(),
                noncurrent.get(j).copied().flatten(),
            ) else {
                continue;
            };
            performed = true;

            let subtotal_sum = current_value + noncurrent_value;
            let difference = total_value - subtotal_sum;
            if difference == 0.0 {
                continue;
            }

            if exceeds_tolerance(difference, total_value, tolerances) {
                result.push(
                    ValidationIssue::new(
                        Severity::Warning,
                        codes::SECTION_MISMATCH,
                        format!(
                            "{section} sections sum to {subtotal_sum:.2} but the stated total is {total_value:.2} in period {period}"
                        ),
                    )
                    .with_details(json!({
                        "section": section,
                        "period": period,
                        "total": total_value,
                        "current": current_value,
                        "noncurrent": noncurrent_value,
                        "difference": difference,
                    })),
                );
            }
        }
    }

    if performed {
        result.record_check("section_rollups");
    }
}

/// A difference is out of tolerance only when it exceeds both the absolute
/// and the relative bound.
fn exceeds_tolerance(difference: f64, reference: f64, tolerances: &ToleranceConfig) -> bool {
    let exceeds_absolute = difference.abs() > tolerances.absolute;
    let relative = difference.abs() / reference.abs().max(f64::MIN_POSITIVE);
    exceeds_absolute && relative > tolerances.relative
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn frame(rows: &[(&str, &[Option<f64>])], period_names: &[&str]) -> DataFrame {
        let labels: Vec<&str> = rows.iter().map(|(label, _)| *label).collect();
        let mut columns: Vec<Column> = vec![Series::new("label".into(), labels).into()];
        for (j, name) in period_names.iter().enumerate() {
            let values: Vec<Option<f64>> = rows.iter().map(|(_, vals)| vals[j]).collect();
            columns.push(Series::new((*name).into(), values).into());
        }
        DataFrame::new(columns).unwrap()
    }

    fn single_period(rows: &[(&str, f64)]) -> DataFrame {
        let rows: Vec<(&str, Vec<Option<f64>>)> =
            rows.iter().map(|(l, v)| (*l, vec![Some(*v)])).collect();
        let borrowed: Vec<(&str, &[Option<f64>])> =
            rows.iter().map(|(l, v)| (*l, v.as_slice())).collect();
        frame(&borrowed, &["FY 2024"])
    }

    fn validate(df: &DataFrame) -> ValidationResult {
        validate_balance_sheet_frame(df, ValidationLevel::Fundamental, &ToleranceConfig::default())
    }

    #[test]
    fn test_balanced_statement_is_clean() {
        let df = single_period(&[
            ("Total Assets", 1_000_000.0),
            ("Total Liabilities", 400_000.0),
            ("Total Stockholders' Equity", 600_000.0),
        ]);
        let result = validate(&df);

        assert!(result.is_valid);
        assert!(result.issues.is_empty());
        assert_eq!(result.checks_performed, vec!["fundamental_equation"]);
    }

    #[test]
    fn test_rounding_within_tolerance_is_info() {
        let df = single_period(&[
            ("Total Assets", 1_000_000.0),
            ("Total Liabilities and Stockholders' Equity", 1_000_000.50),
        ]);
        let result = validate(&df);

        assert!(result.is_valid);
        assert_eq!(result.issues.len(), 1);
        let issue = &result.issues[0];
        assert_eq!(issue.severity, Severity::Info);
        assert_eq!(issue.code, codes::ROUNDING_ADJUSTMENT);
        assert_relative_eq!(
            issue.details["difference"].as_f64().unwrap(),
            -0.50,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_imbalance_is_error_with_context() {
        let df = single_period(&[
            ("Total Assets", 1_000_000.0),
            ("Total Liabilities and Stockholders' Equity", 900_000.0),
        ]);
        let result = validate(&df);

        assert!(!result.is_valid);
        let issue = &result.issues[0];
        assert_eq!(issue.severity, Severity::Error);
        assert_eq!(issue.code, codes::EQUATION_IMBALANCE);
        assert_relative_eq!(issue.details["assets"].as_f64().unwrap(), 1_000_000.0);
        assert_relative_eq!(
            issue.details["liabilities_and_equity"].as_f64().unwrap(),
            900_000.0
        );
        assert_relative_eq!(issue.details["difference"].as_f64().unwrap(), 100_000.0);
    }

    #[test]
    fn test_error_requires_exceeding_both_tolerances() {
        // $5 off on a million-dollar statement: past the absolute bound but
        // within relative rounding noise.
        let df = single_period(&[
            ("Total Assets", 1_000_000.0),
            ("Total Liabilities and Stockholders' Equity", 1_000_005.0),
        ]);
        let result = validate(&df);

        assert!(result.is_valid);
        assert_eq!(result.issues[0].code, codes::ROUNDING_ADJUSTMENT);
    }

    #[test]
    fn test_incomplete_data_is_warning_not_failure() {
        let df = single_period(&[("Total Assets", 1_000_000.0)]);
        let result = validate(&df);

        assert!(result.is_valid);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].severity, Severity::Warning);
        assert_eq!(result.issues[0].code, codes::INCOMPLETE_DATA);
        assert!(result.checks_performed.is_empty());
    }

    #[test]
    fn test_reconstruction_with_parent_equity_and_nci() {
        let df = single_period(&[
            ("Total Assets", 1_000.0),
            ("Total Liabilities", 400.0),
            ("Total Stockholders' Equity", 550.0),
            ("Noncontrolling Interest", 50.0),
        ]);
        let result = validate(&df);

        assert!(result.is_valid);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_comprehensive_equity_does_not_double_count_nci() {
        // Total equity already includes the noncontrolling interest; adding
        // NCI again would produce a spurious imbalance.
        let df = single_period(&[
            ("Total Assets", 1_000.0),
            ("Total Liabilities", 400.0),
            ("Total Equity", 600.0),
            ("Noncontrolling Interest", 50.0),
        ]);
        let result = validate(&df);

        assert!(result.is_valid);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_explicit_combined_total_preferred_over_reconstruction() {
        // The reconstructed right-hand side would balance, but the explicit
        // combined total disagrees with assets and must win.
        let df = single_period(&[
            ("Total Assets", 1_000.0),
            ("Total Liabilities", 400.0),
            ("Total Stockholders' Equity", 600.0),
            ("Total Liabilities and Stockholders' Equity", 900.0),
        ]);
        let result = validate(&df);

        assert!(!result.is_valid);
        assert_eq!(result.issues[0].code, codes::EQUATION_IMBALANCE);
    }

    #[test]
    fn test_per_period_checks() {
        let df = frame(
            &[
                ("Total Assets", &[Some(1_000.0), Some(900.0)]),
                (
                    "Total Liabilities and Equity",
                    &[Some(1_000.0), Some(700.0)],
                ),
            ],
            &["FY 2024", "FY 2023"],
        );
        let result = validate(&df);

        assert!(!result.is_valid);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].details["period"], "FY 2023");
    }

    #[test]
    fn test_sections_level_rollup_mismatch_is_warning() {
        let df = single_period(&[
            ("Total Assets", 1_000.0),
            ("Total Current Assets", 300.0),
            ("Total Non-Current Assets", 600.0),
            ("Total Liabilities", 400.0),
            ("Total Stockholders' Equity", 600.0),
        ]);
        let result = validate_balance_sheet_frame(
            &df,
            ValidationLevel::Sections,
            &ToleranceConfig::default(),
        );

        // The equation holds, the rollup does not; validity is unaffected.
        assert!(result.is_valid);
        let warning = result.issues_at(Severity::Warning).next().unwrap();
        assert_eq!(warning.code, codes::SECTION_MISMATCH);
        assert_eq!(warning.details["section"], "assets");
        assert_relative_eq!(warning.details["difference"].as_f64().unwrap(), 100.0);
        assert!(
            result
                .checks_performed
                .iter()
                .any(|c| c == "section_rollups")
        );
    }

    #[test]
    fn test_sections_skipped_at_fundamental_level() {
        let df = single_period(&[
            ("Total Assets", 1_000.0),
            ("Total Current Assets", 300.0),
            ("Total Non-Current Assets", 600.0),
            ("Total Liabilities and Equity", 1_000.0),
        ]);
        let result = validate(&df);

        assert!(result.issues_at(Severity::Warning).next().is_none());
    }

    #[test]
    fn test_missing_label_column_is_single_error_result() {
        let df = DataFrame::new(vec![
            Series::new("name".into(), vec!["Total Assets"]).into(),
            Series::new("FY 2024".into(), vec![Some(1.0_f64)]).into(),
        ])
        .unwrap();
        let result = validate(&df);

        assert!(!result.is_valid);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].code, codes::CONVERSION_ERROR);
    }

    #[test]
    fn test_label_matching_is_case_insensitive() {
        let df = single_period(&[
            ("TOTAL ASSETS", 1_000.0),
            ("Total liabilities and equity", 1_000.0),
        ]);
        let result = validate(&df);

        assert!(result.is_valid);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_all_null_synonym_falls_through() {
        // "Total Assets" row exists but is empty; the bare "Assets" row
        // carries the value.
        let df = frame(
            &[
                ("Total Assets", &[None]),
                ("Assets", &[Some(1_000.0)]),
                ("Total Liabilities and Equity", &[Some(1_000.0)]),
            ],
            &["FY 2024"],
        );
        let result = validate(&df);

        assert!(result.is_valid);
        assert!(result.issues.is_empty());
    }
}
