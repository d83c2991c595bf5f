//! Statement snapshots and stitched multi-period statements.
//!
//! A [`StatementSnapshot`] is one filing's view of one financial statement,
//! produced upstream by the raw statement extractor. A [`StitchedStatement`]
//! is the merged multi-period view the engine produces from several
//! snapshots.

use crate::error::Result;
use crate::period::{EntityInfo, PeriodInfo, PeriodKind};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The kind of financial statement a snapshot represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementType {
    /// Statement of financial position
    BalanceSheet,
    /// Statement of operations
    IncomeStatement,
    /// Statement of cash flows
    CashFlowStatement,
    /// Statement of stockholders' equity
    StatementOfEquity,
    /// Statement of comprehensive income
    ComprehensiveIncome,
}

impl StatementType {
    /// The period kind this statement reports over: balance sheets are
    /// point-in-time, everything else covers a date range.
    pub const fn period_kind(&self) -> PeriodKind {
        match self {
            Self::BalanceSheet => PeriodKind::Instant,
            _ => PeriodKind::Duration,
        }
    }

    /// Returns true for point-in-time statements.
    pub const fn is_instant(&self) -> bool {
        matches!(self.period_kind(), PeriodKind::Instant)
    }
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BalanceSheet => write!(f, "BalanceSheet"),
            Self::IncomeStatement => write!(f, "IncomeStatement"),
            Self::CashFlowStatement => write!(f, "CashFlowStatement"),
            Self::StatementOfEquity => write!(f, "StatementOfEquity"),
            Self::ComprehensiveIncome => write!(f, "ComprehensiveIncome"),
        }
    }
}

/// One presentation line of a statement snapshot.
///
/// Values and decimals are keyed by the snapshot's raw period id strings.
/// A missing key means the fact was not reported for that period; the maps
/// never store explicit nulls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Taxonomy concept id (e.g. `us-gaap_Assets`)
    pub concept: String,
    /// Display label as presented in the filing
    pub label: String,
    /// Presentation depth in the statement
    pub level: u32,
    /// Abstract flag from the schema, frequently absent and defaulted false
    pub is_abstract: bool,
    /// True when this line is a dimensional breakdown row
    pub is_dimension: bool,
    /// Reported values keyed by period id
    pub values: HashMap<String, f64>,
    /// Reported decimals precision keyed by period id
    pub decimals: HashMap<String, i32>,
    /// Axis/member metadata for dimensional rows
    pub dimension_metadata: Option<HashMap<String, String>>,
}

impl LineItem {
    /// Create a data line item with no values.
    pub fn new(concept: impl Into<String>, label: impl Into<String>, level: u32) -> Self {
        Self {
            concept: concept.into(),
            label: label.into(),
            level,
            ..Self::default()
        }
    }

    /// Add a reported value for a period. Builder-style, mainly for tests
    /// and upstream extractors.
    #[must_use]
    pub fn with_value(mut self, period_id: impl Into<String>, value: f64) -> Self {
        self.values.insert(period_id.into(), value);
        self
    }

    /// Add a decimals precision for a period.
    #[must_use]
    pub fn with_decimals(mut self, period_id: impl Into<String>, decimals: i32) -> Self {
        self.decimals.insert(period_id.into(), decimals);
        self
    }

    /// Mark this item abstract.
    #[must_use]
    pub fn abstract_item(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Returns true when the item reports at least one value.
    pub fn has_values(&self) -> bool {
        !self.values.is_empty()
    }
}

/// One filing's extracted view of a single financial statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementSnapshot {
    /// XBRL presentation role URI
    pub role: String,
    /// Human-readable role definition
    pub definition: String,
    /// Statement kind
    pub statement_type: Option<StatementType>,
    /// Periods referenced by this snapshot, keyed by raw period id
    pub periods: HashMap<String, PeriodInfo>,
    /// Ordered presentation line items
    pub data: Vec<LineItem>,
}

impl StatementSnapshot {
    /// Create an empty snapshot for a statement type.
    pub fn new(statement_type: StatementType) -> Self {
        Self {
            statement_type: Some(statement_type),
            ..Self::default()
        }
    }
}

/// A filing's statement snapshots plus entity metadata, ordered inputs to
/// period selection. Filing lists are expected most-recent first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filing {
    /// Entity metadata for the filing
    pub entity: EntityInfo,
    /// Statements extracted from the filing
    pub statements: Vec<StatementSnapshot>,
}

impl Filing {
    /// Find this filing's snapshot of the given statement type.
    pub fn statement(&self, statement_type: StatementType) -> Option<&StatementSnapshot> {
        self.statements
            .iter()
            .find(|s| s.statement_type == Some(statement_type))
    }
}

/// External concept standardization service seam.
///
/// Implementations map filing-specific labels onto canonical ones (the
/// mapping table itself is out of scope here). When injected, the stitcher
/// runs every snapshot's line items through it before merging.
pub trait ConceptStandardizer {
    /// Return the line items with standardized labels applied.
    fn standardize_statement_data(
        &self,
        items: &[LineItem],
        statement_type: Option<StatementType>,
    ) -> Vec<LineItem>;
}

/// A display period of a stitched statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StitchedPeriod {
    /// Canonical period id
    pub period_id: String,
    /// Display label
    pub label: String,
}

/// One merged row of a stitched statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StitchedLineItem {
    /// Taxonomy concept id the row is keyed by
    pub concept: String,
    /// Display label, taken from the most recent filing that reported the concept
    pub label: String,
    /// Presentation depth
    pub level: u32,
    /// True for structural header rows
    pub is_abstract: bool,
    /// True when the label reads as a total line
    pub is_total: bool,
    /// Merged values keyed by canonical period id
    pub values: HashMap<String, f64>,
    /// Merged decimals keyed by canonical period id
    pub decimals: HashMap<String, i32>,
    /// True when at least one selected period has a value
    pub has_values: bool,
}

/// A merged, period-indexed multi-period statement.
///
/// Periods are ordered most recent first; rows are ordered by presentation
/// level then label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StitchedStatement {
    /// Display periods, most recent first
    pub periods: Vec<StitchedPeriod>,
    /// Merged rows
    pub statement_data: Vec<StitchedLineItem>,
}

impl StitchedStatement {
    /// Canonical period ids in display order.
    pub fn period_ids(&self) -> Vec<&str> {
        self.periods.iter().map(|p| p.period_id.as_str()).collect()
    }

    /// Find a row by concept id.
    pub fn item(&self, concept: &str) -> Option<&StitchedLineItem> {
        self.statement_data.iter().find(|i| i.concept == concept)
    }

    /// Convert to a label-indexed DataFrame with one numeric column per
    /// period, the table shape the validator and downstream renderers
    /// consume.
    ///
    /// Column names use the period display labels, falling back to the
    /// period id when a label is empty or duplicated.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let labels: Vec<&str> = self
            .statement_data
            .iter()
            .map(|item| item.label.as_str())
            .collect();

        let mut columns: Vec<Column> = vec![Series::new("label".into(), labels).into()];

        let mut used_names: Vec<String> = vec!["label".to_string()];
        for period in &self.periods {
            let mut name = if period.label.is_empty() {
                period.period_id.clone()
            } else {
                period.label.clone()
            };
            if used_names.contains(&name) {
                name = period.period_id.clone();
            }
            used_names.push(name.clone());

            let values: Vec<Option<f64>> = self
                .statement_data
                .iter()
                .map(|item| item.values.get(&period.period_id).copied())
                .collect();
            columns.push(Series::new(name.into(), values).into());
        }

        Ok(DataFrame::new(columns)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_type_period_kind() {
        assert!(StatementType::BalanceSheet.is_instant());
        assert_eq!(
            StatementType::IncomeStatement.period_kind(),
            PeriodKind::Duration
        );
        assert_eq!(
            StatementType::CashFlowStatement.period_kind(),
            PeriodKind::Duration
        );
    }

    #[test]
    fn test_line_item_builder() {
        let item = LineItem::new("us-gaap_Assets", "Total Assets", 1)
            .with_value("instant_2024-12-31", 1_000_000.0)
            .with_decimals("instant_2024-12-31", -3);

        assert!(item.has_values());
        assert_eq!(item.values["instant_2024-12-31"], 1_000_000.0);
        assert_eq!(item.decimals["instant_2024-12-31"], -3);
        assert!(!item.is_abstract);
    }

    #[test]
    fn test_filing_statement_lookup() {
        let filing = Filing {
            entity: EntityInfo::default(),
            statements: vec![
                StatementSnapshot::new(StatementType::BalanceSheet),
                StatementSnapshot::new(StatementType::IncomeStatement),
            ],
        };

        assert!(filing.statement(StatementType::BalanceSheet).is_some());
        assert!(filing.statement(StatementType::CashFlowStatement).is_none());
    }

    #[test]
    fn test_to_frame_shape() {
        let statement = StitchedStatement {
            periods: vec![
                StitchedPeriod {
                    period_id: "instant_2024-12-31".to_string(),
                    label: "FY 2024".to_string(),
                },
                StitchedPeriod {
                    period_id: "instant_2023-12-31".to_string(),
                    label: "FY 2023".to_string(),
                },
            ],
            statement_data: vec![
                StitchedLineItem {
                    concept: "us-gaap_Assets".to_string(),
                    label: "Total Assets".to_string(),
                    level: 1,
                    values: HashMap::from([
                        ("instant_2024-12-31".to_string(), 100.0),
                        ("instant_2023-12-31".to_string(), 90.0),
                    ]),
                    has_values: true,
                    ..Default::default()
                },
                StitchedLineItem {
                    concept: "us-gaap_Liabilities".to_string(),
                    label: "Total Liabilities".to_string(),
                    level: 1,
                    values: HashMap::from([("instant_2024-12-31".to_string(), 40.0)]),
                    has_values: true,
                    ..Default::default()
                },
            ],
        };

        let df = statement.to_frame().unwrap();
        assert_eq!(df.shape(), (2, 3));
        assert_eq!(df.get_column_names()[0].as_str(), "label");

        let fy2024 = df.column("FY 2024").unwrap().f64().unwrap();
        assert_eq!(fy2024.get(0), Some(100.0));
        assert_eq!(fy2024.get(1), Some(40.0));

        // Missing value shows up as null, not zero
        let fy2023 = df.column("FY 2023").unwrap().f64().unwrap();
        assert_eq!(fy2023.get(1), None);
    }

    #[test]
    fn test_to_frame_empty_statement() {
        let statement = StitchedStatement::default();
        let df = statement.to_frame().unwrap();
        assert_eq!(df.shape(), (0, 1));
    }

    #[test]
    fn test_to_frame_duplicate_period_labels() {
        let statement = StitchedStatement {
            periods: vec![
                StitchedPeriod {
                    period_id: "instant_2024-12-31".to_string(),
                    label: "Q4".to_string(),
                },
                StitchedPeriod {
                    period_id: "instant_2023-12-31".to_string(),
                    label: "Q4".to_string(),
                },
            ],
            statement_data: vec![],
        };

        let df = statement.to_frame().unwrap();
        let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["label", "Q4", "instant_2023-12-31"]);
    }
}
