//! Statement stitching: merging per-filing snapshots into one multi-period
//! statement.
//!
//! Merge identity is the underlying taxonomy concept, never the display
//! label: labels drift across filings while concepts stay put. Rows are
//! keyed by concept id with an overwritable display label, and because
//! snapshots are processed most-recent first, each row ends up wearing the
//! newest filing's wording over the full historical series.

use crate::classify::ConceptClassifier;
use quilt_core::{
    ConceptStandardizer, LineItem, PeriodDescriptor, PeriodKey, StatementSnapshot, StitchedLineItem,
    StitchedPeriod, StitchedStatement,
};
use std::collections::HashMap;
use tracing::debug;

/// Coarse period-subset policies, the alternate selection strategy when no
/// optimal-period descriptors are supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodPolicy {
    /// The most recent periods, up to the cap.
    RecentPeriods,
    /// Up to three roughly-annual periods.
    ThreeYearComparison,
    /// Up to three roughly-quarterly periods.
    ThreeQuarters,
    /// All roughly-annual periods, up to the cap.
    AnnualComparison,
    /// Every referenced period, up to the cap.
    AllPeriods,
}

/// Where the stitcher's display periods come from.
#[derive(Debug, Clone, Copy)]
pub enum PeriodSelection<'a> {
    /// A coarse policy over the periods the snapshots themselves reference.
    Policy(PeriodPolicy),
    /// The period selector's output, the preferred source.
    Optimal(&'a [PeriodDescriptor]),
}

/// Stitching parameters.
#[derive(Debug, Clone)]
pub struct StitchConfig {
    /// Upper bound on displayed periods.
    pub max_periods: usize,
    /// Run line items through the injected standardizer before merging.
    pub standardize: bool,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            max_periods: 8,
            standardize: false,
        }
    }
}

/// Annual durations land near 365 days; quarterly near 91.
const ANNUAL_DAYS_RANGE: std::ops::RangeInclusive<i64> = 330..=400;
const QUARTERLY_DAYS_RANGE: std::ops::RangeInclusive<i64> = 80..=100;

/// Merges statement snapshots into one concept-keyed, period-indexed
/// statement.
///
/// # Examples
///
/// ```
/// use quilt::{PeriodPolicy, PeriodSelection, StatementStitcher, StitchConfig};
///
/// let stitcher = StatementStitcher::new();
/// let stitched = stitcher.stitch(
///     &[],
///     &PeriodSelection::Policy(PeriodPolicy::RecentPeriods),
///     &StitchConfig::default(),
/// );
/// assert!(stitched.periods.is_empty());
/// assert!(stitched.statement_data.is_empty());
/// ```
#[derive(Default)]
pub struct StatementStitcher {
    classifier: ConceptClassifier,
    standardizer: Option<Box<dyn ConceptStandardizer>>,
}

impl std::fmt::Debug for StatementStitcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatementStitcher")
            .field("classifier", &self.classifier)
            .field("has_standardizer", &self.standardizer.is_some())
            .finish()
    }
}

/// Working state of one merged row during stitching.
struct MergedRow {
    concept: String,
    label: String,
    level: u32,
    is_abstract: bool,
    is_total: bool,
    values: HashMap<PeriodKey, f64>,
    decimals: HashMap<PeriodKey, i32>,
}

impl StatementStitcher {
    /// Create a stitcher with the default classifier and no standardizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a customized concept classifier.
    #[must_use]
    pub fn with_classifier(mut self, classifier: ConceptClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Inject a concept standardization service, applied when
    /// [`StitchConfig::standardize`] is set.
    #[must_use]
    pub fn with_standardizer(mut self, standardizer: Box<dyn ConceptStandardizer>) -> Self {
        self.standardizer = Some(standardizer);
        self
    }

    /// Merge `statements` (ordered most-recent first) into one stitched
    /// statement restricted to the selected periods.
    ///
    /// Never fails: malformed period ids are skipped item-by-item, and zero
    /// period overlap across all statements yields an empty but valid
    /// result.
    pub fn stitch(
        &self,
        statements: &[StatementSnapshot],
        selection: &PeriodSelection<'_>,
        config: &StitchConfig,
    ) -> StitchedStatement {
        let available = collect_available_periods(statements);
        let selected = select_periods(&available, selection, config.max_periods);
        if selected.is_empty() {
            debug!("no periods selected; returning empty statement");
            return StitchedStatement::default();
        }

        let mut rows: HashMap<String, MergedRow> = HashMap::new();
        let mut row_order: Vec<String> = Vec::new();

        for (index, statement) in statements.iter().enumerate() {
            // Restrict to the intersection of this statement's own periods
            // with the selected set, keyed by the statement's raw ids.
            let period_map = statement_period_map(statement, &selected);
            if period_map.is_empty() {
                debug!(index, "statement shares no periods with selection; skipped");
                continue;
            }

            let standardized;
            let items: &[LineItem] = match (&self.standardizer, config.standardize) {
                (Some(standardizer), true) => {
                    standardized = standardizer
                        .standardize_statement_data(&statement.data, statement.statement_type);
                    &standardized
                }
                _ => &statement.data,
            };

            for (position, item) in items.iter().enumerate() {
                if is_dimensional(item) {
                    continue;
                }

                let has_children = items
                    .get(position + 1)
                    .is_some_and(|next| next.level > item.level);
                let is_abstract = self.classifier.is_abstract(
                    &item.concept,
                    item.is_abstract,
                    has_children,
                    item.has_values(),
                );
                if is_abstract && !has_children {
                    continue;
                }

                let merge_key = if item.concept.is_empty() {
                    // Untagged rows have nothing better than their label.
                    item.label.clone()
                } else {
                    item.concept.clone()
                };

                let row = rows.entry(merge_key.clone()).or_insert_with(|| {
                    row_order.push(merge_key.clone());
                    MergedRow {
                        concept: item.concept.clone(),
                        label: item.label.clone(),
                        level: item.level,
                        is_abstract,
                        is_total: is_total_label(&item.label),
                        values: HashMap::new(),
                        decimals: HashMap::new(),
                    }
                });

                for (raw_id, &value) in &item.values {
                    if let Some(key) = period_map.get(raw_id) {
                        // First write wins: the most recent filing's value
                        // is already in place, and a present value is never
                        // displaced by a missing one.
                        row.values.entry(*key).or_insert(value);
                        if let Some(&decimals) = item.decimals.get(raw_id) {
                            row.decimals.entry(*key).or_insert(decimals);
                        }
                    }
                }
            }
        }

        build_statement(rows, row_order, &selected)
    }
}

/// Stitch statements with a default stitcher.
pub fn stitch_statements(
    statements: &[StatementSnapshot],
    selection: &PeriodSelection<'_>,
    config: &StitchConfig,
) -> StitchedStatement {
    StatementStitcher::new().stitch(statements, selection, config)
}

/// All periods referenced across the snapshots, keyed by canonical identity.
/// On duplicate identities the candidate from the more recent filing (lower
/// index) supplies the display label.
fn collect_available_periods(
    statements: &[StatementSnapshot],
) -> HashMap<PeriodKey, (usize, String)> {
    let mut available: HashMap<PeriodKey, (usize, String)> = HashMap::new();
    for (index, statement) in statements.iter().enumerate() {
        for (raw_id, info) in &statement.periods {
            let Some(key) = PeriodKey::parse(raw_id).or_else(|| info.key()) else {
                debug!(%raw_id, "skipping malformed period id");
                continue;
            };
            let label = if info.label.is_empty() {
                key.encode()
            } else {
                info.label.clone()
            };
            available
                .entry(key)
                .and_modify(|entry| {
                    if index < entry.0 {
                        *entry = (index, label.clone());
                    }
                })
                .or_insert((index, label));
        }
    }
    available
}

/// Apply the period selection, returning `(key, label)` pairs most recent
/// first, capped at `max_periods`.
fn select_periods(
    available: &HashMap<PeriodKey, (usize, String)>,
    selection: &PeriodSelection<'_>,
    max_periods: usize,
) -> Vec<(PeriodKey, String)> {
    let mut periods: Vec<(PeriodKey, String)> = match selection {
        PeriodSelection::Optimal(descriptors) => descriptors
            .iter()
            .filter(|d| available.contains_key(&d.key))
            .map(|d| (d.key, d.label.clone()))
            .collect(),
        PeriodSelection::Policy(policy) => {
            let mut all: Vec<(PeriodKey, String)> = available
                .iter()
                .filter(|(key, _)| policy_accepts(*policy, key))
                .map(|(key, (_, label))| (*key, label.clone()))
                .collect();
            all.sort_by(|a, b| b.0.date().cmp(&a.0.date()).then_with(|| a.0.cmp(&b.0)));
            all
        }
    };

    let cap = match selection {
        PeriodSelection::Policy(PeriodPolicy::ThreeYearComparison | PeriodPolicy::ThreeQuarters) => {
            max_periods.min(3)
        }
        _ => max_periods,
    };
    periods.truncate(cap);
    periods
}

/// Whether a period passes the policy's shape filter. Instants always pass:
/// balance sheets only carry instants, and the annual/quarterly distinction
/// for them is handled by period spacing upstream.
fn policy_accepts(policy: PeriodPolicy, key: &PeriodKey) -> bool {
    let Some(days) = key.duration_days() else {
        return true;
    };
    match policy {
        PeriodPolicy::RecentPeriods | PeriodPolicy::AllPeriods => true,
        PeriodPolicy::ThreeYearComparison | PeriodPolicy::AnnualComparison => {
            ANNUAL_DAYS_RANGE.contains(&days)
        }
        PeriodPolicy::ThreeQuarters => QUARTERLY_DAYS_RANGE.contains(&days),
    }
}

/// Map a statement's raw period ids to the canonical keys that made the
/// selection.
fn statement_period_map(
    statement: &StatementSnapshot,
    selected: &[(PeriodKey, String)],
) -> HashMap<String, PeriodKey> {
    statement
        .periods
        .iter()
        .filter_map(|(raw_id, info)| {
            let key = PeriodKey::parse(raw_id).or_else(|| info.key())?;
            selected
                .iter()
                .any(|(selected_key, _)| *selected_key == key)
                .then(|| (raw_id.clone(), key))
        })
        .collect()
}

/// The weak but preserved total heuristic: the label mentions "total".
fn is_total_label(label: &str) -> bool {
    label.to_lowercase().contains("total")
}

/// Dimensional structural elements never become stitched rows.
fn is_dimensional(item: &LineItem) -> bool {
    if item.is_dimension {
        return true;
    }
    ["Axis", "Domain", "Member", "Table", "LineItems"]
        .iter()
        .any(|suffix| item.concept.ends_with(suffix))
}

/// Assemble the final statement: rows ordered by `(level, label)`, emitted
/// when they carry a value in some selected period or provide structure.
fn build_statement(
    mut rows: HashMap<String, MergedRow>,
    row_order: Vec<String>,
    selected: &[(PeriodKey, String)],
) -> StitchedStatement {
    let mut ordered: Vec<MergedRow> = row_order
        .into_iter()
        .filter_map(|key| rows.remove(&key))
        .collect();
    ordered.sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.label.cmp(&b.label)));

    let statement_data: Vec<StitchedLineItem> = ordered
        .into_iter()
        .filter_map(|row| {
            let has_values = !row.values.is_empty();
            if !has_values && !row.is_abstract {
                return None;
            }
            Some(StitchedLineItem {
                concept: row.concept,
                label: row.label,
                level: row.level,
                is_abstract: row.is_abstract,
                is_total: row.is_total,
                values: row
                    .values
                    .iter()
                    .map(|(key, value)| (key.encode(), *value))
                    .collect(),
                decimals: row
                    .decimals
                    .iter()
                    .map(|(key, decimals)| (key.encode(), *decimals))
                    .collect(),
                has_values,
            })
        })
        .collect();

    StitchedStatement {
        periods: selected
            .iter()
            .map(|(key, label)| StitchedPeriod {
                period_id: key.encode(),
                label: label.clone(),
            })
            .collect(),
        statement_data,
    }
}
