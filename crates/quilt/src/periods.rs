//! Optimal reporting period selection across filings.
//!
//! Given filings ordered most-recent first, pick the period set that best
//! represents a coherent multi-period statement: one instant per filing for
//! balance sheets, one or two durations per filing for flow statements, then
//! a cross-filing dedup pass that drops near-duplicate periods.
//!
//! Selection never fails: a filing with no periods, an unparsable date, or a
//! missing statement simply contributes zero candidates.

use chrono::{Datelike, NaiveDate};
use quilt_core::{
    EntityInfo, Filing, FiscalPeriod, PeriodDescriptor, PeriodKey, PeriodKind, StatementType,
};
use tracing::debug;

/// Thresholds steering period selection.
///
/// The day windows are inherited from long-standing filing-alignment
/// behavior; they are exposed as configuration rather than re-derived.
#[derive(Debug, Clone)]
pub struct SelectionConfig {
    /// A period end within this many days of the document period end date
    /// counts as an exact match.
    pub exact_match_days: i64,
    /// Widened window for acceptable matches when nothing lands in the
    /// exact window.
    pub acceptable_days: i64,
    /// Two same-kind periods closer than this are considered duplicates
    /// during cross-filing dedup.
    pub dedup_window_days: i64,
    /// Upper bound on the number of retained periods.
    pub max_periods: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            exact_match_days: 3,
            acceptable_days: 14,
            dedup_window_days: 14,
            max_periods: 8,
        }
    }
}

/// Choose the optimal display periods for `statement_type` across filings.
///
/// Filings must be ordered most-recent first; the returned descriptors carry
/// the index of their source filing. The result is ordered by period date
/// descending, deduplicated, and capped at
/// [`SelectionConfig::max_periods`]. Identical inputs always produce an
/// identical ordered output.
pub fn determine_optimal_periods(
    filings: &[Filing],
    statement_type: StatementType,
    config: &SelectionConfig,
) -> Vec<PeriodDescriptor> {
    let mut candidates = Vec::new();

    for (filing_index, filing) in filings.iter().enumerate() {
        let Some(snapshot) = filing.statement(statement_type) else {
            debug!(filing_index, %statement_type, "filing has no snapshot for statement type");
            continue;
        };

        let periods = parse_snapshot_periods(snapshot);
        if periods.is_empty() {
            debug!(filing_index, "filing snapshot has no parsable periods");
            continue;
        }

        match statement_type.period_kind() {
            PeriodKind::Instant => {
                if let Some(descriptor) =
                    select_instant_period(&periods, &filing.entity, filing_index, config)
                {
                    candidates.push(descriptor);
                }
            }
            PeriodKind::Duration => {
                candidates.extend(select_duration_periods(
                    &periods,
                    &filing.entity,
                    filing_index,
                    config,
                ));
            }
        }
    }

    dedup_candidates(candidates, config)
}

/// Parse a snapshot's period map into canonical keys, skipping malformed
/// entries. Sorted for deterministic downstream selection regardless of map
/// iteration order.
fn parse_snapshot_periods(snapshot: &quilt_core::StatementSnapshot) -> Vec<(PeriodKey, String)> {
    let mut periods: Vec<(PeriodKey, String)> = snapshot
        .periods
        .iter()
        .filter_map(|(id, info)| {
            let key = PeriodKey::parse(id).or_else(|| info.key())?;
            Some((key, info.label.clone()))
        })
        .collect();

    periods.sort_by(|a, b| b.0.date().cmp(&a.0.date()).then_with(|| a.0.cmp(&b.0)));
    periods.dedup_by(|a, b| a.0 == b.0);
    periods
}

/// Pick the single instant period that best matches the filing's document
/// period end date.
fn select_instant_period(
    periods: &[(PeriodKey, String)],
    entity: &EntityInfo,
    filing_index: usize,
    config: &SelectionConfig,
) -> Option<PeriodDescriptor> {
    // Most recent first, inherited from parse_snapshot_periods.
    let instants: Vec<(NaiveDate, &str)> = periods
        .iter()
        .filter_map(|(key, label)| match key {
            PeriodKey::Instant(date) => Some((*date, label.as_str())),
            PeriodKey::Duration { .. } => None,
        })
        .collect();

    let picked = match entity.document_period_end_date {
        Some(doc_end) => closest_within(&instants, doc_end, config.exact_match_days)
            .or_else(|| closest_within(&instants, doc_end, config.acceptable_days)),
        None => instants.first().copied(),
    };

    picked.map(|(date, label)| {
        make_descriptor(PeriodKey::Instant(date), label, entity, filing_index)
    })
}

/// Closest instant to `target` within `window` days, preferring the more
/// recent date on ties.
fn closest_within<'a>(
    instants: &'a [(NaiveDate, &'a str)],
    target: NaiveDate,
    window: i64,
) -> Option<(NaiveDate, &'a str)> {
    instants
        .iter()
        .filter(|(date, _)| distance_days(*date, target) <= window)
        .min_by_key(|(date, _)| distance_days(*date, target))
        .copied()
}

/// Pick the duration periods matching the filing's fiscal intent: one
/// roughly-annual period for FY filings, a quarter plus (for Q2-Q4) a
/// year-to-date counterpart for quarterly filings.
fn select_duration_periods(
    periods: &[(PeriodKey, String)],
    entity: &EntityInfo,
    filing_index: usize,
    config: &SelectionConfig,
) -> Vec<PeriodDescriptor> {
    let durations: Vec<(PeriodKey, &str, i64)> = periods
        .iter()
        .filter_map(|(key, label)| {
            let days = key.duration_days()?;
            // End before start means a malformed candidate.
            (days > 0).then_some((*key, label.as_str(), days))
        })
        .collect();

    if durations.is_empty() {
        return Vec::new();
    }

    let targets: Vec<i64> = match entity.fiscal_period {
        Some(fp) if !fp.is_annual() => {
            let mut t = vec![fp.target_days()];
            t.extend(fp.ytd_target_days());
            t
        }
        _ => vec![FiscalPeriod::Fy.target_days()],
    };

    // Tiered restriction on end-date proximity to the document period end:
    // exact window, then the widened window, then all candidates.
    let subset: Vec<&(PeriodKey, &str, i64)> = match entity.document_period_end_date {
        Some(doc_end) => {
            let tier = |window: i64| -> Vec<&(PeriodKey, &str, i64)> {
                durations
                    .iter()
                    .filter(|(key, _, _)| distance_days(key.date(), doc_end) <= window)
                    .collect()
            };
            let exact = tier(config.exact_match_days);
            if exact.is_empty() {
                let acceptable = tier(config.acceptable_days);
                if acceptable.is_empty() {
                    durations.iter().collect()
                } else {
                    acceptable
                }
            } else {
                exact
            }
        }
        None => durations.iter().collect(),
    };

    let mut selected: Vec<PeriodDescriptor> = Vec::new();
    for target in targets {
        let best = subset
            .iter()
            .min_by_key(|(_, _, days)| (days - target).abs());
        if let Some((key, label, _)) = best {
            if selected.iter().all(|d| d.key != *key) {
                selected.push(make_descriptor(*key, label, entity, filing_index));
            }
        }
    }
    selected
}

/// Pool candidates from all filings, keep the most recent representative of
/// each near-duplicate group, and cap the result.
fn dedup_candidates(
    mut candidates: Vec<PeriodDescriptor>,
    config: &SelectionConfig,
) -> Vec<PeriodDescriptor> {
    candidates.sort_by(|a, b| {
        b.date()
            .cmp(&a.date())
            .then_with(|| a.filing_index.cmp(&b.filing_index))
            .then_with(|| a.key.cmp(&b.key))
    });

    let mut retained: Vec<PeriodDescriptor> = Vec::new();
    for candidate in candidates {
        let duplicate = retained.iter().any(|kept| is_duplicate(kept, &candidate, config));
        if duplicate {
            debug!(period = %candidate.key, "dropping near-duplicate period");
        } else {
            retained.push(candidate);
        }
    }

    retained.truncate(config.max_periods);
    retained
}

/// Two periods are duplicates when they have the same kind and land within
/// the dedup window of each other. Durations must additionally have similar
/// lengths, so a quarter and its year-to-date counterpart ending on the same
/// date both survive.
fn is_duplicate(a: &PeriodDescriptor, b: &PeriodDescriptor, config: &SelectionConfig) -> bool {
    if a.kind() != b.kind() {
        return false;
    }
    if distance_days(a.date(), b.date()) >= config.dedup_window_days {
        return false;
    }
    match (a.key.duration_days(), b.key.duration_days()) {
        (Some(len_a), Some(len_b)) => (len_a - len_b).abs() < config.dedup_window_days,
        _ => true,
    }
}

fn distance_days(a: NaiveDate, b: NaiveDate) -> i64 {
    a.signed_duration_since(b).num_days().abs()
}

fn make_descriptor(
    key: PeriodKey,
    label: &str,
    entity: &EntityInfo,
    filing_index: usize,
) -> PeriodDescriptor {
    let label = if label.is_empty() {
        generate_label(&key, entity)
    } else {
        label.to_string()
    };
    PeriodDescriptor {
        key,
        label,
        filing_index,
        fiscal_period: entity.fiscal_period,
        fiscal_year: entity.fiscal_year,
    }
}

/// Fallback display label from fiscal metadata when the filing's own period
/// label is empty.
fn generate_label(key: &PeriodKey, entity: &EntityInfo) -> String {
    let year = entity.fiscal_year.unwrap_or_else(|| key.date().year());
    match entity.fiscal_period {
        Some(fp) if !fp.is_annual() => {
            // A duration well past one quarter in a quarterly filing is the
            // year-to-date period.
            let is_ytd = key.duration_days().is_some_and(|days| days > 120);
            if is_ytd {
                format!("{fp} YTD {year}")
            } else {
                format!("{fp} {year}")
            }
        }
        _ => format!("FY {year}"),
    }
}
