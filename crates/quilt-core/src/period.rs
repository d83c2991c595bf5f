//! Reporting period model for SEC filings.
//!
//! XBRL facts are reported either for an instant (balance sheet items) or a
//! duration (income and cash flow items). Filings identify periods with
//! opaque string ids; this module gives them a canonical identity based on
//! the period kind and its dates, so equivalent periods from different
//! filings collapse to the same key.

use crate::error::QuiltError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether a reporting period is a point in time or a date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PeriodKind {
    /// Point-in-time period (balance sheet facts)
    Instant,
    /// Start/end date period (income and cash flow facts)
    Duration,
}

impl fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instant => write!(f, "instant"),
            Self::Duration => write!(f, "duration"),
        }
    }
}

/// Fiscal period designator carried by a filing's entity information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FiscalPeriod {
    /// First fiscal quarter
    Q1,
    /// Second fiscal quarter
    Q2,
    /// Third fiscal quarter
    Q3,
    /// Fourth fiscal quarter
    Q4,
    /// Full fiscal year
    Fy,
}

impl FiscalPeriod {
    /// Parse a fiscal period designator such as `"Q3"` or `"FY"`.
    ///
    /// Returns `None` for anything unrecognized.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "Q1" => Some(Self::Q1),
            "Q2" => Some(Self::Q2),
            "Q3" => Some(Self::Q3),
            "Q4" => Some(Self::Q4),
            "FY" => Some(Self::Fy),
            _ => None,
        }
    }

    /// Returns true for the full-year designator.
    pub const fn is_annual(&self) -> bool {
        matches!(self, Self::Fy)
    }

    /// Quarter number (1-4), or `None` for the full year.
    pub const fn quarter(&self) -> Option<u32> {
        match self {
            Self::Q1 => Some(1),
            Self::Q2 => Some(2),
            Self::Q3 => Some(3),
            Self::Q4 => Some(4),
            Self::Fy => None,
        }
    }

    /// Target duration length in days for this fiscal period's primary
    /// reporting period: roughly one year for FY, one quarter otherwise.
    pub const fn target_days(&self) -> i64 {
        match self {
            Self::Fy => 365,
            _ => 90,
        }
    }

    /// Target length of the year-to-date counterpart period, where one
    /// exists. Q1 has no year-to-date period distinct from the quarter.
    pub const fn ytd_target_days(&self) -> Option<i64> {
        match self {
            Self::Q2 => Some(180),
            Self::Q3 => Some(270),
            Self::Q4 => Some(365),
            Self::Q1 | Self::Fy => None,
        }
    }
}

impl fmt::Display for FiscalPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Q1 => write!(f, "Q1"),
            Self::Q2 => write!(f, "Q2"),
            Self::Q3 => write!(f, "Q3"),
            Self::Q4 => write!(f, "Q4"),
            Self::Fy => write!(f, "FY"),
        }
    }
}

/// Canonical identity of a reporting period.
///
/// Two periods from different filings are the same period exactly when their
/// keys are equal, regardless of how each filing spelled its period id.
///
/// The string encoding is `instant_YYYY-MM-DD` or
/// `duration_YYYY-MM-DD_YYYY-MM-DD`.
///
/// # Examples
///
/// ```
/// use quilt_core::PeriodKey;
/// use chrono::NaiveDate;
///
/// let key = PeriodKey::parse("instant_2024-12-31").unwrap();
/// assert_eq!(key.date(), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
/// assert_eq!(key.encode(), "instant_2024-12-31");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PeriodKey {
    /// Point-in-time period.
    Instant(NaiveDate),
    /// Date-range period.
    Duration {
        /// First day of the period
        start: NaiveDate,
        /// Last day of the period
        end: NaiveDate,
    },
}

const DATE_FMT: &str = "%Y-%m-%d";

impl PeriodKey {
    /// Parse a period id string, returning `None` when it is malformed.
    ///
    /// Malformed ids are expected in the wild and are skipped by callers
    /// rather than treated as fatal.
    pub fn parse(id: &str) -> Option<Self> {
        if let Some(rest) = id.strip_prefix("instant_") {
            let date = NaiveDate::parse_from_str(rest, DATE_FMT).ok()?;
            return Some(Self::Instant(date));
        }
        if let Some(rest) = id.strip_prefix("duration_") {
            let (start_str, end_str) = rest.split_once('_')?;
            let start = NaiveDate::parse_from_str(start_str, DATE_FMT).ok()?;
            let end = NaiveDate::parse_from_str(end_str, DATE_FMT).ok()?;
            return Some(Self::Duration { start, end });
        }
        None
    }

    /// Build a key from optional start and end dates.
    ///
    /// A start and end date make a duration; an end date alone makes an
    /// instant; anything else is `None`.
    pub const fn from_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<Self> {
        match (start, end) {
            (Some(start), Some(end)) => Some(Self::Duration { start, end }),
            (None, Some(end)) => Some(Self::Instant(end)),
            _ => None,
        }
    }

    /// Canonical string encoding of this key.
    pub fn encode(&self) -> String {
        match self {
            Self::Instant(date) => format!("instant_{}", date.format(DATE_FMT)),
            Self::Duration { start, end } => {
                format!("duration_{}_{}", start.format(DATE_FMT), end.format(DATE_FMT))
            }
        }
    }

    /// The period kind.
    pub const fn kind(&self) -> PeriodKind {
        match self {
            Self::Instant(_) => PeriodKind::Instant,
            Self::Duration { .. } => PeriodKind::Duration,
        }
    }

    /// The date used for ordering and proximity comparisons: the instant
    /// date, or the end date of a duration.
    pub const fn date(&self) -> NaiveDate {
        match self {
            Self::Instant(date) => *date,
            Self::Duration { end, .. } => *end,
        }
    }

    /// Length in days for duration periods, `None` for instants.
    pub fn duration_days(&self) -> Option<i64> {
        match self {
            Self::Instant(_) => None,
            Self::Duration { start, end } => Some(end.signed_duration_since(*start).num_days()),
        }
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl FromStr for PeriodKey {
    type Err = QuiltError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| QuiltError::InvalidPeriodId(s.to_string()))
    }
}

/// Period metadata as recorded inside a statement snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodInfo {
    /// Human-readable period label from the filing, possibly empty
    pub label: String,
    /// First day of the period (durations only)
    pub start_date: Option<NaiveDate>,
    /// Last day of the period, or the instant date
    pub end_date: Option<NaiveDate>,
}

impl PeriodInfo {
    /// Derive a canonical key from the recorded dates, when present.
    pub const fn key(&self) -> Option<PeriodKey> {
        PeriodKey::from_dates(self.start_date, self.end_date)
    }
}

/// Per-filing entity metadata relevant to period selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityInfo {
    /// The document's stated period end date
    pub document_period_end_date: Option<NaiveDate>,
    /// Fiscal period designator (Q1-Q4 or FY)
    pub fiscal_period: Option<FiscalPeriod>,
    /// Fiscal year
    pub fiscal_year: Option<i32>,
}

/// A reporting period selected for display, with provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodDescriptor {
    /// Canonical period identity
    pub key: PeriodKey,
    /// Display label for the period
    pub label: String,
    /// Index of the source filing in the input ordering (0 = most recent)
    pub filing_index: usize,
    /// Fiscal period of the source filing
    pub fiscal_period: Option<FiscalPeriod>,
    /// Fiscal year of the source filing
    pub fiscal_year: Option<i32>,
}

impl PeriodDescriptor {
    /// Canonical period id string.
    pub fn period_id(&self) -> String {
        self.key.encode()
    }

    /// Date used for ordering and dedup comparisons.
    pub const fn date(&self) -> NaiveDate {
        self.key.date()
    }

    /// The period kind.
    pub const fn kind(&self) -> PeriodKind {
        self.key.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_instant() {
        let key = PeriodKey::parse("instant_2024-12-31").unwrap();
        assert_eq!(key, PeriodKey::Instant(date(2024, 12, 31)));
        assert_eq!(key.kind(), PeriodKind::Instant);
        assert_eq!(key.duration_days(), None);
    }

    #[test]
    fn test_parse_duration() {
        let key = PeriodKey::parse("duration_2024-01-01_2024-12-31").unwrap();
        assert_eq!(
            key,
            PeriodKey::Duration {
                start: date(2024, 1, 1),
                end: date(2024, 12, 31),
            }
        );
        assert_eq!(key.date(), date(2024, 12, 31));
        assert_eq!(key.duration_days(), Some(365));
    }

    #[rstest]
    #[case("")]
    #[case("instant_")]
    #[case("instant_20241231")]
    #[case("duration_2024-01-01")]
    #[case("duration_2024-01-01_not-a-date")]
    #[case("quarterly_2024-12-31")]
    fn test_parse_malformed(#[case] id: &str) {
        assert!(PeriodKey::parse(id).is_none());
        assert!(id.parse::<PeriodKey>().is_err());
    }

    #[test]
    fn test_encode_round_trip() {
        for id in ["instant_2023-06-30", "duration_2023-01-01_2023-06-30"] {
            assert_eq!(PeriodKey::parse(id).unwrap().encode(), id);
        }
    }

    #[test]
    fn test_from_dates() {
        assert_eq!(
            PeriodKey::from_dates(None, Some(date(2024, 3, 31))),
            Some(PeriodKey::Instant(date(2024, 3, 31)))
        );
        assert_eq!(
            PeriodKey::from_dates(Some(date(2024, 1, 1)), Some(date(2024, 3, 31))),
            Some(PeriodKey::Duration {
                start: date(2024, 1, 1),
                end: date(2024, 3, 31),
            })
        );
        assert_eq!(PeriodKey::from_dates(Some(date(2024, 1, 1)), None), None);
        assert_eq!(PeriodKey::from_dates(None, None), None);
    }

    #[rstest]
    #[case("FY", FiscalPeriod::Fy, 365, None)]
    #[case("Q1", FiscalPeriod::Q1, 90, None)]
    #[case("q2", FiscalPeriod::Q2, 90, Some(180))]
    #[case("Q3", FiscalPeriod::Q3, 90, Some(270))]
    #[case("Q4", FiscalPeriod::Q4, 90, Some(365))]
    fn test_fiscal_period(
        #[case] input: &str,
        #[case] expected: FiscalPeriod,
        #[case] target: i64,
        #[case] ytd: Option<i64>,
    ) {
        let fp = FiscalPeriod::parse(input).unwrap();
        assert_eq!(fp, expected);
        assert_eq!(fp.target_days(), target);
        assert_eq!(fp.ytd_target_days(), ytd);
    }

    #[test]
    fn test_fiscal_period_unrecognized() {
        assert_eq!(FiscalPeriod::parse("H1"), None);
        assert_eq!(FiscalPeriod::parse(""), None);
    }
}
