//! Temporal windows around an anchor event.
//!
//! The resolver turns the caller's anchor dates and relationship mode into
//! either a closed date interval or a proximity rule that keeps one record
//! per partition key. It reads no data.

use chrono::{NaiveDate, TimeDelta};
use sdtm_model::{Predicate, RankRule, Ranking, Retrieval};

use crate::error::{QueryError, Result};

/// Wire names of the anchor parameters, as reported in errors.
pub const ANCHOR_START: &str = "AESTDTC";
pub const ANCHOR_END: &str = "AEENDTC";
pub const OFFSET_DAYS: &str = "Days";

/// Anchor values supplied with a query. `end` is already normalized, so an
/// ongoing event arrives here as the reference date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnchorDates {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub offset_days: Option<i64>,
}

/// Relationship modes that resolve against caller-supplied anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMode {
    AtTime,
    Prior,
    During,
    WithinDays,
}

impl WindowMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowMode::AtTime => "at_time",
            WindowMode::Prior => "prior",
            WindowMode::During => "during",
            WindowMode::WithinDays => "within_days",
        }
    }
}

/// Closed date interval `[low, high]`. An interval with `high < low` is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateInterval {
    pub low: NaiveDate,
    pub high: NaiveDate,
}

impl DateInterval {
    /// Builds the interval spanning both dates, whichever comes first.
    pub fn spanning(a: NaiveDate, b: NaiveDate) -> Self {
        Self {
            low: a.min(b),
            high: a.max(b),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.low <= date && date <= self.high
    }

    pub fn is_empty(&self) -> bool {
        self.high < self.low
    }
}

/// How the single record per partition key is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProximityRule {
    /// Exact date match first, then smallest day distance.
    Nearest,
    /// Latest record dated on or before the target.
    MostRecent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedWindow {
    Interval(DateInterval),
    Proximity {
        target: NaiveDate,
        rule: ProximityRule,
    },
}

impl ResolvedWindow {
    /// Adds the window to `retrieval`, filtering and ranking on
    /// `date_column` within `partition`.
    pub fn apply(&self, retrieval: Retrieval, date_column: &str, partition: &str) -> Retrieval {
        match *self {
            ResolvedWindow::Interval(interval) => retrieval.filter(Predicate::date_between(
                date_column,
                interval.low,
                interval.high,
            )),
            ResolvedWindow::Proximity { target, rule } => {
                let (predicate, rule) = match rule {
                    ProximityRule::Nearest => (Predicate::has_date(date_column), RankRule::Nearest),
                    ProximityRule::MostRecent => (
                        Predicate::date_on_or_before(date_column, target),
                        RankRule::MostRecent,
                    ),
                };
                retrieval.filter(predicate).rank_by(Ranking {
                    partition: partition.to_string(),
                    date_column: date_column.to_string(),
                    target,
                    rule,
                })
            }
        }
    }
}

/// Computes windows from anchor dates.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemporalWindowResolver;

impl TemporalWindowResolver {
    pub fn resolve(&self, anchors: &AnchorDates, mode: WindowMode) -> Result<ResolvedWindow> {
        let mode_name = mode.as_str();
        let start = anchors.start.ok_or(QueryError::MissingParameter {
            parameter: ANCHOR_START,
            mode: mode_name,
        })?;

        let window = match mode {
            WindowMode::AtTime => ResolvedWindow::Proximity {
                target: start,
                rule: ProximityRule::Nearest,
            },
            WindowMode::Prior => ResolvedWindow::Proximity {
                target: start,
                rule: ProximityRule::MostRecent,
            },
            WindowMode::During => {
                let end = anchors.end.ok_or(QueryError::MissingParameter {
                    parameter: ANCHOR_END,
                    mode: mode_name,
                })?;
                // An end before the start is kept as given and matches no record.
                ResolvedWindow::Interval(DateInterval {
                    low: start,
                    high: end,
                })
            }
            WindowMode::WithinDays => {
                let days = anchors.offset_days.ok_or(QueryError::MissingParameter {
                    parameter: OFFSET_DAYS,
                    mode: mode_name,
                })?;
                let shifted = shift_days(start, days).ok_or(QueryError::InvalidParameter {
                    parameter: OFFSET_DAYS,
                    value: days.to_string(),
                })?;
                ResolvedWindow::Interval(DateInterval::spanning(start, shifted))
            }
        };

        tracing::debug!(mode = mode_name, window = ?window, "resolved window");
        Ok(window)
    }
}

/// `date` moved by `days`, or `None` past the calendar range.
pub fn shift_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    TimeDelta::try_days(days).and_then(|delta| date.checked_add_signed(delta))
}
