//! Geometric and temporal point filtering.
//!
//! Order of operations (counts are reported after each stage):
//! 1. Cap the input at `max_points`.
//! 2. Drop points with non-finite or out-of-range coordinates.
//! 3. Keep points accepted by the membership test.
//! 4. Keep points whose local hour matches the `HourFilter` and whose local
//!    weekday is in the `DaySet`.

use chrono::{Datelike, FixedOffset, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cfg::AnalysisCfg;
use crate::geo::Coordinate;
use crate::telemetry::TelemetryPoint;

/// Hour-of-day selection. Hours are 0..=23; deserialization rejects others.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase", try_from = "RawHourFilter")]
pub enum HourFilter {
    #[default]
    All,
    Single {
        hour: u8,
    },
    /// Inclusive; wraps past midnight when `from_hour > to_hour`.
    #[serde(rename_all = "camelCase")]
    Range {
        from_hour: u8,
        to_hour: u8,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("hour {0} is outside 0..=23")]
pub struct HourOutOfRange(pub u8);

/// Wire form of `HourFilter` before range checks.
#[derive(Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
enum RawHourFilter {
    All,
    Single {
        hour: u8,
    },
    #[serde(rename_all = "camelCase")]
    Range {
        from_hour: u8,
        to_hour: u8,
    },
}

impl TryFrom<RawHourFilter> for HourFilter {
    type Error = HourOutOfRange;

    fn try_from(raw: RawHourFilter) -> Result<Self, Self::Error> {
        let check = |h: u8| if h < 24 { Ok(h) } else { Err(HourOutOfRange(h)) };
        Ok(match raw {
            RawHourFilter::All => HourFilter::All,
            RawHourFilter::Single { hour } => HourFilter::Single { hour: check(hour)? },
            RawHourFilter::Range { from_hour, to_hour } => HourFilter::Range {
                from_hour: check(from_hour)?,
                to_hour: check(to_hour)?,
            },
        })
    }
}

impl HourFilter {
    pub fn matches(&self, hour: u32) -> bool {
        match *self {
            HourFilter::All => true,
            HourFilter::Single { hour: h } => hour == u32::from(h),
            HourFilter::Range { from_hour, to_hour } => {
                let (from, to) = (u32::from(from_hour), u32::from(to_hour));
                if from <= to {
                    hour >= from && hour <= to
                } else {
                    hour >= from || hour <= to
                }
            }
        }
    }

    /// `"all"`, `"14"`, or `"22-4"`; `None` on anything else or hours > 23.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Some(HourFilter::All);
        }
        let hour = |t: &str| t.trim().parse::<u8>().ok().filter(|h| *h < 24);
        match s.split_once('-') {
            Some((a, b)) => Some(HourFilter::Range {
                from_hour: hour(a)?,
                to_hour: hour(b)?,
            }),
            None => Some(HourFilter::Single { hour: hour(s)? }),
        }
    }

    /// Human-readable label used by exports (`all`, `14:00`, `22:00-04:59`).
    pub fn label(&self) -> String {
        match *self {
            HourFilter::All => "all".to_string(),
            HourFilter::Single { hour } => format!("{hour:02}:00"),
            HourFilter::Range { from_hour, to_hour } => {
                format!("{from_hour:02}:00-{to_hour:02}:59")
            }
        }
    }
}

/// Set of weekdays, 0 = Sunday ..= 6 = Saturday.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<u8>", from = "Vec<u8>")]
pub struct DaySet(u8);

impl DaySet {
    const ALL_BITS: u8 = 0b0111_1111;

    pub fn all() -> Self {
        Self(Self::ALL_BITS)
    }
    pub fn none() -> Self {
        Self(0)
    }
    /// Monday..=Friday.
    pub fn weekdays() -> Self {
        Self::from_days([1, 2, 3, 4, 5])
    }
    /// Days outside 0..=6 are ignored.
    pub fn from_days<I: IntoIterator<Item = u8>>(days: I) -> Self {
        Self(
            days.into_iter()
                .filter(|d| *d < 7)
                .fold(0u8, |acc, d| acc | (1 << d)),
        )
    }
    #[inline]
    pub fn contains(&self, day: u8) -> bool {
        day < 7 && self.0 & (1 << day) != 0
    }
    pub fn is_all(&self) -> bool {
        self.0 == Self::ALL_BITS
    }
    pub fn days(&self) -> Vec<u8> {
        (0..7).filter(|d| self.contains(*d)).collect()
    }
}

impl Default for DaySet {
    fn default() -> Self {
        Self::all()
    }
}

impl From<Vec<u8>> for DaySet {
    fn from(v: Vec<u8>) -> Self {
        Self::from_days(v)
    }
}

impl From<DaySet> for Vec<u8> {
    fn from(d: DaySet) -> Self {
        d.days()
    }
}

/// Time-of-day plus day-of-week selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeFilter {
    #[serde(default)]
    pub hours: HourFilter,
    #[serde(default)]
    pub selected_days: DaySet,
}

impl TimeFilter {
    pub fn new(hours: HourFilter, selected_days: DaySet) -> Self {
        Self {
            hours,
            selected_days,
        }
    }

    /// False when the filter would pass every point.
    pub fn is_active(&self) -> bool {
        self.hours != HourFilter::All || !self.selected_days.is_all()
    }

    pub fn accepts(&self, p: &TelemetryPoint, offset: FixedOffset) -> bool {
        let Some(t) = p.local_time(offset) else {
            return false;
        };
        self.hours.matches(t.hour())
            && self
                .selected_days
                .contains(t.weekday().num_days_from_sunday() as u8)
    }
}

/// Filtered points plus per-stage counts.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOutcome {
    #[serde(skip)]
    pub points: Vec<TelemetryPoint>,
    /// Points supplied by the caller.
    pub input_count: usize,
    /// True if `input_count` exceeded the point cap.
    pub truncated: bool,
    /// Points dropped for non-finite or out-of-range coordinates.
    pub invalid_count: usize,
    /// Points inside the shape, before the time filter.
    pub before_time_filter: usize,
    /// Points inside the shape, after the time filter.
    pub after_time_filter: usize,
}

/// Reusable filter settings (point cap and local-time offset).
#[derive(Clone, Copy, Debug)]
pub struct PointFilter {
    pub max_points: usize,
    pub offset: FixedOffset,
}

impl Default for PointFilter {
    fn default() -> Self {
        Self::from_cfg(&AnalysisCfg::default())
    }
}

impl PointFilter {
    pub fn from_cfg(cfg: &AnalysisCfg) -> Self {
        Self {
            max_points: cfg.max_points,
            offset: cfg.offset(),
        }
    }

    pub fn apply<F>(
        &self,
        points: &[TelemetryPoint],
        test: F,
        time: Option<&TimeFilter>,
    ) -> FilterOutcome
    where
        F: Fn(Coordinate) -> bool,
    {
        let truncated = points.len() > self.max_points;
        let considered = &points[..points.len().min(self.max_points)];
        if truncated {
            tracing::warn!(
                input = points.len(),
                cap = self.max_points,
                "point cap reached; analysing the first points only"
            );
        }

        let mut invalid_count = 0usize;
        let inside: Vec<&TelemetryPoint> = considered
            .iter()
            .filter(|p| {
                let ok = p.coordinate().is_valid();
                if !ok {
                    invalid_count += 1;
                }
                ok
            })
            .filter(|p| test(p.coordinate()))
            .collect();
        let before_time_filter = inside.len();

        let active = time.filter(|t| t.is_active());
        let kept: Vec<TelemetryPoint> = inside
            .into_iter()
            .filter(|p| active.map_or(true, |t| t.accepts(p, self.offset)))
            .cloned()
            .collect();

        FilterOutcome {
            after_time_filter: kept.len(),
            points: kept,
            input_count: points.len(),
            truncated,
            invalid_count,
            before_time_filter,
        }
    }
}

/// Filter with default cap and UTC as local time.
pub fn filter<F>(points: &[TelemetryPoint], test: F, time: Option<&TimeFilter>) -> FilterOutcome
where
    F: Fn(Coordinate) -> bool,
{
    PointFilter::default().apply(points, test, time)
}
