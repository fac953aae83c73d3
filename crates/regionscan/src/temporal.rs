//! Peak hour-of-day and peak weekday.
//!
//! Two independent 1-D histograms over the same points (not a joint
//! hour × day matrix). Each peak is its own histogram's argmax; ties go to
//! the lowest index.

use chrono::{Datelike, FixedOffset, Timelike};
use serde::{Deserialize, Serialize};

use crate::telemetry::TelemetryPoint;

pub const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalPatterns {
    /// 0..=23, local time.
    pub peak_hour: u8,
    /// 0 = Sunday ..= 6 = Saturday, local time.
    pub peak_day: u8,
    pub hourly: [usize; 24],
    pub daily: [usize; 7],
}

impl TemporalPatterns {
    pub fn peak_day_name(&self) -> &'static str {
        DAY_NAMES[usize::from(self.peak_day) % 7]
    }
}

/// Lowest index of the maximum value.
fn argmax(counts: &[usize]) -> usize {
    let mut best = 0usize;
    for (i, &c) in counts.iter().enumerate() {
        if c > counts[best] {
            best = i;
        }
    }
    best
}

/// Histogram local hours and weekdays; `None` if no point has a usable timestamp.
pub fn analyze(points: &[TelemetryPoint], offset: FixedOffset) -> Option<TemporalPatterns> {
    let mut hourly = [0usize; 24];
    let mut daily = [0usize; 7];
    let mut seen = 0usize;
    for t in points.iter().filter_map(|p| p.local_time(offset)) {
        hourly[t.hour() as usize] += 1;
        daily[t.weekday().num_days_from_sunday() as usize] += 1;
        seen += 1;
    }
    if seen == 0 {
        return None;
    }
    Some(TemporalPatterns {
        peak_hour: argmax(&hourly) as u8,
        peak_day: argmax(&daily) as u8,
        hourly,
        daily,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR_MS: i64 = 3_600_000;
    const DAY_MS: i64 = 24 * HOUR_MS;
    // 2024-01-07T00:00:00Z, a Sunday.
    const SUNDAY: i64 = 1_704_585_600_000;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn at(day: i64, hour: i64) -> TelemetryPoint {
        TelemetryPoint::new(0.0, 0.0, SUNDAY + day * DAY_MS + hour * HOUR_MS)
    }

    #[test]
    fn empty_is_absent() {
        assert_eq!(analyze(&[], utc()), None);
    }

    #[test]
    fn mostly_afternoon_peaks_at_fourteen() {
        let mut pts: Vec<TelemetryPoint> = (0..9).map(|_| at(2, 14)).collect();
        pts.push(at(3, 3));
        let tp = analyze(&pts, utc()).unwrap();
        assert_eq!(tp.peak_hour, 14);
        assert_eq!(tp.peak_day, 2);
        assert_eq!(tp.peak_day_name(), "Tuesday");
        assert_eq!(tp.hourly[3], 1);
        assert_eq!(tp.daily.iter().sum::<usize>(), 10);
    }

    #[test]
    fn ties_break_to_lowest_index() {
        let pts = vec![at(5, 20), at(1, 8)];
        let tp = analyze(&pts, utc()).unwrap();
        assert_eq!(tp.peak_hour, 8);
        assert_eq!(tp.peak_day, 1);
    }

    #[test]
    fn histograms_are_independent() {
        // Peak hour comes from day 0, peak day from a different hour.
        let mut pts = vec![at(0, 6), at(0, 6), at(0, 6)];
        pts.extend([at(4, 1), at(4, 2), at(4, 3), at(4, 4)]);
        let tp = analyze(&pts, utc()).unwrap();
        assert_eq!(tp.peak_hour, 6);
        assert_eq!(tp.peak_day, 4);
    }

    #[test]
    fn offset_shifts_buckets() {
        let pts = vec![at(0, 23)];
        let plus3 = FixedOffset::east_opt(3 * 3600).unwrap();
        let tp = analyze(&pts, plus3).unwrap();
        assert_eq!(tp.peak_hour, 2);
        assert_eq!(tp.peak_day, 1);
    }
}
