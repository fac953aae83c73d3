//! Synthetic drive-test points (uniform in a box, replayable).
//!
//! Model
//! - Positions are uniform in latitude/longitude inside the bounding box.
//! - Timestamps are uniform over one week starting at `start_ms`.
//! - Metrics are uniform in typical LTE ranges; carrier and technology are
//!   drawn from small fixed lists.
//! - Determinism uses a replay token `(seed, index)` mixed into a single RNG.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geo::BoundingBox;
use crate::telemetry::TelemetryPoint;

const WEEK_MS: i64 = 7 * 24 * 3_600_000;

/// Metric name and uniform sampling range.
const METRIC_RANGES: [(&str, f64, f64); 7] = [
    ("rsrp", -120.0, -70.0),
    ("rsrq", -20.0, -3.0),
    ("sinr", -5.0, 30.0),
    ("dl_throughput", 0.5, 150.0),
    ("ul_throughput", 0.1, 50.0),
    ("mos", 1.0, 4.5),
    ("lte_bler", 0.0, 10.0),
];
const CARRIERS: [&str; 3] = ["CarrierA", "CarrierB", "CarrierC"];
const TECHNOLOGIES: [&str; 3] = ["LTE", "5G NSA", "5G SA"];

/// Replay token to make draws reproducible and indexable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayToken {
    pub seed: u64,
    pub index: u64,
}

impl ReplayToken {
    #[inline]
    fn to_std_rng(self) -> StdRng {
        // SplitMix64-style mixing.
        fn mix(mut x: u64) -> u64 {
            x ^= x >> 30;
            x = x.wrapping_mul(0xbf58476d1ce4e5b9);
            x ^= x >> 27;
            x = x.wrapping_mul(0x94d049bb133111eb);
            x ^ (x >> 31)
        }
        let k = mix(self.seed ^ mix(self.index.wrapping_add(0x9e3779b97f4a7c15)));
        StdRng::seed_from_u64(k)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SynthCfg {
    pub count: usize,
    pub bbox: BoundingBox,
    /// Start of the sampled week (Unix ms).
    pub start_ms: i64,
}

/// Draw `cfg.count` points.
pub fn uniform_points(cfg: SynthCfg, tok: ReplayToken) -> Vec<TelemetryPoint> {
    let mut rng = tok.to_std_rng();
    let bb = cfg.bbox;
    (0..cfg.count)
        .map(|_| {
            let lat = bb.south + rng.gen::<f64>() * (bb.north - bb.south);
            let lng = bb.west + rng.gen::<f64>() * (bb.east - bb.west);
            let ts = cfg.start_ms + rng.gen_range(0..WEEK_MS);
            let mut p = TelemetryPoint::new(lat, lng, ts);
            for (name, lo, hi) in METRIC_RANGES {
                p.metrics.insert(name.to_string(), rng.gen_range(lo..hi));
            }
            p.with_attribute("carrier", CARRIERS[rng.gen_range(0..CARRIERS.len())])
                .with_attribute(
                    "technology",
                    TECHNOLOGIES[rng.gen_range(0..TECHNOLOGIES.len())],
                )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(count: usize) -> SynthCfg {
        SynthCfg {
            count,
            bbox: BoundingBox {
                south: 10.0,
                west: 20.0,
                north: 11.0,
                east: 21.0,
            },
            start_ms: 1_704_585_600_000,
        }
    }

    #[test]
    fn reproducible_draw() {
        let tok = ReplayToken { seed: 42, index: 7 };
        assert_eq!(uniform_points(cfg(20), tok), uniform_points(cfg(20), tok));
        let other = ReplayToken { seed: 42, index: 8 };
        assert_ne!(uniform_points(cfg(20), tok), uniform_points(cfg(20), other));
    }

    #[test]
    fn points_stay_in_box_and_week() {
        let c = cfg(500);
        for p in uniform_points(c, ReplayToken { seed: 1, index: 0 }) {
            assert!(c.bbox.contains(p.coordinate()));
            assert!(p.timestamp_ms >= c.start_ms && p.timestamp_ms < c.start_ms + WEEK_MS);
            let rsrp = p.metric("rsrp").unwrap();
            assert!((-120.0..-70.0).contains(&rsrp));
            assert!(p.attribute("carrier").is_some());
        }
    }
}
