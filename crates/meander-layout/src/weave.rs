//! Boat path weaving: a half-sine lateral swing per crossing segment.

use crate::geometry::GeometrySample;
use crate::layout::PathPoint;
use crate::stage::StageInstance;

/// Crossings closer together than this (in progress) are merged.
const MIN_CROSSING_GAP: f64 = 1e-9;

/// Derives weave crossing points from a track's stage boundaries.
///
/// Returns a strictly increasing list of progress fractions that starts at 0
/// and ends at 1. With no stages the whole biome is one crossing segment.
pub fn crossings_from_stages(stages: &[StageInstance]) -> Vec<f64> {
    let mut crossings = vec![0.0];
    for stage in stages {
        let c = stage.end.clamp(0.0, 1.0);
        if let Some(&prev) = crossings.last()
            && c - prev > MIN_CROSSING_GAP
        {
            crossings.push(c);
        }
    }
    match crossings.last_mut() {
        Some(last) if 1.0 - *last <= MIN_CROSSING_GAP => *last = 1.0,
        _ => crossings.push(1.0),
    }
    crossings
}

/// Lateral boat offset at `progress`.
///
/// Within crossing segment `k` the offset is a half-sine whose sign alternates
/// with `k`, scaled by `bank_dist - margin` (never negative).
pub fn weave_offset(progress: f64, crossings: &[f64], bank_dist: f64, margin: f64) -> f64 {
    if crossings.len() < 2 {
        return 0.0;
    }
    let progress = progress.clamp(0.0, 1.0);
    let k = crossings
        .partition_point(|&c| c <= progress)
        .saturating_sub(1)
        .min(crossings.len() - 2);
    let (lo, hi) = (crossings[k], crossings[k + 1]);
    let t = if hi > lo { (progress - lo) / (hi - lo) } else { 0.0 };
    let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
    let amplitude = (bank_dist - margin).max(0.0);
    sign * (std::f64::consts::PI * t.clamp(0.0, 1.0)).sin() * amplitude
}

/// Attaches a woven boat offset to every sample.
pub fn weave_path(samples: Vec<GeometrySample>, crossings: &[f64], margin: f64) -> Vec<PathPoint> {
    let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
        return Vec::new();
    };
    let start = first.arc_length;
    let total = last.arc_length - start;

    samples
        .into_iter()
        .map(|sample| {
            let progress = if total > 0.0 {
                (sample.arc_length - start) / total
            } else {
                0.0
            };
            PathPoint {
                boat_offset: weave_offset(progress, crossings, sample.bank_dist, margin),
                sample,
            }
        })
        .collect()
}
