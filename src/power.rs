//! Mean-maximal power calculation
//!
//! For every grid duration `d` the best average power is the largest sum of `d`
//! consecutive samples inside one continuous segment, divided by `d`. Sums are
//! taken from a per-segment prefix-sum array and compared as exact integers, so
//! a segment costs O(n) to prepare and O(n) per duration to scan, with a single
//! division per (segment, duration).

use crate::grid::DurationGrid;
use crate::models::{ActivityPowerCurve, ContinuousSegment};

/// Mean-maximal power calculator
pub struct PowerAnalyzer;

impl PowerAnalyzer {
    /// Best average power per grid duration across all segments of one activity
    ///
    /// Durations longer than every segment are absent from the result.
    pub fn activity_curve(segments: &[ContinuousSegment], grid: &DurationGrid) -> ActivityPowerCurve {
        let mut curve = ActivityPowerCurve::new();

        for segment in segments {
            let prefix = prefix_sums(segment.powers());
            for &duration in grid.up_to(segment.len()) {
                if let Some(best_sum) = best_window_sum(&prefix, duration as usize) {
                    curve.offer(duration, best_sum as f64 / duration as f64);
                }
            }
        }

        curve
    }

    /// Best average over windows of exactly `duration_seconds` in one segment
    pub fn best_average(segment: &ContinuousSegment, duration_seconds: u32) -> Option<f64> {
        if duration_seconds == 0 {
            return None;
        }
        let prefix = prefix_sums(segment.powers());
        best_window_sum(&prefix, duration_seconds as usize)
            .map(|sum| sum as f64 / duration_seconds as f64)
    }
}

/// `prefix[i]` is the sum of the first `i` samples
fn prefix_sums(powers: &[u16]) -> Vec<u64> {
    let mut prefix = Vec::with_capacity(powers.len() + 1);
    let mut running = 0u64;
    prefix.push(running);
    for &power in powers {
        running += power as u64;
        prefix.push(running);
    }
    prefix
}

fn best_window_sum(prefix: &[u64], window: usize) -> Option<u64> {
    let len = prefix.len().checked_sub(1)?;
    if window == 0 || window > len {
        return None;
    }
    (window..=len).map(|end| prefix[end] - prefix[end - window]).max()
}

/// Convenience wrapper over [`PowerAnalyzer::activity_curve`]
pub fn compute_activity_curve(
    segments: &[ContinuousSegment],
    grid: &DurationGrid,
) -> ActivityPowerCurve {
    PowerAnalyzer::activity_curve(segments, grid)
}
