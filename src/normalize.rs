//! Time-series normalization
//!
//! Turns decoded samples into [`ContinuousSegment`]s: samples without power
//! are dropped, the rest are sorted by timestamp (first-seen wins on
//! duplicates) and split wherever consecutive timestamps are not exactly one
//! second apart.

use tracing::debug;

use crate::models::{ContinuousSegment, RawSample};

/// Split raw samples into maximal 1 Hz segments
pub fn normalize(samples: Vec<RawSample>) -> Vec<ContinuousSegment> {
    let total = samples.len();
    let mut powered: Vec<(i64, u16)> = samples
        .into_iter()
        .filter_map(|s| s.power.map(|p| (s.timestamp, p)))
        .collect();

    // Stable sort keeps file order among equal timestamps.
    powered.sort_by_key(|&(timestamp, _)| timestamp);
    powered.dedup_by_key(|&mut (timestamp, _)| timestamp);

    let mut segments = Vec::new();
    let mut current: Vec<u16> = Vec::new();
    let mut previous: Option<i64> = None;

    for (timestamp, power) in powered {
        if previous.is_some_and(|prev| timestamp - prev != 1) {
            segments.extend(ContinuousSegment::new(std::mem::take(&mut current)));
        }
        current.push(power);
        previous = Some(timestamp);
    }
    segments.extend(ContinuousSegment::new(current));

    debug!(
        samples = total,
        segments = segments.len(),
        longest = segments.iter().map(|s| s.len()).max().unwrap_or(0),
        "Normalized time series"
    );
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(points: &[(i64, Option<u16>)]) -> Vec<RawSample> {
        points
            .iter()
            .map(|&(timestamp, power)| RawSample::new(timestamp, power))
            .collect()
    }

    fn powers(segments: &[ContinuousSegment]) -> Vec<Vec<u16>> {
        segments.iter().map(|s| s.powers().to_vec()).collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(normalize(Vec::new()).is_empty());
        assert!(normalize(samples(&[(1, None), (2, None)])).is_empty());
    }

    #[test]
    fn test_contiguous_run_is_one_segment() {
        let segments = normalize(samples(&[(10, Some(1)), (11, Some(2)), (12, Some(3))]));
        assert_eq!(powers(&segments), vec![vec![1, 2, 3]]);
    }

    #[test]
    fn test_gap_splits_segments() {
        let segments = normalize(samples(&[
            (0, Some(100)),
            (1, Some(100)),
            (5, Some(200)),
            (6, Some(210)),
        ]));
        assert_eq!(powers(&segments), vec![vec![100, 100], vec![200, 210]]);
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let segments = normalize(samples(&[(3, Some(30)), (1, Some(10)), (2, Some(20))]));
        assert_eq!(powers(&segments), vec![vec![10, 20, 30]]);
    }

    #[test]
    fn test_duplicate_timestamps_keep_first_seen() {
        let segments = normalize(samples(&[
            (1, Some(10)),
            (2, Some(20)),
            (2, Some(99)),
            (3, Some(30)),
        ]));
        assert_eq!(powers(&segments), vec![vec![10, 20, 30]]);
    }

    #[test]
    fn test_missing_power_breaks_continuity() {
        let segments = normalize(samples(&[(1, Some(10)), (2, None), (3, Some(30))]));
        assert_eq!(powers(&segments), vec![vec![10], vec![30]]);
    }

    #[test]
    fn test_duplicate_with_absent_first_value_uses_powered_value() {
        let segments = normalize(samples(&[(1, Some(10)), (2, None), (2, Some(20))]));
        assert_eq!(powers(&segments), vec![vec![10, 20]]);
    }

    #[test]
    fn test_zero_watts_is_a_valid_sample() {
        let segments = normalize(samples(&[(1, Some(0)), (2, Some(0))]));
        assert_eq!(powers(&segments), vec![vec![0, 0]]);
    }
}
