//! Cross-activity aggregation
//!
//! An activity qualifies when its calendar date lies inside the requested
//! range (both ends inclusive). For each duration reached by any qualifying
//! activity, the aggregate holds the maximum across those activities.

use chrono::NaiveDate;
use rayon::prelude::*;

use crate::models::{ActivityPowerCurve, AggregatePowerCurve, DateRange};

/// Pointwise maximum over the activities dated inside `range`
///
/// No qualifying activity yields an empty curve, which is a valid result.
pub fn aggregate(
    activities: &[(NaiveDate, ActivityPowerCurve)],
    range: &DateRange,
) -> AggregatePowerCurve {
    activities
        .iter()
        .filter(|(date, _)| range.contains(*date))
        .fold(AggregatePowerCurve::new(), |mut acc, (_, curve)| {
            acc.absorb(curve);
            acc
        })
}

/// Same result as [`aggregate`], reduced across the current rayon pool
pub fn par_aggregate(
    activities: &[(NaiveDate, ActivityPowerCurve)],
    range: &DateRange,
) -> AggregatePowerCurve {
    activities
        .par_iter()
        .filter(|(date, _)| range.contains(*date))
        .fold(AggregatePowerCurve::new, |mut acc, (_, curve)| {
            acc.absorb(curve);
            acc
        })
        .reduce(AggregatePowerCurve::new, AggregatePowerCurve::merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn curve(points: &[(u32, f64)]) -> ActivityPowerCurve {
        points.iter().copied().collect()
    }

    fn january() -> DateRange {
        DateRange::new(date(2024, 1, 1), date(2024, 1, 31)).unwrap()
    }

    #[test]
    fn test_two_activities_same_day() {
        let day = date(2024, 1, 10);
        let a = curve(&[(1, 600.0), (30, 270.0), (60, 250.0)]);
        let b = curve(&[(1, 550.0), (30, 280.0)]);

        let result = aggregate(&[(day, a), (day, b)], &january());

        assert_eq!(result.get(1), Some(600.0));
        assert_eq!(result.get(30), Some(280.0));
        assert_eq!(result.get(60), Some(250.0));
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_range_is_inclusive_and_filters() {
        let activities = vec![
            (date(2023, 12, 31), curve(&[(5, 900.0)])),
            (date(2024, 1, 1), curve(&[(5, 300.0)])),
            (date(2024, 1, 31), curve(&[(10, 250.0)])),
            (date(2024, 2, 1), curve(&[(10, 800.0)])),
        ];

        let result = aggregate(&activities, &january());
        assert_eq!(result.get(5), Some(300.0));
        assert_eq!(result.get(10), Some(250.0));
    }

    #[test]
    fn test_no_qualifying_activity_is_empty() {
        let activities = vec![(date(2023, 6, 1), curve(&[(5, 300.0)]))];
        assert!(aggregate(&activities, &january()).is_empty());
        assert!(aggregate(&[], &january()).is_empty());
    }

    #[test]
    fn test_rerun_is_identical() {
        let activities = vec![
            (date(2024, 1, 2), curve(&[(1, 412.5), (20, 301.25)])),
            (date(2024, 1, 3), curve(&[(1, 399.0), (20, 305.75)])),
        ];
        assert_eq!(aggregate(&activities, &january()), aggregate(&activities, &january()));
    }

    proptest! {
        #[test]
        fn prop_order_independent(
            raw in prop::collection::vec(
                (1u32..31, prop::collection::vec((1u32..100, 0.0f64..2000.0), 0..10)),
                0..12
            )
        ) {
            let activities: Vec<(NaiveDate, ActivityPowerCurve)> = raw
                .iter()
                .map(|(day, points)| (date(2024, 1, *day), curve(points)))
                .collect();
            let mut reversed = activities.clone();
            reversed.reverse();

            let forward = aggregate(&activities, &january());
            prop_assert_eq!(&forward, &aggregate(&reversed, &january()));
            prop_assert_eq!(&forward, &par_aggregate(&activities, &january()));
        }
    }
}
