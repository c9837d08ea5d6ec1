use serde_json::{Map, Value};

use super::{round_watts, ExportError};
use crate::models::AggregatePowerCurve;

/// Duration-string to rounded-watts mapping; absent durations are omitted
pub fn curve_to_map(curve: &AggregatePowerCurve) -> Map<String, Value> {
    curve
        .iter()
        .map(|(duration, watts)| (duration.to_string(), Value::from(round_watts(watts))))
        .collect()
}

/// Pretty JSON object, `{}` when the curve is empty
pub fn render_curve(curve: &AggregatePowerCurve) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(&curve_to_map(curve))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActivityPowerCurve;

    #[test]
    fn test_string_keys_and_one_decimal() {
        let activity: ActivityPowerCurve = vec![(5, 300.0), (10, 220.04), (30, 199.96)]
            .into_iter()
            .collect();
        let mut curve = AggregatePowerCurve::new();
        curve.absorb(&activity);

        let map = curve_to_map(&curve);
        assert_eq!(map.len(), 3);
        assert_eq!(map["5"], Value::from(300.0));
        assert_eq!(map["10"], Value::from(220.0));
        assert_eq!(map["30"], Value::from(200.0));

        let parsed: Value = serde_json::from_str(&render_curve(&curve).unwrap()).unwrap();
        assert_eq!(parsed["10"].as_f64(), Some(220.0));
    }

    #[test]
    fn test_empty_curve_is_empty_object() {
        assert_eq!(render_curve(&AggregatePowerCurve::new()).unwrap(), "{}");
    }
}
