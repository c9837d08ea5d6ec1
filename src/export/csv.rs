use csv::Writer;

use super::{curve_points, ExportError};
use crate::models::AggregatePowerCurve;

/// `duration_seconds,watts` rows in ascending duration order
pub fn render_curve(curve: &AggregatePowerCurve) -> Result<String, ExportError> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(["duration_seconds", "watts"])?;
    for point in curve_points(curve) {
        writer.write_record([point.duration_seconds.to_string(), format!("{:.1}", point.watts)])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::SerializationError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::SerializationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActivityPowerCurve;

    #[test]
    fn test_render_curve() {
        let activity: ActivityPowerCurve = vec![(60, 250.0), (1, 612.26)].into_iter().collect();
        let mut curve = AggregatePowerCurve::new();
        curve.absorb(&activity);

        let csv = render_curve(&curve).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines, vec!["duration_seconds,watts", "1,612.3", "60,250.0"]);
    }

    #[test]
    fn test_empty_curve_has_header_only() {
        let csv = render_curve(&AggregatePowerCurve::new()).unwrap();
        assert_eq!(csv.trim_end(), "duration_seconds,watts");
    }
}
