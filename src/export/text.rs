use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::{curve_points, format_duration};
use crate::engine::PowerCurveReport;
use crate::models::AggregatePowerCurve;

#[derive(Tabled)]
struct CurveRow {
    #[tabled(rename = "Duration")]
    label: String,
    #[tabled(rename = "Seconds")]
    seconds: u32,
    #[tabled(rename = "Watts")]
    watts: String,
}

/// Rounded curve as a text table
pub fn render_table(curve: &AggregatePowerCurve) -> String {
    if curve.is_empty() {
        return "No power data in the selected range".to_string();
    }
    let rows: Vec<CurveRow> = curve_points(curve)
        .into_iter()
        .map(|p| CurveRow {
            label: format_duration(p.duration_seconds),
            seconds: p.duration_seconds,
            watts: format!("{:.1}", p.watts),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

/// Short plain-text summary of a request
pub fn render_report_summary(report: &PowerCurveReport) -> String {
    let stats = report.stats();
    let mut lines = vec![
        format!("Athlete: {}", report.owner),
        format!(
            "Period: {} to {}",
            report.range.start().format("%Y-%m-%d"),
            report.range.end().format("%Y-%m-%d")
        ),
        format!(
            "Activities: {} ({} computed, {} failed, {} skipped)",
            stats.activities, stats.computed, stats.failed, stats.skipped
        ),
        format!("Durations: {}", stats.durations),
    ];
    if stats.partial {
        lines.push("Result is partial: time budget exhausted".to_string());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActivityPowerCurve;

    #[test]
    fn test_render_table() {
        let activity: ActivityPowerCurve = vec![(5, 400.0), (300, 280.56)].into_iter().collect();
        let mut curve = AggregatePowerCurve::new();
        curve.absorb(&activity);

        let table = render_table(&curve);
        assert!(table.contains("Duration"));
        assert!(table.contains("5m"));
        assert!(table.contains("400.0"));
        assert!(table.contains("280.6"));
    }

    #[test]
    fn test_render_empty_table() {
        assert_eq!(
            render_table(&AggregatePowerCurve::new()),
            "No power data in the selected range"
        );
    }
}
