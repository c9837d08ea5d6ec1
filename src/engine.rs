//! Activity power-curve engine
//!
//! Ties the pieces together for one request: select the owner's activities
//! dated inside the range, compute each activity's curve in parallel, and fold
//! the results into one [`AggregatePowerCurve`].

use serde::Serialize;
use tracing::info;

use crate::aggregate::par_aggregate;
use crate::config::AppConfig;
use crate::error::Result;
use crate::grid::DurationGrid;
use crate::import::parallel::{BatchConfig, BatchProcessor, BatchSummary};
use crate::models::{ActivityFile, AggregatePowerCurve, DateRange};
use crate::store::ActivitySource;

/// Outcome of one power-curve request
#[derive(Debug, Clone)]
pub struct PowerCurveReport {
    pub owner: String,
    pub range: DateRange,
    pub curve: AggregatePowerCurve,
    pub summary: BatchSummary,
}

impl PowerCurveReport {
    /// Some activities were skipped because the time budget ran out
    pub fn is_partial(&self) -> bool {
        self.summary.is_partial()
    }

    /// No qualifying data; not a failure
    pub fn is_empty(&self) -> bool {
        self.curve.is_empty()
    }

    pub fn stats(&self) -> ReportStats {
        ReportStats {
            activities: self.summary.total_activities,
            computed: self.summary.computed,
            failed: self.summary.failed,
            skipped: self.summary.skipped,
            durations: self.curve.len(),
            partial: self.is_partial(),
        }
    }
}

/// Counters of a report, for logs and machine-readable output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportStats {
    pub activities: usize,
    pub computed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub durations: usize,
    pub partial: bool,
}

pub struct PowerCurveEngine {
    grid: DurationGrid,
    processor: BatchProcessor,
}

impl PowerCurveEngine {
    pub fn new(grid: DurationGrid, config: BatchConfig) -> Result<Self> {
        Ok(Self {
            grid,
            processor: BatchProcessor::with_config(config)?,
        })
    }

    /// Engine with the standard grid and default batch settings
    pub fn with_defaults() -> Result<Self> {
        Self::new(DurationGrid::standard(), BatchConfig::default())
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(config.grid.build()?, config.engine.clone())
    }

    pub fn grid(&self) -> &DurationGrid {
        &self.grid
    }

    pub fn batch_config(&self) -> &BatchConfig {
        &self.processor.config
    }

    /// Power curve of `owner` over `range` from already loaded activities
    ///
    /// Activities of other owners or outside the range are never decoded.
    pub fn compute(&self, owner: &str, activities: &[ActivityFile], range: &DateRange) -> PowerCurveReport {
        let qualifying: Vec<&ActivityFile> = activities
            .iter()
            .filter(|a| a.owner == owner && range.contains(a.date))
            .collect();

        let summary = self.processor.process(&qualifying, &self.grid);
        let curves = summary.curves();
        let curve = self.processor.install(|| par_aggregate(&curves, range));

        let report = PowerCurveReport {
            owner: owner.to_string(),
            range: *range,
            curve,
            summary,
        };

        let stats = report.stats();
        info!(
            owner = %owner,
            start = %range.start(),
            end = %range.end(),
            activities = stats.activities,
            failed = stats.failed,
            skipped = stats.skipped,
            durations = stats.durations,
            "Power curve computed in {}ms",
            report.summary.total_duration_ms
        );
        report
    }

    /// Power curve of `owner` over `range`, loading activities from `source`
    pub fn power_curve(
        &self,
        source: &dyn ActivitySource,
        owner: &str,
        range: &DateRange,
    ) -> Result<PowerCurveReport> {
        let activities = source.activities_in(owner, range)?;
        Ok(self.compute(owner, &activities, range))
    }
}
