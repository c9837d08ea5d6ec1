//! Parallel batch processing of activity files using rayon
//!
//! Each activity is decoded, normalized and reduced to its own
//! [`ActivityPowerCurve`] on a worker thread. Workers share nothing but the
//! read-only duration grid. Provides:
//! - Configurable, dedicated thread pool
//! - Optional wall-clock budget; activities not started in time are skipped
//! - Per-activity outcomes, decode failures never abort the batch

use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::{DecodeError, PowerCurveError, Result};
use crate::grid::DurationGrid;
use crate::models::{ActivityFile, ActivityPowerCurve};
use crate::normalize::normalize;
use crate::power::PowerAnalyzer;

use super::fit::decode;

/// Configuration for batch processing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Worker threads; `None` uses rayon's default (number of CPUs)
    pub num_threads: Option<usize>,
    /// Show a progress bar while processing
    pub show_progress: bool,
    /// Wall-clock budget in milliseconds for one batch
    pub time_budget_ms: Option<u64>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            show_progress: false,
            time_budget_ms: None,
        }
    }
}

impl BatchConfig {
    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_ms.map(Duration::from_millis)
    }
}

/// What happened to one activity
#[derive(Debug, Clone, PartialEq)]
pub enum ActivityOutcome {
    Computed {
        curve: ActivityPowerCurve,
        samples: usize,
        segments: usize,
    },
    Failed(DecodeError),
    /// Not started before the time budget ran out
    Skipped,
}

impl ActivityOutcome {
    pub fn is_computed(&self) -> bool {
        matches!(self, ActivityOutcome::Computed { .. })
    }

    pub fn curve(&self) -> Option<&ActivityPowerCurve> {
        match self {
            ActivityOutcome::Computed { curve, .. } => Some(curve),
            _ => None,
        }
    }
}

/// Result of processing one activity
#[derive(Debug, Clone)]
pub struct ActivityResult {
    pub id: String,
    pub date: NaiveDate,
    pub outcome: ActivityOutcome,
    /// Processing time in milliseconds
    pub duration_ms: u128,
}

/// Summary of a batch
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub total_activities: usize,
    pub computed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total_duration_ms: u128,
    /// Per-activity results in input order
    pub results: Vec<ActivityResult>,
}

impl BatchSummary {
    fn from_results(results: Vec<ActivityResult>, total_duration_ms: u128) -> Self {
        let mut summary = Self {
            total_activities: results.len(),
            computed: 0,
            failed: 0,
            skipped: 0,
            total_duration_ms,
            results: Vec::new(),
        };
        for result in &results {
            match result.outcome {
                ActivityOutcome::Computed { .. } => summary.computed += 1,
                ActivityOutcome::Failed(_) => summary.failed += 1,
                ActivityOutcome::Skipped => summary.skipped += 1,
            }
        }
        summary.results = results;
        summary
    }

    /// Activities per second
    pub fn throughput_per_sec(&self) -> f64 {
        if self.total_duration_ms == 0 {
            return 0.0;
        }
        (self.computed as f64 / self.total_duration_ms as f64) * 1000.0
    }

    pub fn avg_time_per_activity_ms(&self) -> f64 {
        if self.computed == 0 {
            return 0.0;
        }
        self.total_duration_ms as f64 / self.computed as f64
    }

    /// True when the time budget cut the batch short
    pub fn is_partial(&self) -> bool {
        self.skipped > 0
    }

    pub fn is_fully_successful(&self) -> bool {
        self.failed == 0 && self.skipped == 0
    }

    /// Decode failures with the activity they belong to
    pub fn failures(&self) -> impl Iterator<Item = (&str, &DecodeError)> {
        self.results.iter().filter_map(|r| match &r.outcome {
            ActivityOutcome::Failed(err) => Some((r.id.as_str(), err)),
            _ => None,
        })
    }

    /// `(date, curve)` pairs of the computed activities
    pub fn curves(&self) -> Vec<(NaiveDate, ActivityPowerCurve)> {
        self.results
            .iter()
            .filter_map(|r| r.outcome.curve().map(|c| (r.date, c.clone())))
            .collect()
    }

    pub fn to_string_pretty(&self) -> String {
        format!(
            "Batch Summary\n  \
             Total Activities: {}\n  \
             Computed: {}\n  \
             Failed: {}\n  \
             Skipped: {}\n  \
             Total Time: {:.2}s\n  \
             Throughput: {:.2} activities/sec\n  \
             Avg Time/Activity: {:.2}ms",
            self.total_activities,
            self.computed,
            self.failed,
            self.skipped,
            self.total_duration_ms as f64 / 1000.0,
            self.throughput_per_sec(),
            self.avg_time_per_activity_ms()
        )
    }
}

/// Runs activity batches on a dedicated thread pool
pub struct BatchProcessor {
    pub config: BatchConfig,
    pool: rayon::ThreadPool,
}

impl BatchProcessor {
    pub fn new() -> Result<Self> {
        Self::with_config(BatchConfig::default())
    }

    pub fn with_config(config: BatchConfig) -> Result<Self> {
        let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("powercurve-{}", i));
        if let Some(num_threads) = config.num_threads {
            builder = builder.num_threads(num_threads);
        }
        let pool = builder.build().map_err(|e| {
            PowerCurveError::Configuration(format!("Failed to create thread pool: {}", e))
        })?;
        Ok(Self { config, pool })
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `op` inside this processor's thread pool
    pub fn install<R, F>(&self, op: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }

    /// Compute every activity's curve; results keep input order
    pub fn process<A>(&self, activities: &[A], grid: &DurationGrid) -> BatchSummary
    where
        A: Borrow<ActivityFile> + Sync,
    {
        let start = Instant::now();
        let deadline = self.config.time_budget().map(|budget| start + budget);

        info!(
            "Processing {} activities on {} threads",
            activities.len(),
            self.num_threads()
        );

        let progress = self.progress_bar(activities.len());

        let results: Vec<ActivityResult> = self.pool.install(|| {
            activities
                .par_iter()
                .map(|activity| {
                    let activity: &ActivityFile = activity.borrow();
                    let result = if deadline.is_some_and(|d| Instant::now() >= d) {
                        ActivityResult {
                            id: activity.id.clone(),
                            date: activity.date,
                            outcome: ActivityOutcome::Skipped,
                            duration_ms: 0,
                        }
                    } else {
                        process_activity(activity, grid)
                    };
                    if let Some(pb) = &progress {
                        pb.inc(1);
                    }
                    result
                })
                .collect()
        });

        if let Some(pb) = progress {
            pb.finish_with_message("Complete");
        }

        let summary = BatchSummary::from_results(results, start.elapsed().as_millis());
        if summary.is_partial() {
            warn!(
                "Time budget exhausted: {} of {} activities skipped",
                summary.skipped, summary.total_activities
            );
        }
        debug!("{}", summary.to_string_pretty());
        summary
    }

    fn progress_bar(&self, len: usize) -> Option<ProgressBar> {
        if !self.config.show_progress {
            return None;
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({msg})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        Some(pb)
    }
}

/// Decode, normalize and reduce one activity
pub fn process_activity(activity: &ActivityFile, grid: &DurationGrid) -> ActivityResult {
    let started = Instant::now();

    let outcome = match decode(&activity.bytes) {
        Ok(samples) => {
            let sample_count = samples.len();
            let segments = normalize(samples);
            let curve = PowerAnalyzer::activity_curve(&segments, grid);
            debug!(
                activity = %activity.id,
                samples = sample_count,
                segments = segments.len(),
                durations = curve.len(),
                "Computed activity curve"
            );
            ActivityOutcome::Computed {
                curve,
                samples: sample_count,
                segments: segments.len(),
            }
        }
        Err(err) => {
            warn!(
                activity = %activity.id,
                offset = err.offset(),
                "Skipping undecodable activity: {}",
                err
            );
            ActivityOutcome::Failed(err)
        }
    };

    ActivityResult {
        id: activity.id.clone(),
        date: activity.date,
        outcome,
        duration_ms: started.elapsed().as_millis(),
    }
}
