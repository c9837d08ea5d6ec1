//! Duration grid
//!
//! The set of window lengths (seconds) a power curve is evaluated at. The grid
//! is built once per engine and shared read-only by every worker.

use serde::{Deserialize, Serialize};

use crate::error::{PowerCurveError, Result};

/// Sparse 31-point checkpoint grid
const LEGACY_DURATIONS: &[u32] = &[
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 12, 15, 20, 30, 45, 60, 75, 90, 120, 150, 180, 240, 300, 420,
    600, 900, 1200, 1800, 2700, 3600, 5400,
];

/// Grid selection as it appears in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridPolicy {
    /// Every second to 1 min, then physiological checkpoints to 90 min
    Standard,
    /// Coarser 31-point checkpoint list
    Legacy,
    /// Explicit, strictly increasing list
    Custom(Vec<u32>),
}

impl Default for GridPolicy {
    fn default() -> Self {
        GridPolicy::Standard
    }
}

impl GridPolicy {
    pub fn build(&self) -> Result<DurationGrid> {
        match self {
            GridPolicy::Standard => Ok(DurationGrid::standard()),
            GridPolicy::Legacy => Ok(DurationGrid::legacy()),
            GridPolicy::Custom(durations) => DurationGrid::from_durations(durations.clone()),
        }
    }
}

/// Strictly increasing, positive durations in seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DurationGrid {
    durations: Vec<u32>,
}

impl DurationGrid {
    /// 1..=60 s, 90 s, 120 s, every minute to 10 min, every 5 min to 30 min,
    /// every 10 min to 90 min
    pub fn standard() -> Self {
        let durations = (1..=60)
            .chain([90, 120])
            .chain((180..=600).step_by(60))
            .chain((900..=1800).step_by(300))
            .chain((2400..=5400).step_by(600))
            .collect();
        Self { durations }
    }

    pub fn legacy() -> Self {
        Self {
            durations: LEGACY_DURATIONS.to_vec(),
        }
    }

    /// Validate a caller-supplied grid
    pub fn from_durations(durations: Vec<u32>) -> Result<Self> {
        if durations.is_empty() {
            return Err(PowerCurveError::InvalidGrid {
                reason: "grid is empty".to_string(),
            });
        }
        if durations.first() == Some(&0) {
            return Err(PowerCurveError::InvalidGrid {
                reason: "durations must be positive".to_string(),
            });
        }
        if let Some(pair) = durations.windows(2).find(|w| w[0] >= w[1]) {
            return Err(PowerCurveError::InvalidGrid {
                reason: format!(
                    "durations must be strictly increasing ({} followed by {})",
                    pair[0], pair[1]
                ),
            });
        }
        Ok(Self { durations })
    }

    pub fn durations(&self) -> &[u32] {
        &self.durations
    }

    pub fn len(&self) -> usize {
        self.durations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    /// Longest duration in the grid
    pub fn max_duration(&self) -> u32 {
        self.durations.last().copied().unwrap_or(0)
    }

    /// Durations not longer than `len` seconds
    pub fn up_to(&self, len: usize) -> &[u32] {
        let end = self.durations.partition_point(|&d| d as usize <= len);
        &self.durations[..end]
    }
}

impl Default for DurationGrid {
    fn default() -> Self {
        Self::standard()
    }
}
