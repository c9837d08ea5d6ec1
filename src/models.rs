use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{PowerCurveError, Result};

/// Seconds between the Unix epoch and the FIT epoch (1989-12-31T00:00:00Z)
pub const FIT_EPOCH_OFFSET: i64 = 631_065_600;

/// Convert a FIT timestamp to a UTC date-time
pub fn fit_timestamp_to_utc(timestamp: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp + FIT_EPOCH_OFFSET, 0)
}

/// One decoded `record` message: seconds since the FIT epoch and instantaneous power
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSample {
    pub timestamp: i64,
    pub power: Option<u16>,
}

impl RawSample {
    pub fn new(timestamp: i64, power: Option<u16>) -> Self {
        Self { timestamp, power }
    }
}

/// Gap-free run of 1 Hz power values; the offset of a value is its index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuousSegment {
    powers: Vec<u16>,
}

impl ContinuousSegment {
    /// Build a segment; an empty run is not a segment
    pub fn new(powers: Vec<u16>) -> Option<Self> {
        if powers.is_empty() {
            None
        } else {
            Some(Self { powers })
        }
    }

    pub fn len(&self) -> usize {
        self.powers.len()
    }

    /// Always false for a constructed segment
    pub fn is_empty(&self) -> bool {
        self.powers.is_empty()
    }

    pub fn powers(&self) -> &[u16] {
        &self.powers
    }

    /// `(offset_seconds, power)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (u32, u16)> + '_ {
        self.powers
            .iter()
            .enumerate()
            .map(|(offset, &power)| (offset as u32, power))
    }
}

/// Best average power per duration for a single activity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityPowerCurve {
    best: BTreeMap<u32, f64>,
}

impl ActivityPowerCurve {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a candidate value, keeping the larger of old and new
    pub fn offer(&mut self, duration_seconds: u32, watts: f64) {
        offer_max(&mut self.best, duration_seconds, watts);
    }

    pub fn get(&self, duration_seconds: u32) -> Option<f64> {
        self.best.get(&duration_seconds).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }

    pub fn len(&self) -> usize {
        self.best.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.best.iter().map(|(&d, &w)| (d, w))
    }
}

impl FromIterator<(u32, f64)> for ActivityPowerCurve {
    fn from_iter<I: IntoIterator<Item = (u32, f64)>>(iter: I) -> Self {
        let mut curve = Self::new();
        for (duration, watts) in iter {
            curve.offer(duration, watts);
        }
        curve
    }
}

/// Pointwise maximum of activity curves over a request's qualifying activities
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatePowerCurve {
    best: BTreeMap<u32, f64>,
}

impl AggregatePowerCurve {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one activity into the aggregate
    pub fn absorb(&mut self, curve: &ActivityPowerCurve) {
        for (duration, watts) in curve.iter() {
            offer_max(&mut self.best, duration, watts);
        }
    }

    /// Combine two partial aggregates; commutative and associative
    pub fn merge(mut self, other: AggregatePowerCurve) -> AggregatePowerCurve {
        for (duration, watts) in other.best {
            offer_max(&mut self.best, duration, watts);
        }
        self
    }

    pub fn get(&self, duration_seconds: u32) -> Option<f64> {
        self.best.get(&duration_seconds).copied()
    }

    /// An empty aggregate is the valid "no qualifying data" outcome
    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }

    pub fn len(&self) -> usize {
        self.best.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.best.iter().map(|(&d, &w)| (d, w))
    }
}

fn offer_max(best: &mut BTreeMap<u32, f64>, duration_seconds: u32, watts: f64) {
    best.entry(duration_seconds)
        .and_modify(|current| {
            if watts > *current {
                *current = watts;
            }
        })
        .or_insert(watts);
}

/// Inclusive calendar date range; construction rejects `start > end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(PowerCurveError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parse two `YYYY-MM-DD` strings
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
                PowerCurveError::Configuration(format!(
                    "Invalid date format '{}'. Use YYYY-MM-DD",
                    s
                ))
            })
        };
        Self::new(parse(start)?, parse(end)?)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Check if a date falls within this range, both ends inclusive
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// One stored activity as handed over by the storage collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityFile {
    pub id: String,
    pub owner: String,
    pub date: NaiveDate,
    pub bytes: Vec<u8>,
}

impl ActivityFile {
    pub fn new(
        id: impl Into<String>,
        owner: impl Into<String>,
        date: NaiveDate,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            id: id.into(),
            owner: owner.into(),
            date,
            bytes,
        }
    }
}
