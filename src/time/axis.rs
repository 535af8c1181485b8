//! Discrete time axis with linear bracketing.
//!
//! A [`TimeAxis`] holds strictly increasing UTC timestamps. Sampling a field
//! at an arbitrary time first brackets it between two axis entries and
//! returns the blend fraction ([`TimeBracket`]).
//!
//! Axes with zero or one entry are time-independent: every query maps to
//! index 0 with no blending, whatever the requested time.
//!
//! # CF time decoding
//!
//! NetCDF files store time as numbers plus a units string such as
//! `"hours since 2020-01-01 00:00:00"`. [`TimeAxis::from_cf`] decodes those.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

use crate::error::{FieldError, Result};

/// Bracketing result: `value = (1 - alpha) * v[lower] + alpha * v[upper]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeBracket {
    pub lower: usize,
    pub upper: usize,
    pub alpha: f64,
}

impl TimeBracket {
    /// A bracket that selects a single index.
    #[inline]
    pub const fn exact(index: usize) -> Self {
        Self {
            lower: index,
            upper: index,
            alpha: 0.0,
        }
    }

    /// Whether the second index contributes at all.
    #[inline]
    pub fn needs_blend(&self) -> bool {
        self.lower != self.upper && self.alpha != 0.0
    }
}

/// Ordered time coordinate of a field.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimeAxis {
    times: Vec<DateTime<Utc>>,
}

impl TimeAxis {
    /// Create a time axis.
    ///
    /// # Errors
    ///
    /// `InvalidTimeAxis` if timestamps are not strictly increasing.
    pub fn new(times: Vec<DateTime<Utc>>) -> Result<Self> {
        if let Some(i) = times.windows(2).position(|w| w[1] <= w[0]) {
            return Err(FieldError::InvalidTimeAxis(format!(
                "non-increasing time at index {}: {} after {}",
                i + 1,
                times[i + 1],
                times[i]
            )));
        }
        Ok(Self { times })
    }

    /// A time-independent axis with a single entry.
    pub fn constant() -> Self {
        Self {
            times: vec![DateTime::<Utc>::UNIX_EPOCH],
        }
    }

    /// An axis with no entries (field has no time dimension).
    pub fn empty() -> Self {
        Self { times: Vec::new() }
    }

    /// Decode CF-style numeric times (`"<unit> since <epoch>"`).
    pub fn from_cf(values: &[f64], units: &str) -> Result<Self> {
        let (step, epoch) = parse_cf_units(units)?;
        let times = values
            .iter()
            .map(|&v| {
                let ms = (v * step * 1000.0).round();
                (ms.is_finite() && ms.abs() < i64::MAX as f64)
                    .then(|| Duration::try_milliseconds(ms as i64))
                    .flatten()
                    .and_then(|offset| epoch.checked_add_signed(offset))
                    .ok_or_else(|| {
                        FieldError::InvalidTimeAxis(format!("time value {} {} is out of range", v, units))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(times)
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Whether the axis has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Whether every query maps to the same index.
    #[inline]
    pub fn is_constant(&self) -> bool {
        self.times.len() <= 1
    }

    /// Timestamps.
    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    /// First timestamp.
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.times.first().copied()
    }

    /// Last timestamp.
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.times.last().copied()
    }

    /// Exact index of a timestamp, if present.
    pub fn index_of(&self, time: DateTime<Utc>) -> Option<usize> {
        self.times.binary_search(&time).ok()
    }

    /// Whether `time` lies inside `[start, end]`. Constant axes cover all times.
    pub fn covers(&self, time: DateTime<Utc>) -> bool {
        match (self.start(), self.end()) {
            _ if self.is_constant() => true,
            (Some(s), Some(e)) => s <= time && time <= e,
            _ => true,
        }
    }

    /// Whether two axes share any part of their range.
    pub fn overlaps(&self, other: &TimeAxis) -> bool {
        if self.is_constant() || other.is_constant() {
            return true;
        }
        match (self.start(), self.end(), other.start(), other.end()) {
            (Some(a0), Some(a1), Some(b0), Some(b1)) => a0 <= b1 && b0 <= a1,
            _ => true,
        }
    }

    /// Locate the two entries bracketing `time`.
    ///
    /// Outside the axis range the result is clamped to the nearest end when
    /// `extrapolate` is set, and `TimeOutOfRange` otherwise.
    pub fn bracket(&self, time: DateTime<Utc>, extrapolate: bool) -> Result<TimeBracket> {
        if self.is_constant() {
            return Ok(TimeBracket::exact(0));
        }
        let n = self.times.len();
        let (first, last) = (self.times[0], self.times[n - 1]);

        if time < first || time > last {
            if !extrapolate {
                return Err(FieldError::TimeOutOfRange {
                    time,
                    start: first,
                    end: last,
                });
            }
            return Ok(TimeBracket::exact(if time < first { 0 } else { n - 1 }));
        }

        // First index strictly after `time`
        let upper = self.times.partition_point(|&t| t <= time);
        if upper == 0 {
            return Ok(TimeBracket::exact(0));
        }
        let lower = upper - 1;
        if upper == n || self.times[lower] == time {
            return Ok(TimeBracket::exact(lower));
        }

        let t0 = self.times[lower];
        let t1 = self.times[upper];
        let alpha = seconds_between(t0, time) / seconds_between(t0, t1);
        Ok(TimeBracket {
            lower,
            upper,
            alpha,
        })
    }
}

/// Signed seconds from `a` to `b`.
#[inline]
pub fn seconds_between(a: DateTime<Utc>, b: DateTime<Utc>) -> f64 {
    (b - a).num_milliseconds() as f64 / 1000.0
}

fn parse_cf_units(units: &str) -> Result<(f64, DateTime<Utc>)> {
    let bad = || FieldError::InvalidTimeAxis(format!("cannot decode time units '{}'", units));

    let (unit, epoch) = units.split_once(" since ").ok_or_else(bad)?;
    let step = match unit.trim().to_ascii_lowercase().as_str() {
        "seconds" | "second" | "secs" | "sec" | "s" => 1.0,
        "minutes" | "minute" | "mins" | "min" => 60.0,
        "hours" | "hour" | "hrs" | "hr" | "h" => 3600.0,
        "days" | "day" | "d" => 86400.0,
        _ => return Err(bad()),
    };

    let epoch = epoch.trim().trim_end_matches(" UTC").trim_end_matches('Z');
    if let Ok(dt) = DateTime::parse_from_rfc3339(epoch) {
        return Ok((step, dt.with_timezone(&Utc)));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(epoch, fmt) {
            return Ok((step, naive.and_utc()));
        }
    }
    let date = NaiveDate::parse_from_str(epoch, "%Y-%m-%d").map_err(|_| bad())?;
    let naive = date.and_hms_opt(0, 0, 0).ok_or_else(bad)?;
    Ok((step, naive.and_utc()))
}
