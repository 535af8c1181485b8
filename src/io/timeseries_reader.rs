//! Reader for station velocity time series (wind or current records).
//!
//! # File Format
//!
//! ```text
//! # name: Station 46001
//! # units: knots
//! # columns: time speed direction(deg from)
//! 2024-03-01T00:00:00Z 10.0 270.0
//! 2024-03-01T06:00:00Z 12.5 280.0
//! ```
//!
//! Times are ISO 8601 (UTC assumed without an offset) and must be strictly
//! increasing. Directions are degrees clockwise from north, where the flow
//! comes from. Units default to `m/s`.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{FieldError, Result};
use crate::field::{SpeedDirection, VelocityTimeSeries};

fn parse_error(line: usize, message: impl Into<String>) -> FieldError {
    FieldError::Parse {
        line,
        message: message.into(),
    }
}

fn parse_time(token: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(token) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(token, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Incremental parser shared by the file and string entry points.
#[derive(Default)]
struct Parser {
    name: Option<String>,
    units: Option<String>,
    records: Vec<SpeedDirection>,
}

impl Parser {
    fn line(&mut self, line_num: usize, line: &str) -> Result<()> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }

        if line.starts_with('#') {
            let comment = line.trim_start_matches('#').trim();
            if let Some(units) = comment.strip_prefix("units:") {
                self.units = Some(units.trim().to_string());
            } else if let Some(name) = comment.strip_prefix("name:") {
                self.name = Some(name.trim().to_string());
            }
            return Ok(());
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 3 {
            return Err(parse_error(line_num, "Expected: time speed direction"));
        }
        let time = parse_time(parts[0]).ok_or_else(|| parse_error(line_num, "Invalid time"))?;
        let speed: f64 = parts[1]
            .parse()
            .map_err(|_| parse_error(line_num, "Invalid speed"))?;
        let direction: f64 = parts[2]
            .parse()
            .map_err(|_| parse_error(line_num, "Invalid direction"))?;

        if let Some(prev) = self.records.last() {
            if time <= prev.time {
                return Err(parse_error(line_num, "Non-monotonic time"));
            }
        }
        self.records.push(SpeedDirection {
            time,
            speed,
            direction,
        });
        Ok(())
    }

    fn finish(self) -> Result<VelocityTimeSeries> {
        if self.records.is_empty() {
            return Err(parse_error(0, "Time series contains no data"));
        }
        let name = self.name.unwrap_or_else(|| "velocity".to_string());
        let units = self.units.unwrap_or_else(|| "m/s".to_string());
        tracing::debug!(%name, %units, n_records = self.records.len(), "parsed velocity time series");
        VelocityTimeSeries::from_speed_direction(name, units, &self.records)
    }
}

/// Read a velocity time series file.
pub fn read_velocity_file(path: &Path) -> Result<VelocityTimeSeries> {
    let reader = BufReader::new(File::open(path)?);
    let mut parser = Parser::default();
    for (line_num, line) in reader.lines().enumerate() {
        parser.line(line_num + 1, &line?)?;
    }
    parser.finish()
}

/// Parse a velocity time series from a string.
pub fn parse_velocity_timeseries(content: &str) -> Result<VelocityTimeSeries> {
    let mut parser = Parser::default();
    for (line_num, line) in content.lines().enumerate() {
        parser.line(line_num + 1, line)?;
    }
    parser.finish()
}

/// Write a velocity time series in the same format.
pub fn write_velocity_file(path: &Path, series: &VelocityTimeSeries) -> Result<()> {
    let mut file = File::create(path)?;
    writeln!(file, "# name: {}", series.name())?;
    writeln!(file, "# units: {}", series.units())?;
    writeln!(file, "# columns: time speed direction")?;
    for r in series.to_speed_direction() {
        writeln!(
            file,
            "{} {:.6} {:.4}",
            r.time.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            r.speed,
            r.direction
        )?;
    }
    Ok(())
}
