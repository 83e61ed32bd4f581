//! Hourly outdoor dry-bulb temperatures.
//!
//! The environment file lists one temperature in °C per line, starting at
//! hour zero of the run. Blank lines and lines starting with `#` are ignored.
//! Values between hours are interpolated linearly, and the series repeats once
//! it runs out.

use std::{fmt, fs, path::Path};

use ndarray::Array1;
use ninterp::prelude::{Interp1DOwned, Interpolator};

use crate::ZoneError;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Outdoor conditions over the run.
pub struct Weather {
    hours: usize,
    drybulb: Interp1DOwned<f64, ninterp::strategy::Linear>,
}

impl Weather {
    /// Reads an environment file.
    ///
    /// # Errors
    ///
    /// Returns a [`ZoneError`] if the file cannot be read or holds malformed
    /// values.
    pub fn from_file(path: &Path) -> Result<Self, ZoneError> {
        let text = fs::read_to_string(path).map_err(|source| ZoneError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parses environment data.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Weather`] if a line is not a finite number or no
    /// values are present.
    pub fn parse(text: &str) -> Result<Self, ZoneError> {
        let mut values = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let value: f64 = line.parse().map_err(|_| ZoneError::Weather {
                line: index + 1,
                reason: format!("`{line}` is not a number"),
            })?;
            if !value.is_finite() {
                return Err(ZoneError::Weather {
                    line: index + 1,
                    reason: "temperature must be finite".into(),
                });
            }
            values.push(value);
        }
        Self::from_hourly(values)
    }

    /// Builds weather from hourly dry-bulb temperatures in °C.
    ///
    /// # Errors
    ///
    /// Returns a [`ZoneError`] if `values` is empty.
    pub fn from_hourly(mut values: Vec<f64>) -> Result<Self, ZoneError> {
        let Some(&first) = values.first() else {
            return Err(ZoneError::Weather {
                line: 0,
                reason: "no temperatures found".into(),
            });
        };
        let hours = values.len();

        // Close the cycle so the last hour interpolates toward the first.
        values.push(first);
        let x = Array1::from_iter((0..=hours).map(|hour| hour as f64));
        let drybulb = Interp1DOwned::new(
            x,
            Array1::from_vec(values),
            ninterp::strategy::Linear,
            ninterp::interpolator::Extrapolate::Clamp,
        )?;

        Ok(Self { hours, drybulb })
    }

    /// Number of hourly values before the series repeats.
    #[must_use]
    pub fn hours(&self) -> usize {
        self.hours
    }

    /// Returns the outdoor dry-bulb temperature in °C at simulation time
    /// `time` seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Interpolation`] if interpolation fails.
    pub fn drybulb(&self, time: f64) -> Result<f64, ZoneError> {
        let hour = (time.max(0.0) / SECONDS_PER_HOUR) % self.hours as f64;
        Ok(self.drybulb.interpolate(&[hour])?)
    }
}

impl fmt::Debug for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Weather")
            .field("hours", &self.hours)
            .finish_non_exhaustive()
    }
}
