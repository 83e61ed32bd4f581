//! Time conventions shared by the driver and engines.
//!
//! Simulation time is measured in seconds from the start of the run period,
//! where `0.0` is midnight of the first simulated day.

use uom::si::{f64::Time, time};

/// Seconds in one simulated day.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Converts a (possibly fractional) day count into simulation seconds.
#[must_use]
pub fn days_to_seconds(day: f64) -> f64 {
    Time::new::<time::day>(day).get::<time::second>()
}

/// Splits simulation seconds into a whole day index and seconds into that day.
///
/// Negative times are clamped to the start of day zero.
#[must_use]
pub fn day_and_seconds(seconds: f64) -> (u64, f64) {
    let seconds = seconds.max(0.0);
    let day = (seconds / SECONDS_PER_DAY).floor();
    (day as u64, seconds - day * SECONDS_PER_DAY)
}
