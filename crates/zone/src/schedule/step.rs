use std::{cmp::Ordering, ops::Range};

use thiserror::Error;

/// A value held over a non-empty, half-open range of seconds `[start, end)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    range: Range<u32>,
    value: f64,
}

/// Error returned when attempting to create a [`Step`] with an empty range.
#[derive(Debug, Error)]
#[error("empty range: start ({start}) >= end ({end})")]
pub struct EmptyRangeError {
    pub start: u32,
    pub end: u32,
}

impl Step {
    /// Creates a step holding `value` over `range`.
    ///
    /// # Errors
    ///
    /// Returns an [`EmptyRangeError`] if the range is empty.
    pub fn new(range: Range<u32>, value: f64) -> Result<Self, EmptyRangeError> {
        if range.is_empty() {
            Err(EmptyRangeError {
                start: range.start,
                end: range.end,
            })
        } else {
            Ok(Self { range, value })
        }
    }

    #[must_use]
    pub fn start(&self) -> u32 {
        self.range.start
    }

    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    #[must_use]
    pub fn contains(&self, second: u32) -> bool {
        self.range.contains(&second)
    }

    /// Returns how this step's range relates to `second`, for binary search.
    ///
    /// - [`Ordering::Less`] if the step ends at or before `second`
    /// - [`Ordering::Greater`] if the step starts after `second`
    /// - [`Ordering::Equal`] if `second` is within the step's range
    #[must_use]
    pub fn cmp_to_time(&self, second: u32) -> Ordering {
        if self.range.end <= second {
            Ordering::Less
        } else if self.range.start > second {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_ranges() {
        let err = Step::new(3600..3600, 1.0).unwrap_err();
        assert_eq!(err.start, 3600);
        assert_eq!(err.end, 3600);
    }

    #[test]
    fn compares_to_time() {
        let step = Step::new(10..20, 0.5).unwrap();
        assert_eq!(step.cmp_to_time(5), Ordering::Greater);
        assert_eq!(step.cmp_to_time(10), Ordering::Equal);
        assert_eq!(step.cmp_to_time(20), Ordering::Less);
        assert!(!step.contains(20));
    }
}
