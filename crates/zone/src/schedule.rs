mod step;

use jiff::civil::{Time, Weekday};

use cosim_core::time::{SECONDS_PER_DAY, day_and_seconds};

use crate::{ZoneError, model::ScheduleSpec};

pub use step::{EmptyRangeError, Step};

/// Threshold below which [`DailyProfile::value_at`] uses linear search.
const LINEAR_SEARCH_THRESHOLD: usize = 32;

/// Seconds in one day, as the exclusive end of the last step.
const DAY_END: u32 = 86_400;

/// Values over one day, as contiguous steps covering `[0, 86400)` seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyProfile {
    steps: Vec<Step>,
}

impl DailyProfile {
    /// Builds a profile from `(from, value)` entries.
    ///
    /// Each value holds from its time of day until the next entry's, and the
    /// last holds until midnight.
    ///
    /// # Errors
    ///
    /// Returns a reason if the entries do not start at midnight or two entries
    /// share a time.
    pub fn new(entries: impl IntoIterator<Item = (Time, f64)>) -> Result<Self, String> {
        let mut entries: Vec<(u32, f64)> = entries
            .into_iter()
            .map(|(time, value)| (seconds_of_day(time), value))
            .collect();
        entries.sort_by_key(|&(start, _)| start);

        match entries.first() {
            Some((0, _)) => {}
            Some(_) => return Err("first entry must start at 00:00:00".into()),
            None => return Err("profile has no entries".into()),
        }

        let ends = entries
            .iter()
            .skip(1)
            .map(|&(start, _)| start)
            .chain(std::iter::once(DAY_END));
        let steps = entries
            .iter()
            .zip(ends)
            .map(|(&(start, value), end)| {
                Step::new(start..end, value).map_err(|err| err.to_string())
            })
            .collect::<Result<_, _>>()?;

        Ok(Self { steps })
    }

    /// Returns the value at `seconds` past midnight.
    #[must_use]
    pub fn value_at(&self, seconds: f64) -> f64 {
        let second = seconds.clamp(0.0, f64::from(DAY_END - 1)).floor() as u32;
        if self.steps.len() < LINEAR_SEARCH_THRESHOLD {
            self.steps
                .iter()
                .find(|step| step.contains(second))
                .map_or(0.0, Step::value)
        } else {
            self.steps
                .binary_search_by(|step| step.cmp_to_time(second))
                .map_or(0.0, |index| self.steps[index].value())
        }
    }

    /// Returns the first step start strictly after `seconds` past midnight.
    #[must_use]
    pub fn next_change_after(&self, seconds: f64) -> Option<f64> {
        self.steps
            .iter()
            .map(|step| f64::from(step.start()))
            .find(|&start| start > seconds)
    }
}

/// A named schedule with separate weekday and weekend profiles.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    name: String,
    weekday: DailyProfile,
    weekend: Option<DailyProfile>,
}

impl Schedule {
    /// Builds a schedule from its model definition.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Schedule`] if either profile is malformed.
    pub fn from_spec(spec: &ScheduleSpec) -> Result<Self, ZoneError> {
        let profile = |entries: &[crate::model::ProfileEntry]| {
            DailyProfile::new(entries.iter().map(|entry| (entry.from, entry.value))).map_err(
                |reason| ZoneError::Schedule {
                    schedule: spec.name.clone(),
                    reason,
                },
            )
        };

        Ok(Self {
            name: spec.name.clone(),
            weekday: profile(&spec.weekday)?,
            weekend: spec.weekend.as_deref().map(profile).transpose()?,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value at simulation time `time` for a run starting on
    /// `start`.
    #[must_use]
    pub fn value_at(&self, time: f64, start: Weekday) -> f64 {
        let (day, seconds) = day_and_seconds(time);
        self.profile(day, start).value_at(seconds)
    }

    /// Returns the first simulation time after `time` at which the value may
    /// change: a step boundary or the next midnight.
    #[must_use]
    pub fn next_change_after(&self, time: f64, start: Weekday) -> f64 {
        let (day, seconds) = day_and_seconds(time);
        let midnight = (day as f64) * SECONDS_PER_DAY;
        match self.profile(day, start).next_change_after(seconds) {
            Some(change) => midnight + change,
            None => midnight + SECONDS_PER_DAY,
        }
    }

    fn profile(&self, day: u64, start: Weekday) -> &DailyProfile {
        match &self.weekend {
            Some(weekend) if is_weekend(day, start) => weekend,
            _ => &self.weekday,
        }
    }
}

/// Returns `true` if simulated day `day` falls on a Saturday or Sunday.
fn is_weekend(day: u64, start: Weekday) -> bool {
    let offset = match start {
        Weekday::Monday => 0,
        Weekday::Tuesday => 1,
        Weekday::Wednesday => 2,
        Weekday::Thursday => 3,
        Weekday::Friday => 4,
        Weekday::Saturday => 5,
        Weekday::Sunday => 6,
    };
    (offset + day) % 7 >= 5
}

fn seconds_of_day(time: Time) -> u32 {
    let hour = u32::try_from(time.hour()).unwrap_or(0);
    let minute = u32::try_from(time.minute()).unwrap_or(0);
    let second = u32::try_from(time.second()).unwrap_or(0);
    hour * 3600 + minute * 60 + second
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::civil::time;

    use crate::model::ProfileEntry;

    fn lighting() -> Schedule {
        Schedule::from_spec(&ScheduleSpec {
            name: "Lighting".into(),
            weekday: vec![
                ProfileEntry {
                    from: time(0, 0, 0, 0),
                    value: 0.05,
                },
                ProfileEntry {
                    from: time(7, 0, 0, 0),
                    value: 0.9,
                },
                ProfileEntry {
                    from: time(19, 0, 0, 0),
                    value: 0.3,
                },
            ],
            weekend: Some(vec![ProfileEntry {
                from: time(0, 0, 0, 0),
                value: 0.05,
            }]),
        })
        .unwrap()
    }

    #[test]
    fn steps_are_half_open() {
        let schedule = lighting();
        let seven = 7.0 * 3600.0;

        assert_eq!(schedule.value_at(0.0, Weekday::Monday), 0.05);
        assert_eq!(schedule.value_at(seven - 1.0, Weekday::Monday), 0.05);
        assert_eq!(schedule.value_at(seven, Weekday::Monday), 0.9);
        assert_eq!(schedule.value_at(19.0 * 3600.0, Weekday::Monday), 0.3);
    }

    #[test]
    fn weekends_use_their_own_profile() {
        let schedule = lighting();
        let noon = 12.0 * 3600.0;

        // A run starting on Friday reaches Saturday on day 1.
        assert_eq!(schedule.value_at(noon, Weekday::Friday), 0.9);
        assert_eq!(schedule.value_at(SECONDS_PER_DAY + noon, Weekday::Friday), 0.05);
        assert_eq!(schedule.value_at(2.0 * SECONDS_PER_DAY + noon, Weekday::Friday), 0.05);
        assert_eq!(schedule.value_at(3.0 * SECONDS_PER_DAY + noon, Weekday::Friday), 0.9);
    }

    #[test]
    fn reports_next_change() {
        let schedule = lighting();

        assert_eq!(schedule.next_change_after(0.0, Weekday::Monday), 7.0 * 3600.0);
        assert_eq!(schedule.next_change_after(7.0 * 3600.0, Weekday::Monday), 19.0 * 3600.0);
        assert_eq!(schedule.next_change_after(20.0 * 3600.0, Weekday::Monday), SECONDS_PER_DAY);
        assert_eq!(
            schedule.next_change_after(SECONDS_PER_DAY, Weekday::Friday),
            2.0 * SECONDS_PER_DAY
        );
    }

    #[test]
    fn profiles_must_start_at_midnight() {
        let err = DailyProfile::new([(time(6, 0, 0, 0), 1.0)]).unwrap_err();
        assert!(err.contains("00:00:00"));
    }

    #[test]
    fn duplicate_entries_are_rejected() {
        assert!(DailyProfile::new([(time(0, 0, 0, 0), 1.0), (time(0, 0, 0, 0), 2.0)]).is_err());
    }
}
