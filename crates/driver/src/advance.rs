//! Event-aware time advancement.
//!
//! The driver moves an engine from its current time to a requested target
//! without ever stepping across an event:
//!
//! 1. If inputs changed or discrete states are pending, settle them at the
//!    current time first.
//! 2. While the target has not been reached:
//!    - Compute the boundary: the next event time, or the target if no event
//!      comes earlier.
//!    - Step the engine's continuous state to the boundary.
//!    - If the engine reports pending discrete states, settle them.
//! 3. Land exactly on the target.
//!
//! An engine that keeps reporting events at or before the current time
//! without time moving is treated like a diverged event iteration.

use cosim_core::{Engine, EventInfo};

use crate::{Error, messages, resolver};

/// The result of advancing to a target time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Advance {
    /// The time reached, always equal to the requested target.
    pub(crate) time: f64,

    /// Event information after the last step or update.
    pub(crate) event_info: EventInfo,

    /// Number of continuous steps taken.
    pub(crate) steps: usize,

    /// Number of instants at which discrete states were settled.
    pub(crate) events: usize,
}

/// Advances `engine` from `from` to `target`.
///
/// `last` is the event information the engine reported most recently, and
/// `inputs_changed` signals that inputs were written since the last update.
///
/// # Errors
///
/// Returns [`Error::EventIterationOverflow`] if discrete states fail to
/// settle, [`Error::EngineTerminated`] if the engine ends the run before the
/// target, or [`Error::EngineStep`] if the engine fails.
pub(crate) fn advance<E: Engine>(
    engine: &mut E,
    from: f64,
    target: f64,
    last: EventInfo,
    inputs_changed: bool,
    max_iterations: usize,
) -> Result<Advance, Error> {
    let mut time = from;
    let mut info = last;
    let mut steps = 0;
    let mut events = 0;

    if inputs_changed || info.discrete_states_pending {
        info = resolver::settle(engine, time, max_iterations)?.event_info;
        events += 1;
    }

    let mut stalls = 0;
    while time < target {
        if info.terminate_requested {
            tracing::warn!(time, target, "engine requested termination");
            return Err(Error::EngineTerminated { time });
        }

        let boundary = info.boundary(target);
        if boundary <= time {
            stalls += 1;
            if stalls > max_iterations {
                return Err(Error::EventIterationOverflow {
                    time,
                    iterations: max_iterations,
                });
            }
            info = resolver::settle(engine, time, max_iterations)?.event_info;
            events += 1;
            continue;
        }
        stalls = 0;

        info = engine
            .step_to(boundary)
            .map_err(|err| Error::engine_step(boundary, err))?;
        messages::forward(engine);
        steps += 1;
        time = boundary;

        if info.discrete_states_pending {
            info = resolver::settle(engine, time, max_iterations)?.event_info;
            events += 1;
        }
    }

    tracing::debug!(from, to = target, steps, events, "advanced");
    Ok(Advance {
        time: target,
        event_info: info,
        steps,
        events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use cosim_core::{EngineSetup, Handle};
    use jiff::civil::Weekday;

    use crate::{
        resolver::MAX_EVENT_ITERATIONS,
        test_utils::{MockEngine, MockOptions, Probe},
    };

    const SIGNAL: Handle = Handle(0);
    const TICKS: Handle = Handle(1);
    const GAIN: Handle = Handle(2);

    fn started(options: MockOptions, dir: &tempfile::TempDir) -> (MockEngine, EventInfo, Probe) {
        let probe = Probe::default();
        let mut engine = MockEngine::new(options, probe.clone());
        let info = engine
            .initialize(&EngineSetup {
                instance_name: "advance".into(),
                model: "mock.json".into(),
                environment: "mock.weather".into(),
                working_dir: dir.path().to_path_buf(),
                start_time: 0.0,
                stop_time: 86_400.0,
                start_weekday: Weekday::Sunday,
            })
            .unwrap();
        (engine, info, probe)
    }

    #[test]
    fn steps_stop_at_every_event() {
        let dir = tempfile::tempdir().unwrap();
        let (mut engine, info, probe) = started(MockOptions::default(), &dir);

        let result = advance(&mut engine, 0.0, 1500.0, info, false, MAX_EVENT_ITERATIONS).unwrap();

        assert_eq!(result.time, 1500.0);
        assert_eq!(result.steps, 3);
        assert_eq!(result.events, 2);
        assert_eq!(probe.steps(), [600.0, 1200.0, 1500.0]);
        assert_eq!(result.event_info.next_event_time, Some(1800.0));
        assert_relative_eq!(engine.read(TICKS).unwrap(), 2.0);
    }

    #[test]
    fn lands_exactly_on_an_event_time() {
        let dir = tempfile::tempdir().unwrap();
        let (mut engine, info, _probe) = started(MockOptions::default(), &dir);

        let result = advance(&mut engine, 0.0, 1200.0, info, false, MAX_EVENT_ITERATIONS).unwrap();

        assert_eq!(result.time, 1200.0);
        assert_eq!(engine.time(), 1200.0);
        assert!(!result.event_info.discrete_states_pending);
        assert_relative_eq!(engine.read(TICKS).unwrap(), 2.0);
    }

    #[test]
    fn zero_length_advance_applies_written_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let (mut engine, info, probe) = started(MockOptions::default(), &dir);

        engine.write(GAIN, 4.0).unwrap();
        assert_relative_eq!(engine.read(SIGNAL).unwrap(), 1000.0);

        let result = advance(&mut engine, 0.0, 0.0, info, true, MAX_EVENT_ITERATIONS).unwrap();

        assert_eq!(result.steps, 0);
        assert_eq!(result.events, 1);
        assert!(probe.steps().is_empty());
        assert_relative_eq!(engine.read(SIGNAL).unwrap(), 4000.0);
    }

    #[test]
    fn unchanged_inputs_skip_the_initial_update() {
        let dir = tempfile::tempdir().unwrap();
        let (mut engine, info, _probe) = started(MockOptions::default(), &dir);

        let result = advance(&mut engine, 0.0, 0.0, info, false, MAX_EVENT_ITERATIONS).unwrap();
        assert_eq!(result.events, 0);
    }

    #[test]
    fn non_settling_engine_overflows() {
        let dir = tempfile::tempdir().unwrap();
        let options = MockOptions {
            never_converge: true,
            ..MockOptions::default()
        };
        let (mut engine, info, _probe) = started(options, &dir);

        let err = advance(&mut engine, 0.0, 600.0, info, false, 10).unwrap_err();
        assert!(matches!(
            err,
            Error::EventIterationOverflow { iterations: 10, .. }
        ));
    }

    #[test]
    fn engine_termination_before_target_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let options = MockOptions {
            terminate_at: Some(1200.0),
            ..MockOptions::default()
        };
        let (mut engine, info, _probe) = started(options, &dir);

        let err = advance(&mut engine, 0.0, 3000.0, info, false, MAX_EVENT_ITERATIONS).unwrap_err();
        assert!(matches!(err, Error::EngineTerminated { time } if time == 1200.0));
    }
}
