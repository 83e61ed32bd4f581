//! Event iteration at a single instant.
//!
//! When an engine reports pending discrete states, time must not move until
//! repeated updates bring it to a fixed point:
//!
//! ```text
//! repeat
//!     info = update_discrete_states()
//! until !info.discrete_states_pending
//! ```
//!
//! The loop is bounded; an engine that keeps asking for more updates is
//! treated as diverged.

use cosim_core::{Engine, EventInfo};

use crate::{Error, messages};

/// Default bound on discrete updates at one instant.
pub const MAX_EVENT_ITERATIONS: usize = 100;

/// The outcome of settling discrete states.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Settled {
    /// Event information from the final update, with `values_changed` set if
    /// any update changed values.
    pub(crate) event_info: EventInfo,

    /// Number of updates performed.
    pub(crate) iterations: usize,
}

/// Updates discrete states at `time` until the engine stops asking for more.
///
/// At least one update is always performed, so inputs written since the last
/// update take effect.
///
/// # Errors
///
/// Returns [`Error::EventIterationOverflow`] if states are still pending after
/// `max_iterations` updates, or [`Error::EngineStep`] if an update fails.
pub(crate) fn settle<E: Engine>(
    engine: &mut E,
    time: f64,
    max_iterations: usize,
) -> Result<Settled, Error> {
    let mut values_changed = false;

    for iteration in 1..=max_iterations {
        let info = engine
            .update_discrete_states()
            .map_err(|err| Error::engine_step(time, err))?;
        messages::forward(engine);
        values_changed |= info.values_changed;

        if !info.discrete_states_pending {
            tracing::trace!(time, iterations = iteration, "discrete states settled");
            return Ok(Settled {
                event_info: EventInfo {
                    values_changed,
                    ..info
                },
                iterations: iteration,
            });
        }
    }

    tracing::error!(time, max_iterations, "discrete states did not settle");
    Err(Error::EventIterationOverflow {
        time,
        iterations: max_iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use cosim_core::EngineSetup;
    use jiff::civil::Weekday;

    use crate::test_utils::{MockEngine, MockOptions, Probe};

    fn started(options: MockOptions, dir: &tempfile::TempDir) -> MockEngine {
        let mut engine = MockEngine::new(options, Probe::default());
        engine
            .initialize(&EngineSetup {
                instance_name: "resolver".into(),
                model: "mock.json".into(),
                environment: "mock.weather".into(),
                working_dir: dir.path().to_path_buf(),
                start_time: 0.0,
                stop_time: 3600.0,
                start_weekday: Weekday::Sunday,
            })
            .unwrap();
        engine
    }

    #[test]
    fn settles_after_the_required_passes() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = started(
            MockOptions {
                passes: 3,
                ..MockOptions::default()
            },
            &dir,
        );

        let info = engine.step_to(600.0).unwrap();
        assert!(info.discrete_states_pending);

        let settled = settle(&mut engine, 600.0, MAX_EVENT_ITERATIONS).unwrap();
        assert_eq!(settled.iterations, 3);
        assert!(!settled.event_info.discrete_states_pending);
        assert_eq!(settled.event_info.next_event_time, Some(1200.0));
    }

    #[test]
    fn always_updates_at_least_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = started(MockOptions::default(), &dir);

        let settled = settle(&mut engine, 0.0, MAX_EVENT_ITERATIONS).unwrap();
        assert_eq!(settled.iterations, 1);
    }

    #[test]
    fn overflows_when_states_never_settle() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = started(
            MockOptions {
                never_converge: true,
                ..MockOptions::default()
            },
            &dir,
        );

        let err = settle(&mut engine, 0.0, 5).unwrap_err();
        assert!(matches!(
            err,
            Error::EventIterationOverflow { iterations: 5, .. }
        ));
    }
}
