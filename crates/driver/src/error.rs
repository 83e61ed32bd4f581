use std::{error::Error as StdError, io, path::PathBuf};

use cosim_core::{EngineVariable, UnitError};

use crate::{config::ConfigError, instance::State};

/// Errors returned by a driver [`Instance`](crate::Instance).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("engine failed to initialize: {0}")]
    EngineInit(#[source] Box<dyn StdError + Send + Sync>),

    #[error("cannot advance from {current} s to {requested} s: {reason}")]
    InvalidTime {
        requested: f64,
        current: f64,
        reason: &'static str,
    },

    #[error("unknown variable `{0}`")]
    UnknownVariable(String),

    #[error("no variable at index {0}")]
    UnknownIndex(usize),

    #[error("variable `{0}` is an output and cannot be written")]
    Causality(String),

    #[error("variable `{0}` is declared more than once")]
    DuplicateBinding(String),

    #[error("cannot read `{name}`")]
    EngineRead {
        name: String,
        #[source]
        source: AccessError,
    },

    #[error("cannot write `{name}`")]
    EngineWrite {
        name: String,
        #[source]
        source: AccessError,
    },

    #[error("discrete states at {time} s did not settle within {iterations} iterations")]
    EventIterationOverflow { time: f64, iterations: usize },

    #[error("engine failed while advancing to {time} s")]
    EngineStep {
        time: f64,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("engine ended the simulation at {time} s")]
    EngineTerminated { time: f64 },

    #[error("engine failed to shut down: {0}")]
    EngineShutdown(#[source] Box<dyn StdError + Send + Sync>),

    #[error("`{operation}` is not allowed while the instance is {state}")]
    InvalidState {
        operation: &'static str,
        state: State,
    },

    #[error("cannot prepare working directory {path}")]
    WorkingDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Why a single variable access failed.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("the engine cannot resolve variables yet")]
    NotReady,

    #[error("the engine has no {0}")]
    Missing(EngineVariable),

    #[error(transparent)]
    Unit(#[from] UnitError),

    #[error("value {0} is not finite")]
    NonFinite(f64),

    #[error("engine error: {0}")]
    Engine(#[source] Box<dyn StdError + Send + Sync>),
}

impl Error {
    /// Returns `true` if the error leaves the instance unable to continue.
    ///
    /// After a fatal error the instance is [`State::Failed`] and only
    /// [`stop`](crate::Instance::stop) is accepted.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::EngineInit(_)
                | Self::EventIterationOverflow { .. }
                | Self::EngineStep { .. }
                | Self::EngineTerminated { .. }
        )
    }

    pub(crate) fn engine_init<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::EngineInit(Box::new(err))
    }

    pub(crate) fn engine_step<E: StdError + Send + Sync + 'static>(time: f64, err: E) -> Self {
        Self::EngineStep {
            time,
            source: Box::new(err),
        }
    }

    pub(crate) fn engine_shutdown<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::EngineShutdown(Box::new(err))
    }
}

impl AccessError {
    pub(crate) fn engine<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Engine(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_engine_failures_are_fatal() {
        assert!(Error::EventIterationOverflow {
            time: 0.0,
            iterations: 100
        }
        .is_fatal());
        assert!(Error::EngineTerminated { time: 60.0 }.is_fatal());
        assert!(Error::engine_step(10.0, io::Error::other("diverged")).is_fatal());

        assert!(!Error::UnknownVariable("x".into()).is_fatal());
        assert!(!Error::UnknownIndex(7).is_fatal());
        assert!(!Error::Causality("x".into()).is_fatal());
        assert!(
            !Error::InvalidTime {
                requested: 1.0,
                current: 2.0,
                reason: "time cannot move backward",
            }
            .is_fatal()
        );
    }

    #[test]
    fn messages_name_the_variable() {
        let err = Error::EngineRead {
            name: "Core_Zone_Lights_Output".into(),
            source: AccessError::NotReady,
        };
        assert_eq!(err.to_string(), "cannot read `Core_Zone_Lights_Output`");
    }
}
