use std::{io, path::PathBuf};

use ninterp::error::{InterpolateError, ValidateError};
use thiserror::Error;

/// Errors raised by the zone engine.
#[derive(Debug, Error)]
pub enum ZoneError {
    #[error("cannot read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed model: {0}")]
    Model(#[from] serde_json::Error),

    #[error("invalid model: {0}")]
    Invalid(String),

    #[error("schedule `{schedule}`: {reason}")]
    Schedule { schedule: String, reason: String },

    #[error("`{owner}` refers to unknown schedule `{schedule}`")]
    UnknownSchedule { owner: String, schedule: String },

    #[error("malformed weather data on line {line}: {reason}")]
    Weather { line: usize, reason: String },

    #[error(transparent)]
    Validation(#[from] ValidateError),

    #[error(transparent)]
    Interpolation(#[from] InterpolateError),

    #[error("engine is not initialized")]
    NotInitialized,

    #[error("no variable behind handle {0}")]
    Handle(usize),

    #[error("{0} is read-only")]
    ReadOnly(String),

    #[error("cannot step from {current} s to {requested} s with the next event at {next_event} s")]
    Step {
        requested: f64,
        current: f64,
        next_event: f64,
    },
}
