//! A co-simulation driver for an embedded building energy engine.
//!
//! The driver wraps an [`Engine`](cosim_core::Engine) in a small lifecycle
//! API built around exact, event-aware time advancement:
//!
//! - [`Instance`]: create, start, advance, exchange values, and stop one run
//! - [`Configuration`]: the JSON document naming engine files and bindings
//! - [`Registry`] and [`VariableBinding`]: external names mapped to engine data
//! - [`Runtime`]: the process-wide, once-only engine runtime initialization
//!
//! Time never moves past an engine event without processing it, inputs take
//! effect at the next call to [`Instance::set_time`], and every run's working
//! directory and engine are released exactly once.

mod advance;
mod bridge;
mod config;
mod error;
mod instance;
mod messages;
mod registry;
mod resolver;
mod resources;
mod runtime;

#[cfg(test)]
mod test_utils;

pub use config::{
    ConfigError, Configuration, EmsActuator, EngineFiles, ModelBindings, OutputVariable, RunPeriod,
    ScheduleInput, SurfaceInput, ZoneInput,
};
pub use error::{AccessError, Error};
pub use instance::{Instance, Options, State};
pub use registry::{Causality, Registry, Resolution, VariableBinding};
pub use resolver::MAX_EVENT_ITERATIONS;
pub use resources::{Released, WorkDir};
pub use runtime::Runtime;

pub use cosim_core::time::days_to_seconds;
