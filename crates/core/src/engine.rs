use std::{error::Error as StdError, path::PathBuf};

use jiff::civil::Weekday;

use crate::{EngineMessage, EngineVariable, EventInfo, Handle, Lookup};

/// Everything an engine needs to set up one simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSetup {
    /// Name of the driver instance owning the engine.
    pub instance_name: String,

    /// Model definition file.
    pub model: PathBuf,

    /// Weather/environment data file.
    pub environment: PathBuf,

    /// Directory the engine may write scratch and report files into.
    pub working_dir: PathBuf,

    /// Start of the run in seconds, always `0.0` for the driver.
    pub start_time: f64,

    /// End of the run in seconds.
    pub stop_time: f64,

    /// Day of the week of the first simulated day.
    pub start_weekday: Weekday,
}

/// A synchronous, non-reentrant simulation engine.
///
/// The driver owns exactly one engine per instance and serializes every call
/// through `&mut self`. Time only moves forward through [`step_to`], and the
/// engine reports the next instant at which its discrete state may change.
///
/// # Protocol
///
/// 1. [`initialize`] once, before anything else.
/// 2. [`lookup`] variables to obtain handles, then [`read`], [`write`] or
///    [`reset`] through them.
/// 3. [`step_to`] never past the last reported event time. Whenever
///    [`EventInfo::discrete_states_pending`] is set, call
///    [`update_discrete_states`] until it clears.
/// 4. [`terminate`] once, at the end.
///
/// Writes take effect at the next discrete-state update, never by themselves.
///
/// [`initialize`]: Engine::initialize
/// [`lookup`]: Engine::lookup
/// [`read`]: Engine::read
/// [`write`]: Engine::write
/// [`reset`]: Engine::reset
/// [`step_to`]: Engine::step_to
/// [`update_discrete_states`]: Engine::update_discrete_states
/// [`terminate`]: Engine::terminate
pub trait Engine {
    /// The error type returned when an engine operation fails.
    type Error: StdError + Send + Sync + 'static;

    /// Prepares the engine for a run over `[setup.start_time, setup.stop_time]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects the model or environment data.
    fn initialize(&mut self, setup: &EngineSetup) -> Result<EventInfo, Self::Error>;

    /// Resolves a variable into a handle, if the engine is ready to do so.
    fn lookup(&self, variable: &EngineVariable) -> Lookup;

    /// Reads the current value behind `handle`, in the handle's unit.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is invalid or the engine is not in a
    /// readable state.
    fn read(&self, handle: Handle) -> Result<f64, Self::Error>;

    /// Writes a value to a writable handle, in the handle's unit.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is invalid, read-only, or the engine
    /// refuses the value.
    fn write(&mut self, handle: Handle, value: f64) -> Result<(), Self::Error>;

    /// Releases a previous [`write`](Engine::write), returning control of the
    /// value to the engine's model.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is invalid or read-only.
    fn reset(&mut self, handle: Handle) -> Result<(), Self::Error>;

    /// Integrates the continuous state up to `time`.
    ///
    /// # Errors
    ///
    /// Returns an error if `time` lies before the engine's current time or
    /// past its next event, or if integration fails.
    fn step_to(&mut self, time: f64) -> Result<EventInfo, Self::Error>;

    /// Performs one pass of discrete-state updates at the current instant.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    fn update_discrete_states(&mut self) -> Result<EventInfo, Self::Error>;

    /// Takes all diagnostic messages queued since the last call.
    fn drain_messages(&mut self) -> Vec<EngineMessage> {
        Vec::new()
    }

    /// Ends the run and flushes any reports.
    ///
    /// # Errors
    ///
    /// Returns an error if shutdown fails; the engine is unusable afterward
    /// either way.
    fn terminate(&mut self) -> Result<(), Self::Error>;
}

/// Creates engines and owns the process-wide runtime they share.
///
/// Engines commonly depend on global state that must be initialized once per
/// process before the first engine starts. The driver calls
/// [`init_runtime`](EngineLoader::init_runtime) at most once per
/// [`RUNTIME`](EngineLoader::RUNTIME) identifier, across all threads.
pub trait EngineLoader {
    /// The engine this loader creates.
    type Engine: Engine;

    /// Identifies the process-wide runtime this loader's engines share.
    const RUNTIME: &'static str;

    /// Initializes the process-wide runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be initialized.
    fn init_runtime(&self) -> Result<(), <Self::Engine as Engine>::Error> {
        Ok(())
    }

    /// Creates an uninitialized engine for one simulation run.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot be created from the setup.
    fn load(&self, setup: &EngineSetup) -> Result<Self::Engine, <Self::Engine as Engine>::Error>;
}
