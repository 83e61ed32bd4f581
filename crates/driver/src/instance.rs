use std::{fmt, path::Path};

use cosim_core::{Engine, EngineLoader, EngineSetup, EventInfo};

use crate::{
    Configuration, Error,
    advance::advance,
    bridge::Bridge,
    messages,
    registry::Registry,
    resolver::{self, MAX_EVENT_ITERATIONS},
    resources::{Resources, WorkDir},
    runtime::Runtime,
};

/// Lifecycle state of an [`Instance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Configured, engine not yet loaded.
    Created,

    /// Inside [`Instance::start`].
    Initializing,

    /// Accepting time advancement and variable access.
    Running,

    /// Stopped; resources are released.
    Terminated,

    /// A fatal error occurred; only [`Instance::stop`] is useful.
    Failed,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            State::Created => "created",
            State::Initializing => "initializing",
            State::Running => "running",
            State::Terminated => "terminated",
            State::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Tuning knobs for an [`Instance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Bound on discrete-state updates at a single instant.
    pub max_event_iterations: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_event_iterations: MAX_EVENT_ITERATIONS,
        }
    }
}

impl Options {
    /// Validates that the options can drive an engine.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_event_iterations` is zero.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.max_event_iterations == 0 {
            return Err("max_event_iterations must be at least 1");
        }
        Ok(())
    }
}

/// One co-simulation run of an embedded engine.
///
/// An instance owns its engine and working directory. All calls block until
/// the engine finishes, and `&mut self` serializes them, so one instance is
/// driven by one thread at a time. Distinct instances may run on distinct
/// threads.
///
/// ```ignore
/// let mut instance = Instance::<ZoneLoader>::create("office", &config_text, None)?;
/// instance.start()?;
/// for day in 0..365 {
///     instance.set_time(days_to_seconds(f64::from(day)))?;
///     let lights = instance.get_value("Core_Zone_Lights_Output")?;
/// }
/// instance.stop();
/// ```
#[derive(Debug)]
pub struct Instance<L: EngineLoader> {
    name: String,
    config: Configuration,
    loader: L,
    options: Options,
    state: State,
    time: f64,
    event_info: EventInfo,
    bridge: Bridge,
    resources: Resources<L::Engine>,
    span: tracing::Span,
}

impl<L: EngineLoader + Default> Instance<L> {
    /// Creates an instance from a configuration file path or JSON text.
    ///
    /// With `working_dir`, the instance runs in a private directory inside
    /// that path; otherwise in a temporary directory it owns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the configuration is invalid, or
    /// [`Error::WorkingDirectory`] if the working directory cannot be created.
    pub fn create(name: &str, configuration: &str, working_dir: Option<&Path>) -> Result<Self, Error> {
        let config = Configuration::load(configuration)?;
        Self::with_loader(name, config, working_dir, L::default(), Options::default())
    }
}

impl<L: EngineLoader> Instance<L> {
    /// Creates an instance from a parsed configuration and an explicit loader.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the options or bindings are invalid,
    /// [`Error::DuplicateBinding`] if two bindings share a name, or
    /// [`Error::WorkingDirectory`] if the working directory cannot be created.
    pub fn with_loader(
        name: &str,
        config: Configuration,
        working_dir: Option<&Path>,
        loader: L,
        options: Options,
    ) -> Result<Self, Error> {
        options.validate().map_err(crate::ConfigError::Options)?;
        let registry = Registry::from_bindings(config.bindings()?)?;

        let workdir = match working_dir {
            Some(root) => WorkDir::supplied(root, name)?,
            None => WorkDir::temporary(name)?,
        };

        let span = tracing::info_span!("instance", name = %name);
        span.in_scope(|| {
            tracing::info!(
                working_dir = %workdir.path().display(),
                bindings = registry.len(),
                "created"
            );
        });

        Ok(Self {
            name: name.to_string(),
            config,
            loader,
            options,
            state: State::Created,
            time: 0.0,
            event_info: EventInfo::settled(),
            bridge: Bridge::new(registry),
            resources: Resources::new(workdir),
            span,
        })
    }

    /// Loads and initializes the engine, leaving the instance at time zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] unless the instance is
    /// [`State::Created`]. Returns [`Error::EngineInit`] or
    /// [`Error::EventIterationOverflow`] if the engine cannot be brought up,
    /// after which the instance is [`State::Failed`].
    pub fn start(&mut self) -> Result<(), Error> {
        self.require(State::Created, "start")?;
        let span = self.span.clone();
        let _enter = span.enter();

        self.state = State::Initializing;
        match self.initialize() {
            Ok(info) => {
                self.time = 0.0;
                self.event_info = info;
                self.state = State::Running;
                tracing::info!(stop_time = self.config.stop_time(), "started");
                Ok(())
            }
            Err(err) => {
                self.state = State::Failed;
                tracing::error!(error = %err, "start failed");
                Err(err)
            }
        }
    }

    fn initialize(&mut self) -> Result<EventInfo, Error> {
        let setup = self.setup()?;

        Runtime::global()
            .ensure(L::RUNTIME, || self.loader.init_runtime())
            .map_err(Error::engine_init)?;

        let mut engine = self.loader.load(&setup).map_err(Error::engine_init)?;
        let initialized = engine.initialize(&setup);
        self.resources.attach_engine(engine);

        let engine = engine_of(&mut self.resources, "start", self.state)?;
        messages::forward(engine);
        let mut info = initialized.map_err(Error::engine_init)?;

        if info.discrete_states_pending {
            info = resolver::settle(engine, 0.0, self.options.max_event_iterations)?.event_info;
        }

        let unresolved = self.bridge.resolve_all(engine);
        if unresolved > 0 {
            tracing::debug!(unresolved, "some bindings will resolve on first access");
        }
        Ok(info)
    }

    fn setup(&self) -> Result<EngineSetup, Error> {
        let working_dir = self
            .resources
            .working_dir()
            .ok_or(Error::InvalidState {
                operation: "start",
                state: self.state,
            })?
            .to_path_buf();

        Ok(EngineSetup {
            instance_name: self.name.clone(),
            model: self.config.model_path(),
            environment: self.config.environment_path(),
            working_dir,
            start_time: 0.0,
            stop_time: self.config.stop_time(),
            start_weekday: self.config.start_weekday()?,
        })
    }

    /// Advances simulated time to exactly `time` seconds.
    ///
    /// Every event between the current time and `time` is processed in order,
    /// and inputs written since the last call take effect at the current
    /// instant first. `set_time(current_time)` applies pending inputs without
    /// moving time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTime`] if `time` is not finite, lies in the past,
    /// or lies beyond the run period; the instance keeps running. Returns a
    /// fatal error if the engine fails while advancing, after which the
    /// instance is [`State::Failed`].
    pub fn set_time(&mut self, time: f64) -> Result<(), Error> {
        self.require(State::Running, "set_time")?;
        let _enter = self.span.enter();

        let invalid = |reason| Error::InvalidTime {
            requested: time,
            current: self.time,
            reason,
        };
        if !time.is_finite() {
            return Err(invalid("time must be finite"));
        }
        if time < self.time {
            return Err(invalid("time cannot move backward"));
        }
        if time > self.config.stop_time() {
            return Err(invalid("time is past the end of the run period"));
        }

        let inputs_changed = self.bridge.take_pending_inputs();
        let engine = engine_of(&mut self.resources, "set_time", self.state)?;
        let result = advance(
            engine,
            self.time,
            time,
            self.event_info,
            inputs_changed,
            self.options.max_event_iterations,
        );

        match result {
            Ok(advanced) => {
                self.time = advanced.time;
                self.event_info = advanced.event_info;
                Ok(())
            }
            Err(err) => {
                self.state = State::Failed;
                tracing::error!(time = self.time, target = time, error = %err, "advance failed");
                Err(err)
            }
        }
    }

    /// Reads a variable in its declared unit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownVariable`] for undeclared names and
    /// [`Error::EngineRead`] if the engine cannot supply the value yet.
    pub fn get_value(&mut self, name: &str) -> Result<f64, Error> {
        self.require(State::Running, "get_value")?;
        let engine = engine_of(&mut self.resources, "get_value", self.state)?;
        self.bridge.get_value(engine, name)
    }

    /// Writes an input variable, given in its declared unit.
    ///
    /// The value takes effect at the next [`set_time`](Self::set_time).
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownVariable`], [`Error::Causality`] for outputs, or
    /// [`Error::EngineWrite`] if the engine refuses the value.
    pub fn set_value(&mut self, name: &str, value: f64) -> Result<(), Error> {
        self.require(State::Running, "set_value")?;
        let engine = engine_of(&mut self.resources, "set_value", self.state)?;
        self.bridge.set_value(engine, name, value)
    }

    /// Releases an earlier [`set_value`](Self::set_value), returning control
    /// of the variable to the engine's model from the next
    /// [`set_time`](Self::set_time).
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`set_value`](Self::set_value).
    pub fn clear_value(&mut self, name: &str) -> Result<(), Error> {
        self.require(State::Running, "clear_value")?;
        let engine = engine_of(&mut self.resources, "clear_value", self.state)?;
        self.bridge.clear_value(engine, name)
    }

    /// Returns the position of a variable in declaration order, for use with
    /// [`get_value_at`](Self::get_value_at) and
    /// [`set_value_at`](Self::set_value_at).
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownVariable`] for undeclared names.
    pub fn variable_index(&self, name: &str) -> Result<usize, Error> {
        self.bridge
            .registry()
            .index_of(name)
            .ok_or_else(|| Error::UnknownVariable(name.to_string()))
    }

    /// Reads the variable at `index` in its declared unit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownIndex`] for an index past the last binding,
    /// otherwise the same errors as [`get_value`](Self::get_value).
    pub fn get_value_at(&mut self, index: usize) -> Result<f64, Error> {
        let name = self.name_at(index)?;
        self.get_value(&name)
    }

    /// Writes the input variable at `index`, given in its declared unit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownIndex`] for an index past the last binding,
    /// otherwise the same errors as [`set_value`](Self::set_value).
    pub fn set_value_at(&mut self, index: usize, value: f64) -> Result<(), Error> {
        let name = self.name_at(index)?;
        self.set_value(&name, value)
    }

    /// Returns the current simulated time in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] before [`start`](Self::start).
    pub fn current_time(&self) -> Result<f64, Error> {
        match self.state {
            State::Created => Err(Error::InvalidState {
                operation: "current_time",
                state: self.state,
            }),
            _ => Ok(self.time),
        }
    }

    /// Returns the next known engine event time, if any.
    #[must_use]
    pub fn next_event_time(&self) -> Option<f64> {
        match self.state {
            State::Running => self.event_info.next_event_time,
            _ => None,
        }
    }

    /// Shuts down the engine and removes the working directory.
    ///
    /// Safe to call any number of times. Before [`start`](Self::start) and
    /// after a previous stop it does nothing. Shutdown failures are logged and
    /// never prevent the working directory from being removed.
    pub fn stop(&mut self) {
        match self.state {
            State::Created | State::Terminated => {}
            State::Initializing | State::Running | State::Failed => {
                let _enter = self.span.enter();
                let released = self.resources.release();
                self.state = State::Terminated;
                tracing::info!(
                    time = self.time,
                    engine = released.engine,
                    working_dir = released.working_dir,
                    "stopped"
                );
            }
        }
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    /// Returns every variable binding in declaration order.
    #[must_use]
    pub fn bindings(&self) -> &Registry {
        self.bridge.registry()
    }

    /// Returns the directory the engine runs in, until it is released.
    #[must_use]
    pub fn working_directory(&self) -> Option<&Path> {
        self.resources.working_dir()
    }

    fn name_at(&self, index: usize) -> Result<String, Error> {
        self.bridge
            .registry()
            .get_index(index)
            .map(|binding| binding.name().to_string())
            .ok_or(Error::UnknownIndex(index))
    }

    fn require(&self, expected: State, operation: &'static str) -> Result<(), Error> {
        if self.state == expected {
            Ok(())
        } else {
            Err(Error::InvalidState {
                operation,
                state: self.state,
            })
        }
    }
}

fn engine_of<'a, E: Engine>(
    resources: &'a mut Resources<E>,
    operation: &'static str,
    state: State,
) -> Result<&'a mut E, Error> {
    resources
        .engine_mut()
        .ok_or(Error::InvalidState { operation, state })
}
