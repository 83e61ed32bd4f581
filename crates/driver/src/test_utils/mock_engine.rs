use std::{
    fs,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use cosim_core::{
    Engine, EngineLoader, EngineMessage, EngineSetup, EngineVariable, EventInfo, Handle,
    HandleInfo, Lookup, Severity, Unit,
};

/// Handle of the `Signal` output, reported in watts.
const SIGNAL: Handle = Handle(0);

/// Handle of the `Ticks` output, counting event updates.
const TICKS: Handle = Handle(1);

/// Handle of the `Gain` actuator, in kilowatts.
const GAIN: Handle = Handle(2);

#[derive(Debug, thiserror::Error)]
#[error("mock engine: {0}")]
pub(crate) struct MockError(pub(crate) String);

/// Knobs controlling how a [`MockEngine`] behaves.
#[derive(Debug, Clone)]
pub(crate) struct MockOptions {
    /// Spacing of periodic events in seconds.
    pub(crate) period: f64,

    /// Discrete updates needed before an event settles.
    pub(crate) passes: usize,

    /// Handles stay [`Lookup::Pending`] until the first `step_to`.
    pub(crate) late_handles: bool,

    /// Discrete states never settle.
    pub(crate) never_converge: bool,

    pub(crate) fail_init: bool,
    pub(crate) fail_terminate: bool,

    /// The engine requests termination once it reaches this time.
    pub(crate) terminate_at: Option<f64>,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            period: 600.0,
            passes: 1,
            late_handles: false,
            never_converge: false,
            fail_init: false,
            fail_terminate: false,
            terminate_at: None,
        }
    }
}

/// Counters shared between a test and the engines it creates.
#[derive(Debug, Clone, Default)]
pub(crate) struct Probe {
    pub(crate) loads: Arc<AtomicUsize>,
    pub(crate) terminates: Arc<AtomicUsize>,
    pub(crate) steps: Arc<Mutex<Vec<f64>>>,
}

impl Probe {
    pub(crate) fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub(crate) fn terminates(&self) -> usize {
        self.terminates.load(Ordering::SeqCst)
    }

    pub(crate) fn steps(&self) -> Vec<f64> {
        self.steps.lock().unwrap().clone()
    }
}

/// A small engine with periodic events and one actuator.
///
/// `Signal` reports the applied gain in watts. Writes to `Gain` only take
/// effect at the next discrete update, and each update performed at an event
/// time increments `Ticks`.
#[derive(Debug)]
pub(crate) struct MockEngine {
    options: MockOptions,
    probe: Probe,
    initialized: bool,
    stepped: bool,
    time: f64,
    next_event: f64,
    at_event: bool,
    remaining_passes: usize,
    pending: bool,
    written_gain: Option<f64>,
    applied_gain: f64,
    ticks: f64,
    messages: Vec<EngineMessage>,
}

impl MockEngine {
    pub(crate) fn new(options: MockOptions, probe: Probe) -> Self {
        Self {
            options,
            probe,
            initialized: false,
            stepped: false,
            time: 0.0,
            next_event: 0.0,
            at_event: false,
            remaining_passes: 0,
            pending: false,
            written_gain: None,
            applied_gain: 1.0,
            ticks: 0.0,
            messages: Vec::new(),
        }
    }

    pub(crate) fn time(&self) -> f64 {
        self.time
    }

    fn info(&self) -> EventInfo {
        EventInfo {
            next_event_time: Some(self.next_event),
            discrete_states_pending: self.pending,
            values_changed: false,
            terminate_requested: self
                .options
                .terminate_at
                .is_some_and(|limit| self.time >= limit),
        }
    }

    fn unit_of(handle: Handle) -> Option<Unit> {
        match handle {
            SIGNAL => Some(Unit::Watt),
            TICKS => Some(Unit::One),
            GAIN => Some(Unit::Kilowatt),
            _ => None,
        }
    }
}

impl Engine for MockEngine {
    type Error = MockError;

    fn initialize(&mut self, setup: &EngineSetup) -> Result<EventInfo, Self::Error> {
        if self.options.fail_init {
            return Err(MockError("model rejected".into()));
        }
        fs::write(setup.working_dir.join("mock.log"), &setup.instance_name)
            .map_err(|err| MockError(err.to_string()))?;

        self.initialized = true;
        self.next_event = self.options.period;
        self.pending = self.options.never_converge;
        self.messages
            .push(EngineMessage::new(Severity::Info, "initialized"));
        Ok(self.info())
    }

    fn lookup(&self, variable: &EngineVariable) -> Lookup {
        if !self.initialized || (self.options.late_handles && !self.stepped) {
            return Lookup::Pending;
        }
        let handle = match variable {
            EngineVariable::Output { name, key } if key == "Mock" && name == "Signal" => SIGNAL,
            EngineVariable::Output { name, key } if key == "Mock" && name == "Ticks" => TICKS,
            EngineVariable::Actuator {
                component_type,
                control_type,
                component_name,
            } if component_type == "Mock"
                && control_type == "Gain"
                && component_name == "Mock" =>
            {
                GAIN
            }
            _ => return Lookup::Missing,
        };
        match Self::unit_of(handle) {
            Some(unit) => Lookup::Found(HandleInfo { handle, unit }),
            None => Lookup::Missing,
        }
    }

    fn read(&self, handle: Handle) -> Result<f64, Self::Error> {
        match handle {
            SIGNAL => Ok(self.applied_gain * 1000.0),
            TICKS => Ok(self.ticks),
            GAIN => Ok(self.written_gain.unwrap_or(self.applied_gain)),
            Handle(other) => Err(MockError(format!("no handle {other}"))),
        }
    }

    fn write(&mut self, handle: Handle, value: f64) -> Result<(), Self::Error> {
        if handle != GAIN {
            return Err(MockError("read-only handle".into()));
        }
        self.written_gain = Some(value);
        Ok(())
    }

    fn reset(&mut self, handle: Handle) -> Result<(), Self::Error> {
        if handle != GAIN {
            return Err(MockError("read-only handle".into()));
        }
        self.written_gain = None;
        Ok(())
    }

    fn step_to(&mut self, time: f64) -> Result<EventInfo, Self::Error> {
        if time < self.time || time > self.next_event {
            return Err(MockError(format!(
                "cannot step from {} to {time} with next event at {}",
                self.time, self.next_event
            )));
        }
        self.probe.steps.lock().unwrap().push(time);
        self.time = time;
        self.stepped = true;
        if time == self.next_event {
            self.at_event = true;
            self.pending = true;
            self.remaining_passes = self.options.passes;
        }
        Ok(self.info())
    }

    fn update_discrete_states(&mut self) -> Result<EventInfo, Self::Error> {
        if self.options.never_converge {
            self.pending = true;
            return Ok(self.info());
        }

        self.remaining_passes = self.remaining_passes.saturating_sub(1);
        if self.remaining_passes > 0 {
            self.pending = true;
            return Ok(self.info());
        }

        let previous = self.applied_gain;
        self.applied_gain = self.written_gain.unwrap_or(1.0);
        if self.at_event {
            self.ticks += 1.0;
            self.at_event = false;
            self.next_event = self.time + self.options.period;
        }
        self.pending = false;
        Ok(EventInfo {
            values_changed: previous != self.applied_gain,
            ..self.info()
        })
    }

    fn drain_messages(&mut self) -> Vec<EngineMessage> {
        std::mem::take(&mut self.messages)
    }

    fn terminate(&mut self) -> Result<(), Self::Error> {
        self.probe.terminates.fetch_add(1, Ordering::SeqCst);
        if self.options.fail_terminate {
            Err(MockError("shutdown failed".into()))
        } else {
            Ok(())
        }
    }
}

/// Creates [`MockEngine`]s sharing one [`Probe`].
#[derive(Debug, Clone, Default)]
pub(crate) struct MockLoader {
    pub(crate) options: MockOptions,
    pub(crate) probe: Probe,
}

impl MockLoader {
    pub(crate) fn new(options: MockOptions) -> Self {
        Self {
            options,
            probe: Probe::default(),
        }
    }
}

impl EngineLoader for MockLoader {
    type Engine = MockEngine;

    const RUNTIME: &'static str = "mock";

    fn load(&self, _setup: &EngineSetup) -> Result<Self::Engine, MockError> {
        self.probe.loads.fetch_add(1, Ordering::SeqCst);
        Ok(MockEngine::new(self.options.clone(), self.probe.clone()))
    }
}

/// Bindings for every mock variable, the way a configuration declares them.
pub(crate) const MOCK_CONFIG: &str = r#"{
    "engine": { "model": "mock.json", "environment": "mock.weather" },
    "RunPeriod": { "stop_time": 86400.0 },
    "model": {
        "outputVariables": [
            { "name": "Signal", "key": "Mock", "fmiName": "Signal", "unit": "kW" },
            { "name": "Ticks", "key": "Mock", "fmiName": "Ticks" },
            { "name": "Nothing", "key": "Mock", "fmiName": "Nothing" }
        ],
        "emsActuators": [
            { "variableName": "Mock", "componentType": "Mock", "controlType": "Gain",
              "unit": "W", "fmiName": "Gain" }
        ]
    }
}"#;
