use std::{
    collections::HashMap,
    fs::{self, File},
    io::Write as _,
    path::PathBuf,
};

use cosim_core::{
    Engine, EngineMessage, EngineSetup, EngineVariable, EventInfo, Handle, HandleInfo, Lookup,
    Severity, SurfaceQuantity, Unit, ZoneQuantity,
};
use jiff::civil::Weekday;
use uom::si::{
    f64::{TemperatureInterval, ThermodynamicTemperature, Time},
    temperature_interval, thermodynamic_temperature::degree_celsius,
    time::second,
};

use crate::{
    ZoneError,
    model::{Model, PeopleSpec, SurfaceSpec},
    schedule::Schedule,
    thermostat::{HeatingThermostat, SwitchState},
    weather::Weather,
    zone::{Coupling, ThermalZone},
};

/// Name of the prepared model copy written into the working directory.
pub const PREPARED_MODEL: &str = "in.json";

/// Name of the message log written into the working directory.
pub const MESSAGE_LOG: &str = "zone.log";

/// Key of outputs that describe the site rather than a model object.
const ENVIRONMENT_KEY: &str = "Environment";

/// A piece of engine data a handle can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Signal {
    ZoneTemperature(usize),
    OccupantCount(usize),
    ZoneLightsRate(usize),
    LightsRate { zone: usize, lights: usize },
    HeatingRate(usize),
    OutdoorDrybulb,
    ScheduleValue(usize),
    People { zone: usize, people: usize },
    Lights { zone: usize, lights: usize },
    ScheduleOverride(usize),
    HeatingSetpoint(usize),
    ZoneVolume(usize),
    FloorArea(usize),
    SensibleMultiplier(usize),
    ConvectiveGain(usize),
    LatentGain(usize),
    PeopleGain(usize),
    RadiantTemperature(usize),
    AirTemperature(usize),
    SurfaceArea(usize),
    SurfaceHeatFlow(usize),
    SurfaceTemperature(usize),
}

impl Signal {
    fn unit(self) -> Unit {
        match self {
            Self::ZoneTemperature(_)
            | Self::OutdoorDrybulb
            | Self::HeatingSetpoint(_)
            | Self::RadiantTemperature(_)
            | Self::AirTemperature(_)
            | Self::SurfaceTemperature(_) => Unit::DegreeCelsius,
            Self::OccupantCount(_)
            | Self::ScheduleValue(_)
            | Self::People { .. }
            | Self::ScheduleOverride(_)
            | Self::SensibleMultiplier(_) => Unit::One,
            Self::ZoneLightsRate(_)
            | Self::LightsRate { .. }
            | Self::HeatingRate(_)
            | Self::Lights { .. }
            | Self::ConvectiveGain(_)
            | Self::LatentGain(_)
            | Self::PeopleGain(_)
            | Self::SurfaceHeatFlow(_) => Unit::Watt,
            Self::ZoneVolume(_) => Unit::CubicMeter,
            Self::FloorArea(_) | Self::SurfaceArea(_) => Unit::SquareMeter,
        }
    }

    fn is_writable(self) -> bool {
        matches!(
            self,
            Self::People { .. }
                | Self::Lights { .. }
                | Self::ScheduleOverride(_)
                | Self::HeatingSetpoint(_)
                | Self::AirTemperature(_)
                | Self::SurfaceTemperature(_)
        )
    }
}

/// Values that only change at discrete updates.
#[derive(Debug, Clone, Default, PartialEq)]
struct Discrete {
    schedule_values: Vec<f64>,
    people: Vec<Vec<f64>>,
    lights: Vec<Vec<f64>>,
    setpoints: Vec<f64>,
    heating: Vec<SwitchState>,
}

/// Run parameters fixed at initialization.
#[derive(Debug)]
struct Run {
    start_weekday: Weekday,
    stop_time: f64,
    log_path: PathBuf,
    log: Option<File>,
}

/// A schedule-driven zone model that steps from event to event.
///
/// Events fall on every multiple of the model timestep and on every schedule
/// change. Actuator writes are held until the next discrete update, and
/// heating thermostats are evaluated only at discrete updates. A thermostat
/// that switches asks for one more update to confirm the new state.
///
/// A supplied zone air temperature replaces the simulated one until it is
/// cleared. A supplied surface temperature couples that surface to its zone's
/// air; surfaces without one exchange no heat.
#[derive(Debug)]
pub struct ZoneEngine {
    model: Model,
    weather: Weather,
    schedules: Vec<Schedule>,
    zones: Vec<ThermalZone>,

    /// Zone each surface faces, by index.
    surface_zones: Vec<usize>,
    signals: Vec<Signal>,
    written: HashMap<Signal, f64>,
    applied: HashMap<Signal, f64>,
    discrete: Discrete,
    run: Option<Run>,
    time: f64,
    next_event: f64,
    at_event: bool,
    pending: bool,
    messages: Vec<EngineMessage>,
}

impl ZoneEngine {
    /// Creates an engine for `model` under `weather`, ready to initialize.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Schedule`] if a schedule profile is malformed.
    pub fn new(model: Model, weather: Weather) -> Result<Self, ZoneError> {
        let schedules = model
            .schedules
            .iter()
            .map(Schedule::from_spec)
            .collect::<Result<Vec<_>, _>>()?;
        let zones = model.zones.iter().map(ThermalZone::new).collect();
        let surface_zones = model
            .surfaces
            .iter()
            .map(|surface| {
                model.zone_index(&surface.zone).ok_or_else(|| {
                    ZoneError::Invalid(format!(
                        "surface `{}` faces unknown zone `{}`",
                        surface.name, surface.zone
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            model,
            weather,
            schedules,
            zones,
            surface_zones,
            signals: Vec::new(),
            written: HashMap::new(),
            applied: HashMap::new(),
            discrete: Discrete::default(),
            run: None,
            time: 0.0,
            next_event: 0.0,
            at_event: false,
            pending: false,
            messages: Vec::new(),
        })
    }

    fn run(&self) -> Result<&Run, ZoneError> {
        self.run.as_ref().ok_or(ZoneError::NotInitialized)
    }

    fn signal(&self, handle: Handle) -> Result<Signal, ZoneError> {
        self.run()?;
        self.signals
            .get(handle.0)
            .copied()
            .ok_or(ZoneError::Handle(handle.0))
    }

    fn event_info(&self) -> EventInfo {
        let stop_time = self.run.as_ref().map_or(f64::INFINITY, |run| run.stop_time);
        EventInfo {
            next_event_time: Some(self.next_event),
            discrete_states_pending: self.pending,
            values_changed: false,
            terminate_requested: self.time >= stop_time,
        }
    }

    /// Lists every signal the model offers, in handle order.
    fn enumerate_signals(&self) -> Vec<Signal> {
        let mut signals = vec![Signal::OutdoorDrybulb];
        for (zone, spec) in self.model.zones.iter().enumerate() {
            signals.extend([
                Signal::ZoneTemperature(zone),
                Signal::OccupantCount(zone),
                Signal::ZoneLightsRate(zone),
                Signal::HeatingRate(zone),
            ]);
            if spec.heating.is_some() {
                signals.push(Signal::HeatingSetpoint(zone));
            }
            signals.extend((0..spec.people.len()).map(|people| Signal::People { zone, people }));
            for lights in 0..spec.lights.len() {
                signals.push(Signal::LightsRate { zone, lights });
                signals.push(Signal::Lights { zone, lights });
            }
            signals.extend([
                Signal::ZoneVolume(zone),
                Signal::SensibleMultiplier(zone),
                Signal::ConvectiveGain(zone),
                Signal::LatentGain(zone),
                Signal::PeopleGain(zone),
                Signal::RadiantTemperature(zone),
                Signal::AirTemperature(zone),
            ]);
            if spec.floor_area.is_some() {
                signals.push(Signal::FloorArea(zone));
            }
        }
        for surface in 0..self.model.surfaces.len() {
            signals.extend([
                Signal::SurfaceArea(surface),
                Signal::SurfaceHeatFlow(surface),
                Signal::SurfaceTemperature(surface),
            ]);
        }
        for schedule in 0..self.schedules.len() {
            signals.push(Signal::ScheduleValue(schedule));
            signals.push(Signal::ScheduleOverride(schedule));
        }
        signals
    }

    /// Maps an engine variable onto a signal by case-insensitive name.
    fn identify(&self, variable: &EngineVariable) -> Option<Signal> {
        match variable {
            EngineVariable::Output { name, key } => {
                let name = name.trim();
                if is(name, "Zone Mean Air Temperature") {
                    self.zone_index(key).map(Signal::ZoneTemperature)
                } else if is(name, "Zone People Occupant Count") {
                    self.zone_index(key).map(Signal::OccupantCount)
                } else if is(name, "Zone Lights Electricity Rate") {
                    self.zone_index(key).map(Signal::ZoneLightsRate)
                } else if is(name, "Lights Electricity Rate") {
                    self.lights_index(key)
                        .map(|(zone, lights)| Signal::LightsRate { zone, lights })
                } else if is(name, "Zone Heating Rate") {
                    self.zone_index(key).map(Signal::HeatingRate)
                } else if is(name, "Site Outdoor Air Drybulb Temperature") {
                    is(key, ENVIRONMENT_KEY).then_some(Signal::OutdoorDrybulb)
                } else if is(name, "Schedule Value") {
                    self.model.schedule_index(key.trim()).map(Signal::ScheduleValue)
                } else {
                    None
                }
            }
            EngineVariable::Actuator {
                component_type,
                control_type,
                component_name,
            } => {
                if is(component_type, "People") && is(control_type, "Number of People") {
                    self.people_index(component_name)
                        .map(|(zone, people)| Signal::People { zone, people })
                } else if is(component_type, "Lights") && is(control_type, "Electricity Rate") {
                    self.lights_index(component_name)
                        .map(|(zone, lights)| Signal::Lights { zone, lights })
                } else if is(component_type, "Schedule:Compact")
                    && is(control_type, "Schedule Value")
                {
                    self.model
                        .schedule_index(component_name.trim())
                        .map(Signal::ScheduleOverride)
                } else if is(component_type, "Zone Temperature Control")
                    && is(control_type, "Heating Setpoint")
                {
                    self.zone_index(component_name).map(Signal::HeatingSetpoint)
                } else {
                    None
                }
            }
            EngineVariable::Schedule { name } => self
                .model
                .schedule_index(name.trim())
                .map(Signal::ScheduleOverride),
            EngineVariable::Zone { name, quantity } => {
                let zone = self.zone_index(name)?;
                Some(match quantity {
                    ZoneQuantity::Volume => Signal::ZoneVolume(zone),
                    ZoneQuantity::FloorArea => Signal::FloorArea(zone),
                    ZoneQuantity::SensibleMultiplier => Signal::SensibleMultiplier(zone),
                    ZoneQuantity::Temperature => Signal::AirTemperature(zone),
                    ZoneQuantity::ConvectiveGain => Signal::ConvectiveGain(zone),
                    ZoneQuantity::LatentGain => Signal::LatentGain(zone),
                    ZoneQuantity::PeopleGain => Signal::PeopleGain(zone),
                    ZoneQuantity::RadiantTemperature => Signal::RadiantTemperature(zone),
                })
            }
            EngineVariable::Surface { name, quantity } => {
                let surface = self.surface_index(name)?;
                Some(match quantity {
                    SurfaceQuantity::Area => Signal::SurfaceArea(surface),
                    SurfaceQuantity::HeatFlow => Signal::SurfaceHeatFlow(surface),
                    SurfaceQuantity::Temperature => Signal::SurfaceTemperature(surface),
                })
            }
        }
    }

    fn zone_index(&self, name: &str) -> Option<usize> {
        self.model.zone_index(name)
    }

    fn surface_index(&self, name: &str) -> Option<usize> {
        self.model
            .surfaces
            .iter()
            .position(|surface| is(&surface.name, name))
    }

    fn people_index(&self, name: &str) -> Option<(usize, usize)> {
        self.model.zones.iter().enumerate().find_map(|(zone, spec)| {
            spec.people
                .iter()
                .position(|people| is(&people.name, name))
                .map(|people| (zone, people))
        })
    }

    fn lights_index(&self, name: &str) -> Option<(usize, usize)> {
        self.model.zones.iter().enumerate().find_map(|(zone, spec)| {
            spec.lights
                .iter()
                .position(|lights| is(&lights.name, name))
                .map(|lights| (zone, lights))
        })
    }

    /// Returns the first event strictly after `time`.
    fn next_event_after(&self, time: f64, run: &Run) -> f64 {
        let mut next = next_timestep_after(time, self.model.timestep);
        for schedule in &self.schedules {
            next = next.min(schedule.next_change_after(time, run.start_weekday));
        }
        if run.stop_time > time {
            next = next.min(run.stop_time);
        }
        next
    }

    /// Re-evaluates schedules, actuators and thermostats at the current time.
    fn evaluate(&self, run: &Run) -> Discrete {
        let schedule_values: Vec<f64> = self
            .schedules
            .iter()
            .enumerate()
            .map(|(index, schedule)| {
                self.applied
                    .get(&Signal::ScheduleOverride(index))
                    .copied()
                    .unwrap_or_else(|| schedule.value_at(self.time, run.start_weekday))
            })
            .collect();
        let fraction = |name: &str| {
            self.model
                .schedule_index(name)
                .and_then(|index| schedule_values.get(index).copied())
                .unwrap_or(0.0)
        };

        let mut discrete = Discrete::default();
        for (zone, spec) in self.model.zones.iter().enumerate() {
            discrete.people.push(
                spec.people
                    .iter()
                    .enumerate()
                    .map(|(people, def)| {
                        self.applied
                            .get(&Signal::People { zone, people })
                            .copied()
                            .unwrap_or_else(|| def.count * fraction(&def.schedule))
                    })
                    .collect(),
            );
            discrete.lights.push(
                spec.lights
                    .iter()
                    .enumerate()
                    .map(|(lights, def)| {
                        self.applied
                            .get(&Signal::Lights { zone, lights })
                            .copied()
                            .unwrap_or_else(|| def.design_level * fraction(&def.schedule))
                    })
                    .collect(),
            );

            let previous = self
                .discrete
                .heating
                .get(zone)
                .copied()
                .unwrap_or_default();
            let (setpoint, heating) = match spec.heating {
                Some(heating) => {
                    let setpoint = self
                        .applied
                        .get(&Signal::HeatingSetpoint(zone))
                        .copied()
                        .unwrap_or(heating.setpoint);
                    let thermostat = HeatingThermostat {
                        setpoint: ThermodynamicTemperature::new::<degree_celsius>(setpoint),
                        deadband: TemperatureInterval::new::<temperature_interval::degree_celsius>(
                            heating.deadband,
                        ),
                    };
                    (
                        setpoint,
                        thermostat.next_state(previous, self.zones[zone].temperature()),
                    )
                }
                None => (0.0, SwitchState::Off),
            };
            discrete.setpoints.push(setpoint);
            discrete.heating.push(heating);
        }
        discrete.schedule_values = schedule_values;
        discrete
    }

    fn heating_rate(&self, zone: usize) -> f64 {
        match (self.model.zones[zone].heating, self.discrete.heating.get(zone)) {
            (Some(heating), Some(SwitchState::On)) => heating.capacity,
            _ => 0.0,
        }
    }

    /// Internal heat added to a zone's air in W.
    fn gains(&self, zone: usize) -> f64 {
        let spec = &self.model.zones[zone];
        let people: f64 = spec
            .people
            .iter()
            .zip(&self.discrete.people[zone])
            .map(|(def, count)| def.sensible_gain() * count)
            .sum();
        let lights: f64 = self.discrete.lights[zone].iter().sum();
        people + lights + self.heating_rate(zone)
    }

    /// Occupant heat in W, split by `share` of each people object's gain.
    fn people_heat(&self, zone: usize, share: impl Fn(&PeopleSpec) -> f64) -> f64 {
        self.model.zones[zone]
            .people
            .iter()
            .zip(&self.discrete.people[zone])
            .map(|(def, count)| share(def) * count)
            .sum()
    }

    fn air_celsius(&self, zone: usize) -> f64 {
        self.zones[zone].temperature().get::<degree_celsius>()
    }

    /// Applied temperature of a surface in °C, if a caller supplied one.
    fn surface_celsius(&self, surface: usize) -> Option<f64> {
        self.applied.get(&Signal::SurfaceTemperature(surface)).copied()
    }

    /// Surfaces facing `zone`, with their indices.
    fn surfaces_of(&self, zone: usize) -> impl Iterator<Item = (usize, &SurfaceSpec)> {
        self.model
            .surfaces
            .iter()
            .enumerate()
            .filter(move |&(surface, _)| self.surface_zones[surface] == zone)
    }

    /// Surfaces with a supplied temperature facing `zone`.
    fn couplings(&self, zone: usize) -> Vec<Coupling> {
        self.surfaces_of(zone)
            .filter_map(|(surface, spec)| {
                self.surface_celsius(surface).map(|temperature| Coupling {
                    conductance: spec.coefficient * spec.area,
                    temperature,
                })
            })
            .collect()
    }

    /// Net sensible heat into a zone's air at the current instant, in W.
    fn convective_gain(&self, zone: usize) -> Result<f64, ZoneError> {
        let air = self.air_celsius(zone);
        let envelope = self.zones[zone].ua() * (self.weather.drybulb(self.time)? - air);
        let surfaces: f64 = self
            .couplings(zone)
            .iter()
            .map(|c| c.conductance * (c.temperature - air))
            .sum();
        Ok(envelope + surfaces + self.gains(zone))
    }

    /// Area-weighted surface temperature in °C; bare air temperature stands
    /// in for surfaces without a supplied one.
    fn radiant_temperature(&self, zone: usize) -> f64 {
        let air = self.air_celsius(zone);
        let (weighted, area) = self
            .surfaces_of(zone)
            .fold((0.0, 0.0), |(weighted, area), (surface, spec)| {
                let temperature = self.surface_celsius(surface).unwrap_or(air);
                (weighted + spec.area * temperature, area + spec.area)
            });
        if area > 0.0 { weighted / area } else { air }
    }

    fn surface_heat_flow(&self, surface: usize) -> f64 {
        let spec = &self.model.surfaces[surface];
        self.surface_celsius(surface).map_or(0.0, |temperature| {
            let air = self.air_celsius(self.surface_zones[surface]);
            spec.coefficient * spec.area * (air - temperature)
        })
    }

    /// Replaces simulated air temperatures with supplied ones.
    fn hold_supplied_temperatures(&mut self) {
        for (zone, node) in self.zones.iter_mut().enumerate() {
            if let Some(&celsius) = self.applied.get(&Signal::AirTemperature(zone)) {
                node.hold(ThermodynamicTemperature::new::<degree_celsius>(celsius));
            }
        }
    }

    fn log(&mut self, severity: Severity, text: impl Into<String>) {
        let message = EngineMessage::new(severity, text);
        if let Some(run) = self.run.as_mut() {
            let failed = run.log.as_mut().is_some_and(|log| {
                writeln!(log, "[{}] {}", message.severity, message.text).is_err()
            });
            if failed {
                let path = run.log_path.display();
                tracing::warn!(%path, "message log is no longer written");
                run.log = None;
            }
        }
        self.messages.push(message);
    }
}

impl Engine for ZoneEngine {
    type Error = ZoneError;

    fn initialize(&mut self, setup: &EngineSetup) -> Result<EventInfo, Self::Error> {
        let prepared = setup.working_dir.join(PREPARED_MODEL);
        let text = serde_json::to_string_pretty(&self.model)?;
        fs::write(&prepared, text).map_err(|source| write_error(prepared, source))?;

        let log_path = setup.working_dir.join(MESSAGE_LOG);
        let log = File::create(&log_path).map_err(|source| write_error(log_path.clone(), source))?;

        let run = Run {
            start_weekday: setup.start_weekday,
            stop_time: setup.stop_time,
            log_path,
            log: Some(log),
        };
        self.time = setup.start_time;
        self.next_event = self.next_event_after(self.time, &run);
        self.discrete = self.evaluate(&run);
        self.run = Some(run);
        self.signals = self.enumerate_signals();

        self.log(
            Severity::Info,
            format!(
                "{}: {} zone(s), {} schedule(s), {} hour(s) of weather",
                setup.instance_name,
                self.zones.len(),
                self.schedules.len(),
                self.weather.hours()
            ),
        );
        if self.weather.hours() < 24 {
            self.log(
                Severity::Warning,
                format!(
                    "weather covers only {} hour(s) and will repeat",
                    self.weather.hours()
                ),
            );
        }
        Ok(self.event_info())
    }

    fn lookup(&self, variable: &EngineVariable) -> Lookup {
        if self.run.is_none() {
            return Lookup::Pending;
        }
        let Some(signal) = self.identify(variable) else {
            return Lookup::Missing;
        };
        match self.signals.iter().position(|&candidate| candidate == signal) {
            Some(index) => Lookup::Found(HandleInfo {
                handle: Handle(index),
                unit: signal.unit(),
            }),
            None => Lookup::Missing,
        }
    }

    fn read(&self, handle: Handle) -> Result<f64, Self::Error> {
        let written = |signal: Signal| self.written.get(&signal).copied();
        Ok(match self.signal(handle)? {
            Signal::ZoneTemperature(zone) => self.zones[zone].temperature().get::<degree_celsius>(),
            Signal::OccupantCount(zone) => self.discrete.people[zone].iter().sum(),
            Signal::ZoneLightsRate(zone) => self.discrete.lights[zone].iter().sum(),
            Signal::LightsRate { zone, lights } => self.discrete.lights[zone][lights],
            Signal::HeatingRate(zone) => self.heating_rate(zone),
            Signal::OutdoorDrybulb => self.weather.drybulb(self.time)?,
            Signal::ScheduleValue(schedule) => self.discrete.schedule_values[schedule],
            signal @ Signal::People { zone, people } => {
                written(signal).unwrap_or(self.discrete.people[zone][people])
            }
            signal @ Signal::Lights { zone, lights } => {
                written(signal).unwrap_or(self.discrete.lights[zone][lights])
            }
            signal @ Signal::ScheduleOverride(schedule) => {
                written(signal).unwrap_or(self.discrete.schedule_values[schedule])
            }
            signal @ Signal::HeatingSetpoint(zone) => {
                written(signal).unwrap_or(self.discrete.setpoints[zone])
            }
            Signal::ZoneVolume(zone) => self.model.zones[zone].volume,
            Signal::FloorArea(zone) => self.model.zones[zone].floor_area.unwrap_or_default(),
            Signal::SensibleMultiplier(zone) => self.model.zones[zone].mass_multiplier,
            Signal::ConvectiveGain(zone) => self.convective_gain(zone)?,
            Signal::LatentGain(zone) => {
                self.people_heat(zone, |def| def.heat_gain * def.latent_fraction)
            }
            Signal::PeopleGain(zone) => self.people_heat(zone, |def| def.heat_gain),
            Signal::RadiantTemperature(zone) => self.radiant_temperature(zone),
            signal @ Signal::AirTemperature(zone) => {
                written(signal).unwrap_or(self.air_celsius(zone))
            }
            Signal::SurfaceArea(surface) => self.model.surfaces[surface].area,
            Signal::SurfaceHeatFlow(surface) => self.surface_heat_flow(surface),
            signal @ Signal::SurfaceTemperature(surface) => written(signal)
                .or(self.surface_celsius(surface))
                .unwrap_or_else(|| self.air_celsius(self.surface_zones[surface])),
        })
    }

    fn write(&mut self, handle: Handle, value: f64) -> Result<(), Self::Error> {
        let signal = self.signal(handle)?;
        if !signal.is_writable() {
            return Err(ZoneError::ReadOnly(format!("{signal:?}")));
        }
        self.written.insert(signal, value);
        Ok(())
    }

    fn reset(&mut self, handle: Handle) -> Result<(), Self::Error> {
        let signal = self.signal(handle)?;
        if !signal.is_writable() {
            return Err(ZoneError::ReadOnly(format!("{signal:?}")));
        }
        self.written.remove(&signal);
        Ok(())
    }

    fn step_to(&mut self, time: f64) -> Result<EventInfo, Self::Error> {
        self.run()?;
        if time < self.time || time > self.next_event {
            return Err(ZoneError::Step {
                requested: time,
                current: self.time,
                next_event: self.next_event,
            });
        }

        let dt = Time::new::<second>(time - self.time);
        let outdoor = self.weather.drybulb(0.5 * (self.time + time))?;
        let loads: Vec<(f64, Vec<Coupling>)> = (0..self.zones.len())
            .map(|zone| (self.gains(zone), self.couplings(zone)))
            .collect();
        for (zone, (gains, couplings)) in self.zones.iter_mut().zip(loads) {
            zone.advance(outdoor, gains, &couplings, dt);
        }
        self.hold_supplied_temperatures();

        self.time = time;
        if time >= self.next_event {
            self.at_event = true;
            self.pending = true;
        }
        Ok(self.event_info())
    }

    fn update_discrete_states(&mut self) -> Result<EventInfo, Self::Error> {
        let run = self.run.take().ok_or(ZoneError::NotInitialized)?;

        self.applied.clone_from(&self.written);
        self.hold_supplied_temperatures();
        let discrete = self.evaluate(&run);
        let switched = discrete.heating != self.discrete.heating;
        let values_changed = discrete != self.discrete;
        self.discrete = discrete;

        if self.at_event {
            self.at_event = false;
            self.next_event = self.next_event_after(self.time, &run);
        }
        self.run = Some(run);

        if switched {
            tracing::trace!(time = self.time, "heating switched");
        }
        self.pending = switched;

        Ok(EventInfo {
            values_changed,
            ..self.event_info()
        })
    }

    fn drain_messages(&mut self) -> Vec<EngineMessage> {
        std::mem::take(&mut self.messages)
    }

    fn terminate(&mut self) -> Result<(), Self::Error> {
        if self.run.is_none() {
            return Ok(());
        }
        self.log(
            Severity::Info,
            format!("simulation ended at {} s", self.time),
        );
        if let Some(mut run) = self.run.take() {
            if let Some(log) = run.log.as_mut() {
                log.flush().map_err(|source| write_error(run.log_path, source))?;
            }
        }
        Ok(())
    }
}

/// Returns the first multiple of `timestep` strictly after `time`.
///
/// Multiples are counted as integers, since `(time / timestep).floor()` can
/// land one step short when `time` is itself a rounded multiple.
fn next_timestep_after(time: f64, timestep: f64) -> f64 {
    let mut step = (time / timestep).floor().max(0.0) as u64 + 1;
    while (step as f64) * timestep <= time {
        step += 1;
    }
    (step as f64) * timestep
}

fn is(candidate: &str, name: &str) -> bool {
    candidate.trim().eq_ignore_ascii_case(name.trim())
}

fn write_error(path: PathBuf, source: std::io::Error) -> ZoneError {
    ZoneError::Write { path, source }
}
