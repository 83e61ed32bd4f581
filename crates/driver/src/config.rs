//! Configuration documents describing one co-simulation run.
//!
//! A configuration names the engine's input files and lists the variables the
//! driver exposes:
//!
//! ```json
//! {
//!   "version": "0.1",
//!   "engine": { "model": "office.json", "environment": "chicago.weather" },
//!   "model": {
//!     "outputVariables": [
//!       { "name": "Lights Electricity Rate", "key": "Core_ZN_Lights", "fmiName": "Core_Zone_Lights_Output" }
//!     ],
//!     "emsActuators": [
//!       { "variableName": "Core_ZN People", "componentType": "People",
//!         "controlType": "Number of People", "unit": "1", "fmiName": "Core_Zone_People" }
//!     ]
//!   }
//! }
//! ```
//!
//! The engine section is also accepted under the key `EnergyPlus`, with `idf`
//! and `weather` in place of `model` and `environment`. Relative paths resolve
//! against the directory of the configuration file, or the process working
//! directory when the configuration is given inline.
//!
//! Zones and surfaces listed under `model.zones` and `model.zoneSurfaces`
//! (alias `buildingSurfaceDetailed`) expand into one binding per quantity,
//! e.g. `{ "name": "Core_ZN" }` yields `Core_ZN_V`, `Core_ZN_T`,
//! `Core_ZN_QConSen_flow` and the rest. Temperatures are exchanged in kelvin.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use cosim_core::{EngineVariable, SurfaceQuantity, Unit, UnitError, ZoneQuantity};
use jiff::civil::Weekday;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::registry::{Causality, VariableBinding};

/// Length of the default run period: one non-leap year.
const DEFAULT_STOP_TIME: f64 = 365.0 * 86_400.0;

/// Errors that make a configuration unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("cannot read configuration file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("binding `{binding}` has an empty `{field}`")]
    EmptyField {
        binding: String,
        field: &'static str,
    },

    #[error("binding `{binding}` declares an invalid unit")]
    Unit {
        binding: String,
        #[source]
        source: UnitError,
    },

    #[error("unknown day of week `{0}`")]
    Weekday(String),

    #[error("stop time must be positive and finite, got {0}")]
    StopTime(f64),

    #[error("invalid driver options: {0}")]
    Options(&'static str),
}

/// A parsed and validated run configuration.
///
/// The configuration is immutable once an instance is created from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(rename = "engine", alias = "EnergyPlus")]
    pub engine: EngineFiles,

    #[serde(rename = "RunPeriod", default)]
    pub run_period: RunPeriod,

    #[serde(default)]
    pub model: ModelBindings,

    /// Directory relative paths are resolved against.
    #[serde(skip)]
    base_path: PathBuf,
}

/// Input files handed to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineFiles {
    #[serde(alias = "idf")]
    pub model: PathBuf,

    #[serde(alias = "weather")]
    pub environment: PathBuf,
}

/// Time bounds and calendar of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunPeriod {
    /// End of the run in seconds.
    pub stop_time: f64,

    /// Day of the week of the first simulated day, e.g. `Sunday`.
    pub day_of_week_for_start_day: String,
}

/// The variables exposed by the driver, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelBindings {
    #[serde(default)]
    pub output_variables: Vec<OutputVariable>,

    #[serde(default)]
    pub ems_actuators: Vec<EmsActuator>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schedules: Vec<ScheduleInput>,

    /// Zones coupled to the caller, each expanded into the bindings named by
    /// [`ZoneQuantity`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub zones: Vec<ZoneInput>,

    /// Surfaces coupled to the caller, each expanded into the bindings named
    /// by [`SurfaceQuantity`].
    #[serde(
        default,
        alias = "buildingSurfaceDetailed",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub zone_surfaces: Vec<SurfaceInput>,
}

/// An engine output variable exposed read-only under `fmi_name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputVariable {
    pub name: String,
    pub key: String,
    pub fmi_name: String,

    /// Unit the value is reported in; the engine's own unit when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// An engine actuator exposed writable under `fmi_name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmsActuator {
    pub variable_name: String,
    pub component_type: String,
    pub control_type: String,
    pub unit: String,
    pub fmi_name: String,
}

/// A schedule whose value is overridden through `fmi_name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleInput {
    pub name: String,
    pub unit: String,
    pub fmi_name: String,
}

/// A zone exposed as `<name>_V`, `<name>_T`, `<name>_QConSen_flow` and so on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneInput {
    pub name: String,
}

/// A surface exposed as `<name>_A`, `<name>_Q_flow` and `<name>_T`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceInput {
    pub name: String,
}

fn default_version() -> String {
    "0.1".to_string()
}

impl Default for RunPeriod {
    fn default() -> Self {
        Self {
            stop_time: DEFAULT_STOP_TIME,
            day_of_week_for_start_day: "Sunday".to_string(),
        }
    }
}

impl Configuration {
    /// Parses configuration text, resolving relative paths against the
    /// process working directory.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the text is malformed or fails validation.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let base = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::parse_with_base(text, base)
    }

    /// Reads and parses a configuration file, resolving relative paths
    /// against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, is malformed, or
    /// fails validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let read_error = |source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        };
        let text = fs::read_to_string(path).map_err(read_error)?;
        let base = fs::canonicalize(path)
            .map_err(read_error)?
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self::parse_with_base(&text, base)
    }

    /// Loads a configuration from either a file path or inline JSON text.
    ///
    /// `input` is treated as a path if a file exists there, and as
    /// configuration text otherwise.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] as for [`from_file`](Self::from_file) or
    /// [`parse`](Self::parse).
    pub fn load(input: &str) -> Result<Self, ConfigError> {
        let path = Path::new(input);
        if !input.trim_start().starts_with('{') && path.is_file() {
            Self::from_file(path)
        } else {
            Self::parse(input)
        }
    }

    fn parse_with_base(text: &str, base: PathBuf) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(text)?;
        config.base_path = base;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration back into JSON text.
    ///
    /// Parsing the result yields the same bindings, paths and run period.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if serialization fails.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Returns the model definition path, resolved against the base path.
    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        self.resolve(&self.engine.model)
    }

    /// Returns the environment data path, resolved against the base path.
    #[must_use]
    pub fn environment_path(&self) -> PathBuf {
        self.resolve(&self.engine.environment)
    }

    /// Returns the end of the run in seconds.
    #[must_use]
    pub fn stop_time(&self) -> f64 {
        self.run_period.stop_time
    }

    /// Returns the day of the week of the first simulated day.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Weekday`] if the configured name is unknown.
    pub fn start_weekday(&self) -> Result<Weekday, ConfigError> {
        parse_weekday(&self.run_period.day_of_week_for_start_day)
    }

    /// Builds the variable bindings in declaration order: outputs, actuators,
    /// schedules, then every quantity of each zone and each surface.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Unit`] if a binding declares an unknown unit.
    pub fn bindings(&self) -> Result<Vec<VariableBinding>, ConfigError> {
        let outputs = self.model.output_variables.iter().map(|output| {
            let unit = output
                .unit
                .as_deref()
                .map(|unit| parse_unit(&output.fmi_name, unit))
                .transpose()?;
            Ok(VariableBinding::new(
                output.fmi_name.clone(),
                EngineVariable::Output {
                    name: output.name.clone(),
                    key: output.key.clone(),
                },
                Causality::Output,
                unit,
            ))
        });

        let actuators = self.model.ems_actuators.iter().map(|actuator| {
            Ok(VariableBinding::new(
                actuator.fmi_name.clone(),
                EngineVariable::Actuator {
                    component_type: actuator.component_type.clone(),
                    control_type: actuator.control_type.clone(),
                    component_name: actuator.variable_name.clone(),
                },
                Causality::Input,
                Some(parse_unit(&actuator.fmi_name, &actuator.unit)?),
            ))
        });

        let schedules = self.model.schedules.iter().map(|schedule| {
            Ok(VariableBinding::new(
                schedule.fmi_name.clone(),
                EngineVariable::Schedule {
                    name: schedule.name.clone(),
                },
                Causality::Input,
                Some(parse_unit(&schedule.fmi_name, &schedule.unit)?),
            ))
        });

        let zones = self.model.zones.iter().flat_map(|zone| {
            ZoneQuantity::ALL.into_iter().map(|quantity| {
                Ok::<_, ConfigError>(coupled(
                    &zone.name,
                    quantity.suffix(),
                    EngineVariable::Zone {
                        name: zone.name.clone(),
                        quantity,
                    },
                    quantity.is_writable(),
                    quantity.unit(),
                ))
            })
        });

        let surfaces = self.model.zone_surfaces.iter().flat_map(|surface| {
            SurfaceQuantity::ALL.into_iter().map(|quantity| {
                Ok::<_, ConfigError>(coupled(
                    &surface.name,
                    quantity.suffix(),
                    EngineVariable::Surface {
                        name: surface.name.clone(),
                        quantity,
                    },
                    quantity.is_writable(),
                    quantity.unit(),
                ))
            })
        });

        outputs
            .chain(actuators)
            .chain(schedules)
            .chain(zones)
            .chain(surfaces)
            .collect()
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.model.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("engine.model"));
        }
        if self.engine.environment.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("engine.environment"));
        }

        let stop = self.run_period.stop_time;
        if !stop.is_finite() || stop <= 0.0 {
            return Err(ConfigError::StopTime(stop));
        }
        self.start_weekday()?;

        for output in &self.model.output_variables {
            non_empty(&output.fmi_name, "fmiName", &output.fmi_name)?;
            non_empty(&output.fmi_name, "name", &output.name)?;
            non_empty(&output.fmi_name, "key", &output.key)?;
        }
        for actuator in &self.model.ems_actuators {
            non_empty(&actuator.fmi_name, "fmiName", &actuator.fmi_name)?;
            non_empty(&actuator.fmi_name, "variableName", &actuator.variable_name)?;
            non_empty(&actuator.fmi_name, "componentType", &actuator.component_type)?;
            non_empty(&actuator.fmi_name, "controlType", &actuator.control_type)?;
        }
        for schedule in &self.model.schedules {
            non_empty(&schedule.fmi_name, "fmiName", &schedule.fmi_name)?;
            non_empty(&schedule.fmi_name, "name", &schedule.name)?;
        }
        for zone in &self.model.zones {
            non_empty("zones", "name", &zone.name)?;
        }
        for surface in &self.model.zone_surfaces {
            non_empty("zoneSurfaces", "name", &surface.name)?;
        }

        // Surfaces unit errors at parse time rather than at first use.
        self.bindings().map(|_| ())
    }
}

fn coupled(
    object: &str,
    suffix: &str,
    variable: EngineVariable,
    writable: bool,
    unit: Unit,
) -> VariableBinding {
    let causality = if writable {
        Causality::Input
    } else {
        Causality::Output
    };
    VariableBinding::new(format!("{object}_{suffix}"), variable, causality, Some(unit))
}

fn non_empty(binding: &str, field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::EmptyField {
            binding: binding.to_string(),
            field,
        })
    } else {
        Ok(())
    }
}

fn parse_unit(binding: &str, unit: &str) -> Result<Unit, ConfigError> {
    unit.parse().map_err(|source| ConfigError::Unit {
        binding: binding.to_string(),
        source,
    })
}

fn parse_weekday(name: &str) -> Result<Weekday, ConfigError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "monday" => Ok(Weekday::Monday),
        "tuesday" => Ok(Weekday::Tuesday),
        "wednesday" => Ok(Weekday::Wednesday),
        "thursday" => Ok(Weekday::Thursday),
        "friday" => Ok(Weekday::Friday),
        "saturday" => Ok(Weekday::Saturday),
        "sunday" => Ok(Weekday::Sunday),
        _ => Err(ConfigError::Weekday(name.to_string())),
    }
}
