//! The JSON model file read by the zone engine.
//!
//! ```json
//! {
//!   "timestep": 600,
//!   "zones": [{
//!     "name": "Core_ZN", "volume": 1000.0, "ua": 400.0, "initialTemperature": 20.0,
//!     "people": [{ "name": "Core_ZN People", "count": 10, "schedule": "Occupancy" }],
//!     "lights": [{ "name": "Core_ZN_Lights", "designLevel": 1000.0, "schedule": "Lighting" }],
//!     "heating": { "setpoint": 21.0, "deadband": 1.0, "capacity": 8000.0 }
//!   }],
//!   "surfaces": [{ "name": "Core_ZN_Floor", "zone": "Core_ZN", "area": 250.0 }],
//!   "schedules": [{
//!     "name": "Lighting",
//!     "weekday": [{ "from": "00:00:00", "value": 0.05 }, { "from": "07:00:00", "value": 0.9 }],
//!     "weekend": [{ "from": "00:00:00", "value": 0.05 }]
//!   }]
//! }
//! ```

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::ZoneError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Zone timestep in seconds; the engine reports an event at every multiple.
    #[serde(default = "default_timestep")]
    pub timestep: f64,

    pub zones: Vec<ZoneSpec>,

    /// Surfaces whose temperature a caller may supply.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub surfaces: Vec<SurfaceSpec>,

    #[serde(default)]
    pub schedules: Vec<ScheduleSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneSpec {
    pub name: String,

    /// Air volume in m³.
    pub volume: f64,

    /// Envelope conductance in W/K.
    pub ua: f64,

    /// Floor area in m².
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor_area: Option<f64>,

    /// Scales the air heat capacity to account for furnishings and structure.
    #[serde(default = "one")]
    pub mass_multiplier: f64,

    /// Air temperature at the start of the run in °C.
    pub initial_temperature: f64,

    #[serde(default)]
    pub people: Vec<PeopleSpec>,

    #[serde(default)]
    pub lights: Vec<LightsSpec>,

    #[serde(default)]
    pub heating: Option<HeatingSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeopleSpec {
    pub name: String,

    /// Occupants at a schedule fraction of one.
    pub count: f64,

    pub schedule: String,

    /// Total heat per occupant in W.
    #[serde(default = "default_heat_gain")]
    pub heat_gain: f64,

    /// Share of `heat_gain` released as moisture rather than to the air.
    #[serde(default)]
    pub latent_fraction: f64,
}

impl PeopleSpec {
    /// Heat per occupant that warms the air, in W.
    #[must_use]
    pub fn sensible_gain(&self) -> f64 {
        self.heat_gain * (1.0 - self.latent_fraction)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightsSpec {
    pub name: String,

    /// Electric power in W at a schedule fraction of one.
    pub design_level: f64,

    pub schedule: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatingSpec {
    /// Heating setpoint in °C.
    pub setpoint: f64,

    /// Heating turns on at `setpoint - deadband`, in K.
    pub deadband: f64,

    /// Heating capacity in W.
    pub capacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceSpec {
    pub name: String,

    /// Zone the surface faces.
    pub zone: String,

    /// Area in m².
    pub area: f64,

    /// Convective film coefficient in W/(m²·K).
    #[serde(default = "default_film_coefficient")]
    pub coefficient: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSpec {
    pub name: String,
    pub weekday: Vec<ProfileEntry>,

    /// Profile used on Saturdays and Sundays; the weekday profile if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekend: Option<Vec<ProfileEntry>>,
}

/// A value that holds from a time of day until the next entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileEntry {
    pub from: jiff::civil::Time,
    pub value: f64,
}

fn default_timestep() -> f64 {
    600.0
}

fn default_heat_gain() -> f64 {
    120.0
}

fn default_film_coefficient() -> f64 {
    3.0
}

fn one() -> f64 {
    1.0
}

impl Model {
    /// Reads and validates a model file.
    ///
    /// # Errors
    ///
    /// Returns a [`ZoneError`] if the file cannot be read or describes an
    /// invalid model.
    pub fn from_file(path: &Path) -> Result<Self, ZoneError> {
        let text = fs::read_to_string(path).map_err(|source| ZoneError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parses and validates model text.
    ///
    /// # Errors
    ///
    /// Returns a [`ZoneError`] if the text is malformed or describes an
    /// invalid model.
    pub fn parse(text: &str) -> Result<Self, ZoneError> {
        let model: Self = serde_json::from_str(text)?;
        model.validate()?;
        Ok(model)
    }

    /// Finds a schedule by case-insensitive name.
    #[must_use]
    pub fn schedule_index(&self, name: &str) -> Option<usize> {
        self.schedules
            .iter()
            .position(|schedule| schedule.name.eq_ignore_ascii_case(name))
    }

    /// Finds a zone by case-insensitive name.
    #[must_use]
    pub fn zone_index(&self, name: &str) -> Option<usize> {
        self.zones
            .iter()
            .position(|zone| zone.name.trim().eq_ignore_ascii_case(name.trim()))
    }

    fn validate(&self) -> Result<(), ZoneError> {
        if !(self.timestep.is_finite() && self.timestep > 0.0) {
            return Err(ZoneError::Invalid(format!(
                "timestep must be positive, got {}",
                self.timestep
            )));
        }
        if self.zones.is_empty() {
            return Err(ZoneError::Invalid("at least one zone is required".into()));
        }

        for zone in &self.zones {
            if zone.volume <= 0.0 || zone.ua <= 0.0 || zone.mass_multiplier <= 0.0 {
                return Err(ZoneError::Invalid(format!(
                    "zone `{}` needs a positive volume, ua and mass multiplier",
                    zone.name
                )));
            }
            if zone.floor_area.is_some_and(|area| area <= 0.0) {
                return Err(ZoneError::Invalid(format!(
                    "zone `{}` needs a positive floor area",
                    zone.name
                )));
            }
            if let Some(people) = zone
                .people
                .iter()
                .find(|people| !(0.0..=1.0).contains(&people.latent_fraction))
            {
                return Err(ZoneError::Invalid(format!(
                    "`{}` latent fraction must lie in [0, 1]",
                    people.name
                )));
            }

            let references = zone
                .people
                .iter()
                .map(|people| (&people.name, &people.schedule))
                .chain(zone.lights.iter().map(|lights| (&lights.name, &lights.schedule)));
            for (owner, schedule) in references {
                if self.schedule_index(schedule).is_none() {
                    return Err(ZoneError::UnknownSchedule {
                        owner: owner.clone(),
                        schedule: schedule.clone(),
                    });
                }
            }
        }

        for surface in &self.surfaces {
            if self.zone_index(&surface.zone).is_none() {
                return Err(ZoneError::Invalid(format!(
                    "surface `{}` faces unknown zone `{}`",
                    surface.name, surface.zone
                )));
            }
            if surface.area <= 0.0 || surface.coefficient <= 0.0 {
                return Err(ZoneError::Invalid(format!(
                    "surface `{}` needs a positive area and coefficient",
                    surface.name
                )));
            }
        }
        Ok(())
    }
}
