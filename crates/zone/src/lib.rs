//! A schedule-driven zone model for exercising the cosim driver.
//!
//! Each zone is a single air node with envelope losses, occupant and lighting
//! gains, and an optional deadband heating thermostat. The engine reports an
//! event at every model timestep and at every schedule change, and exposes:
//!
//! | Output | Key | Unit |
//! |--------|-----|------|
//! | `Zone Mean Air Temperature` | zone | degC |
//! | `Zone People Occupant Count` | zone | 1 |
//! | `Zone Lights Electricity Rate` | zone | W |
//! | `Lights Electricity Rate` | lights object | W |
//! | `Zone Heating Rate` | zone | W |
//! | `Site Outdoor Air Drybulb Temperature` | `Environment` | degC |
//! | `Schedule Value` | schedule | 1 |
//!
//! | Actuator | Control | Unit |
//! |----------|---------|------|
//! | `People` | `Number of People` | 1 |
//! | `Lights` | `Electricity Rate` | W |
//! | `Schedule:Compact` | `Schedule Value` | 1 |
//! | `Zone Temperature Control` | `Heating Setpoint` | degC |
//!
//! Zones and model surfaces also answer to direct quantity lookups:
//!
//! | Zone quantity | Unit | | Surface quantity | Unit |
//! |---------------|------|-|------------------|------|
//! | volume | m3 | | area | m2 |
//! | floor area, if the model gives one | m2 | | heat flow into the surface | W |
//! | sensible multiplier | 1 | | temperature (writable) | degC |
//! | air temperature (writable) | degC | | | |
//! | net convective gain | W | | | |
//! | latent gain | W | | | |
//! | occupant gain | W | | | |
//! | radiant temperature | degC | | | |
//!
//! Names are matched case-insensitively.

mod engine;
mod error;
mod loader;
pub mod model;
pub mod schedule;
mod thermostat;
pub mod weather;
mod zone;

pub use engine::{MESSAGE_LOG, PREPARED_MODEL, ZoneEngine};
pub use error::ZoneError;
pub use loader::ZoneLoader;
pub use thermostat::{HeatingThermostat, SwitchState};
pub use zone::{Coupling, ThermalZone};
