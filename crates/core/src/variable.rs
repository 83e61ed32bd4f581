use std::fmt;

use crate::Unit;

/// Identifies a piece of engine data by the engine's own naming.
///
/// Names are matched by the engine, which may treat them case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EngineVariable {
    /// A reported output variable, e.g. `Lights Electricity Rate` keyed by a
    /// lights object name.
    Output { name: String, key: String },

    /// A controllable actuator on a model component.
    Actuator {
        component_type: String,
        control_type: String,
        component_name: String,
    },

    /// The value of a named schedule, which can be overridden.
    Schedule { name: String },

    /// A quantity of a thermal zone coupled to the driver's caller.
    Zone { name: String, quantity: ZoneQuantity },

    /// A quantity of a zone surface whose temperature the caller supplies.
    Surface {
        name: String,
        quantity: SurfaceQuantity,
    },
}

impl EngineVariable {
    /// Returns `true` if the engine accepts writes to this kind of variable.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        match self {
            Self::Output { .. } => false,
            Self::Actuator { .. } | Self::Schedule { .. } => true,
            Self::Zone { quantity, .. } => quantity.is_writable(),
            Self::Surface { quantity, .. } => quantity.is_writable(),
        }
    }
}

/// What a [`EngineVariable::Zone`] refers to.
///
/// Each quantity is exposed under `<zone>_<suffix>` in the unit returned by
/// [`unit`](ZoneQuantity::unit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneQuantity {
    /// Air volume.
    Volume,
    /// Floor area.
    FloorArea,
    /// Multiplier on the air's sensible heat capacity.
    SensibleMultiplier,
    /// Air temperature, imposed by the caller.
    Temperature,
    /// Convective sensible heat gain to the air.
    ConvectiveGain,
    /// Latent heat gain to the air.
    LatentGain,
    /// Total heat given off by occupants.
    PeopleGain,
    /// Area-weighted mean temperature of the zone's surfaces.
    RadiantTemperature,
}

impl ZoneQuantity {
    pub const ALL: [Self; 8] = [
        Self::Volume,
        Self::FloorArea,
        Self::SensibleMultiplier,
        Self::Temperature,
        Self::ConvectiveGain,
        Self::LatentGain,
        Self::PeopleGain,
        Self::RadiantTemperature,
    ];

    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Volume => "V",
            Self::FloorArea => "AFlo",
            Self::SensibleMultiplier => "mSenFac",
            Self::Temperature => "T",
            Self::ConvectiveGain => "QConSen_flow",
            Self::LatentGain => "QLat_flow",
            Self::PeopleGain => "QPeo_flow",
            Self::RadiantTemperature => "TRad",
        }
    }

    /// Unit the quantity is exposed in.
    #[must_use]
    pub fn unit(self) -> Unit {
        match self {
            Self::Volume => Unit::CubicMeter,
            Self::FloorArea => Unit::SquareMeter,
            Self::SensibleMultiplier => Unit::One,
            Self::Temperature | Self::RadiantTemperature => Unit::Kelvin,
            Self::ConvectiveGain | Self::LatentGain | Self::PeopleGain => Unit::Watt,
        }
    }

    #[must_use]
    pub fn is_writable(self) -> bool {
        self == Self::Temperature
    }
}

/// What a [`EngineVariable::Surface`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceQuantity {
    /// Area exposed to the zone.
    Area,
    /// Net heat flow from the zone into the surface.
    HeatFlow,
    /// Surface temperature, imposed by the caller.
    Temperature,
}

impl SurfaceQuantity {
    pub const ALL: [Self; 3] = [Self::Area, Self::HeatFlow, Self::Temperature];

    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Area => "A",
            Self::HeatFlow => "Q_flow",
            Self::Temperature => "T",
        }
    }

    /// Unit the quantity is exposed in.
    #[must_use]
    pub fn unit(self) -> Unit {
        match self {
            Self::Area => Unit::SquareMeter,
            Self::HeatFlow => Unit::Watt,
            Self::Temperature => Unit::Kelvin,
        }
    }

    #[must_use]
    pub fn is_writable(self) -> bool {
        self == Self::Temperature
    }
}

impl fmt::Display for EngineVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Output { name, key } => write!(f, "output `{name}` [{key}]"),
            Self::Actuator {
                component_type,
                control_type,
                component_name,
            } => write!(
                f,
                "actuator `{component_type}`/`{control_type}` [{component_name}]"
            ),
            Self::Schedule { name } => write!(f, "schedule `{name}`"),
            Self::Zone { name, quantity } => write!(f, "zone `{name}` {}", quantity.suffix()),
            Self::Surface { name, quantity } => {
                write!(f, "surface `{name}` {}", quantity.suffix())
            }
        }
    }
}

/// An opaque engine-issued handle for a resolved variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(pub usize);

/// A resolved handle together with the unit the engine reports values in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleInfo {
    pub handle: Handle,
    pub unit: Unit,
}

/// The outcome of asking an engine to resolve an [`EngineVariable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// The variable exists and can be accessed through the handle.
    Found(HandleInfo),

    /// The engine has not finished initializing far enough to hand out
    /// handles. Asking again later may succeed.
    Pending,

    /// The engine's model has no such variable.
    Missing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outputs_are_read_only() {
        let output = EngineVariable::Output {
            name: "Zone Mean Air Temperature".into(),
            key: "Core_ZN".into(),
        };
        let actuator = EngineVariable::Actuator {
            component_type: "People".into(),
            control_type: "Number of People".into(),
            component_name: "Core_ZN People".into(),
        };
        let schedule = EngineVariable::Schedule {
            name: "Lighting".into(),
        };

        assert!(!output.is_writable());
        assert!(actuator.is_writable());
        assert!(schedule.is_writable());

        let zone = |quantity| EngineVariable::Zone {
            name: "Core_ZN".into(),
            quantity,
        };
        assert!(zone(ZoneQuantity::Temperature).is_writable());
        assert!(!zone(ZoneQuantity::ConvectiveGain).is_writable());
        assert!(!zone(ZoneQuantity::Volume).is_writable());
    }

    #[test]
    fn zone_quantities_have_distinct_suffixes() {
        let mut suffixes: Vec<_> = ZoneQuantity::ALL.iter().map(|q| q.suffix()).collect();
        suffixes.sort_unstable();
        suffixes.dedup();
        assert_eq!(suffixes.len(), ZoneQuantity::ALL.len());

        let surface = EngineVariable::Surface {
            name: "Core_ZN_Floor".into(),
            quantity: SurfaceQuantity::HeatFlow,
        };
        assert_eq!(surface.to_string(), "surface `Core_ZN_Floor` Q_flow");
        assert!(!surface.is_writable());
    }

    #[test]
    fn display_names_the_engine_identifier() {
        let output = EngineVariable::Output {
            name: "Lights Electricity Rate".into(),
            key: "Core_ZN_Lights".into(),
        };
        assert_eq!(
            output.to_string(),
            "output `Lights Electricity Rate` [Core_ZN_Lights]"
        );
    }
}
