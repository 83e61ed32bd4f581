use std::{fmt, str::FromStr};

use thiserror::Error;
use uom::si::{
    angle, energy,
    f64::{Angle, Energy, Power, Pressure, Ratio, ThermodynamicTemperature, Time, Volume},
    power, pressure, ratio, thermodynamic_temperature, time, volume,
};

/// A unit a variable binding may be declared in.
///
/// Each unit belongs to a [`UnitKind`]. Values convert freely between units of
/// the same kind and never across kinds.
///
/// Units are written the way engine model files write them, e.g. `degC`,
/// `kgWater/kgDryAir` or `m3/s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    DegreeCelsius,
    Kelvin,
    One,
    KgWaterPerKgDryAir,
    Percent,
    Pascal,
    Kilopascal,
    MeterPerSecond,
    Degree,
    Radian,
    Watt,
    Kilowatt,
    WattPerSquareMeter,
    Joule,
    KilowattHour,
    Meter,
    SquareMeter,
    CubicMeter,
    Liter,
    CubicMeterPerSecond,
    Second,
    Minute,
    Hour,
    Kilogram,
    KilogramPerSecond,
}

/// The physical quantity a [`Unit`] measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    Temperature,
    Dimensionless,
    HumidityRatio,
    Pressure,
    Velocity,
    Angle,
    Power,
    HeatFlux,
    Energy,
    Length,
    Area,
    Volume,
    VolumeRate,
    Time,
    Mass,
    MassRate,
}

/// Errors from parsing or converting units.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    #[error("unknown unit `{0}`")]
    Unknown(String),

    #[error("cannot convert {from} ({from_kind:?}) to {to} ({to_kind:?})")]
    Incompatible {
        from: Unit,
        from_kind: UnitKind,
        to: Unit,
        to_kind: UnitKind,
    },
}

const UNIT_NAMES: [(Unit, &str); 25] = [
    (Unit::DegreeCelsius, "degC"),
    (Unit::Kelvin, "K"),
    (Unit::One, "1"),
    (Unit::KgWaterPerKgDryAir, "kgWater/kgDryAir"),
    (Unit::Percent, "%"),
    (Unit::Pascal, "Pa"),
    (Unit::Kilopascal, "kPa"),
    (Unit::MeterPerSecond, "m/s"),
    (Unit::Degree, "deg"),
    (Unit::Radian, "rad"),
    (Unit::Watt, "W"),
    (Unit::Kilowatt, "kW"),
    (Unit::WattPerSquareMeter, "W/m2"),
    (Unit::Joule, "J"),
    (Unit::KilowattHour, "kWh"),
    (Unit::Meter, "m"),
    (Unit::SquareMeter, "m2"),
    (Unit::CubicMeter, "m3"),
    (Unit::Liter, "L"),
    (Unit::CubicMeterPerSecond, "m3/s"),
    (Unit::Second, "s"),
    (Unit::Minute, "min"),
    (Unit::Hour, "hr"),
    (Unit::Kilogram, "kg"),
    (Unit::KilogramPerSecond, "kg/s"),
];

impl Unit {
    /// Returns the quantity this unit measures.
    #[must_use]
    pub fn kind(self) -> UnitKind {
        match self {
            Self::DegreeCelsius | Self::Kelvin => UnitKind::Temperature,
            Self::One | Self::Percent => UnitKind::Dimensionless,
            Self::KgWaterPerKgDryAir => UnitKind::HumidityRatio,
            Self::Pascal | Self::Kilopascal => UnitKind::Pressure,
            Self::MeterPerSecond => UnitKind::Velocity,
            Self::Degree | Self::Radian => UnitKind::Angle,
            Self::Watt | Self::Kilowatt => UnitKind::Power,
            Self::WattPerSquareMeter => UnitKind::HeatFlux,
            Self::Joule | Self::KilowattHour => UnitKind::Energy,
            Self::Meter => UnitKind::Length,
            Self::SquareMeter => UnitKind::Area,
            Self::CubicMeter | Self::Liter => UnitKind::Volume,
            Self::CubicMeterPerSecond => UnitKind::VolumeRate,
            Self::Second | Self::Minute | Self::Hour => UnitKind::Time,
            Self::Kilogram => UnitKind::Mass,
            Self::KilogramPerSecond => UnitKind::MassRate,
        }
    }

    /// Converts `value` from `from` into `to`.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::Incompatible`] if the units measure different
    /// quantities.
    pub fn convert(value: f64, from: Unit, to: Unit) -> Result<f64, UnitError> {
        if from == to || from.is_bare_ratio_of(to) || to.is_bare_ratio_of(from) {
            return Ok(value);
        }
        if from.kind() != to.kind() {
            return Err(UnitError::Incompatible {
                from,
                from_kind: from.kind(),
                to,
                to_kind: to.kind(),
            });
        }
        Ok(to.from_base(from.to_base(value)))
    }

    /// Humidity ratio is interchangeable with a bare ratio, but not with
    /// other dimensionless units such as `%`.
    fn is_bare_ratio_of(self, other: Unit) -> bool {
        self == Self::One && other == Self::KgWaterPerKgDryAir
    }

    /// Expresses `value`, given in this unit, in the SI unit of its kind.
    fn to_base(self, value: f64) -> f64 {
        use thermodynamic_temperature::{degree_celsius, kelvin};

        match self {
            Self::DegreeCelsius => {
                ThermodynamicTemperature::new::<degree_celsius>(value).get::<kelvin>()
            }
            Self::Percent => Ratio::new::<ratio::percent>(value).get::<ratio::ratio>(),
            Self::Kilopascal => Pressure::new::<pressure::kilopascal>(value).get::<pressure::pascal>(),
            Self::Degree => Angle::new::<angle::degree>(value).get::<angle::radian>(),
            Self::Kilowatt => Power::new::<power::kilowatt>(value).get::<power::watt>(),
            Self::KilowattHour => Energy::new::<energy::kilowatt_hour>(value).get::<energy::joule>(),
            Self::Liter => Volume::new::<volume::liter>(value).get::<volume::cubic_meter>(),
            Self::Minute => Time::new::<time::minute>(value).get::<time::second>(),
            Self::Hour => Time::new::<time::hour>(value).get::<time::second>(),
            _ => value,
        }
    }

    /// Expresses `value`, given in the SI unit of this kind, in this unit.
    fn from_base(self, value: f64) -> f64 {
        use thermodynamic_temperature::{degree_celsius, kelvin};

        match self {
            Self::DegreeCelsius => {
                ThermodynamicTemperature::new::<kelvin>(value).get::<degree_celsius>()
            }
            Self::Percent => Ratio::new::<ratio::ratio>(value).get::<ratio::percent>(),
            Self::Kilopascal => Pressure::new::<pressure::pascal>(value).get::<pressure::kilopascal>(),
            Self::Degree => Angle::new::<angle::radian>(value).get::<angle::degree>(),
            Self::Kilowatt => Power::new::<power::watt>(value).get::<power::kilowatt>(),
            Self::KilowattHour => Energy::new::<energy::joule>(value).get::<energy::kilowatt_hour>(),
            Self::Liter => Volume::new::<volume::cubic_meter>(value).get::<volume::liter>(),
            Self::Minute => Time::new::<time::second>(value).get::<time::minute>(),
            Self::Hour => Time::new::<time::second>(value).get::<time::hour>(),
            _ => value,
        }
    }

    /// Returns the unit's name as written in model files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        UNIT_NAMES
            .iter()
            .find(|(unit, _)| *unit == self)
            .map_or("?", |(_, name)| name)
    }
}

impl FromStr for Unit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        UNIT_NAMES
            .iter()
            .find(|(_, name)| *name == s)
            .map(|(unit, _)| *unit)
            .ok_or_else(|| UnitError::Unknown(s.to_string()))
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
