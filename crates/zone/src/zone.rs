use uom::si::{
    f64::{ThermodynamicTemperature, Time},
    thermodynamic_temperature::degree_celsius,
    time::second,
};

use crate::model::ZoneSpec;

/// Volumetric heat capacity of air in J/(m³·K).
const AIR_HEAT_CAPACITY: f64 = 1.2 * 1005.0;

/// Convective exchange with a surface held at a known temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coupling {
    /// Film coefficient times area, in W/K.
    pub conductance: f64,

    /// Surface temperature in °C.
    pub temperature: f64,
}

/// A single well-mixed air node exchanging heat with the outdoors and with
/// any coupled surfaces.
///
/// With gains `Q`, outdoor temperature `T_o` and surface temperatures `T_i`
/// held constant over a step, the air temperature relaxes exponentially
/// toward its equilibrium:
///
/// ```text
/// G = UA + sum(hA_i)
/// T_eq = (UA * T_o + sum(hA_i * T_i) + Q) / G
/// T(t + dt) = T_eq + (T(t) - T_eq) * exp(-dt * G / C)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ThermalZone {
    /// Envelope conductance in W/K.
    ua: f64,

    /// Heat capacity in J/K.
    capacitance: f64,

    temperature: ThermodynamicTemperature,
}

impl ThermalZone {
    #[must_use]
    pub fn new(spec: &ZoneSpec) -> Self {
        Self {
            ua: spec.ua,
            capacitance: spec.volume * AIR_HEAT_CAPACITY * spec.mass_multiplier,
            temperature: ThermodynamicTemperature::new::<degree_celsius>(spec.initial_temperature),
        }
    }

    #[must_use]
    pub fn temperature(&self) -> ThermodynamicTemperature {
        self.temperature
    }

    /// Envelope conductance in W/K.
    #[must_use]
    pub fn ua(&self) -> f64 {
        self.ua
    }

    /// Replaces the air temperature, as when a caller supplies it.
    pub fn hold(&mut self, temperature: ThermodynamicTemperature) {
        self.temperature = temperature;
    }

    /// Advances the air temperature over `dt` with constant conditions.
    ///
    /// `outdoor` is in °C and `gains` in W.
    pub fn advance(&mut self, outdoor: f64, gains: f64, couplings: &[Coupling], dt: Time) {
        let dt = dt.get::<second>();
        if dt <= 0.0 {
            return;
        }
        let conductance = self.ua + couplings.iter().map(|c| c.conductance).sum::<f64>();
        let driving = self.ua * outdoor
            + couplings
                .iter()
                .map(|c| c.conductance * c.temperature)
                .sum::<f64>();
        let equilibrium = (driving + gains) / conductance;
        let decay = (-dt * conductance / self.capacitance).exp();
        let current = self.temperature.get::<degree_celsius>();
        self.temperature = ThermodynamicTemperature::new::<degree_celsius>(
            equilibrium + (current - equilibrium) * decay,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn zone() -> ThermalZone {
        ThermalZone::new(&ZoneSpec {
            name: "Core_ZN".into(),
            volume: 1000.0,
            ua: 400.0,
            floor_area: None,
            mass_multiplier: 1.0,
            initial_temperature: 20.0,
            people: Vec::new(),
            lights: Vec::new(),
            heating: None,
        })
    }

    fn celsius(zone: &ThermalZone) -> f64 {
        zone.temperature().get::<degree_celsius>()
    }

    #[test]
    fn relaxes_toward_outdoor_without_gains() {
        let mut zone = zone();
        let tau = 1000.0 * AIR_HEAT_CAPACITY / 400.0;

        zone.advance(0.0, 0.0, &[], Time::new::<second>(tau));
        assert_relative_eq!(celsius(&zone), 20.0 * (-1.0_f64).exp(), epsilon = 1e-9);
    }

    #[test]
    fn holds_at_equilibrium() {
        let mut zone = zone();
        // 400 W/K * 20 K = 8 kW keeps the zone at 20 °C with 0 °C outside.
        zone.advance(0.0, 8000.0, &[], Time::new::<second>(3600.0));
        assert_relative_eq!(celsius(&zone), 20.0, epsilon = 1e-9);
    }

    #[test]
    fn splitting_a_step_changes_nothing() {
        let mut whole = zone();
        let mut halves = zone();

        whole.advance(-5.0, 2000.0, &[], Time::new::<second>(1200.0));
        halves.advance(-5.0, 2000.0, &[], Time::new::<second>(600.0));
        halves.advance(-5.0, 2000.0, &[], Time::new::<second>(600.0));

        assert_relative_eq!(celsius(&whole), celsius(&halves), epsilon = 1e-9);
    }

    #[test]
    fn surfaces_pull_the_air_toward_their_temperature() {
        let mut zone = zone();
        // 400 W/K to 0 °C outside and 400 W/K to a 30 °C slab settle at 15 °C.
        let slab = Coupling {
            conductance: 400.0,
            temperature: 30.0,
        };
        zone.advance(0.0, 0.0, &[slab], Time::new::<second>(1.0e7));
        assert_relative_eq!(celsius(&zone), 15.0, epsilon = 1e-9);
    }

    #[test]
    fn held_temperature_is_the_starting_point() {
        let mut zone = zone();
        zone.hold(ThermodynamicTemperature::new::<degree_celsius>(8.0));
        zone.advance(0.0, 3200.0, &[], Time::new::<second>(600.0));
        assert_relative_eq!(celsius(&zone), 8.0, epsilon = 1e-9);
    }
}
