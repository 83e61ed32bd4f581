use uom::si::f64::{TemperatureInterval, ThermodynamicTemperature};

/// Whether a zone's heating is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwitchState {
    On,
    #[default]
    Off,
}

/// A heating thermostat with a one-sided deadband.
///
/// - If currently `Off` and `temperature <= setpoint - deadband`, returns `On`.
/// - If currently `On` and `temperature >= setpoint`, returns `Off`.
/// - Otherwise, the current state is returned unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatingThermostat {
    pub setpoint: ThermodynamicTemperature,
    pub deadband: TemperatureInterval,
}

impl HeatingThermostat {
    #[must_use]
    pub fn next_state(
        &self,
        state: SwitchState,
        temperature: ThermodynamicTemperature,
    ) -> SwitchState {
        match state {
            SwitchState::Off if temperature <= self.setpoint - self.deadband => SwitchState::On,
            SwitchState::On if temperature >= self.setpoint => SwitchState::Off,
            _ => state,
        }
    }
}
