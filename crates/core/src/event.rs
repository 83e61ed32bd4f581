/// Event information reported by an [`Engine`](crate::Engine).
///
/// An engine can only tell when its next discrete event happens after it has
/// been stepped or updated, so every stepping call returns a fresh `EventInfo`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventInfo {
    /// Time in seconds of the next known event, or `None` if unbounded.
    pub next_event_time: Option<f64>,

    /// The engine needs another discrete-state update at the current instant.
    pub discrete_states_pending: bool,

    /// Values of continuous states changed during the last update.
    pub values_changed: bool,

    /// The engine asks the driver to end the simulation.
    pub terminate_requested: bool,
}

impl EventInfo {
    /// Event information with no pending work and no known next event.
    #[must_use]
    pub fn settled() -> Self {
        Self {
            next_event_time: None,
            discrete_states_pending: false,
            values_changed: false,
            terminate_requested: false,
        }
    }

    /// Returns the time the driver may advance to without crossing an event.
    ///
    /// This is `target` unless a known event lies before it.
    #[must_use]
    pub fn boundary(&self, target: f64) -> f64 {
        match self.next_event_time {
            Some(event) if event < target => event,
            _ => target,
        }
    }
}

impl Default for EventInfo {
    fn default() -> Self {
        Self::settled()
    }
}
