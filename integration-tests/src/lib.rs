//! Shared fixtures for the driver's end-to-end tests.

use std::path::PathBuf;

use cosim_driver::Instance;
use cosim_zone::ZoneLoader;
use tracing_subscriber::EnvFilter;

/// A driver instance running the zone engine.
pub type ZoneInstance = Instance<ZoneLoader>;

/// Output binding for the core zone's lighting power.
pub const LIGHTS: &str = "Core_Zone_Lights_Output";

/// Output binding for the core zone's occupant count.
pub const OCCUPANTS: &str = "Core_Zone_Occupants";

/// Output binding for the core zone's air temperature.
pub const TEMPERATURE: &str = "Core_Zone_Temperature";

/// Input binding for the core zone's number of people.
pub const PEOPLE: &str = "Core_Zone_People";

/// Returns the path of a file under `fixtures/`.
#[must_use]
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
}

/// Returns the office configuration path as a string for [`Instance::create`].
#[must_use]
pub fn office_config() -> String {
    fixture("office.json").display().to_string()
}

/// Routes driver logs to the test harness, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
