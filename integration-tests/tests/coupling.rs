use approx::assert_relative_eq;
use cosim_driver::{Causality, Error, State};
use integration_tests::{TEMPERATURE, ZoneInstance, init_tracing, office_config};

/// Zone air temperature input, in K.
const AIR: &str = "Core_ZN_T";

/// Floor surface temperature input, in K.
const FLOOR: &str = "Core_ZN_Floor_T";

const KELVIN_OFFSET: f64 = 273.15;

fn running() -> (ZoneInstance, tempfile::TempDir) {
    init_tracing();
    let root = tempfile::tempdir().unwrap();
    let mut instance =
        ZoneInstance::create("coupled", &office_config(), Some(root.path())).unwrap();
    instance.start().unwrap();
    (instance, root)
}

#[test]
fn zone_and_surface_bindings_follow_their_names() {
    let (instance, _root) = running();

    let names: Vec<_> = instance.bindings().iter().map(|b| b.name().to_string()).collect();
    assert_eq!(
        &names[4..],
        [
            "Core_ZN_V",
            "Core_ZN_AFlo",
            "Core_ZN_mSenFac",
            "Core_ZN_T",
            "Core_ZN_QConSen_flow",
            "Core_ZN_QLat_flow",
            "Core_ZN_QPeo_flow",
            "Core_ZN_TRad",
            "Core_ZN_Floor_A",
            "Core_ZN_Floor_Q_flow",
            "Core_ZN_Floor_T",
        ]
    );

    let inputs: Vec<_> = instance
        .bindings()
        .iter()
        .filter(|b| b.causality() == Causality::Input)
        .map(|b| b.name().to_string())
        .collect();
    assert_eq!(inputs, ["Core_Zone_People", AIR, FLOOR]);
}

#[test]
fn zone_geometry_reads_in_declared_units() {
    let (mut instance, _root) = running();

    assert_relative_eq!(instance.get_value("Core_ZN_V").unwrap(), 1800.0);
    assert_relative_eq!(instance.get_value("Core_ZN_AFlo").unwrap(), 600.0);
    assert_relative_eq!(instance.get_value("Core_ZN_mSenFac").unwrap(), 3.0);
    assert_relative_eq!(instance.get_value("Core_ZN_Floor_A").unwrap(), 600.0);
    assert_relative_eq!(
        instance.get_value(AIR).unwrap(),
        20.0 + KELVIN_OFFSET,
        epsilon = 1e-9
    );
    assert!(instance.get_value("Core_ZN_QConSen_flow").unwrap().is_finite());
    assert_relative_eq!(instance.get_value("Core_ZN_QLat_flow").unwrap(), 0.0);

    assert!(matches!(
        instance.set_value("Core_ZN_V", 1.0),
        Err(Error::Causality(_))
    ));
}

#[test]
fn supplied_temperatures_drive_the_zone_by_index() {
    let (mut instance, _root) = running();
    let air = instance.variable_index(AIR).unwrap();
    let floor = instance.variable_index(FLOOR).unwrap();
    let flow = instance.variable_index("Core_ZN_Floor_Q_flow").unwrap();
    let radiant = instance.variable_index("Core_ZN_TRad").unwrap();

    instance.set_value_at(air, 22.0 + KELVIN_OFFSET).unwrap();
    instance.set_time(0.0).unwrap();
    assert_relative_eq!(instance.get_value(TEMPERATURE).unwrap(), 22.0, epsilon = 1e-9);
    assert_relative_eq!(instance.get_value_at(flow).unwrap(), 0.0);
    assert_relative_eq!(
        instance.get_value_at(radiant).unwrap(),
        22.0 + KELVIN_OFFSET,
        epsilon = 1e-9
    );

    instance.set_value_at(floor, 30.0 + KELVIN_OFFSET).unwrap();
    instance.set_time(600.0).unwrap();
    assert_relative_eq!(instance.get_value(TEMPERATURE).unwrap(), 22.0, epsilon = 1e-9);
    // 3 W/m²K over 600 m² of floor, 8 K warmer than the air.
    assert_relative_eq!(instance.get_value_at(flow).unwrap(), -14_400.0, epsilon = 1e-6);
    assert_relative_eq!(
        instance.get_value_at(radiant).unwrap(),
        30.0 + KELVIN_OFFSET,
        epsilon = 1e-9
    );

    instance.clear_value(AIR).unwrap();
    instance.set_time(1200.0).unwrap();
    let released = instance.get_value(TEMPERATURE).unwrap();
    assert!((released - 22.0).abs() > 1e-6, "air stayed at {released}");

    let past_the_end = instance.bindings().len();
    assert!(matches!(
        instance.get_value_at(past_the_end),
        Err(Error::UnknownIndex(index)) if index == past_the_end
    ));
    assert_eq!(instance.state(), State::Running);
    instance.stop();
}
