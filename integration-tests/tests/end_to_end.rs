use std::fs;

use cosim_driver::{State, days_to_seconds};
use integration_tests::{LIGHTS, PEOPLE, ZoneInstance, init_tracing, office_config};

/// Days between switches of the people input.
const PERIOD_DAYS: u32 = 7;

#[test]
fn runs_a_year_at_daily_resolution() {
    init_tracing();
    let root = tempfile::tempdir().unwrap();

    let mut instance = ZoneInstance::create("office", &office_config(), Some(root.path())).unwrap();
    instance.start().unwrap();
    assert_eq!(instance.state(), State::Running);

    for day in 0..365 {
        let people = if (day / PERIOD_DAYS) % 2 == 0 { 5.0 } else { 1.0 };
        instance.set_value(PEOPLE, people).unwrap();

        let time = days_to_seconds(f64::from(day));
        instance.set_time(time).unwrap();

        assert_eq!(instance.current_time().unwrap(), time);
        let lights = instance.get_value(LIGHTS).unwrap();
        assert!(lights > 0.0, "no lighting power on day {day}: {lights}");
    }

    instance.stop();
    assert_eq!(instance.state(), State::Terminated);
    assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
}

#[test]
fn stop_is_idempotent_and_releases_the_run_directory() {
    let root = tempfile::tempdir().unwrap();
    let mut instance = ZoneInstance::create("office", &office_config(), Some(root.path())).unwrap();
    instance.start().unwrap();

    let run_dir = instance.working_directory().unwrap().to_path_buf();
    assert!(run_dir.starts_with(root.path()));
    assert!(run_dir.join(cosim_zone::PREPARED_MODEL).exists());

    instance.set_time(3600.0).unwrap();
    instance.stop();
    instance.stop();

    assert_eq!(instance.state(), State::Terminated);
    assert!(!run_dir.exists());
    assert!(instance.working_directory().is_none());
}
