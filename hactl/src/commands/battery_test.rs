use super::*;
use crate::test_support::entities;
use serde_json::json;

fn fixture() -> Vec<EntityState> {
    entities(json!([
        {"entity_id": "sensor.door_battery", "state": "87", "attributes": {"friendly_name": "Door", "unit_of_measurement": "%"}},
        {"entity_id": "sensor.alex_iphone_battery_level", "state": "40", "attributes": {}},
        {"entity_id": "sensor.hall_battery_state", "state": "ok", "attributes": {}},
        {"entity_id": "sensor.remote_battery_percentage", "state": "12", "attributes": {}},
        {"entity_id": "sensor.Motion_Battery_Level", "state": "55", "attributes": {}},
        {"entity_id": "binary_sensor.window_battery_low", "state": "off", "attributes": {}},
        {"entity_id": "sensor.kitchen_temperature", "state": "21", "attributes": {}}
    ]))
}

#[test]
fn mobile_devices_excluded_by_default() {
    let ids: Vec<_> = select_batteries(&fixture(), false).into_iter().map(|s| s.entity_id).collect();
    assert_eq!(ids, vec!["sensor.Motion_Battery_Level", "sensor.door_battery", "sensor.remote_battery_percentage"]);
}

#[test]
fn include_mobile_keeps_phones_but_not_state_sensors() {
    let ids: Vec<_> = select_batteries(&fixture(), true).into_iter().map(|s| s.entity_id).collect();
    assert!(ids.contains(&"sensor.alex_iphone_battery_level".to_owned()));
    assert!(!ids.contains(&"sensor.hall_battery_state".to_owned()));
    assert!(!ids.contains(&"binary_sensor.window_battery_low".to_owned()));
}

#[test]
fn sensor_rows_carry_name_and_unit() {
    let sensors = select_batteries(&fixture(), false);
    let door = sensors.iter().find(|s| s.entity_id == "sensor.door_battery").unwrap();
    assert_eq!(door.friendly_name, "Door");
    assert_eq!(door.unit, "%");
    let remote = sensors.iter().find(|s| s.entity_id == "sensor.remote_battery_percentage").unwrap();
    assert_eq!(remote.friendly_name, "");
}

#[test]
fn summary_checks_classify_results() {
    let reporting = entities(json!([
        {"entity_id": "sensor.battery_average_level", "state": "71", "attributes": {"unit_of_measurement": "%"}},
        {"entity_id": "sensor.battery_low_count", "state": "unavailable", "attributes": {}}
    ]));
    let mut reporting = reporting.into_iter();

    let ok = SensorCheck::from_result(Ok(reporting.next().unwrap()));
    assert_eq!(ok, SensorCheck::Reporting { state: "71".into(), unit: "%".into() });
    assert!(ok.is_ok());

    assert_eq!(SensorCheck::from_result(Ok(reporting.next().unwrap())), SensorCheck::Unavailable);

    let failed = SensorCheck::from_result(Err(CliError::Api { status: 404, path: "/api/states/x".into(), body: "{}".into() }));
    assert!(matches!(failed, SensorCheck::Failed(ref message) if message.starts_with("HTTP 404")));
    assert!(!failed.is_ok());
}
