use super::*;
use crate::test_support::{Reply, fake_hass};
use serde_json::json;

fn registries() -> Registries {
    Registries {
        areas: serde_json::from_value(json!([
            {"area_id": "kitchen", "name": "Kitchen", "picture": null},
            {"area_id": "attic"},
            {"area_id": "bedroom", "name": "bedroom"}
        ]))
        .unwrap(),
        devices: serde_json::from_value(json!([
            {"id": "d1", "area_id": "kitchen"},
            {"id": "d2", "area_id": "kitchen"},
            {"id": "d3", "area_id": null},
            {"id": "d4", "area_id": "bedroom"}
        ]))
        .unwrap(),
        entities: serde_json::from_value(json!([
            {"entity_id": "light.kitchen", "device_id": "d1", "area_id": null},
            {"entity_id": "sensor.fridge", "device_id": "d2"},
            {"entity_id": "light.lamp", "device_id": "d2", "area_id": "bedroom"},
            {"entity_id": "sensor.orphan", "device_id": "d3"},
            {"entity_id": "sun.sun"}
        ]))
        .unwrap(),
    }
}

#[test]
fn entity_area_overrides_device_area() {
    let report = build_report(&registries());
    let names: Vec<_> = report.areas.iter().map(|area| area.name.as_str()).collect();
    assert_eq!(names, vec!["attic", "bedroom", "Kitchen"]);

    let kitchen = &report.areas[2];
    assert_eq!(kitchen.device_count, 2);
    assert_eq!(kitchen.entity_count, 2);
    assert_eq!(kitchen.sample_entities, vec!["light.kitchen", "sensor.fridge"]);

    let bedroom = &report.areas[1];
    assert_eq!(bedroom.device_count, 1);
    assert_eq!(bedroom.sample_entities, vec!["light.lamp"]);

    assert_eq!(report.areas[0].entity_count, 0);
    assert_eq!(report.unassigned_entities, 2);
}

#[tokio::test]
async fn registries_fetched_in_one_session() {
    let (config, peer) = fake_hass(vec![
        ("config/area_registry/list", Reply::Ok(json!([{"area_id": "office", "name": "Office"}]))),
        ("config/device_registry/list", Reply::Ok(json!([{"id": "d1", "area_id": "office"}]))),
        ("config/entity_registry/list", Reply::Ok(json!([{"entity_id": "light.desk", "device_id": "d1"}]))),
    ]);

    let registries = ws::session(&config, fetch_registries).await.unwrap();
    let report = build_report(&registries);
    assert_eq!(report.areas[0].entity_count, 1);
    assert_eq!(report.areas[0].device_count, 1);
    assert_eq!(peer.join().unwrap().len(), 3);
}

#[tokio::test]
async fn failed_registry_call_aborts() {
    let (config, _peer) = fake_hass(vec![("config/area_registry/list", Reply::Fail("unauthorized"))]);
    let err = ws::session(&config, fetch_registries).await.unwrap_err();
    assert!(matches!(err, CliError::Ws(hassws::WsError::RemoteCallFailed(_))));
}
