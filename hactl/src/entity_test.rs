use super::*;
use serde_json::json;

#[test]
fn decodes_with_missing_fields_defaulted() {
    let state: EntityState = serde_json::from_value(json!({"entity_id": "light.kitchen"})).unwrap();
    assert_eq!(state.entity_id, "light.kitchen");
    assert_eq!(state.state, "");
    assert!(state.attributes.is_empty());
    assert_eq!(state.last_updated, None);
}

#[test]
fn domain_splits_on_first_dot() {
    let state = EntityState { entity_id: "sensor.outdoor.temp".to_owned(), ..EntityState::default() };
    assert_eq!(state.domain(), "sensor");

    let odd = EntityState { entity_id: "nodot".to_owned(), ..EntityState::default() };
    assert_eq!(odd.domain(), "unknown");
}

#[test]
fn friendly_name_falls_back_to_entity_id() {
    let named: EntityState = serde_json::from_value(json!({
        "entity_id": "switch.pump",
        "state": "on",
        "attributes": {"friendly_name": "Pool Pump", "device_class": 3}
    }))
    .unwrap();
    assert_eq!(named.friendly_name(), "Pool Pump");
    assert_eq!(named.attr_str("device_class"), None);

    let bare = EntityState { entity_id: "switch.pump".to_owned(), ..EntityState::default() };
    assert_eq!(bare.friendly_name(), "switch.pump");
}

#[test]
fn attr_treats_null_as_absent() {
    let state: EntityState =
        serde_json::from_value(json!({"entity_id": "zone.home", "attributes": {"radius": null, "icon": "mdi:home"}}))
            .unwrap();
    assert!(state.attr("radius").is_none());
    assert_eq!(state.attr("icon"), Some(&json!("mdi:home")));
}
