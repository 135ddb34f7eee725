use super::*;
use serde_json::json;

fn normalize(value: Value) -> Vec<ServiceEntry> {
    serde_json::from_value::<ServicesResponse>(value).unwrap().normalize()
}

#[test]
fn map_form_expands_domains_and_fields() {
    let entries = normalize(json!({
        "light": {
            "turn_on": {
                "description": "Turn on a light",
                "fields": {
                    "brightness": {"description": "0-255", "required": false, "example": 120},
                    "entity_id": {"description": "Target", "required": true}
                }
            },
            "toggle": "legacy"
        },
        "homeassistant": {"restart": {}}
    }));

    let names: Vec<_> = entries.iter().map(|e| format!("{}.{}", e.domain, e.service)).collect();
    assert_eq!(names, vec!["homeassistant.restart", "light.toggle", "light.turn_on"]);

    let turn_on = &entries[2];
    assert_eq!(turn_on.description, "Turn on a light");
    assert!(turn_on.fields["entity_id"].required);
    assert_eq!(turn_on.fields["brightness"].example, Some(json!(120)));
    assert_eq!(entries[1].description, "");
}

#[test]
fn list_form_accepts_flat_entries() {
    let entries = normalize(json!([
        {"domain": "switch", "service": "turn_off", "description": "Off", "fields": {"entity_id": "target"}},
        {"service": "orphan"},
        "not an object"
    ]));

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].domain, "switch");
    assert_eq!(entries[0].fields["entity_id"].value, Some(json!("target")));
    assert_eq!(entries[1].domain, "unknown");
    assert_eq!(entries[1].service, "orphan");
}

#[test]
fn list_form_accepts_grouped_entries() {
    let entries = normalize(json!([
        {"domain": "script", "services": {"reload": {"description": "Reload scripts"}, "turn_on": {}}}
    ]));

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].service, "reload");
    assert_eq!(entries[0].description, "Reload scripts");
    assert_eq!(entries[1].service, "turn_on");
}

#[test]
fn both_shapes_normalize_identically() {
    let from_map = normalize(json!({"fan": {"set_speed": {"description": "Speed"}}}));
    let from_list = normalize(json!([{"domain": "fan", "services": {"set_speed": {"description": "Speed"}}}]));
    assert_eq!(from_map, from_list);
}

#[test]
fn scalar_response_is_rejected() {
    assert!(serde_json::from_value::<ServicesResponse>(json!("nope")).is_err());
}

#[test]
fn grouping_keeps_domain_order() {
    let entries = normalize(json!({"b": {"x": {}}, "a": {"y": {}, "z": {}}}));
    let grouped = group_by_domain(&entries);
    let domains: Vec<_> = grouped.keys().copied().collect();
    assert_eq!(domains, vec!["a", "b"]);
    assert_eq!(grouped["a"].len(), 2);
}
