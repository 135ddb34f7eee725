use super::*;
use chrono::{FixedOffset, Utc};

#[test]
fn selects_home_assistant_pod_but_not_esphome() {
    let names = "esphome-home-assistant-0 mosquitto-7d9 home-assistant-5f8c9-abcde zigbee2mqtt-0";
    assert_eq!(select_hass_pod(names.split_whitespace()), Some("home-assistant-5f8c9-abcde"));
    assert_eq!(select_hass_pod("Home-Assistant-0".split_whitespace()), Some("Home-Assistant-0"));
    assert_eq!(select_hass_pod("esphome-0 mosquitto-0".split_whitespace()), None);
    assert_eq!(select_hass_pod(std::iter::empty()), None);
}

#[test]
fn merge_appends_template_section() {
    let merged = merge_template("homeassistant:\n  name: Home\n\n\n", "  - sensor:\n      - name: Battery total\n").unwrap();
    assert_eq!(
        merged,
        "homeassistant:\n  name: Home\n\n# Added by hactl\ntemplate:\n  - sensor:\n      - name: Battery total\n"
    );
}

#[test]
fn merge_refuses_existing_template_section() {
    let current = "sensor: []\ntemplate:\n  - sensor: []\n";
    assert!(matches!(merge_template(current, "  - binary_sensor: []\n"), Err(CliError::MergeConflict)));
}

#[test]
fn backup_name_uses_timestamp() {
    let now = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
    assert_eq!(backup_name(DEFAULT_CONFIG_FILE, &now), "/config/configuration.yaml.backup.20240309_070501");

    let offset = FixedOffset::east_opt(3600).unwrap().with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
    assert_eq!(backup_name("/c.yaml", &offset), "/c.yaml.backup.20241231_235959");
}

#[tokio::test]
async fn missing_program_is_an_io_error() {
    let kubectl = Kubectl::with_program("hactl-test-no-such-kubectl", DEFAULT_NAMESPACE);
    assert!(matches!(kubectl.run(["get", "pods"]).await, Err(CliError::Io { .. })));
}

#[tokio::test]
async fn failing_command_reports_arguments() {
    let kubectl = Kubectl::with_program("false", DEFAULT_NAMESPACE);
    match kubectl.exec("home-assistant-0", &["ha", "core", "restart"]).await {
        Err(CliError::Kubectl { command, .. }) => assert_eq!(command, "exec home-assistant-0 -- ha core restart"),
        other => panic!("expected kubectl failure, got {other:?}"),
    }
}

#[tokio::test]
async fn pod_lookup_parses_name_list() {
    // `echo -n <namespace> ...` prints the namespace first, standing in for the pod list.
    let kubectl = Kubectl::with_program("echo", "ns-home-assistant-0");
    assert_eq!(kubectl.find_hass_pod().await.unwrap().as_deref(), Some("ns-home-assistant-0"));
    assert_eq!(kubectl.namespace(), "ns-home-assistant-0");
}
