use super::*;
use crate::test_support::{Reply, fake_hass};
use serde_json::json;

#[tokio::test]
async fn session_runs_work_and_returns_its_value() {
    let (config, peer) = fake_hass(vec![("get_panels", Reply::Ok(json!({"energy": {}})))]);

    let panels = session(&config, |conn| Ok(conn.call("get_panels")?)).await.unwrap();
    assert_eq!(panels, json!({"energy": {}}));

    let seen = peer.join().unwrap();
    assert_eq!(seen[0]["id"], 2);
}

#[tokio::test]
async fn session_surfaces_remote_failure_as_ws_error() {
    let (config, peer) = fake_hass(vec![("lovelace/config", Reply::Fail("config_not_found"))]);

    let err = session(&config, |conn| Ok(conn.call("lovelace/config")?)).await.unwrap_err();
    match err {
        CliError::Ws(hassws::WsError::RemoteCallFailed(message)) => {
            assert_eq!(message["error"]["code"], "config_not_found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    peer.join().unwrap();
}

#[tokio::test]
async fn session_reports_connect_failure() {
    let config = HassConfig {
        base_url: "ftp://ha.local".to_owned(),
        token: "t".to_owned(),
        ws_timeout: std::time::Duration::from_secs(1),
    };
    let err = session(&config, |_conn| Ok(())).await.unwrap_err();
    assert!(matches!(err, CliError::Ws(hassws::WsError::UnsupportedScheme(_))));
}
