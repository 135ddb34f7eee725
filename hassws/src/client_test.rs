use super::*;
use std::io::BufRead;
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

// =============================================================================
// SCRIPTED PEER
// =============================================================================

/// Loopback stand-in for Home Assistant, driven step by step from a test.
struct Peer {
    reader: BufReader<TcpStream>,
}

impl Peer {
    fn accept(listener: &TcpListener, status: &str) -> Self {
        let (stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        loop {
            line.clear();
            let read = reader.read_line(&mut line).expect("read request line");
            if read == 0 || line == "\r\n" {
                break;
            }
        }
        let response = format!("HTTP/1.1 {status}\r\nUpgrade: websocket\r\nConnection: Upgrade\r\n\r\n");
        reader.get_mut().write_all(response.as_bytes()).expect("write response");
        Self { reader }
    }

    fn accept_authenticated(listener: &TcpListener) -> Self {
        let mut peer = Self::accept(listener, "101 Switching Protocols");
        peer.send(&json!({"type": "auth_required", "ha_version": "2024.6.0"}));
        let auth = peer.recv();
        assert_eq!(auth, json!({"type": "auth", "access_token": "secret"}));
        peer.send(&json!({"type": "auth_ok", "ha_version": "2024.6.0"}));
        peer
    }

    fn send(&mut self, value: &Value) {
        let payload = serde_json::to_vec(value).expect("serialize");
        self.send_raw(Opcode::Text, &payload);
    }

    fn send_raw(&mut self, opcode: Opcode, payload: &[u8]) {
        self.reader.get_mut().write_all(&server_frame(opcode, payload)).expect("write frame");
    }

    fn recv_frame(&mut self) -> Result<(Opcode, Vec<u8>), WsError> {
        decode_frame(&mut self.reader)
    }

    fn recv(&mut self) -> Value {
        let (opcode, payload) = self.recv_frame().expect("client frame");
        assert_eq!(opcode, Opcode::Text);
        serde_json::from_slice(&payload).expect("client JSON")
    }

    fn reply(&mut self, request: &Value, result: Value) {
        self.send(&json!({"id": request["id"], "type": "result", "success": true, "result": result}));
    }
}

/// Server-to-client frames are unmasked.
fn server_frame(opcode: Opcode, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![0x80 | opcode.as_u8()];
    match payload.len() {
        len @ 0..=125 => out.push(u8::try_from(len).expect("short length")),
        len @ 126..=65_535 => {
            out.push(126);
            out.extend_from_slice(&u16::try_from(len).expect("u16 length").to_be_bytes());
        }
        len => {
            out.push(127);
            out.extend_from_slice(&(len as u64).to_be_bytes());
        }
    }
    out.extend_from_slice(payload);
    out
}

fn spawn_peer<F>(script: F) -> (String, JoinHandle<()>)
where
    F: FnOnce(&TcpListener) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let url = format!("http://{}", listener.local_addr().expect("local addr"));
    let handle = thread::spawn(move || script(&listener));
    (url, handle)
}

// =============================================================================
// CONNECT
// =============================================================================

#[test]
fn unsupported_scheme_fails_before_io() {
    let err = Connection::connect("ws://127.0.0.1:1", "secret").err().expect("should fail");
    assert!(matches!(err, WsError::UnsupportedScheme(_)));
}

#[test]
fn handshake_rejection_never_attempts_auth() {
    let (url, peer) = spawn_peer(|listener| {
        let mut peer = Peer::accept(listener, "400 Bad Request");
        assert!(peer.recv_frame().is_err(), "client must not send frames after a rejected upgrade");
    });

    let err = Connection::connect(&url, "secret").err().expect("should fail");
    match err {
        WsError::HandshakeFailed { response } => assert!(response.contains("400 Bad Request")),
        other => panic!("unexpected error: {other:?}"),
    }
    peer.join().expect("peer thread");
}

#[test]
fn auth_required_then_auth_ok_authenticates() {
    let (url, peer) = spawn_peer(|listener| {
        let mut peer = Peer::accept_authenticated(listener);
        let (opcode, _) = peer.recv_frame().expect("close frame");
        assert_eq!(opcode, Opcode::Close);
    });

    let mut conn = Connection::connect(&url, "secret").expect("connect");
    assert!(!conn.is_closed());
    conn.close();
    assert!(conn.is_closed());
    peer.join().expect("peer thread");
}

#[test]
fn auth_invalid_fails_with_authentication_error() {
    let (url, peer) = spawn_peer(|listener| {
        let mut peer = Peer::accept(listener, "101 Switching Protocols");
        peer.send(&json!({"type": "auth_required"}));
        let _auth = peer.recv();
        peer.send(&json!({"type": "auth_invalid", "message": "Invalid access token"}));
        assert!(peer.recv_frame().is_err(), "socket should be released after auth_invalid");
    });

    let err = Connection::connect(&url, "secret").err().expect("should fail");
    assert!(matches!(err, WsError::AuthenticationFailed(ref msg) if msg == "Invalid access token"));
    peer.join().expect("peer thread");
}

#[test]
fn auth_skips_non_text_and_undecodable_frames() {
    let (url, peer) = spawn_peer(|listener| {
        let mut peer = Peer::accept(listener, "101 Switching Protocols");
        let _auth = peer.recv();
        peer.send_raw(Opcode::Binary, &[1, 2, 3]);
        peer.send_raw(Opcode::Text, b"not json");
        peer.send(&json!({"type": "auth_ok"}));
    });

    let conn = Connection::connect(&url, "secret").expect("connect");
    assert!(!conn.is_closed());
    peer.join().expect("peer thread");
}

// =============================================================================
// CALLS
// =============================================================================

#[test]
fn call_ignores_uncorrelated_messages() {
    let (url, peer) = spawn_peer(|listener| {
        let mut peer = Peer::accept_authenticated(listener);
        let request = peer.recv();
        assert_eq!(request["type"], "foo");
        assert_eq!(request["id"], 2);
        peer.send(&json!({"id": 99, "type": "result", "success": true, "result": "wrong"}));
        peer.send(&json!({"id": 2, "type": "event", "event": {"data": "noise"}}));
        peer.reply(&request, json!({"ok": true}));
    });

    let mut conn = Connection::connect(&url, "secret").expect("connect");
    let result = conn.call("foo").expect("call");
    assert_eq!(result, json!({"ok": true}));
    peer.join().expect("peer thread");
}

#[test]
fn failed_call_carries_message_and_keeps_connection_usable() {
    let (url, peer) = spawn_peer(|listener| {
        let mut peer = Peer::accept_authenticated(listener);
        let first = peer.recv();
        peer.send(&json!({
            "id": first["id"],
            "type": "result",
            "success": false,
            "error": {"code": "unknown_command", "message": "Unknown command."}
        }));
        let second = peer.recv();
        assert_eq!(second["id"], 3);
        peer.reply(&second, Value::Null);
    });

    let mut conn = Connection::connect(&url, "secret").expect("connect");
    let err = conn.call("bogus").expect_err("should fail");
    match err {
        WsError::RemoteCallFailed(message) => {
            assert_eq!(message["error"]["code"], "unknown_command");
            assert_eq!(message["id"], 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!conn.is_closed());

    assert_eq!(conn.call("ping_again").expect("second call"), Value::Null);
    peer.join().expect("peer thread");
}

#[test]
fn result_without_success_flag_is_a_failure() {
    let (url, peer) = spawn_peer(|listener| {
        let mut peer = Peer::accept_authenticated(listener);
        let request = peer.recv();
        peer.send(&json!({"id": request["id"], "type": "result", "result": {"x": 1}}));
    });

    let mut conn = Connection::connect(&url, "secret").expect("connect");
    let err = conn.call("foo").expect_err("should fail");
    assert!(matches!(err, WsError::RemoteCallFailed(_)));
    peer.join().expect("peer thread");
}

#[test]
fn malformed_success_flag_on_correlated_reply_is_a_failure() {
    let (url, peer) = spawn_peer(|listener| {
        let mut peer = Peer::accept_authenticated(listener);
        let first = peer.recv();
        peer.send(&json!({"id": first["id"], "type": "result", "success": null}));
        let second = peer.recv();
        peer.send(&json!({"id": second["id"], "type": "result", "success": 1, "result": "ignored"}));
        let third = peer.recv();
        assert_eq!(third["id"], 4);
        peer.reply(&third, json!("fine"));
    });

    let mut conn = Connection::connect(&url, "secret").expect("connect");
    let err = conn.call("foo").expect_err("null success should fail");
    assert!(matches!(err, WsError::RemoteCallFailed(ref raw) if raw["success"].is_null() && raw["id"] == 2));
    let err = conn.call("foo").expect_err("integer success should fail");
    assert!(matches!(err, WsError::RemoteCallFailed(ref raw) if raw["success"] == 1));
    assert!(!conn.is_closed());
    assert_eq!(conn.call("foo").expect("third call"), json!("fine"));
    peer.join().expect("peer thread");
}

#[test]
fn correlated_reply_without_type_still_resolves_the_call() {
    let (url, peer) = spawn_peer(|listener| {
        let mut peer = Peer::accept_authenticated(listener);
        let request = peer.recv();
        peer.send(&json!({"id": request["id"], "success": true, "result": [1, 2]}));
    });

    let mut conn = Connection::connect(&url, "secret").expect("connect");
    assert_eq!(conn.call("foo").expect("call"), json!([1, 2]));
    peer.join().expect("peer thread");
}

#[test]
fn params_cannot_override_id_or_type() {
    let (url, peer) = spawn_peer(|listener| {
        let mut peer = Peer::accept_authenticated(listener);
        let request = peer.recv();
        assert_eq!(request, json!({"id": 2, "type": "lovelace/config", "url_path": "energy"}));
        peer.reply(&request, json!({}));
    });

    let mut conn = Connection::connect(&url, "secret").expect("connect");
    let mut params = Map::new();
    params.insert("id".to_owned(), json!(500));
    params.insert("type".to_owned(), json!("hijack"));
    params.insert("url_path".to_owned(), json!("energy"));
    conn.call_with("lovelace/config", params).expect("call");
    peer.join().expect("peer thread");
}

#[test]
fn ping_is_answered_while_waiting_for_result() {
    let (url, peer) = spawn_peer(|listener| {
        let mut peer = Peer::accept_authenticated(listener);
        let request = peer.recv();
        peer.send_raw(Opcode::Ping, b"hb");
        let (opcode, payload) = peer.recv_frame().expect("pong");
        assert_eq!(opcode, Opcode::Pong);
        assert_eq!(payload, b"hb");
        peer.reply(&request, json!("pong seen"));
    });

    let mut conn = Connection::connect(&url, "secret").expect("connect");
    assert_eq!(conn.call("foo").expect("call"), json!("pong seen"));
    peer.join().expect("peer thread");
}

#[test]
fn close_frame_mid_call_closes_connection() {
    let (url, peer) = spawn_peer(|listener| {
        let mut peer = Peer::accept_authenticated(listener);
        let _request = peer.recv();
        peer.send_raw(Opcode::Close, &[]);
    });

    let mut conn = Connection::connect(&url, "secret").expect("connect");
    let err = conn.call("foo").expect_err("should fail");
    assert!(matches!(err, WsError::ConnectionClosed));
    assert!(conn.is_closed());

    let again = conn.call("foo").expect_err("closed connection");
    assert!(matches!(again, WsError::ConnectionClosed));
    peer.join().expect("peer thread");
}

#[test]
fn peer_hangup_mid_call_reports_connection_closed() {
    let (url, peer) = spawn_peer(|listener| {
        let mut peer = Peer::accept_authenticated(listener);
        let _request = peer.recv();
    });

    let mut conn = Connection::connect(&url, "secret").expect("connect");
    let err = conn.call("foo").expect_err("should fail");
    assert!(matches!(err, WsError::ConnectionClosed | WsError::Io(_)));
    assert!(conn.is_closed());
    peer.join().expect("peer thread");
}

#[test]
fn panels_then_dashboard_config_end_to_end() {
    let (url, peer) = spawn_peer(|listener| {
        let mut peer = Peer::accept_authenticated(listener);

        let panels = peer.recv();
        assert_eq!(panels, json!({"id": 2, "type": "get_panels"}));
        peer.reply(
            &panels,
            json!({"lovelace-overview": {"component_name": "lovelace", "url_path": "lovelace"}}),
        );

        let config = peer.recv();
        assert_eq!(config, json!({"id": 3, "type": "lovelace/config", "url_path": "lovelace"}));
        peer.reply(&config, json!({"views": []}));

        let (opcode, _) = peer.recv_frame().expect("close frame");
        assert_eq!(opcode, Opcode::Close);
    });

    let mut conn = Connection::connect(&url, "secret").expect("connect");

    let panels = conn.call("get_panels").expect("get_panels");
    assert_eq!(
        panels,
        json!({"lovelace-overview": {"component_name": "lovelace", "url_path": "lovelace"}})
    );

    let mut params = Map::new();
    params.insert("url_path".to_owned(), json!("lovelace"));
    let config = conn.call_with("lovelace/config", params).expect("lovelace/config");
    assert_eq!(config, json!({"views": []}));

    conn.close();
    assert!(conn.is_closed());
    conn.close();
    peer.join().expect("peer thread");
}
