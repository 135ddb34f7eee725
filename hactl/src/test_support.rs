//! Scripted Home Assistant WebSocket peer for handler tests.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use hassws::{Opcode, decode_frame, encode_frame};
use serde_json::{Value, json};

use crate::config::HassConfig;

pub enum Reply {
    Ok(Value),
    Fail(&'static str),
}

/// Accept one connection, authenticate it, then answer each request in
/// order with the scripted reply for its `type`. Returns every request seen.
pub fn fake_hass(script: Vec<(&'static str, Reply)>) -> (HassConfig, JoinHandle<Vec<Value>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream);
        upgrade(&mut reader);

        send(&mut reader, &json!({"type": "auth_required", "ha_version": "2024.6.0"}));
        let auth = recv(&mut reader).unwrap();
        assert_eq!(auth["type"], "auth");
        send(&mut reader, &json!({"type": "auth_ok", "ha_version": "2024.6.0"}));

        let mut seen = Vec::new();
        for (expected_type, reply) in script {
            let request = recv(&mut reader).unwrap();
            assert_eq!(request["type"], expected_type);
            let response = match reply {
                Reply::Ok(result) => json!({"id": request["id"], "type": "result", "success": true, "result": result}),
                Reply::Fail(code) => json!({
                    "id": request["id"],
                    "type": "result",
                    "success": false,
                    "error": {"code": code, "message": format!("{code} for test")}
                }),
            };
            send(&mut reader, &response);
            seen.push(request);
        }
        seen
    });

    let config = HassConfig { base_url, token: "test-token".to_owned(), ws_timeout: Duration::from_secs(5) };
    (config, handle)
}

fn upgrade(reader: &mut BufReader<TcpStream>) {
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
            break;
        }
    }
    reader
        .get_mut()
        .write_all(b"HTTP/1.1 101 Switching Protocols\r\nUpgrade: websocket\r\nConnection: Upgrade\r\n\r\n")
        .unwrap();
}

fn send(reader: &mut BufReader<TcpStream>, value: &Value) {
    // Clients must accept masked frames too, so the client encoder is reused.
    let frame = encode_frame(Opcode::Text, &serde_json::to_vec(value).unwrap());
    reader.get_mut().write_all(&frame).unwrap();
}

fn recv(reader: &mut BufReader<TcpStream>) -> Option<Value> {
    loop {
        let (opcode, payload) = decode_frame(reader).ok()?;
        match opcode {
            Opcode::Text => return serde_json::from_slice(&payload).ok(),
            Opcode::Close => return None,
            _ => {}
        }
    }
}

/// Decode a JSON array of `/api/states` entries.
pub fn entities(value: Value) -> Vec<crate::entity::EntityState> {
    serde_json::from_value(value).unwrap()
}
