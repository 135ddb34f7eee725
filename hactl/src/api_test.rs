use super::*;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Serve one HTTP response and hand back the raw request head.
fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream);
        let mut head = String::new();
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                break;
            }
            head.push_str(&line);
        }
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        reader.get_mut().write_all(response.as_bytes()).unwrap();
        head
    });
    (base_url, handle)
}

fn config(base_url: String) -> HassConfig {
    HassConfig { base_url, token: "secret-token".to_owned(), ws_timeout: Duration::from_secs(5) }
}

#[tokio::test]
async fn states_sends_bearer_and_decodes_entities() {
    let (base_url, server) = serve_once(
        "200 OK",
        r#"[{"entity_id":"light.kitchen","state":"on","attributes":{"friendly_name":"Kitchen"}}]"#,
    );
    let client = RestClient::new(&config(base_url)).unwrap();

    let states = client.states().await.unwrap();
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].friendly_name(), "Kitchen");

    let head = server.join().unwrap().to_ascii_lowercase();
    assert!(head.starts_with("get /api/states http/1.1"));
    assert!(head.contains("authorization: bearer secret-token"));
}

#[tokio::test]
async fn non_success_status_carries_body() {
    let (base_url, server) = serve_once("404 Not Found", r#"{"message":"Entity not found."}"#);
    let client = RestClient::new(&config(base_url)).unwrap();

    let err = client.state("sensor.missing").await.unwrap_err();
    match err {
        CliError::Api { status, path, body } => {
            assert_eq!(status, 404);
            assert_eq!(path, "/api/states/sensor.missing");
            assert!(body.contains("Entity not found"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    server.join().unwrap();
}
