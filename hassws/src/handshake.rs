//! HTTP Upgrade handshake.
//!
//! The Home Assistant WebSocket endpoint lives at `<base-path>/api/websocket`
//! on the same host and port as the REST API, so the endpoint is derived from
//! the configured `http(s)://` base URL rather than a `ws(s)://` URL.

use std::io::{BufRead, BufReader, Read, Write};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use url::Url;

use crate::WsError;

/// Upper bound on the response header block we are willing to buffer.
const MAX_RESPONSE_HEADER_BYTES: usize = 16 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    #[must_use]
    pub fn default_port(self) -> u16 {
        match self {
            Self::Http => 80,
            Self::Https => 443,
        }
    }
}

/// Where to connect and which path to upgrade.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    /// Request target, always ending in `/api/websocket`.
    pub path: String,
}

impl Endpoint {
    /// Parse a Home Assistant base URL into a WebSocket endpoint.
    ///
    /// # Errors
    ///
    /// [`WsError::UnsupportedScheme`] for anything but `http`/`https`, and
    /// [`WsError::InvalidUrl`] when the URL is malformed or has no host.
    pub fn parse(base_url: &str) -> Result<Self, WsError> {
        let url = Url::parse(base_url).map_err(|error| WsError::InvalidUrl(format!("{base_url}: {error}")))?;

        let scheme = match url.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => return Err(WsError::UnsupportedScheme(other.to_owned())),
        };

        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| WsError::InvalidUrl(format!("{base_url}: missing host")))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_owned();
        let port = url.port().unwrap_or_else(|| scheme.default_port());
        let path = format!("{}/api/websocket", url.path().trim_end_matches('/'));

        Ok(Self { scheme, host, port, path })
    }

    /// Value for the `Host` header; the port is omitted when it is the default.
    #[must_use]
    pub fn host_header(&self) -> String {
        let host = if self.host.contains(':') { format!("[{}]", self.host) } else { self.host.clone() };
        if self.port == self.scheme.default_port() { host } else { format!("{host}:{}", self.port) }
    }
}

/// Random 16-byte `Sec-WebSocket-Key`, base64 encoded.
#[must_use]
pub fn generate_key() -> String {
    STANDARD.encode(rand::random::<[u8; 16]>())
}

/// Render the Upgrade request.
#[must_use]
pub fn handshake_request(endpoint: &Endpoint, key: &str, origin: &str) -> String {
    format!(
        "GET {path} HTTP/1.1\r\n\
         Host: {host}\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Key: {key}\r\n\
         Sec-WebSocket-Version: 13\r\n\
         Origin: {origin}\r\n\r\n",
        path = endpoint.path,
        host = endpoint.host_header(),
    )
}

/// Send the Upgrade request and consume the response header block.
///
/// Reads stop at the blank line ending the headers, so any frame bytes the
/// server sends right after the `101` stay in `stream`'s buffer.
///
/// # Errors
///
/// [`WsError::HandshakeFailed`] carrying the raw response when the status is
/// not 101, the stream ends early, or the headers exceed 16 KiB.
pub fn perform_handshake<S>(stream: &mut BufReader<S>, endpoint: &Endpoint, origin: &str) -> Result<(), WsError>
where
    S: Read + Write,
{
    let request = handshake_request(endpoint, &generate_key(), origin);
    let writer = stream.get_mut();
    writer.write_all(request.as_bytes())?;
    writer.flush()?;

    let response = read_response_head(stream)?;
    let status = response.lines().next().and_then(|line| line.split_whitespace().nth(1));
    if status != Some("101") {
        return Err(WsError::HandshakeFailed { response });
    }

    tracing::debug!(path = %endpoint.path, "websocket upgrade accepted");
    Ok(())
}

fn read_response_head<S: BufRead>(stream: &mut S) -> Result<String, WsError> {
    let mut head = Vec::new();
    loop {
        let before = head.len();
        // One byte past the cap is enough to tell an oversized head apart.
        let budget = u64::try_from(MAX_RESPONSE_HEADER_BYTES + 1 - before).unwrap_or(0);
        let read = stream.by_ref().take(budget).read_until(b'\n', &mut head)?;
        if read == 0 || head.len() > MAX_RESPONSE_HEADER_BYTES {
            return Err(WsError::HandshakeFailed { response: String::from_utf8_lossy(&head).into_owned() });
        }
        if &head[before..] == b"\r\n" || &head[before..] == b"\n" {
            return Ok(String::from_utf8_lossy(&head).into_owned());
        }
    }
}

#[cfg(test)]
#[path = "handshake_test.rs"]
mod tests;
