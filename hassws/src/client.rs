//! Authenticated connection and id-correlated calls.
//!
//! LIFECYCLE
//! =========
//! 1. `connect` → TCP (+TLS) → HTTP Upgrade → `auth` → `auth_ok`
//! 2. `call` / `call_with` → one text frame out, frames in until a
//!    non-event message whose `id` matches
//! 3. `close` (or drop) → close frame, socket shutdown
//!
//! Any fatal error closes the connection; after that every operation fails
//! with [`WsError::ConnectionClosed`]. A failed call (`success: false`) is not
//! fatal and the connection stays usable.
//!
//! Calls borrow the connection mutably, so at most one call is ever in
//! flight. Messages whose id does not match the pending call are dropped,
//! which is only safe under that one-in-flight rule.

use std::io::{BufReader, Read, Write};

use serde_json::{Map, Value, json};

use crate::WsError;
use crate::codec::{Opcode, decode_frame, encode_frame};
use crate::handshake::{Endpoint, perform_handshake};
use crate::message::ServerMessage;
use crate::transport::{ConnectOptions, Shutdownable, Transport};

/// Id implicitly consumed by the auth exchange; the first call uses the next.
const AUTH_ID: u64 = 1;

pub struct Connection<S: Read + Write + Shutdownable = Transport> {
    stream: BufReader<S>,
    next_id: u64,
    upgraded: bool,
    closed: bool,
}

impl Connection<Transport> {
    /// Connect to `base_url` (`http://` or `https://`) and authenticate.
    ///
    /// # Errors
    ///
    /// [`WsError::UnsupportedScheme`] before any I/O, then
    /// [`WsError::HandshakeFailed`], [`WsError::AuthenticationFailed`], or
    /// transport errors.
    pub fn connect(base_url: &str, token: &str) -> Result<Self, WsError> {
        Self::connect_with(base_url, token, &ConnectOptions::default())
    }

    /// [`Connection::connect`] with explicit socket options.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::connect`].
    pub fn connect_with(base_url: &str, token: &str, options: &ConnectOptions) -> Result<Self, WsError> {
        let endpoint = Endpoint::parse(base_url)?;
        let transport = Transport::connect(&endpoint, options)?;
        tracing::debug!(host = %endpoint.host, port = endpoint.port, "websocket transport connected");
        Self::establish(transport, &endpoint, base_url, token)
    }
}

impl<S: Read + Write + Shutdownable> Connection<S> {
    /// Run the handshake and auth sequence over an already-open stream.
    ///
    /// # Errors
    ///
    /// [`WsError::HandshakeFailed`] or [`WsError::AuthenticationFailed`], plus
    /// any socket error. The stream is shut down on failure.
    pub fn establish(stream: S, endpoint: &Endpoint, origin: &str, token: &str) -> Result<Self, WsError> {
        let mut conn = Self { stream: BufReader::new(stream), next_id: AUTH_ID, upgraded: false, closed: false };

        let upgrade = perform_handshake(&mut conn.stream, endpoint, origin);
        conn.track(upgrade)?;
        conn.upgraded = true;

        conn.authenticate(token)?;
        Ok(conn)
    }

    fn authenticate(&mut self, token: &str) -> Result<(), WsError> {
        self.send_json(&json!({"type": "auth", "access_token": token}))?;
        loop {
            let (message, raw) = self.recv_message()?;
            match message {
                ServerMessage::AuthOk { ha_version } => {
                    tracing::debug!(ha_version = ha_version.as_deref().unwrap_or("unknown"), "websocket authenticated");
                    return Ok(());
                }
                ServerMessage::AuthInvalid { message } => {
                    self.release();
                    return Err(WsError::AuthenticationFailed(message.unwrap_or_else(|| raw.to_string())));
                }
                _ => {}
            }
        }
    }

    /// Issue a call with no parameters. See [`Connection::call_with`].
    ///
    /// # Errors
    ///
    /// Same as [`Connection::call_with`].
    pub fn call(&mut self, message_type: &str) -> Result<Value, WsError> {
        self.call_with(message_type, Map::new())
    }

    /// Send `{"id", "type", ..params}` and wait for the matching `result`.
    ///
    /// Returns the `result` field (`null` when absent). `id` and `type` in
    /// `params` are overwritten.
    ///
    /// # Errors
    ///
    /// [`WsError::RemoteCallFailed`] with the whole response when `success`
    /// is anything but `true`; [`WsError::ConnectionClosed`] when the socket
    /// closes or the connection was already closed.
    pub fn call_with(&mut self, message_type: &str, params: Map<String, Value>) -> Result<Value, WsError> {
        self.ensure_open()?;
        self.next_id += 1;
        let id = self.next_id;

        let mut request = params;
        request.insert("id".to_owned(), Value::from(id));
        request.insert("type".to_owned(), Value::String(message_type.to_owned()));
        self.send_json(&Value::Object(request))?;
        tracing::debug!(id, message_type, "websocket call sent");

        loop {
            let (message, mut raw) = self.recv_message()?;
            // Correlate on the raw id so a malformed reply still resolves the call.
            let correlated = raw.get("id").and_then(Value::as_u64) == Some(id);
            if !correlated || matches!(message, ServerMessage::Event { .. }) {
                tracing::debug!(id, discarded = ?raw.get("id"), "dropping uncorrelated websocket message");
                continue;
            }
            if raw.get("success") != Some(&Value::Bool(true)) {
                return Err(WsError::RemoteCallFailed(raw));
            }
            return Ok(raw.get_mut("result").map(Value::take).unwrap_or(Value::Null));
        }
    }

    /// Send a close frame (best effort) and shut the socket down. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        if self.upgraded {
            let frame = encode_frame(Opcode::Close, &[]);
            let writer = self.stream.get_mut();
            let _ = writer.write_all(&frame).and_then(|()| writer.flush());
        }
        self.release();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn release(&mut self) {
        if !self.closed {
            self.stream.get_mut().shutdown_stream();
            self.closed = true;
        }
    }

    fn ensure_open(&self) -> Result<(), WsError> {
        if self.closed { Err(WsError::ConnectionClosed) } else { Ok(()) }
    }

    fn track<T>(&mut self, result: Result<T, WsError>) -> Result<T, WsError> {
        if let Err(error) = &result {
            if error.is_fatal() {
                self.release();
            }
        }
        result
    }

    fn send_frame(&mut self, opcode: Opcode, payload: &[u8]) -> Result<(), WsError> {
        self.ensure_open()?;
        let frame = encode_frame(opcode, payload);
        let writer = self.stream.get_mut();
        let sent = writer.write_all(&frame).and_then(|()| writer.flush()).map_err(WsError::from);
        self.track(sent)
    }

    fn send_json(&mut self, value: &Value) -> Result<(), WsError> {
        let payload = serde_json::to_vec(value)?;
        self.send_frame(Opcode::Text, &payload)
    }

    /// Next JSON message from a text frame. Pings are answered, other
    /// non-text frames and undecodable text are skipped.
    fn recv_message(&mut self) -> Result<(ServerMessage, Value), WsError> {
        loop {
            self.ensure_open()?;
            let frame = decode_frame(&mut self.stream);
            let (opcode, payload) = self.track(frame)?;
            match opcode {
                Opcode::Close => {
                    tracing::debug!("websocket close frame received");
                    self.release();
                    return Err(WsError::ConnectionClosed);
                }
                Opcode::Text => match serde_json::from_slice::<Value>(&payload) {
                    Ok(value) => return Ok((ServerMessage::classify(&value), value)),
                    Err(error) => tracing::debug!(%error, "skipping undecodable text frame"),
                },
                Opcode::Ping => self.send_frame(Opcode::Pong, &payload)?,
                _ => {}
            }
        }
    }
}

impl<S: Read + Write + Shutdownable> Drop for Connection<S> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
