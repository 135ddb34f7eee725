//! Blocking WebSocket client for the Home Assistant WebSocket API.
//!
//! This crate owns the wire side of `hactl`'s WebSocket-only calls
//! (dashboards, registries). It is small and synchronous:
//! one [`Connection`] owns one socket, authenticates once, and serves one
//! call at a time.
//!
//! LAYERS
//! ======
//! - [`codec`]: RFC 6455 frame encode/decode with client masking.
//! - [`handshake`]: endpoint parsing and the HTTP Upgrade exchange.
//! - [`transport`]: plain TCP or rustls-wrapped TCP behind `Read + Write`.
//! - [`client`]: auth sub-protocol and id-correlated request/response.

pub mod client;
pub mod codec;
pub mod handshake;
pub mod message;
pub mod transport;

pub use client::Connection;
pub use codec::{Opcode, decode_frame, encode_frame};
pub use handshake::{Endpoint, Scheme};
pub use message::ServerMessage;
pub use transport::{ConnectOptions, Shutdownable, Transport};

use serde_json::Value;

/// Error returned by every fallible operation in this crate.
#[derive(Debug, thiserror::Error)]
pub enum WsError {
    /// The URL scheme is not `http` or `https`. Raised before any I/O.
    #[error("unsupported URL scheme `{0}` (expected http or https)")]
    UnsupportedScheme(String),
    /// The URL could not be parsed or has no host.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    /// The server did not answer the Upgrade request with `101`.
    #[error("websocket handshake failed:\n{response}")]
    HandshakeFailed { response: String },
    /// The peer closed the socket or sent a close frame.
    #[error("websocket connection closed")]
    ConnectionClosed,
    /// The server answered the auth message with `auth_invalid`.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),
    /// A correlated `result` message carried `success: false`.
    #[error("websocket call failed: {0}")]
    RemoteCallFailed(Value),
    /// A frame announced a payload longer than [`codec::MAX_PAYLOAD`].
    #[error("frame payload of {0} bytes exceeds the accepted maximum")]
    FrameTooLarge(u64),
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
    #[error("tls error: {0}")]
    Tls(#[from] rustls::Error),
    #[error("invalid JSON message: {0}")]
    Json(#[from] serde_json::Error),
}

impl WsError {
    /// True for errors after which the connection cannot be used again.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::RemoteCallFailed(_))
    }
}
