//! Byte stream under a [`Connection`](crate::Connection): plain TCP or TLS.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};

use crate::WsError;
use crate::handshake::{Endpoint, Scheme};

/// Socket-level knobs applied before the handshake.
#[derive(Clone, Debug, Default)]
pub struct ConnectOptions {
    /// Read timeout for every blocking socket read. `None` blocks forever.
    pub read_timeout: Option<Duration>,
    /// TLS client configuration; defaults to webpki roots over ring.
    pub tls: Option<Arc<ClientConfig>>,
}

pub enum Transport {
    Plain(TcpStream),
    Tls(Box<StreamOwned<ClientConnection, TcpStream>>),
}

impl Transport {
    /// Open a TCP connection to `endpoint`, wrapping it in TLS for https.
    ///
    /// # Errors
    ///
    /// [`WsError::Io`] for connect failures, [`WsError::InvalidUrl`] when the
    /// host is not a valid TLS server name, [`WsError::Tls`] for TLS setup.
    pub fn connect(endpoint: &Endpoint, options: &ConnectOptions) -> Result<Self, WsError> {
        let tcp = TcpStream::connect((endpoint.host.as_str(), endpoint.port))?;
        tcp.set_read_timeout(options.read_timeout)?;
        tcp.set_nodelay(true)?;

        match endpoint.scheme {
            Scheme::Http => Ok(Self::Plain(tcp)),
            Scheme::Https => {
                let config = match &options.tls {
                    Some(config) => Arc::clone(config),
                    None => default_tls_config()?,
                };
                let server_name = ServerName::try_from(endpoint.host.clone())
                    .map_err(|_| WsError::InvalidUrl(format!("invalid TLS server name: {}", endpoint.host)))?;
                let conn = ClientConnection::new(config, server_name)?;
                Ok(Self::Tls(Box::new(StreamOwned::new(conn, tcp))))
            }
        }
    }

    fn tcp(&self) -> &TcpStream {
        match self {
            Self::Plain(tcp) => tcp,
            Self::Tls(stream) => stream.get_ref(),
        }
    }

    /// Close both directions of the underlying socket. Errors are ignored:
    /// the peer may already be gone.
    pub fn shutdown(&mut self) {
        if let Self::Tls(stream) = self {
            stream.conn.send_close_notify();
            let _ = stream.flush();
        }
        let _ = self.tcp().shutdown(Shutdown::Both);
    }
}

impl Read for Transport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Plain(tcp) => tcp.read(buf),
            Self::Tls(stream) => stream.read(buf),
        }
    }
}

impl Write for Transport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(tcp) => tcp.write(buf),
            Self::Tls(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(tcp) => tcp.flush(),
            Self::Tls(stream) => stream.flush(),
        }
    }
}

/// Shutdown hook so [`Connection`](crate::Connection) can release sockets
/// generically; in-memory test streams use the no-op default.
pub trait Shutdownable {
    fn shutdown_stream(&mut self) {}
}

impl Shutdownable for Transport {
    fn shutdown_stream(&mut self) {
        self.shutdown();
    }
}

impl Shutdownable for TcpStream {
    fn shutdown_stream(&mut self) {
        let _ = self.shutdown(Shutdown::Both);
    }
}

fn default_tls_config() -> Result<Arc<ClientConfig>, WsError> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
        .with_safe_default_protocol_versions()?
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(Arc::new(config))
}
