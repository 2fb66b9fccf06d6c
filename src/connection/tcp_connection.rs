//! Network backend: `tcp://HOST[:PORT]`.
//!
//! The printer never replies over this channel in practice, so
//! `supports_read` is `false` even though `TcpStream` technically supports
//! reading.

use std::io::Write;
use std::net::TcpStream;

use super::{Transport, TCP_WRITE_TIMEOUT};
use crate::error::TransportError;

/// A TCP connection to a network-attached printer (typically port 9100).
pub struct TcpConnection {
    host: String,
    port: u16,
    stream: Option<TcpStream>,
}

impl TcpConnection {
    /// Creates a connection that will dial `host:port` once opened.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port, stream: None }
    }
}

impl Transport for TcpConnection {
    fn open(&mut self) -> Result<(), TransportError> {
        if self.stream.is_some() {
            return Ok(());
        }
        let stream = TcpStream::connect((self.host.as_str(), self.port)).map_err(TransportError::Network)?;
        stream.set_nodelay(true).map_err(TransportError::Network)?;
        stream.set_write_timeout(Some(TCP_WRITE_TIMEOUT)).map_err(TransportError::Network)?;
        self.stream = Some(stream);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::Unsupported)?;
        stream.write_all(data).map_err(TransportError::Network)
    }
}
