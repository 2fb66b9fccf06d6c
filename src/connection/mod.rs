//! Transport abstraction: the trait every backend implements, plus the
//! [`DeviceUrl`] grammar that selects one.
//!
//! The backends' OS-level plumbing (actual USB/TCP/character-device I/O) is
//! kept behind a trait so the rest of the crate, and its tests, never touch
//! real hardware directly.

mod device_url;
mod file_connection;
mod kernel_connection;
mod tcp_connection;
#[cfg(feature = "usb")]
mod usb_connection;

pub use device_url::DeviceUrl;
pub use file_connection::FileConnection;
pub use kernel_connection::KernelConnection;
pub use tcp_connection::TcpConnection;
#[cfg(feature = "usb")]
pub use usb_connection::{UsbConnection, UsbConnectionInfo};

use crate::error::TransportError;

/// Default write timeout for the USB backend.
pub const USB_WRITE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(15);
/// Default write timeout for the TCP backend.
pub const TCP_WRITE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);
/// Per-request read timeout used by transports that support status read-back.
pub const STATUS_READ_TIMEOUT: std::time::Duration = std::time::Duration::from_millis(10);

/// Common interface every transport backend implements.
///
/// `open`/`close` must be idempotent. Backends that cannot read status
/// replies (TCP, file) implement `read` as [`TransportError::Unsupported`]
/// and report `supports_read() == false`.
pub trait Transport {
    /// Opens the underlying device/file/socket. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on failure to acquire the resource.
    fn open(&mut self) -> Result<(), TransportError>;

    /// Closes the underlying resource. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on failure to release the resource.
    fn close(&mut self) -> Result<(), TransportError>;

    /// Writes `data` in full to the transport.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the underlying write fails or is short.
    fn write(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Reads up to `max_len` bytes, if this backend supports reading.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Unsupported`] if `supports_read()` is false,
    /// or a backend-specific I/O failure.
    fn read(&mut self, max_len: usize) -> Result<Vec<u8>, TransportError> {
        let _ = max_len;
        Err(TransportError::Unsupported)
    }

    /// Whether this backend can read status replies back from the device.
    fn supports_read(&self) -> bool {
        false
    }
}

/// Opens the transport selected by `url`, per the [`DeviceUrl`] grammar.
///
/// # Errors
///
/// Returns [`TransportError::InvalidUrl`] if `url` doesn't parse, or a
/// backend-specific failure opening the resolved transport. USB URLs return
/// [`TransportError::Unsupported`] when the crate's `usb` feature is disabled.
pub fn open(url: &str) -> Result<Box<dyn Transport>, TransportError> {
    let parsed = DeviceUrl::parse(url)?;
    open_parsed(parsed)
}

fn open_parsed(parsed: DeviceUrl) -> Result<Box<dyn Transport>, TransportError> {
    match parsed {
        DeviceUrl::Usb { vendor_id, product_id, serial } => {
            #[cfg(feature = "usb")]
            {
                let mut conn = UsbConnection::new(UsbConnectionInfo { vendor_id, product_id, serial });
                conn.open()?;
                Ok(Box::new(conn))
            }
            #[cfg(not(feature = "usb"))]
            {
                let _ = (vendor_id, product_id, serial);
                Err(TransportError::Unsupported)
            }
        }
        DeviceUrl::Tcp { host, port } => {
            let mut conn = TcpConnection::new(host, port);
            conn.open()?;
            Ok(Box::new(conn))
        }
        DeviceUrl::Lp { path } => {
            let mut conn = KernelConnection::new(path);
            conn.open()?;
            Ok(Box::new(conn))
        }
        DeviceUrl::File { path } => {
            let mut conn = FileConnection::new(path);
            conn.open()?;
            Ok(Box::new(conn))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_file_backend_for_bare_path() {
        let dir = std::env::temp_dir().join(format!("bql-test-{}", std::process::id()));
        let mut transport = open(dir.to_str().unwrap()).unwrap();
        transport.write(b"hello").unwrap();
        transport.close().unwrap();
        assert_eq!(std::fs::read(&dir).unwrap(), b"hello");
        let _ = std::fs::remove_file(&dir);
    }

    #[test]
    fn tcp_url_to_unreachable_host_fails_to_open() {
        let err = open("tcp://127.0.0.1:1").unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
    }
}
