//! Device URL grammar: `usb://`, `tcp://`, `lp://`, `file://`/bare path.

use crate::error::TransportError;

/// A parsed device URL, selecting which backend to open and its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceUrl {
    /// `usb://0xVVVV:0xPPPP[/SERIAL]`.
    Usb {
        /// USB vendor ID.
        vendor_id: u16,
        /// USB product ID.
        product_id: u16,
        /// Optional serial number selecting a specific unit.
        serial: Option<String>,
    },
    /// `tcp://HOST[:PORT]`, port defaults to 9100.
    Tcp {
        /// Hostname or IP address.
        host: String,
        /// TCP port.
        port: u16,
    },
    /// `lp://lpN` or `lp:///dev/usb/lpN`.
    Lp {
        /// Path to the character device.
        path: String,
    },
    /// `file://PATH` or a bare filesystem path (debug sink).
    File {
        /// Path to the file to write raw bytes to.
        path: String,
    },
}

const DEFAULT_TCP_PORT: u16 = 9100;

impl DeviceUrl {
    /// Parses a device URL string.
    ///
    /// Strings without a recognized `scheme://` prefix fall back to the
    /// `file` backend: no prefix always means `file`, letting the caller's
    /// `open()` surface an I/O error if the path is bogus.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidUrl`] if a recognized scheme's
    /// grammar isn't satisfied.
    pub fn parse(s: &str) -> Result<Self, TransportError> {
        if let Some(rest) = s.strip_prefix("usb://") {
            return Self::parse_usb(s, rest);
        }
        if let Some(rest) = s.strip_prefix("tcp://") {
            return Self::parse_tcp(s, rest);
        }
        if let Some(rest) = s.strip_prefix("lp://") {
            let path = if let Some(dev) = rest.strip_prefix('/') {
                format!("/{dev}")
            } else {
                format!("/dev/usb/{rest}")
            };
            return Ok(DeviceUrl::Lp { path });
        }
        if let Some(rest) = s.strip_prefix("file://") {
            return Ok(DeviceUrl::File { path: rest.to_owned() });
        }
        Ok(DeviceUrl::File { path: s.to_owned() })
    }

    fn parse_usb(original: &str, rest: &str) -> Result<Self, TransportError> {
        let (ids, serial) = match rest.split_once('/') {
            Some((ids, serial)) => (ids, Some(serial.to_owned())),
            None => (rest, None),
        };
        let (vendor, product) = ids.split_once(':').ok_or_else(|| TransportError::InvalidUrl {
            url: original.to_owned(),
            reason: "expected usb://0xVVVV:0xPPPP[/SERIAL]".to_owned(),
        })?;
        let vendor_id = parse_hex_u16(vendor).ok_or_else(|| TransportError::InvalidUrl {
            url: original.to_owned(),
            reason: format!("invalid vendor id {vendor:?}"),
        })?;
        let product_id = parse_hex_u16(product).ok_or_else(|| TransportError::InvalidUrl {
            url: original.to_owned(),
            reason: format!("invalid product id {product:?}"),
        })?;
        Ok(DeviceUrl::Usb { vendor_id, product_id, serial })
    }

    fn parse_tcp(original: &str, rest: &str) -> Result<Self, TransportError> {
        if rest.is_empty() {
            return Err(TransportError::InvalidUrl {
                url: original.to_owned(),
                reason: "expected tcp://HOST[:PORT]".to_owned(),
            });
        }
        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port_str)) => {
                let port = port_str.parse::<u16>().map_err(|_| TransportError::InvalidUrl {
                    url: original.to_owned(),
                    reason: format!("invalid port {port_str:?}"),
                })?;
                (host.to_owned(), port)
            }
            None => (rest.to_owned(), DEFAULT_TCP_PORT),
        };
        Ok(DeviceUrl::Tcp { host, port })
    }
}

fn parse_hex_u16(s: &str) -> Option<u16> {
    let s = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    u16::from_str_radix(s, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_usb_url_without_serial() {
        let url = DeviceUrl::parse("usb://0x04f9:0x20c0").unwrap();
        assert_eq!(url, DeviceUrl::Usb { vendor_id: 0x04f9, product_id: 0x20c0, serial: None });
    }

    #[test]
    fn parses_usb_url_with_serial() {
        let url = DeviceUrl::parse("usb://0x04f9:0x20c0/ABC123").unwrap();
        assert_eq!(
            url,
            DeviceUrl::Usb { vendor_id: 0x04f9, product_id: 0x20c0, serial: Some("ABC123".to_owned()) }
        );
    }

    #[test]
    fn parses_tcp_url_with_default_port() {
        let url = DeviceUrl::parse("tcp://192.168.1.50").unwrap();
        assert_eq!(url, DeviceUrl::Tcp { host: "192.168.1.50".to_owned(), port: 9100 });
    }

    #[test]
    fn parses_tcp_url_with_explicit_port() {
        let url = DeviceUrl::parse("tcp://printer.local:9200").unwrap();
        assert_eq!(url, DeviceUrl::Tcp { host: "printer.local".to_owned(), port: 9200 });
    }

    #[test]
    fn parses_lp_short_form() {
        let url = DeviceUrl::parse("lp://lp0").unwrap();
        assert_eq!(url, DeviceUrl::Lp { path: "/dev/usb/lp0".to_owned() });
    }

    #[test]
    fn parses_lp_full_path_form() {
        let url = DeviceUrl::parse("lp:///dev/usb/lp1").unwrap();
        assert_eq!(url, DeviceUrl::Lp { path: "/dev/usb/lp1".to_owned() });
    }

    #[test]
    fn bare_path_falls_back_to_file() {
        let url = DeviceUrl::parse("output.bin").unwrap();
        assert_eq!(url, DeviceUrl::File { path: "output.bin".to_owned() });
    }

    #[test]
    fn rejects_malformed_usb_url() {
        assert!(DeviceUrl::parse("usb://not-hex:zzzz").is_err());
    }
}
