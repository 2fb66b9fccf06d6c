//! USB backend: `usb://0xVVVV:0xPPPP[/SERIAL]`.
//!
//! Supports an optional serial number to narrow the match to one unit: a
//! wrong serial matches no device, which is reported as a distinct error
//! from "no device with this vendor/product ID at all".

use std::time::Duration;

use rusb::{Context, Device, DeviceHandle, UsbContext};

use super::{Transport, USB_WRITE_TIMEOUT};
use crate::error::{TransportError, UsbError};

/// USB vendor/product/serial selection used to open a [`UsbConnection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsbConnectionInfo {
    /// USB vendor ID.
    pub vendor_id: u16,
    /// USB product ID.
    pub product_id: u16,
    /// Optional serial number narrowing the match to one specific unit.
    pub serial: Option<String>,
}

/// A direct USB connection to a Brother QL/PT printer.
pub struct UsbConnection {
    info: UsbConnectionInfo,
    handle: Option<DeviceHandle<Context>>,
    interface: u8,
    endpoint_out: u8,
    endpoint_in: u8,
    timeout: Duration,
}

const DEFAULT_INTERFACE: u8 = 0;
const DEFAULT_ENDPOINT_OUT: u8 = 0x02;
const DEFAULT_ENDPOINT_IN: u8 = 0x81;

impl UsbConnection {
    /// Creates a connection that will resolve and open the matching device
    /// once opened.
    #[must_use]
    pub fn new(info: UsbConnectionInfo) -> Self {
        Self {
            info,
            handle: None,
            interface: DEFAULT_INTERFACE,
            endpoint_out: DEFAULT_ENDPOINT_OUT,
            endpoint_in: DEFAULT_ENDPOINT_IN,
            timeout: USB_WRITE_TIMEOUT,
        }
    }

    fn find_device(&self, context: &Context) -> Result<Device<Context>, TransportError> {
        let devices = context.devices().map_err(|e| TransportError::Usb(UsbError::Rusb(e)))?;
        let mut found_any_matching_ids = false;
        let mut candidate_serials = Vec::new();
        for device in devices.iter() {
            let Ok(descriptor) = device.device_descriptor() else { continue };
            if descriptor.vendor_id() != self.info.vendor_id || descriptor.product_id() != self.info.product_id {
                continue;
            }
            found_any_matching_ids = true;
            if let Some(wanted_serial) = &self.info.serial {
                let Ok(handle) = device.open() else { continue };
                let Ok(language) = handle.read_languages(self.timeout) else { continue };
                let Some(language) = language.first().copied() else { continue };
                let Ok(serial) = handle.read_serial_number_string(language, &descriptor, self.timeout) else {
                    continue;
                };
                if &serial != wanted_serial {
                    candidate_serials.push(serial);
                    continue;
                }
            }
            return Ok(device);
        }
        Err(self.unmatched_result(found_any_matching_ids, candidate_serials))
    }

    /// Builds the error for a scan that found no acceptable device, given
    /// whether any device matched the vendor/product ID and, if so, what
    /// serial numbers those devices reported. Split out from [`Self::find_device`]
    /// so the decision can be exercised without a real USB bus.
    fn unmatched_result(&self, found_any_matching_ids: bool, candidate_serials: Vec<String>) -> TransportError {
        if found_any_matching_ids {
            if let Some(wanted_serial) = &self.info.serial {
                return TransportError::Usb(UsbError::UnknownSerial {
                    vendor_id: self.info.vendor_id,
                    product_id: self.info.product_id,
                    requested: wanted_serial.clone(),
                    candidates: candidate_serials,
                });
            }
        }
        TransportError::Usb(UsbError::DeviceNotFound {
            vendor_id: self.info.vendor_id,
            product_id: self.info.product_id,
        })
    }
}

impl Transport for UsbConnection {
    fn open(&mut self) -> Result<(), TransportError> {
        if self.handle.is_some() {
            return Ok(());
        }
        let context = Context::new().map_err(|e| TransportError::Usb(UsbError::Rusb(e)))?;
        let device = self.find_device(&context)?;
        let handle = device.open().map_err(|e| TransportError::Usb(UsbError::Rusb(e)))?;
        handle.set_auto_detach_kernel_driver(true).map_err(|e| TransportError::Usb(UsbError::Rusb(e)))?;
        handle.set_active_configuration(1).map_err(|e| TransportError::Usb(UsbError::Rusb(e)))?;
        handle.claim_interface(self.interface).map_err(|e| TransportError::Usb(UsbError::Rusb(e)))?;
        self.handle = Some(handle);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if let Some(handle) = self.handle.take() {
            let _ = handle.release_interface(self.interface);
        }
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let handle = self.handle.as_mut().ok_or(TransportError::Unsupported)?;
        let written =
            handle.write_bulk(self.endpoint_out, data, self.timeout).map_err(|e| TransportError::Usb(UsbError::Rusb(e)))?;
        if written != data.len() {
            return Err(TransportError::Usb(UsbError::IncompleteWrite));
        }
        Ok(())
    }

    fn read(&mut self, max_len: usize) -> Result<Vec<u8>, TransportError> {
        let handle = self.handle.as_mut().ok_or(TransportError::Unsupported)?;
        let mut buf = vec![0u8; max_len];
        match handle.read_bulk(self.endpoint_in, &mut buf, super::STATUS_READ_TIMEOUT) {
            Ok(n) => {
                buf.truncate(n);
                Ok(buf)
            }
            Err(rusb::Error::Timeout) => Ok(Vec::new()),
            Err(e) => Err(TransportError::Usb(UsbError::Rusb(e))),
        }
    }

    fn supports_read(&self) -> bool {
        true
    }
}

impl Drop for UsbConnection {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            let _ = handle.release_interface(self.interface);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_mismatch_on_matching_vendor_product_is_unknown_serial_with_candidates() {
        let conn = UsbConnection::new(UsbConnectionInfo {
            vendor_id: 0x04f9,
            product_id: 0x20c0,
            serial: Some("WRONGSERIAL".to_owned()),
        });
        let err = conn.unmatched_result(true, vec!["000A1B2C3D".to_owned()]);
        match err {
            TransportError::Usb(UsbError::UnknownSerial { vendor_id, product_id, requested, candidates }) => {
                assert_eq!(vendor_id, 0x04f9);
                assert_eq!(product_id, 0x20c0);
                assert_eq!(requested, "WRONGSERIAL");
                assert_eq!(candidates, vec!["000A1B2C3D".to_owned()]);
            }
            other => panic!("expected UnknownSerial, got {other:?}"),
        }
    }

    #[test]
    fn no_matching_vendor_product_is_device_not_found() {
        let conn = UsbConnection::new(UsbConnectionInfo { vendor_id: 0x04f9, product_id: 0x20c0, serial: None });
        let err = conn.unmatched_result(false, Vec::new());
        assert!(matches!(err, TransportError::Usb(UsbError::DeviceNotFound { .. })));
    }

    #[test]
    fn vendor_product_match_without_a_requested_serial_is_device_not_found() {
        let conn = UsbConnection::new(UsbConnectionInfo { vendor_id: 0x04f9, product_id: 0x20c0, serial: None });
        let err = conn.unmatched_result(true, Vec::new());
        assert!(matches!(err, TransportError::Usb(UsbError::DeviceNotFound { .. })));
    }
}
