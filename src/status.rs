//! Printer status information parsing and types.
//!
//! Provides types and parsing for the 32-byte status packets returned by
//! Brother QL/PT printers.

use bitflags::bitflags;

use crate::{catalog, catalog::Model, commands::VariousModeSettings, error::StatusParsingError};

/// Wire bytes for the `status_information_request` opcode, sent to ask the
/// printer for an immediate status reply.
pub const STATUS_REQUEST_BYTES: [u8; 3] = [0x1b, 0x69, 0x53];

bitflags! {
/// Error flags reported by the printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorFlags: u16 {
    /// No media loaded.
    const NoMediaError = 0b1 << 0;
    /// End of media (die-cut labels only).
    const EndOfMediaError = 0b1 << 1;
    /// Cutter jammed.
    const CutterJamError = 0b1 << 2;
    /// Printer is in use by another client.
    const PrinterInUseError = 0b1 << 4;
    /// Printer has been turned off.
    const PrinterTurnedOffError = 0b1 << 5;
    /// High-voltage adapter fault.
    const HighVoltageAdapterError = 0b1 << 6;
    /// Fan motor fault.
    const FanMotorError = 0b1 << 7;
    /// Media needs to be replaced.
    const ReplaceMediaError = 0b1 << 8;
    /// Expansion buffer is full.
    const ExpansionBufferFullError = 0b1 << 9;
    /// Communication error.
    const CommunicationError = 0b1 << 10;
    /// Communication buffer is full.
    const CommunicationBufferFullError = 0b1 << 11;
    /// Cover is open.
    const CoverOpenError = 0b1 << 12;
    /// Cancel key was pressed.
    const CancelKeyError = 0b1 << 13;
    /// Media cannot be fed, or end of media.
    const FeedingError = 0b1 << 14;
    /// Unspecified system error.
    const SystemError = 0b1 << 15;
    const _ = !0;
}
}

/// Type of status message from the printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusType {
    /// Reply to a status request.
    StatusRequestReply,
    /// Printing has completed.
    PrintingCompleted,
    /// An error has occurred.
    ErrorOccurred,
    /// Printer was turned off.
    TurnedOff,
    /// Notification message.
    Notification,
    /// Phase change notification.
    PhaseChange,
    /// A recognized-but-unspecified status byte. Parsing continues rather
    /// than aborting (§4.3.3: unknown bytes leave the record "partially valid").
    Unknown(u8),
}

impl From<u8> for StatusType {
    fn from(value: u8) -> Self {
        match value {
            0x00 => Self::StatusRequestReply,
            0x01 => Self::PrintingCompleted,
            0x02 => Self::ErrorOccurred,
            0x04 => Self::TurnedOff,
            0x05 => Self::Notification,
            0x06 => Self::PhaseChange,
            other => Self::Unknown(other),
        }
    }
}

/// Current phase of the printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting to receive data.
    Receiving,
    /// Printing.
    Printing,
    /// A recognized-but-unspecified phase byte sequence.
    Unknown([u8; 3]),
}

impl From<[u8; 3]> for Phase {
    fn from(value: [u8; 3]) -> Self {
        match value {
            [0x00, 0x00, 0x00] => Self::Receiving,
            [0x01, 0x00, 0x00] => Self::Printing,
            other => Self::Unknown(other),
        }
    }
}

/// Notification from the printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// No notification available.
    Unavailable,
    /// Cooling has started.
    CoolingStarted,
    /// Cooling has finished.
    CoolingFinished,
    /// A recognized-but-unspecified notification byte.
    Unknown(u8),
}

impl From<u8> for Notification {
    fn from(value: u8) -> Self {
        match value {
            0x00 => Self::Unavailable,
            0x03 => Self::CoolingStarted,
            0x04 => Self::CoolingFinished,
            other => Self::Unknown(other),
        }
    }
}

/// Status information received from the printer.
///
/// Mirrors the 32-byte wire layout. `model` is `None` when the
/// model-identification byte doesn't match any known model; other fields
/// are decoded best-effort so that an unrecognized byte at one offset
/// doesn't prevent reading the rest.
#[derive(Debug)]
pub struct StatusInformation {
    /// The printer model, if the model-identification byte was recognized.
    pub model: Option<&'static Model>,
    /// Error flags.
    pub errors: ErrorFlags,
    /// Media width in mm.
    pub media_width: u8,
    /// Media length in mm (for die-cut labels; 0 for continuous).
    pub media_length: u8,
    /// Various mode settings.
    pub mode: VariousModeSettings,
    /// Status type.
    pub status_type: StatusType,
    /// Current phase.
    pub phase: Phase,
    /// Notification.
    pub notification: Notification,
}

impl StatusInformation {
    /// Returns `true` if any error bit is set.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl TryFrom<&[u8]> for StatusInformation {
    type Error = StatusParsingError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let status: &[u8; 32] = value
            .try_into()
            .map_err(|_| StatusParsingError { reason: format!("invalid size of {}B, expected 32B", value.len()) })?;

        let check_fixed_field = |offset: usize, name: &str, expected_value: u8| -> Result<(), StatusParsingError> {
            if status[offset] != expected_value {
                return Err(StatusParsingError {
                    reason: format!(
                        "expected value {expected_value:#x} for field {name} at offset {offset} but was {:#x}",
                        status[offset]
                    ),
                });
            }
            Ok(())
        };
        check_fixed_field(0, "print head mark", 0x80)?;
        check_fixed_field(1, "size", 0x20)?;
        check_fixed_field(2, "reserved", 0x42)?;
        check_fixed_field(3, "series code", 0x34)?;

        let model = catalog::model_by_status_code(status[4]);
        let errors = ErrorFlags::from_bits_retain(u16::from_le_bytes([status[8], status[9]]));
        let media_width = status[10];
        let mode = VariousModeSettings::try_from(status[15])?;
        let media_length = status[17];
        let status_type = StatusType::from(status[18]);
        let phase_bytes: [u8; 3] = status[19..=21].try_into().expect("slice of exactly 3 bytes");
        let phase = Phase::from(phase_bytes);
        let notification = Notification::from(status[22]);

        Ok(StatusInformation { model, errors, media_width, media_length, mode, status_type, phase, notification })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bytes(model_code: u8, status_type: u8, phase: [u8; 3]) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        bytes[0] = 0x80;
        bytes[1] = 0x20;
        bytes[2] = 0x42;
        bytes[3] = 0x34;
        bytes[4] = model_code;
        bytes[10] = 62;
        bytes[17] = 0;
        bytes[18] = status_type;
        bytes[19..22].copy_from_slice(&phase);
        bytes
    }

    #[test]
    fn parses_a_well_formed_status_reply() {
        let bytes = sample_bytes(0x47, 0x01, [0x00, 0x00, 0x00]);
        let status = StatusInformation::try_from(bytes.as_slice()).unwrap();
        assert_eq!(status.model.unwrap().name, "QL-600");
        assert_eq!(status.status_type, StatusType::PrintingCompleted);
        assert_eq!(status.phase, Phase::Receiving);
        assert!(!status.has_errors());
    }

    #[test]
    fn unknown_model_code_does_not_abort_parsing() {
        let bytes = sample_bytes(0xEE, 0x00, [0x00, 0x00, 0x00]);
        let status = StatusInformation::try_from(bytes.as_slice()).unwrap();
        assert!(status.model.is_none());
        assert_eq!(status.status_type, StatusType::StatusRequestReply);
    }

    #[test]
    fn rejects_wrong_size_input() {
        assert!(StatusInformation::try_from([0u8; 10].as_slice()).is_err());
    }
}
