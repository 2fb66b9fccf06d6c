//! The engine loop: write a finalized job to a transport, then (where the
//! transport supports read-back) poll for completion.
//!
//! Returns a typed [`PrintOutcome`] rather than forcing callers to parse raw
//! status bytes, and works against the crate's [`Transport`] trait so it
//! doesn't care which backend is behind it.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::connection::Transport;
use crate::error::PrintError;
use crate::status::{Phase, StatusInformation, StatusType};

/// Overall wait budget for print completion.
pub const OVERALL_TIMEOUT: Duration = Duration::from_secs(10);
/// Delay between read polls when no data is available.
pub const POLL_INTERVAL: Duration = Duration::from_millis(5);
/// Maximum status reply size in bytes.
const STATUS_REPLY_LEN: usize = 32;

/// Summary of what happened after writing a job and (if possible) waiting
/// for it to finish.
#[derive(Debug, Clone, Default)]
pub struct PrintOutcome {
    /// The instructions were written to the transport.
    pub instructions_sent: bool,
    /// `true` once a `PrintingCompleted` status was observed.
    pub did_print: bool,
    /// `true` once the printer reported `PhaseChange`/`Receiving` after printing.
    pub ready_for_next_job: bool,
    /// The last status reply observed, if any.
    pub printer_state: Option<StatusInformation>,
}

impl PrintOutcome {
    fn sent_only() -> Self {
        Self { instructions_sent: true, ..Self::default() }
    }
}

/// Writes `instructions` to `transport` and, if it supports read-back, waits
/// up to [`OVERALL_TIMEOUT`] for the printer to report completion.
///
/// Backends without read-back (network, file) return immediately after the
/// write succeeds; the outcome's `did_print`/`ready_for_next_job` stay
/// `false` since there is no way to confirm them.
///
/// # Errors
///
/// Returns [`PrintError::Transport`] if the write fails.
pub fn communicate(instructions: &[u8], transport: &mut dyn Transport) -> Result<PrintOutcome, PrintError> {
    info!(bytes = instructions.len(), "sending instructions to the printer");
    transport.write(instructions)?;

    if !transport.supports_read() {
        return Ok(PrintOutcome::sent_only());
    }

    let start = Instant::now();
    let mut outcome = PrintOutcome::sent_only();

    while start.elapsed() < OVERALL_TIMEOUT {
        let data = transport.read(STATUS_REPLY_LEN)?;
        if data.is_empty() {
            std::thread::sleep(POLL_INTERVAL);
            continue;
        }
        let status = match StatusInformation::try_from(data.as_slice()) {
            Ok(status) => status,
            Err(e) => {
                warn!(elapsed = ?start.elapsed(), error = %e, "could not understand printer response");
                continue;
            }
        };
        debug!(elapsed = ?start.elapsed(), ?status, "received status reply");

        if status.has_errors() {
            return Err(crate::error::ProtocolError::PrinterError(status.errors).into());
        }
        if status.status_type == StatusType::PrintingCompleted {
            outcome.did_print = true;
        }
        if status.status_type == StatusType::PhaseChange && status.phase == Phase::Receiving {
            outcome.ready_for_next_job = true;
        }
        outcome.printer_state = Some(status);
        if outcome.did_print && outcome.ready_for_next_job {
            break;
        }
    }

    if !outcome.did_print {
        warn!("'printing completed' status not received");
    }
    if !outcome.ready_for_next_job {
        warn!("'waiting to receive' status not received");
    }
    if outcome.did_print && outcome.ready_for_next_job {
        info!("printing was successful, printer is ready for the next job");
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;

    struct WriteOnlyTransport {
        written: Vec<u8>,
    }

    impl Transport for WriteOnlyTransport {
        fn open(&mut self) -> Result<(), TransportError> {
            Ok(())
        }
        fn close(&mut self) -> Result<(), TransportError> {
            Ok(())
        }
        fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
            self.written.extend_from_slice(data);
            Ok(())
        }
    }

    #[test]
    fn non_readable_transport_returns_immediately_after_write() {
        let mut transport = WriteOnlyTransport { written: Vec::new() };
        let outcome = communicate(&[1, 2, 3], &mut transport).unwrap();
        assert!(outcome.instructions_sent);
        assert!(!outcome.did_print);
        assert!(!outcome.ready_for_next_job);
        assert_eq!(transport.written, vec![1, 2, 3]);
    }

    struct ScriptedTransport {
        replies: std::collections::VecDeque<Vec<u8>>,
    }

    impl Transport for ScriptedTransport {
        fn open(&mut self) -> Result<(), TransportError> {
            Ok(())
        }
        fn close(&mut self) -> Result<(), TransportError> {
            Ok(())
        }
        fn write(&mut self, _data: &[u8]) -> Result<(), TransportError> {
            Ok(())
        }
        fn read(&mut self, _max_len: usize) -> Result<Vec<u8>, TransportError> {
            Ok(self.replies.pop_front().unwrap_or_default())
        }
        fn supports_read(&self) -> bool {
            true
        }
    }

    fn status_bytes(status_type: u8, phase: [u8; 3]) -> Vec<u8> {
        let mut bytes = vec![0u8; 32];
        bytes[0] = 0x80;
        bytes[1] = 0x20;
        bytes[2] = 0x42;
        bytes[3] = 0x34;
        bytes[18] = status_type;
        bytes[19..22].copy_from_slice(&phase);
        bytes
    }

    #[test]
    fn readable_transport_reports_printed_and_ready() {
        let mut transport = ScriptedTransport {
            replies: vec![status_bytes(0x01, [0, 0, 0]), status_bytes(0x06, [0, 0, 0])].into(),
        };
        let outcome = communicate(&[1], &mut transport).unwrap();
        assert!(outcome.did_print);
        assert!(outcome.ready_for_next_job);
    }

    #[test]
    fn error_status_yields_protocol_error() {
        let mut bytes = status_bytes(0x02, [0, 0, 0]);
        bytes[8] = 0x01;
        let mut transport = ScriptedTransport { replies: vec![bytes].into() };
        let err = communicate(&[1], &mut transport).unwrap_err();
        assert!(matches!(err, PrintError::Protocol(_)));
    }
}
