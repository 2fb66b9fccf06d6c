//! Linux character-device backend: `lp://lpN` or `lp:///dev/usb/lpN`.
//!
//! A plain read/write file handle, polled non-blockingly before each read so
//! an unresponsive printer can't hang the engine loop.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::fd::AsFd;

use nix::poll::{poll, PollFd, PollFlags, PollTimeout};

use super::Transport;
use crate::error::{KernelError, TransportError};

/// A connection to the printer via the Linux kernel's `usblp` character device.
pub struct KernelConnection {
    path: String,
    handle: Option<File>,
}

impl KernelConnection {
    /// Creates a connection that will open `path` once opened.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), handle: None }
    }
}

impl Transport for KernelConnection {
    fn open(&mut self) -> Result<(), TransportError> {
        if self.handle.is_some() {
            return Ok(());
        }
        let handle = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(|e| TransportError::Kernel(KernelError::IOError(e)))?;
        self.handle = Some(handle);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.handle = None;
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let handle = self.handle.as_mut().ok_or(TransportError::Unsupported)?;
        let written = handle.write(data).map_err(|e| TransportError::Kernel(KernelError::IOError(e)))?;
        if written != data.len() {
            return Err(TransportError::Kernel(KernelError::IncompleteWrite));
        }
        Ok(())
    }

    fn read(&mut self, max_len: usize) -> Result<Vec<u8>, TransportError> {
        let handle = self.handle.as_mut().ok_or(TransportError::Unsupported)?;
        // Non-blocking poll with a zero timeout: the engine loop owns the
        // overall wait budget and polling cadence, this just reports whether
        // data is available right now.
        let mut pollfds = [PollFd::new(handle.as_fd(), PollFlags::POLLIN)];
        let nready = poll(&mut pollfds, PollTimeout::ZERO).unwrap_or(0);
        if nready == 0 {
            return Ok(Vec::new());
        }
        let mut buf = vec![0u8; max_len];
        let n = handle.read(&mut buf).map_err(|e| TransportError::Kernel(KernelError::IOError(e)))?;
        buf.truncate(n);
        Ok(buf)
    }

    fn supports_read(&self) -> bool {
        true
    }
}
