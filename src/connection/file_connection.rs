//! Debug sink: writes raw bytes to a file (`file://PATH` or a bare path).

use std::fs::File;
use std::io::Write;

use super::Transport;
use crate::error::TransportError;

/// Writes raw printer command bytes to a file, for network printing prep or debugging.
pub struct FileConnection {
    path: String,
    file: Option<File>,
}

impl FileConnection {
    /// Creates a connection that will write to `path` once opened.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), file: None }
    }
}

impl Transport for FileConnection {
    fn open(&mut self) -> Result<(), TransportError> {
        if self.file.is_some() {
            return Ok(());
        }
        let file = File::create(&self.path).map_err(TransportError::File)?;
        self.file = Some(file);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.file = None;
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let file = self.file.as_mut().ok_or(TransportError::Unsupported)?;
        file.write_all(data).map_err(TransportError::File)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_bytes_to_file() {
        let path = std::env::temp_dir().join(format!("bql-file-conn-{}.bin", std::process::id()));
        let mut conn = FileConnection::new(path.to_str().unwrap());
        conn.open().unwrap();
        conn.write(b"abc").unwrap();
        conn.close().unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"abc");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn open_is_idempotent() {
        let path = std::env::temp_dir().join(format!("bql-file-conn-idem-{}.bin", std::process::id()));
        let mut conn = FileConnection::new(path.to_str().unwrap());
        conn.open().unwrap();
        conn.open().unwrap();
        conn.close().unwrap();
        let _ = std::fs::remove_file(&path);
    }
}
