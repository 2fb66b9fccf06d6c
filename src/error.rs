//! Error types for the Brother label driver.
//!
//! Each subsystem gets its own `thiserror`-derived enum; [`BQLError`] composes
//! them into the single type a caller (or the CLI binary) actually needs to
//! match on.
//!
//! - [`CatalogError`]: unknown model/label name
//! - [`RasterError`]: encoder-side dimensional/capability mismatches
//! - [`ReaderError`]: malformed or truncated raster byte streams
//! - [`PrintJobError`]: validation and compatibility errors during print job creation
//! - [`TransportError`]: USB/kernel/network/file transport failures
//! - [`UsbError`] / [`KernelError`]: transport errors for specific backends
//! - [`RenderError`]: geometry/quantization failures in the render pipeline
//! - [`ExternalToolError`]: subprocess failures from vector/font-matcher collaborators
//! - [`StatusParsingError`] / [`StatusError`]: status-reply parsing and retrieval
//! - [`ProtocolError`]: unexpected printer status during the engine loop
//! - [`PrintError`]: top-level error from driving a full print

use thiserror::Error;

use crate::status::ErrorFlags;

/// Errors raised while looking up models or labels in the catalog.
#[derive(Error, Debug, Clone)]
pub enum CatalogError {
    /// No model matched the given name.
    #[error("unknown model {name:?}{}", format_suggestions(suggestions))]
    UnknownModel {
        /// The name as given by the caller.
        name: String,
        /// Up to 3 near-matches by edit distance.
        suggestions: Vec<String>,
    },

    /// No label accepted by `model` matched the given identifier.
    #[error("unknown label {identifier:?} for model {model}{}", format_suggestions(suggestions))]
    UnknownLabel {
        /// The identifier as given by the caller.
        identifier: String,
        /// The model it was being resolved against.
        model: &'static str,
        /// Up to 3 near-matches by edit distance.
        suggestions: Vec<String>,
    },
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean: {}?)", suggestions.join(", "))
    }
}

/// Errors raised while encoding a raster job.
#[derive(Error, Debug, Clone)]
pub enum RasterError {
    /// An image's width doesn't match the printable width for the selected label/model.
    #[error("image width {actual} px does not match expected width {expected} px")]
    WidthMismatch {
        /// Expected width in device pixels.
        expected: u32,
        /// Actual image width in pixels.
        actual: u32,
    },

    /// A die-cut label requires an exact height match and the image didn't provide one.
    #[error("image height {actual} px does not match expected height {expected} px for die-cut label")]
    HeightMismatch {
        /// Expected height in device pixels.
        expected: u32,
        /// Actual image height in pixels.
        actual: u32,
    },

    /// The selected model does not support a requested opcode.
    #[error("model {model} does not support {command}")]
    UnsupportedCommand {
        /// The model that was asked to emit the command.
        model: &'static str,
        /// Name of the unsupported command/opcode.
        command: &'static str,
    },

    /// Page row count is outside the model's supported range.
    #[error("page has {actual} rows, outside supported range {min}..={max}")]
    RowCountOutOfRange {
        /// Minimum supported row count.
        min: u32,
        /// Maximum supported row count.
        max: u32,
        /// Actual row count requested.
        actual: u32,
    },

    /// PackBits compression was requested but would not fit a control byte/run.
    #[error("packbits encode error: {0}")]
    PackBits(String),
}

/// Errors raised while interpreting a raster byte stream.
#[derive(Error, Debug, Clone)]
pub enum ReaderError {
    /// The stream ended mid-instruction.
    #[error("unexpected end of stream: need {needed} more byte(s)")]
    NeedMore {
        /// Additional bytes required to complete the in-progress instruction.
        needed: usize,
    },

    /// A leading byte sequence did not match any known opcode.
    #[error("malformed input at offset {offset}: {reason}")]
    Malformed {
        /// Byte offset of the failure.
        offset: usize,
        /// Description of the problem.
        reason: String,
    },

    /// PackBits decoding produced more or fewer bytes than the row requires.
    #[error("packbits decode error: {0}")]
    PackBits(String),
}

/// Errors related to print job validation.
///
/// Returned when image dimensions don't match media requirements.
#[derive(Error, Debug)]
pub enum PrintJobError {
    /// Image dimensions don't match the selected media type.
    #[error("Image dimensions ({actual_width}x{actual_height} px) don't match media requirements (width: {expected_width} px{})",
        expected_height.map(|h| format!(", height: {h} px")).unwrap_or_default()
    )]
    DimensionMismatch {
        /// Expected image width in pixels (dots).
        expected_width: u32,
        /// Actual image width in pixels.
        actual_width: u32,
        /// Expected image height in pixels (None for continuous media).
        expected_height: Option<u32>,
        /// Actual image height in pixels.
        actual_height: u32,
    },

    /// Image I/O error from the image crate.
    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    /// Raster encoding error (capability gate, row bounds, compression).
    #[error(transparent)]
    Raster(#[from] RasterError),
}

/// USB communication errors. Only constructible with the `usb` feature enabled.
#[derive(Error, Debug)]
pub enum UsbError {
    /// USB device not found with the specified vendor and product ID.
    #[error("USB device not found (vendor: {vendor_id:#06x}, product: {product_id:#06x})")]
    DeviceNotFound {
        /// USB vendor ID (typically 0x04f9 for Brother).
        vendor_id: u16,
        /// USB product ID (specific to printer model).
        product_id: u16,
    },

    /// A device matched the requested vendor/product ID, but none of them
    /// carried the requested serial number.
    #[error(
        "no USB device (vendor: {vendor_id:#06x}, product: {product_id:#06x}) matched serial {requested:?}{}",
        format_suggestions(candidates)
    )]
    UnknownSerial {
        /// USB vendor ID that did match.
        vendor_id: u16,
        /// USB product ID that did match.
        product_id: u16,
        /// The serial number that was requested.
        requested: String,
        /// Serial numbers found on vendor/product-matching devices instead.
        candidates: Vec<String>,
    },

    /// Failed to write all data to the USB device.
    #[error("incomplete USB write")]
    IncompleteWrite,

    /// USB communication error from the rusb library.
    #[cfg(feature = "usb")]
    #[error(transparent)]
    Rusb(#[from] rusb::Error),
}

/// Kernel character-device communication errors.
#[derive(Error, Debug)]
pub enum KernelError {
    /// Kernel read/write operation failed.
    #[error("kernel IO error: {0}")]
    IOError(#[from] std::io::Error),

    /// Failed to write all data to the kernel device.
    #[error("incomplete kernel write")]
    IncompleteWrite,
}

/// Transport errors, generalized across backends (USB/kernel/network/file).
///
/// The engine loop and the `Transport` trait speak only this type; backend
/// crates (`rusb`, `nix`, `std::net`) are an implementation detail behind it.
#[derive(Error, Debug)]
pub enum TransportError {
    /// USB backend failure.
    #[error(transparent)]
    Usb(#[from] UsbError),

    /// Kernel character-device backend failure.
    #[error(transparent)]
    Kernel(#[from] KernelError),

    /// Network (TCP) backend failure.
    #[error("network IO error: {0}")]
    Network(#[source] std::io::Error),

    /// File-sink backend failure.
    #[error("file IO error: {0}")]
    File(#[source] std::io::Error),

    /// Device URL failed to parse.
    #[error("invalid device URL {url:?}: {reason}")]
    InvalidUrl {
        /// The URL as given.
        url: String,
        /// Description of the problem.
        reason: String,
    },

    /// Operation attempted on a backend that doesn't support it (e.g. reading from a TCP/file sink).
    #[error("operation not supported by this transport")]
    Unsupported,
}

/// Errors raised while rendering a source into device pixels.
#[derive(Error, Debug)]
pub enum RenderError {
    /// A [`crate::render::RenderOptions`] invariant was violated.
    #[error("invalid render options: {0}")]
    InvalidOptions(String),

    /// The requested page index does not exist in the source.
    #[error("page index {index} out of range (source has {page_count} page(s))")]
    PageOutOfRange {
        /// The index that was requested.
        index: usize,
        /// Total pages the source reports.
        page_count: usize,
    },

    /// Decoding the bitmap source failed.
    #[error("bitmap decode error: {0}")]
    Image(#[from] image::ImageError),

    /// A vector or font-matcher subprocess collaborator failed.
    #[error(transparent)]
    ExternalTool(#[from] ExternalToolError),
}

/// Errors from external-tool collaborators (vector rasterizer, font matcher).
#[derive(Error, Debug)]
pub enum ExternalToolError {
    /// The external executable could not be located on `PATH`.
    #[error("external tool {name:?} not found on PATH")]
    NotFound {
        /// Name of the executable that was searched for.
        name: &'static str,
    },

    /// The external tool ran but exited with a non-zero status.
    #[error("external tool {name:?} exited with status {status}: {stderr}")]
    NonZeroExit {
        /// Name of the executable.
        name: &'static str,
        /// Process exit status.
        status: i32,
        /// Captured standard error.
        stderr: String,
    },

    /// Spawning or communicating with the subprocess failed at the OS level.
    #[error("failed to run external tool {name:?}: {source}")]
    Spawn {
        /// Name of the executable.
        name: &'static str,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The tool's output could not be parsed as expected.
    #[error("could not parse output of external tool {name:?}: {reason}")]
    Parse {
        /// Name of the executable.
        name: &'static str,
        /// Description of the problem.
        reason: String,
    },
}

/// Status parsing errors.
///
/// Returned when status bytes from the printer are malformed.
#[derive(Error, Debug, Clone)]
#[error("failed to parse status information: {reason}")]
pub struct StatusParsingError {
    /// Description of what's wrong with the status data.
    pub reason: String,
}

/// Status reading errors.
#[derive(Error, Debug)]
pub enum StatusError {
    /// Transport error while requesting or reading status.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Printer did not respond after retries.
    #[error("printer did not respond with a status information reply after being queried")]
    NoResponse,

    /// Status parsing error (malformed status bytes).
    #[error(transparent)]
    Parsing(#[from] StatusParsingError),
}

/// Protocol flow errors during printing.
///
/// Returned when the printer sends unexpected status or reports an error condition.
#[derive(Error, Debug, Clone)]
pub enum ProtocolError {
    /// Printer reported error conditions (see [`ErrorFlags`]).
    #[error("printer reported errors: {0:?}")]
    PrinterError(ErrorFlags),

    /// Printer sent unexpected status.
    #[error(
        "unexpected printer status: expected {expected_type:?}/{expected_phase:?}, got {actual_type:?}/{actual_phase:?}"
    )]
    UnexpectedStatus {
        /// Expected status type.
        expected_type: crate::status::StatusType,
        /// Expected phase.
        expected_phase: crate::status::Phase,
        /// Actual status type received.
        actual_type: crate::status::StatusType,
        /// Actual phase received.
        actual_phase: crate::status::Phase,
    },

    /// The engine loop exceeded its overall timeout waiting for completion.
    #[error("timed out after {0:?} waiting for the printer to finish")]
    Timeout(std::time::Duration),
}

/// Printing errors.
///
/// Returned by the engine loop.
#[derive(Error, Debug)]
pub enum PrintError {
    /// Transport error.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Status reading error (communication, timeout, or parsing).
    #[error(transparent)]
    Status(#[from] StatusError),

    /// Protocol flow error (unexpected status, printer error, etc).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Top-level error type composing every subsystem error.
///
/// The CLI binary matches on this and surfaces a single-line message with
/// exit code 1; library callers are expected to match on the more specific
/// per-subsystem types where they need finer control.
#[derive(Error, Debug)]
pub enum BQLError {
    /// Catalog lookup failure.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Raster encoder failure.
    #[error(transparent)]
    Raster(#[from] RasterError),

    /// Raster reader failure.
    #[error(transparent)]
    Reader(#[from] ReaderError),

    /// Print job validation failure.
    #[error(transparent)]
    PrintJob(#[from] PrintJobError),

    /// Transport failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// External tool (vector/font) failure.
    #[error(transparent)]
    ExternalTool(#[from] ExternalToolError),

    /// Render pipeline failure.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Status retrieval/parsing failure.
    #[error(transparent)]
    Status(#[from] StatusError),

    /// Protocol flow failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Printing failure (composes transport/status/protocol).
    #[error(transparent)]
    Print(#[from] PrintError),

    /// An I/O error not otherwise classified (e.g. spool file creation).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
