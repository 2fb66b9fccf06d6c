//! Raster reader/interpreter: the inverse of [`crate::job`].
//!
//! Consumes a byte stream emitted by the encoder (or captured from a real
//! device) and reconstructs page images plus, for device replies, decoded
//! status records.

use image::{GrayImage, Luma};

use crate::{error::ReaderError, packbits, status::StatusInformation};

/// How to determine the total length (in bytes, including the matched
/// prefix) of a chunk once its opcode prefix has matched.
#[derive(Clone, Copy)]
enum LengthKind {
    /// Fixed total length.
    Fixed(usize),
    /// A run of identical (`0x00`) bytes; consumes as many as are present.
    NulRun,
    /// `header_len` bytes (prefix + a 2-byte little-endian length field),
    /// followed by that many payload bytes.
    RasterLine { header_len: usize },
}

struct OpcodeEntry {
    prefix: &'static [u8],
    kind: LengthKind,
}

/// The opcode table: leading bytes map to a length-decoding rule.
///
/// Self-checked for prefix-uniqueness by [`assert_prefix_uniqueness`] (run in
/// tests): no two entries may have one's prefix as a byte-prefix of the
/// other's, since that would make the chunker's dispatch ambiguous.
static OPCODE_TABLE: &[OpcodeEntry] = &[
    OpcodeEntry { prefix: &[0x00], kind: LengthKind::NulRun },
    OpcodeEntry { prefix: &[0x1b, 0x40], kind: LengthKind::Fixed(2) },
    OpcodeEntry { prefix: &[0x1b, 0x69, 0x64], kind: LengthKind::Fixed(5) },
    OpcodeEntry { prefix: &[0x1b, 0x69, 0x61], kind: LengthKind::Fixed(4) },
    OpcodeEntry { prefix: &[0x1b, 0x69, 0x21], kind: LengthKind::Fixed(4) },
    OpcodeEntry { prefix: &[0x1b, 0x69, 0x53], kind: LengthKind::Fixed(3) },
    OpcodeEntry { prefix: &[0x1b, 0x69, 0x41], kind: LengthKind::Fixed(4) },
    OpcodeEntry { prefix: &[0x1b, 0x69, 0x4d], kind: LengthKind::Fixed(4) },
    OpcodeEntry { prefix: &[0x1b, 0x69, 0x4b], kind: LengthKind::Fixed(4) },
    OpcodeEntry { prefix: &[0x1b, 0x69, 0x7a], kind: LengthKind::Fixed(13) },
    OpcodeEntry { prefix: &[0x67], kind: LengthKind::RasterLine { header_len: 3 } },
    OpcodeEntry { prefix: &[0x77], kind: LengthKind::RasterLine { header_len: 4 } },
    OpcodeEntry { prefix: &[0x0c], kind: LengthKind::Fixed(1) },
    OpcodeEntry { prefix: &[0x1a], kind: LengthKind::Fixed(1) },
    OpcodeEntry { prefix: &[0x4d], kind: LengthKind::Fixed(2) },
    OpcodeEntry { prefix: &[0x80], kind: LengthKind::Fixed(32) },
];

fn assert_prefix_uniqueness() {
    for (i, a) in OPCODE_TABLE.iter().enumerate() {
        for (j, b) in OPCODE_TABLE.iter().enumerate() {
            if i == j {
                continue;
            }
            let n = a.prefix.len().min(b.prefix.len());
            assert_ne!(&a.prefix[..n], &b.prefix[..n], "opcode table entries {i} and {j} share a byte-prefix");
        }
    }
}

/// One decoded instruction from the byte stream. Borrows payload bytes from
/// the buffer that was fed to the [`Reader`].
#[derive(Debug)]
pub enum Chunk<'a> {
    /// NUL preamble.
    Invalidate,
    /// `1B 40`.
    Initialize,
    /// `1B 69 64`.
    SpecifyMarginAmount { margin_size: u16 },
    /// `1B 69 61`.
    SwitchDynamicCommandMode,
    /// `1B 69 21`.
    SwitchAutomaticStatusNotificationMode { notify: bool },
    /// `1B 69 53`.
    StatusInformationRequest,
    /// `1B 69 41`.
    SpecifyPageNumber { cut_every: u8 },
    /// `1B 69 4D`.
    VariousMode { auto_cut: bool },
    /// `1B 69 4B`.
    ExpandedMode { two_color: bool, cut_at_end: bool, high_dpi: bool },
    /// `1B 69 7A`.
    PrintInformation { media_width: u8, media_length: u8, no_lines: u32, first_page: bool },
    /// `67`.
    RasterGraphicsTransfer { data: &'a [u8] },
    /// `77`.
    TwoColorRasterGraphicsTransfer { data: &'a [u8], high_energy: bool },
    /// `0C`.
    Print,
    /// `1A`.
    PrintWithFeed,
    /// `4D`.
    SelectCompressionMode { tiff_compression: bool },
    /// `80 ...` (32-byte device status reply).
    StatusReply(StatusInformation),
}

enum Lookup {
    Found { entry_index: usize, total_len: usize },
    NeedMore(usize),
    Unknown,
}

fn lookup(buf: &[u8]) -> Lookup {
    let mut need_more_for = None;
    for (idx, entry) in OPCODE_TABLE.iter().enumerate() {
        if buf.len() >= entry.prefix.len() {
            if &buf[..entry.prefix.len()] != entry.prefix {
                continue;
            }
            return match entry.kind {
                LengthKind::Fixed(len) => Lookup::Found { entry_index: idx, total_len: len },
                LengthKind::NulRun => {
                    let run = buf.iter().take_while(|&&b| b == 0).count();
                    if run == buf.len() {
                        // The whole remaining buffer is zero; the run might continue.
                        Lookup::NeedMore(1)
                    } else {
                        Lookup::Found { entry_index: idx, total_len: run }
                    }
                }
                LengthKind::RasterLine { header_len } => {
                    if buf.len() < header_len {
                        return Lookup::NeedMore(header_len - buf.len());
                    }
                    let len_offset = header_len - 2;
                    let payload_len = u16::from_le_bytes([buf[len_offset], buf[len_offset + 1]]) as usize;
                    let total_len = header_len + payload_len;
                    if buf.len() < total_len {
                        Lookup::NeedMore(total_len - buf.len())
                    } else {
                        Lookup::Found { entry_index: idx, total_len }
                    }
                }
            };
        } else if entry.prefix.starts_with(buf) {
            let needed = entry.prefix.len() - buf.len();
            need_more_for = Some(need_more_for.map_or(needed, |n: usize| n.min(needed)));
        }
    }
    need_more_for.map_or(Lookup::Unknown, Lookup::NeedMore)
}

fn decode_chunk(entry_index: usize, buf: &[u8]) -> Result<Chunk<'_>, ReaderError> {
    match entry_index {
        0 => Ok(Chunk::Invalidate),
        1 => Ok(Chunk::Initialize),
        2 => Ok(Chunk::SpecifyMarginAmount { margin_size: u16::from_le_bytes([buf[3], buf[4]]) }),
        3 => Ok(Chunk::SwitchDynamicCommandMode),
        4 => Ok(Chunk::SwitchAutomaticStatusNotificationMode { notify: buf[3] == 0x00 }),
        5 => Ok(Chunk::StatusInformationRequest),
        6 => Ok(Chunk::SpecifyPageNumber { cut_every: buf[3] }),
        7 => Ok(Chunk::VariousMode { auto_cut: buf[3] & 0b0100_0000 != 0 }),
        8 => Ok(Chunk::ExpandedMode {
            two_color: buf[3] & 0b1 != 0,
            cut_at_end: buf[3] & (0b1 << 3) != 0,
            high_dpi: buf[3] & (0b1 << 6) != 0,
        }),
        9 => Ok(Chunk::PrintInformation {
            media_width: buf[5],
            media_length: buf[6],
            no_lines: u32::from_be_bytes([buf[10], buf[9], buf[8], buf[7]]),
            first_page: buf[11] == 0x00,
        }),
        10 => Ok(Chunk::RasterGraphicsTransfer { data: &buf[3..] }),
        11 => Ok(Chunk::TwoColorRasterGraphicsTransfer { data: &buf[4..], high_energy: buf[1] == 0x01 }),
        12 => Ok(Chunk::Print),
        13 => Ok(Chunk::PrintWithFeed),
        14 => Ok(Chunk::SelectCompressionMode { tiff_compression: buf[1] == 0x02 }),
        15 => {
            let status = StatusInformation::try_from(buf)
                .map_err(|e| ReaderError::Malformed { offset: 0, reason: e.reason })?;
            Ok(Chunk::StatusReply(status))
        }
        _ => unreachable!("entry_index out of range for OPCODE_TABLE"),
    }
}

/// Reads the single next chunk at the start of `buf`.
///
/// Returns `Ok(None)` if `buf` is a valid-so-far prefix of some opcode but
/// doesn't yet contain the whole instruction (`NeedMore`). Returns
/// `Err(ReaderError::Malformed)` if no opcode in the table matches the
/// leading bytes at all.
///
/// # Errors
///
/// See [`ReaderError`].
pub fn next_chunk(buf: &[u8]) -> Result<Option<(Chunk<'_>, usize)>, ReaderError> {
    if buf.is_empty() {
        return Ok(None);
    }
    match lookup(buf) {
        Lookup::Found { entry_index, total_len } => {
            let chunk = decode_chunk(entry_index, &buf[..total_len])?;
            Ok(Some((chunk, total_len)))
        }
        Lookup::NeedMore(_) => Ok(None),
        Lookup::Unknown => Err(ReaderError::Malformed { offset: 0, reason: format!("unrecognized opcode byte {:#04x}", buf[0]) }),
    }
}

/// One reconstructed page plus the settings observed while building it.
#[derive(Debug, Clone)]
pub struct ReconstructedPage {
    /// The page image. For two-color jobs this is the black channel; see
    /// [`ReconstructedPage::red`].
    pub image: GrayImage,
    /// The red channel, present only for two-color jobs.
    pub red: Option<GrayImage>,
}

/// Incrementally reconstructs pages and status replies from a raster byte
/// stream.
#[derive(Default)]
pub struct PageReconstructor {
    compressed: bool,
    two_color: bool,
    width_bytes: Option<usize>,
    black_rows: Vec<Vec<u8>>,
    red_rows: Vec<Vec<u8>>,
    pending_statuses: Vec<StatusInformation>,
}

impl PageReconstructor {
    /// Creates an empty reconstructor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a full byte stream through the chunker, applying each
    /// recognized chunk, and returns every page completed by a `print`
    /// opcode, in order.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError`] if the stream contains an unrecognized opcode
    /// or is truncated mid-instruction.
    pub fn feed(&mut self, mut buf: &[u8]) -> Result<Vec<ReconstructedPage>, ReaderError> {
        let mut pages = Vec::new();
        while !buf.is_empty() {
            let Some((chunk, consumed)) = next_chunk(buf)? else {
                return Err(ReaderError::NeedMore { needed: 1 });
            };
            if let Some(page) = self.apply(chunk)? {
                pages.push(page);
            }
            buf = &buf[consumed..];
        }
        Ok(pages)
    }

    /// Status replies observed so far (e.g. from `StatusReply` chunks).
    #[must_use]
    pub fn statuses(&self) -> &[StatusInformation] {
        &self.pending_statuses
    }

    fn apply(&mut self, chunk: Chunk<'_>) -> Result<Option<ReconstructedPage>, ReaderError> {
        match chunk {
            Chunk::SelectCompressionMode { tiff_compression } => {
                self.compressed = tiff_compression;
                Ok(None)
            }
            Chunk::ExpandedMode { two_color, .. } => {
                self.two_color = two_color;
                Ok(None)
            }
            Chunk::PrintInformation { .. } => {
                self.black_rows.clear();
                self.red_rows.clear();
                self.width_bytes = None;
                Ok(None)
            }
            Chunk::RasterGraphicsTransfer { data } => {
                let row = self.decode_row(data)?;
                self.width_bytes.get_or_insert(row.len());
                self.black_rows.push(row);
                Ok(None)
            }
            Chunk::TwoColorRasterGraphicsTransfer { data, high_energy } => {
                let row = self.decode_row(data)?;
                self.width_bytes.get_or_insert(row.len());
                if high_energy {
                    self.black_rows.push(row);
                } else {
                    self.red_rows.push(row);
                }
                Ok(None)
            }
            Chunk::StatusReply(status) => {
                self.pending_statuses.push(status);
                Ok(None)
            }
            Chunk::Print | Chunk::PrintWithFeed => Ok(Some(self.flush_page())),
            _ => Ok(None),
        }
    }

    fn decode_row(&self, data: &[u8]) -> Result<Vec<u8>, ReaderError> {
        if self.compressed {
            packbits::decode(data)
        } else {
            Ok(data.to_vec())
        }
    }

    fn flush_page(&mut self) -> ReconstructedPage {
        let width_bytes = self.width_bytes.unwrap_or(0);
        let width_px = (width_bytes * 8) as u32;
        let image = rows_to_image(width_px, &self.black_rows);
        let red = if self.two_color && !self.red_rows.is_empty() {
            Some(rows_to_image(width_px, &self.red_rows))
        } else {
            None
        };
        self.black_rows.clear();
        self.red_rows.clear();
        ReconstructedPage { image, red }
    }
}

fn rows_to_image(width_px: u32, rows: &[Vec<u8>]) -> GrayImage {
    let height = rows.len() as u32;
    let mut image = GrayImage::new(width_px, height.max(1));
    for (y, row) in rows.iter().enumerate() {
        for x in 0..width_px as usize {
            let byte = row.get(x / 8).copied().unwrap_or(0);
            let bit = (byte >> (7 - (x % 8))) & 1;
            let luma = if bit == 1 { 0u8 } else { 255u8 };
            image.put_pixel(x as u32, y as u32, Luma([luma]));
        }
    }
    image
}

/// Writes reconstructed pages to disk using a `{counter:04d}`-style template
/// (e.g. `"spool{:04}.png"`) so a multi-page capture sorts naturally by name.
///
/// # Errors
///
/// Returns [`std::io::Error`] if any page fails to save.
pub fn write_pages(pages: &[ReconstructedPage], filename_template: &str) -> std::io::Result<Vec<std::path::PathBuf>> {
    let mut paths = Vec::with_capacity(pages.len());
    for (i, page) in pages.iter().enumerate() {
        let path = std::path::PathBuf::from(format_counter(filename_template, i as u32));
        page.image.save(&path).map_err(|e| std::io::Error::other(e.to_string()))?;
        paths.push(path);
    }
    Ok(paths)
}

fn format_counter(template: &str, counter: u32) -> String {
    template.replacen("{counter:04d}", &format!("{counter:04}"), 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::{label_by_identifier, model_by_name},
        job::{CutBehavior, RasterJob},
    };

    #[test]
    fn opcode_table_has_unique_prefixes() {
        assert_prefix_uniqueness();
    }

    #[test]
    fn round_trips_an_encoded_job_into_one_page() {
        let model = model_by_name("QL-600").unwrap();
        let label = label_by_identifier(model, "62").unwrap();
        let mut job = RasterJob::new(model, label).cut_behavior(CutBehavior::None).compressed(false);
        let row = vec![0u8; model.bytes_per_row as usize];
        job.add_page(vec![row; 300]).unwrap();
        let output = job.compile();

        let mut reconstructor = PageReconstructor::new();
        let pages = reconstructor.feed(&output.bytes).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].image.width(), 720);
        assert_eq!(pages[0].image.height(), 300);
    }

    #[test]
    fn round_trips_a_compressed_job() {
        let model = model_by_name("QL-600").unwrap();
        let label = label_by_identifier(model, "62").unwrap();
        let mut job = RasterJob::new(model, label).cut_behavior(CutBehavior::None).compressed(true);
        let row = vec![0u8; model.bytes_per_row as usize];
        job.add_page(vec![row; 50]).unwrap();
        let output = job.compile();

        let mut reconstructor = PageReconstructor::new();
        let pages = reconstructor.feed(&output.bytes).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].image.height(), 50);
    }

    #[test]
    fn truncated_stream_signals_need_more() {
        let bytes = vec![0x1b, 0x69, 0x64, 0x05];
        let result = next_chunk(&bytes).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn unknown_opcode_byte_is_malformed() {
        let bytes = vec![0xF1, 0x02, 0x03];
        assert!(next_chunk(&bytes).is_err());
    }
}
