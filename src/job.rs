//! The raster command encoder: turns already-rasterized page data into the
//! exact byte stream a printer model expects.

use crate::{
    catalog::{Capability, Label, Model},
    commands::{ColorPower, CommandBuilder, DynamicCommandMode, RasterCommand as RC, VariousModeSettings},
    error::RasterError,
    packbits,
};

/// Cutting behavior for the automatic cutter unit.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum CutBehavior {
    /// Don't cut at all (manual cutting required).
    None,
    /// Cut after each page.
    CutEach,
    /// Cut after every `n` pages. If the page count isn't divisible by `n`,
    /// an additional cut is added at the end.
    CutEvery(u8),
    /// Cut only after the last page.
    CutAtEnd,
}

enum EncodedPage {
    Monochrome { rows: Vec<Vec<u8>> },
    TwoColor { black_rows: Vec<Vec<u8>>, red_rows: Vec<Vec<u8>> },
}

impl EncodedPage {
    fn row_count(&self) -> usize {
        match self {
            EncodedPage::Monochrome { rows } => rows.len(),
            EncodedPage::TwoColor { black_rows, .. } => black_rows.len(),
        }
    }

    fn is_two_color(&self) -> bool {
        matches!(self, EncodedPage::TwoColor { .. })
    }
}

/// Result of [`RasterJob::compile`]: the encoded bytes plus any optional
/// opcodes that were silently dropped because the target model doesn't
/// support them. Callers decide whether a non-empty `warnings` is fatal.
#[derive(Debug)]
pub struct CompileOutput {
    /// The full byte stream ready to send to (or save for) the printer.
    pub bytes: Vec<u8>,
    /// Optional opcodes the caller requested that this model can't emit.
    pub warnings: Vec<RasterError>,
}

/// A raster print job targeting one [`Model`]/[`Label`] pair.
///
/// Pages are added with [`RasterJob::add_page`] or
/// [`RasterJob::add_two_color_page`]; each row must be exactly
/// `model.bytes_per_row` bytes. Call [`RasterJob::compile`] to produce the
/// final byte stream.
pub struct RasterJob {
    model: &'static Model,
    label: &'static Label,
    high_dpi: bool,
    compressed: bool,
    quality_priority: bool,
    cut_behavior: CutBehavior,
    pages: Vec<EncodedPage>,
}

impl RasterJob {
    /// Creates an empty job targeting `model`/`label`.
    ///
    /// Defaults: `high_dpi = false`, `compressed = model.supports(Capability::COMPRESSION)`,
    /// `quality_priority = true`, `cut_behavior = CutEach` for endless media
    /// or `CutAtEnd` for die-cut media.
    #[must_use]
    pub fn new(model: &'static Model, label: &'static Label) -> Self {
        Self {
            model,
            label,
            high_dpi: false,
            compressed: model.supports(Capability::COMPRESSION),
            quality_priority: true,
            cut_behavior: if label.is_endless() { CutBehavior::CutEach } else { CutBehavior::CutAtEnd },
            pages: Vec::new(),
        }
    }

    /// Sets high-DPI (600x300) mode.
    #[must_use]
    pub fn high_dpi(mut self, high_dpi: bool) -> Self {
        self.high_dpi = high_dpi;
        self
    }

    /// Sets whether PackBits compression should be used.
    #[must_use]
    pub fn compressed(mut self, compressed: bool) -> Self {
        self.compressed = compressed;
        self
    }

    /// Sets whether the printer should prioritize quality over speed.
    #[must_use]
    pub fn quality_priority(mut self, quality_priority: bool) -> Self {
        self.quality_priority = quality_priority;
        self
    }

    /// Sets the automatic-cutter behavior.
    #[must_use]
    pub fn cut_behavior(mut self, cut_behavior: CutBehavior) -> Self {
        self.cut_behavior = cut_behavior;
        self
    }

    /// Appends a monochrome page. Each row must be exactly
    /// `model.bytes_per_row` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::WidthMismatch`] if any row has the wrong
    /// length, or [`RasterError::RowCountOutOfRange`] if the page's row
    /// count falls outside `model.min_max_length_dots`.
    pub fn add_page(&mut self, rows: Vec<Vec<u8>>) -> Result<(), RasterError> {
        self.validate_rows(&rows)?;
        self.pages.push(EncodedPage::Monochrome { rows });
        Ok(())
    }

    /// Appends a two-color (black + red) page. Both row sets must be the
    /// same length and each row exactly `model.bytes_per_row` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::WidthMismatch`]/[`RasterError::RowCountOutOfRange`]
    /// as [`RasterJob::add_page`] does, and additionally a
    /// [`RasterError::UnsupportedCommand`] if `self.model` lacks
    /// [`Capability::TWO_COLOR`].
    pub fn add_two_color_page(&mut self, black_rows: Vec<Vec<u8>>, red_rows: Vec<Vec<u8>>) -> Result<(), RasterError> {
        if !self.model.supports(Capability::TWO_COLOR) {
            return Err(RasterError::UnsupportedCommand { model: self.model.name, command: "two_color_raster" });
        }
        if black_rows.len() != red_rows.len() {
            return Err(RasterError::RowCountOutOfRange {
                min: black_rows.len() as u32,
                max: black_rows.len() as u32,
                actual: red_rows.len() as u32,
            });
        }
        self.validate_rows(&black_rows)?;
        self.validate_rows(&red_rows)?;
        self.pages.push(EncodedPage::TwoColor { black_rows, red_rows });
        Ok(())
    }

    fn validate_rows(&self, rows: &[Vec<u8>]) -> Result<(), RasterError> {
        let expected_bytes = self.model.bytes_per_row as usize;
        for row in rows {
            if row.len() != expected_bytes {
                return Err(RasterError::WidthMismatch {
                    expected: expected_bytes as u32 * 8,
                    actual: row.len() as u32 * 8,
                });
            }
        }
        let (min, max) = self.model.min_max_length_dots;
        let actual = rows.len() as u32;
        if !self.label.is_endless() && (actual < min || actual > max) {
            return Err(RasterError::RowCountOutOfRange { min, max, actual });
        }
        Ok(())
    }

    /// Encodes the prolog plus every added page into the final byte stream.
    ///
    /// Optional opcodes the caller requested but `self.model` doesn't
    /// support (compression, cutting, two-color) are dropped and reported in
    /// [`CompileOutput::warnings`] rather than aborting compilation.
    #[must_use]
    pub fn compile(&self) -> CompileOutput {
        let mut warnings = Vec::new();
        let mut builder = CommandBuilder::default();

        let mode_setting_supported = self.model.supports(Capability::MODE_SETTING);
        if !mode_setting_supported {
            warnings.push(RasterError::UnsupportedCommand { model: self.model.name, command: "switch_mode" });
        }

        if mode_setting_supported {
            builder.add(RC::SwitchDynamicCommandMode { command_mode: DynamicCommandMode::Raster });
        }
        builder.add(RC::Invalidate { num_bytes: self.model.num_invalidate_bytes });
        builder.add(RC::Initialize);
        if mode_setting_supported {
            builder.add(RC::SwitchDynamicCommandMode { command_mode: DynamicCommandMode::Raster });
        }

        let page_count = self.pages.len();
        for (page_no, page) in self.pages.iter().enumerate() {
            builder.add(RC::StatusInformationRequest);

            builder.add(RC::PrintInformation {
                model: self.model,
                label: self.label,
                quality_priority: if page.is_two_color() { false } else { self.quality_priority },
                recovery_on: true,
                no_lines: page.row_count() as u32,
                first_page: page_no == 0,
            });

            let wants_cutting = self.cut_behavior != CutBehavior::None;
            let cutting_supported = self.model.supports(Capability::CUTTING);
            if wants_cutting && !cutting_supported {
                warnings.push(RasterError::UnsupportedCommand { model: self.model.name, command: "autocut" });
            }
            let effective_cut = if cutting_supported { self.cut_behavior } else { CutBehavior::None };

            builder.add(RC::VariousMode(VariousModeSettings { auto_cut: effective_cut != CutBehavior::None }));
            match effective_cut {
                CutBehavior::CutEvery(n) => builder.add(RC::SpecifyPageNumber { cut_every: n }),
                CutBehavior::CutEach => builder.add(RC::SpecifyPageNumber { cut_every: 1 }),
                _ => {}
            }

            if self.model.supports(Capability::EXPANDED_MODE) {
                builder.add(RC::ExpandedMode {
                    two_color: page.is_two_color(),
                    cut_at_end: match effective_cut {
                        CutBehavior::CutAtEnd => true,
                        CutBehavior::CutEvery(n) if n > 0 => !(page_count as u8).is_multiple_of(n),
                        _ => false,
                    },
                    high_dpi: self.high_dpi,
                });
            } else {
                warnings.push(RasterError::UnsupportedCommand { model: self.model.name, command: "expanded_mode" });
            }

            builder.add(RC::SpecifyMarginAmount {
                margin_size: if self.label.is_endless() { self.label.feed_margin as u16 } else { 0 },
            });

            let use_compression = self.compressed && self.model.supports(Capability::COMPRESSION);
            if self.compressed && !use_compression {
                warnings.push(RasterError::UnsupportedCommand { model: self.model.name, command: "compression" });
            }
            builder.add(RC::SelectCompressionMode { tiff_compression: use_compression });

            encode_page_rows(&mut builder, page, use_compression);

            if page_no == page_count - 1 {
                builder.add(RC::PrintWithFeed);
            } else {
                builder.add(RC::Print);
            }
        }

        CompileOutput { bytes: builder.build(), warnings }
    }
}

fn encode_page_rows(builder: &mut CommandBuilder, page: &EncodedPage, use_compression: bool) {
    let maybe_compress = |row: &[u8]| -> Vec<u8> {
        if use_compression { packbits::encode_line(row).0 } else { row.to_vec() }
    };
    match page {
        EncodedPage::Monochrome { rows } => {
            for row in rows {
                builder.add(RC::RasterGraphicsTransfer { data: maybe_compress(row) });
            }
        }
        EncodedPage::TwoColor { black_rows, red_rows } => {
            for (black, red) in black_rows.iter().zip(red_rows.iter()) {
                builder.add(RC::TwoColorRasterGraphicsTransfer {
                    data: maybe_compress(black),
                    color_power: ColorPower::HighEnergy,
                });
                builder.add(RC::TwoColorRasterGraphicsTransfer {
                    data: maybe_compress(red),
                    color_power: ColorPower::LowEnergy,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{model_by_name, label_by_identifier};

    fn white_row(model: &Model) -> Vec<u8> {
        vec![0u8; model.bytes_per_row as usize]
    }

    #[test]
    fn ql600_compiles_a_white_page_with_compression() {
        let model = model_by_name("QL-600").unwrap();
        let label = label_by_identifier(model, "62").unwrap();
        let mut job = RasterJob::new(model, label).compressed(true).cut_behavior(CutBehavior::None);
        let rows = vec![white_row(model); 300];
        job.add_page(rows).unwrap();
        let output = job.compile();
        assert!(output.warnings.is_empty());
        let switch_mode = [0x1b, 0x69, 0x61, 0x01];
        assert_eq!(&output.bytes[0..4], &switch_mode);
        assert_eq!(&output.bytes[4..204], vec![0u8; 200].as_slice());
        assert_eq!(&output.bytes[204..206], &[0x1b, 0x40]);
        assert_eq!(&output.bytes[206..210], &switch_mode);
        assert_eq!(output.bytes.last(), Some(&0x1a));
    }

    #[test]
    fn ql500_unsupported_cutting_warns_but_still_completes() {
        let model = model_by_name("QL-500").unwrap();
        let label = label_by_identifier(model, "62").unwrap();
        let mut job = RasterJob::new(model, label).cut_behavior(CutBehavior::CutEach);
        job.add_page(vec![white_row(model); 300]).unwrap();
        let output = job.compile();
        assert!(!output.bytes.is_empty());
        assert!(output
            .warnings
            .iter()
            .any(|w| matches!(w, RasterError::UnsupportedCommand { command, .. } if *command == "autocut")));
    }

    #[test]
    fn ql500_unsupported_mode_setting_and_expanded_mode_warn_but_still_completes() {
        let model = model_by_name("QL-500").unwrap();
        let label = label_by_identifier(model, "62").unwrap();
        let mut job = RasterJob::new(model, label).cut_behavior(CutBehavior::None);
        job.add_page(vec![white_row(model); 300]).unwrap();
        let output = job.compile();
        assert!(!output.bytes.is_empty());
        assert!(output
            .warnings
            .iter()
            .any(|w| matches!(w, RasterError::UnsupportedCommand { command, .. } if *command == "switch_mode")));
        assert!(output
            .warnings
            .iter()
            .any(|w| matches!(w, RasterError::UnsupportedCommand { command, .. } if *command == "expanded_mode")));
    }

    #[test]
    fn wrong_row_width_is_rejected() {
        let model = model_by_name("QL-600").unwrap();
        let label = label_by_identifier(model, "62").unwrap();
        let mut job = RasterJob::new(model, label);
        let bad_row = vec![0u8; model.bytes_per_row as usize + 1];
        assert!(job.add_page(vec![bad_row]).is_err());
    }

    #[test]
    fn two_color_on_unsupported_model_errors() {
        let model = model_by_name("QL-600").unwrap();
        let label = label_by_identifier(model, "62").unwrap();
        let mut job = RasterJob::new(model, label);
        let row = white_row(model);
        assert!(job.add_two_color_page(vec![row.clone()], vec![row]).is_err());
    }
}
