//! A single text string as a [`RenderSource`].
//!
//! The font *file* is resolved by an external font-matcher subprocess
//! (modeled on `fc-match`), but glyph layout itself is done locally with
//! `rusttype`.

use std::path::{Path, PathBuf};

use image::RgbImage;
use rusttype::{point, Font, Scale};

use super::RenderSource;
use crate::error::{ExternalToolError, RenderError};

/// A subprocess collaborator that resolves a font family/style request to a
/// concrete font file on disk.
pub trait FontMatcher {
    /// Resolves `family` (with the given style) to a font file path.
    ///
    /// # Errors
    ///
    /// Returns [`ExternalToolError`] if the subprocess fails or no font matches.
    fn resolve(&self, family: &str, bold: bool, italic: bool) -> Result<PathBuf, ExternalToolError>;
}

/// Invokes `fc-match` to resolve a font family to a file path.
pub struct FontconfigMatcher;

impl FontMatcher for FontconfigMatcher {
    fn resolve(&self, family: &str, bold: bool, italic: bool) -> Result<PathBuf, ExternalToolError> {
        let mut pattern = family.to_owned();
        if bold {
            pattern.push_str(":bold");
        }
        if italic {
            pattern.push_str(":italic");
        }
        let output = std::process::Command::new("fc-match")
            .args(["--format=%{file}", pattern.as_str()])
            .output()
            .map_err(|source| ExternalToolError::Spawn { name: "fc-match", source })?;
        if !output.status.success() {
            return Err(ExternalToolError::NonZeroExit {
                name: "fc-match",
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        let path = String::from_utf8_lossy(&output.stdout).trim().to_owned();
        if path.is_empty() {
            return Err(ExternalToolError::Parse { name: "fc-match", reason: format!("no font matched {family:?}") });
        }
        Ok(PathBuf::from(path))
    }
}

/// A single string of text, laid out and rendered at the target DPI.
pub struct TextSource {
    text: String,
    font: Font<'static>,
    margin_px: u32,
}

impl TextSource {
    /// Resolves `family` via `matcher`, loads the font file, and prepares to
    /// render `text` with `margin_px` pixels of blank border on every side.
    ///
    /// # Errors
    ///
    /// Returns [`ExternalToolError`] if the font can't be resolved or
    /// loaded, or [`RenderError`] if the file isn't a valid font.
    pub fn new(
        text: impl Into<String>,
        family: &str,
        bold: bool,
        italic: bool,
        margin_px: u32,
        matcher: &dyn FontMatcher,
    ) -> Result<Self, RenderError> {
        let path = matcher.resolve(family, bold, italic)?;
        Self::from_font_file(text, &path, margin_px)
    }

    /// Loads a font directly from a file path, bypassing font matching.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ExternalTool`] if the file can't be read or parsed as a font.
    pub fn from_font_file(text: impl Into<String>, path: &Path, margin_px: u32) -> Result<Self, RenderError> {
        let bytes = std::fs::read(path).map_err(|e| {
            RenderError::ExternalTool(ExternalToolError::Parse { name: "font-file", reason: e.to_string() })
        })?;
        let font = Font::try_from_vec(bytes).ok_or_else(|| {
            RenderError::ExternalTool(ExternalToolError::Parse {
                name: "font-file",
                reason: format!("{} is not a valid TrueType/OpenType font", path.display()),
            })
        })?;
        Ok(Self { text: text.into(), font, margin_px })
    }

    fn layout(&self, scale: Scale) -> (i32, i32) {
        let v_metrics = self.font.v_metrics(scale);
        let glyphs: Vec<_> =
            self.font.layout(&self.text, scale, point(0.0, v_metrics.ascent)).collect();
        let width = glyphs
            .last()
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0)
            .ceil() as i32;
        let height = (v_metrics.ascent - v_metrics.descent).ceil() as i32;
        (width.max(1), height.max(1))
    }
}

impl RenderSource for TextSource {
    fn open(&mut self) -> Result<(), RenderError> {
        Ok(())
    }

    fn page_count(&self) -> usize {
        1
    }

    fn page_size(&self, index: usize) -> Result<(f32, f32), RenderError> {
        if index != 0 {
            return Err(RenderError::PageOutOfRange { index, page_count: 1 });
        }
        let (w, h) = self.layout(Scale::uniform(96.0));
        Ok(((w + 2 * self.margin_px as i32) as f32, (h + 2 * self.margin_px as i32) as f32))
    }

    fn render(&mut self, index: usize, target_size: (u32, u32)) -> Result<RgbImage, RenderError> {
        if index != 0 {
            return Err(RenderError::PageOutOfRange { index, page_count: 1 });
        }
        let mut canvas = RgbImage::from_pixel(target_size.0, target_size.1, image::Rgb([255, 255, 255]));
        let usable_h = target_size.1.saturating_sub(2 * self.margin_px).max(1);
        let scale = Scale::uniform(usable_h as f32);
        let v_metrics = self.font.v_metrics(scale);
        let glyphs: Vec<_> =
            self.font.layout(&self.text, scale, point(0.0, v_metrics.ascent)).collect();
        let text_width = glyphs
            .last()
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0);
        let offset_x = ((target_size.0 as f32 - text_width) / 2.0).max(0.0) as i32 + self.margin_px as i32;

        for glyph in &glyphs {
            let Some(bb) = glyph.pixel_bounding_box() else { continue };
            glyph.draw(|gx, gy, v| {
                let px = bb.min.x + gx as i32 + offset_x;
                let py = bb.min.y + gy as i32 + self.margin_px as i32;
                if px < 0 || py < 0 || px as u32 >= canvas.width() || py as u32 >= canvas.height() {
                    return;
                }
                let shade = (255.0 - v * 255.0).round().clamp(0.0, 255.0) as u8;
                canvas.put_pixel(px as u32, py as u32, image::Rgb([shade, shade, shade]));
            });
        }
        Ok(canvas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysFails;
    impl FontMatcher for AlwaysFails {
        fn resolve(&self, _family: &str, _bold: bool, _italic: bool) -> Result<PathBuf, ExternalToolError> {
            Err(ExternalToolError::NotFound { name: "fc-match" })
        }
    }

    #[test]
    fn unresolvable_font_family_is_an_error() {
        let err = TextSource::new("hello", "Nonexistent Family", false, false, 4, &AlwaysFails);
        assert!(err.is_err());
    }
}
