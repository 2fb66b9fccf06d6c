//! The render pipeline: scale, rotate, compose and quantize a source page
//! into the exact bitmap the raster encoder consumes.
//!
//! [`RenderSource`] uses tagged dispatch over a small set of concrete source
//! kinds rather than an inheritance hierarchy, the same way
//! [`crate::catalog`] treats `Family`/`Capability` as plain data instead of
//! a type hierarchy.

mod bitmap;
pub mod quantize;
#[cfg(feature = "text")]
mod text;
mod vector;

pub use bitmap::BitmapSource;
pub use quantize::Color;
#[cfg(feature = "text")]
pub use text::{FontMatcher, TextSource};
pub use vector::{GhostscriptInterpreter, VectorInterpreter, VectorSource};

use image::RgbImage;

use crate::error::RenderError;

/// Explicit page rotation, in degrees clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotate {
    /// No rotation.
    #[default]
    Deg0,
    /// 90 degrees clockwise.
    Deg90,
    /// 180 degrees.
    Deg180,
    /// 270 degrees clockwise.
    Deg270,
}

/// Per-job render configuration.
///
/// Call [`RenderOptions::validate`] before passing an instance to
/// [`render_page`]; invalid instances are a programmer error, not a runtime
/// condition a caller should need to retry.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Explicit rotation, applied when `auto_rotate` is `false`.
    pub rotate: Rotate,
    /// Whether to auto-rotate 90 degrees when it reduces wasted area.
    pub auto_rotate: bool,
    /// Whether a raster source may be scaled (as opposed to printed 1:1).
    pub allow_scale_raster: bool,
    /// Whether physical page dimensions (vector/text) may be scaled to fit.
    pub allow_scale_physical_dims: bool,
    /// The printable area, in device pixels. Height `0` means endless (unbounded).
    pub printable_pixels: (u32, u32),
    /// The full device canvas, in device pixels. Height `0` means endless.
    pub device_pixels: (u32, u32),
    /// Offset of the printable area's origin within the device canvas.
    pub device_pixels_offset: (i32, i32),
    /// Additional blank rows appended after the content, for endless media.
    pub padding_bottom: u32,
    /// Rendering resolution in dots per inch.
    pub dpi: f32,
    /// Whether to use Floyd-Steinberg dithering (`true`) or nearest-palette
    /// thresholding (`false`).
    pub dither: bool,
    /// Ordered palette (2 or 3 RGB triples in `[0, 1]`); index 0 is the
    /// device canvas background color (white in the default palette).
    pub palette: Vec<Color>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            rotate: Rotate::Deg0,
            auto_rotate: false,
            allow_scale_raster: true,
            allow_scale_physical_dims: true,
            printable_pixels: (0, 0),
            device_pixels: (0, 0),
            device_pixels_offset: (0, 0),
            padding_bottom: 0,
            dpi: 300.0,
            dither: true,
            palette: vec![[1.0, 1.0, 1.0], [0.0, 0.0, 0.0]],
        }
    }
}

impl RenderOptions {
    /// Checks that the options are internally consistent. Must be called
    /// before a page is rendered.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidOptions`] describing the first
    /// violated invariant.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.printable_pixels.0 > self.device_pixels.0 || self.printable_pixels.1 > self.device_pixels.1 {
            return Err(RenderError::InvalidOptions(format!(
                "printable_pixels {:?} exceeds device_pixels {:?}",
                self.printable_pixels, self.device_pixels
            )));
        }
        let is_endless = self.printable_pixels.1 == 0;
        if is_endless && self.device_pixels.1 != 0 {
            return Err(RenderError::InvalidOptions(
                "endless labels (printable_pixels.1 == 0) require device_pixels.1 == 0 too".to_owned(),
            ));
        }
        if !(2..=3).contains(&self.palette.len()) {
            return Err(RenderError::InvalidOptions(format!(
                "palette must have 2 or 3 colors, got {}",
                self.palette.len()
            )));
        }
        for color in &self.palette {
            if color.iter().any(|c| !(0.0..=1.0).contains(c)) {
                return Err(RenderError::InvalidOptions(format!("palette color {color:?} out of range [0, 1]")));
            }
        }
        Ok(())
    }

    fn is_endless(&self) -> bool {
        self.printable_pixels.1 == 0
    }
}

/// Capability set a render source exposes: open, report its page count and
/// each page's native size, then render any page to a target pixel size.
pub trait RenderSource {
    /// Opens/initializes the source (e.g. spawning a subprocess, decoding headers).
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if the source cannot be opened.
    fn open(&mut self) -> Result<(), RenderError>;

    /// Number of pages this source contains.
    fn page_count(&self) -> usize;

    /// Native size of page `index`, in pixels at this source's natural resolution.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::PageOutOfRange`] if `index >= page_count()`.
    fn page_size(&self, index: usize) -> Result<(f32, f32), RenderError>;

    /// Rasterizes page `index` to an RGB canvas of exactly `target_size`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if rasterization fails.
    fn render(&mut self, index: usize, target_size: (u32, u32)) -> Result<RgbImage, RenderError>;
}

/// A fully-composed device-row grid for one printed page: `rows[y][x]` is a
/// palette index (or, for two-color output, a black/red/white tri-state
/// encoded by the caller choosing the right plane).
#[derive(Debug, Clone)]
pub struct ComposedPage {
    /// Palette indices for the black (or monochrome) plane, one row per device row.
    pub black: Vec<Vec<u8>>,
    /// Palette indices for the red plane, present only for three-color palettes.
    pub red: Option<Vec<Vec<u8>>>,
    /// Width of every row, in pixels (equals `options.device_pixels.0`).
    pub width: u32,
    /// Height of the composed canvas, in pixels.
    pub height: u32,
}

fn fit_within(native: (f32, f32), bounds: (u32, u32), bound_height: bool) -> (u32, u32) {
    let aspect = native.0 / native.1;
    let bw = bounds.0 as f32;
    if !bound_height {
        return (bounds.0, (bw / aspect).round().max(1.0) as u32);
    }
    let bh = bounds.1 as f32;
    if bw / aspect <= bh {
        (bounds.0, (bw / aspect).round().max(1.0) as u32)
    } else {
        ((bh * aspect).round().max(1.0) as u32, bounds.1)
    }
}

fn wasted_area(fitted: (u32, u32), bounds: (u32, u32)) -> u64 {
    u64::from(bounds.0) * u64::from(bounds.1) - u64::from(fitted.0) * u64::from(fitted.1)
}

/// Runs one page of `source` through the full geometry and quantization
/// pipeline, producing a device-canvas-sized page ready for
/// [`crate::job::RasterJob::add_page`] / `add_two_color_page`.
///
/// # Errors
///
/// Returns [`RenderError`] if `options` is invalid, `index` is out of
/// range, or the source fails to rasterize the page.
pub fn render_page(
    source: &mut dyn RenderSource,
    index: usize,
    options: &RenderOptions,
) -> Result<ComposedPage, RenderError> {
    options.validate()?;
    if index >= source.page_count() {
        return Err(RenderError::PageOutOfRange { index, page_count: source.page_count() });
    }

    let native = source.page_size(index)?;
    let is_endless = options.is_endless();

    let bounds = options.printable_pixels;
    let rotated_native = (native.1, native.0);

    let unrotated_fit = fit_within(native, bounds, !is_endless);
    let rotated_fit = fit_within(rotated_native, bounds, !is_endless);

    let requested_turns: u32 = if options.auto_rotate {
        let unrotated_waste = wasted_area(unrotated_fit, bounds);
        let rotated_waste = if is_endless { u64::MAX } else { wasted_area(rotated_fit, bounds) };
        u32::from(rotated_waste < unrotated_waste)
    } else {
        match options.rotate {
            Rotate::Deg0 => 0,
            Rotate::Deg90 => 1,
            Rotate::Deg180 => 2,
            Rotate::Deg270 => 3,
        }
    };
    // Endless labels have unbounded height; a 90/270 turn would need to swap
    // the bounded and unbounded axes, which `fit_within` can't express, so
    // those turns are dropped. A 180 turn doesn't change which axis is
    // bounded, so it still applies.
    let applied_turns = if is_endless && requested_turns % 2 == 1 { 0 } else { requested_turns };

    let swap_dims = applied_turns % 2 == 1;
    let (final_w, final_h) = if swap_dims { rotated_fit } else { unrotated_fit };
    // The source is rendered in its own native orientation; rotation is a
    // post-process, so the render target is the final size pre-swap.
    let render_target = if swap_dims { (final_h, final_w) } else { (final_w, final_h) };

    let rendered = source.render(index, render_target)?;
    let rendered = match applied_turns {
        1 => image::imageops::rotate90(&rendered),
        2 => image::imageops::rotate180(&rendered),
        3 => image::imageops::rotate270(&rendered),
        _ => rendered,
    };

    let canvas_height = if is_endless { final_h + options.padding_bottom } else { options.device_pixels.1 };
    let background = options.palette[0];
    let mut canvas = RgbImage::from_pixel(
        options.device_pixels.0,
        canvas_height,
        image::Rgb([
            (background[0] * 255.0).round() as u8,
            (background[1] * 255.0).round() as u8,
            (background[2] * 255.0).round() as u8,
        ]),
    );

    let (off_x, off_y) = options.device_pixels_offset;
    image::imageops::overlay(&mut canvas, &rendered, i64::from(off_x), i64::from(off_y));

    let page = if options.palette.len() == 3 {
        let (black_idx, red_idx) = quantize::separate_red_channel(&canvas, options.dither);
        ComposedPage { black: black_idx, red: Some(red_idx), width: canvas.width(), height: canvas.height() }
    } else if options.dither {
        ComposedPage {
            black: quantize::floyd_steinberg(&canvas, &options.palette),
            red: None,
            width: canvas.width(),
            height: canvas.height(),
        }
    } else {
        ComposedPage {
            black: quantize::threshold(&canvas, &options.palette),
            red: None,
            width: canvas.width(),
            height: canvas.height(),
        }
    };

    Ok(page)
}

/// Packs a [`ComposedPage`] into encoder-ready rows (one `Vec<u8>` per row,
/// bit-per-pixel, `ink_index` set bits) for the black plane, and
/// optionally the red plane.
#[must_use]
pub fn pack_page(page: &ComposedPage, bytes_per_row: usize, ink_index: u8) -> Vec<Vec<u8>> {
    page.black.iter().map(|row| quantize::pack_row(row, ink_index, bytes_per_row)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SolidSource {
        size: (f32, f32),
        color: image::Rgb<u8>,
    }

    impl RenderSource for SolidSource {
        fn open(&mut self) -> Result<(), RenderError> {
            Ok(())
        }
        fn page_count(&self) -> usize {
            1
        }
        fn page_size(&self, index: usize) -> Result<(f32, f32), RenderError> {
            if index >= 1 {
                return Err(RenderError::PageOutOfRange { index, page_count: 1 });
            }
            Ok(self.size)
        }
        fn render(&mut self, _index: usize, target_size: (u32, u32)) -> Result<RgbImage, RenderError> {
            Ok(RgbImage::from_pixel(target_size.0, target_size.1, self.color))
        }
    }

    fn base_options() -> RenderOptions {
        RenderOptions {
            printable_pixels: (80, 100),
            device_pixels: (90, 100),
            device_pixels_offset: (0, 0),
            ..RenderOptions::default()
        }
    }

    #[test]
    fn validate_rejects_printable_larger_than_device() {
        let mut options = base_options();
        options.printable_pixels = (200, 100);
        assert!(options.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_palette_len() {
        let mut options = base_options();
        options.palette = vec![[0.0, 0.0, 0.0]];
        assert!(options.validate().is_err());
    }

    #[test]
    fn renders_a_die_cut_page_to_device_canvas_size() {
        let mut source = SolidSource { size: (80.0, 100.0), color: image::Rgb([0, 0, 0]) };
        let options = base_options();
        let page = render_page(&mut source, 0, &options).unwrap();
        assert_eq!(page.width, 90);
        assert_eq!(page.height, 100);
    }

    #[test]
    fn endless_label_height_follows_content_plus_padding() {
        let mut source = SolidSource { size: (80.0, 40.0), color: image::Rgb([0, 0, 0]) };
        let mut options = base_options();
        options.printable_pixels = (80, 0);
        options.device_pixels = (90, 0);
        options.padding_bottom = 5;
        let page = render_page(&mut source, 0, &options).unwrap();
        assert_eq!(page.height, 40 + 5);
    }

    #[test]
    fn out_of_range_page_index_is_an_error() {
        let mut source = SolidSource { size: (80.0, 100.0), color: image::Rgb([0, 0, 0]) };
        let options = base_options();
        assert!(render_page(&mut source, 5, &options).is_err());
    }

    /// A source whose rendered page is white except for a single black pixel
    /// at its own top-left corner, so a rotation can be told apart from its
    /// neighbors by where that corner ends up.
    struct MarkerSource {
        native: (f32, f32),
    }

    impl RenderSource for MarkerSource {
        fn open(&mut self) -> Result<(), RenderError> {
            Ok(())
        }
        fn page_count(&self) -> usize {
            1
        }
        fn page_size(&self, index: usize) -> Result<(f32, f32), RenderError> {
            if index >= 1 {
                return Err(RenderError::PageOutOfRange { index, page_count: 1 });
            }
            Ok(self.native)
        }
        fn render(&mut self, _index: usize, target_size: (u32, u32)) -> Result<RgbImage, RenderError> {
            let mut image = RgbImage::from_pixel(target_size.0, target_size.1, image::Rgb([255, 255, 255]));
            image.put_pixel(0, 0, image::Rgb([0, 0, 0]));
            Ok(image)
        }
    }

    fn rotated_options(rotate: Rotate) -> RenderOptions {
        RenderOptions {
            printable_pixels: (4, 2),
            device_pixels: (4, 2),
            device_pixels_offset: (0, 0),
            dither: false,
            rotate,
            ..RenderOptions::default()
        }
    }

    #[test]
    fn explicit_180_rotation_flips_content_without_swapping_dims() {
        let mut source = MarkerSource { native: (2.0, 2.0) };
        let options = RenderOptions {
            printable_pixels: (2, 2),
            device_pixels: (2, 2),
            device_pixels_offset: (0, 0),
            dither: false,
            rotate: Rotate::Deg180,
            ..RenderOptions::default()
        };
        let page = render_page(&mut source, 0, &options).unwrap();
        assert_eq!((page.width, page.height), (2, 2));
        assert_eq!(page.black[1][1], 1, "marker should land in the opposite corner after a 180 turn");
        assert_eq!(page.black[0][0], 0);
    }

    #[test]
    fn explicit_90_rotation_swaps_dims_and_rotates_clockwise() {
        let mut source = MarkerSource { native: (2.0, 4.0) };
        let options = rotated_options(Rotate::Deg90);
        let page = render_page(&mut source, 0, &options).unwrap();
        assert_eq!((page.width, page.height), (4, 2));
        assert_eq!(page.black[0][3], 1, "marker should land top-right after a clockwise 90 turn");
        assert_eq!(page.black[0][0], 0);
    }

    #[test]
    fn explicit_270_rotation_swaps_dims_and_rotates_counterclockwise() {
        let mut source = MarkerSource { native: (2.0, 4.0) };
        let options = rotated_options(Rotate::Deg270);
        let page = render_page(&mut source, 0, &options).unwrap();
        assert_eq!((page.width, page.height), (4, 2));
        assert_eq!(page.black[1][0], 1, "marker should land bottom-left after a counter-clockwise 90 turn");
        assert_eq!(page.black[0][0], 0);
        assert_eq!(page.black[0][3], 0, "a 270 turn must not land where a 90 turn would");
    }
}
