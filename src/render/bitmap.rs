//! A single raster image as a [`RenderSource`].

use image::{imageops::FilterType, DynamicImage, RgbImage};

use super::RenderSource;
use crate::error::RenderError;

/// A single already-decoded raster image, treated as a one-page source.
///
/// Native size is the image's own pixel dimensions; DPI is not read from
/// image metadata (the `image` crate does not expose it uniformly across
/// formats), so callers that need DPI-aware scaling set
/// [`RenderOptions::dpi`](super::RenderOptions::dpi) explicitly.
pub struct BitmapSource {
    image: DynamicImage,
}

impl BitmapSource {
    /// Wraps an already-decoded image.
    #[must_use]
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Decodes an image from bytes (any format the `image` crate supports).
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Image`] if decoding fails.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RenderError> {
        Ok(Self { image: image::load_from_memory(bytes)? })
    }
}

impl RenderSource for BitmapSource {
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
        Ok((self.image.width() as f32, self.image.height() as f32))
    }

    fn render(&mut self, index: usize, target_size: (u32, u32)) -> Result<RgbImage, RenderError> {
        if index != 0 {
            return Err(RenderError::PageOutOfRange { index, page_count: 1 });
        }
        Ok(self.image.resize_exact(target_size.0, target_size.1, FilterType::Lanczos3).to_rgb8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_native_pixel_size() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(200, 100));
        let source = BitmapSource::new(image);
        assert_eq!(source.page_size(0).unwrap(), (200.0, 100.0));
    }

    #[test]
    fn renders_to_requested_target_size() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(200, 100));
        let mut source = BitmapSource::new(image);
        let out = source.render(0, (50, 25)).unwrap();
        assert_eq!((out.width(), out.height()), (50, 25));
    }

    #[test]
    fn second_page_is_out_of_range() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(10, 10));
        let source = BitmapSource::new(image);
        assert!(matches!(source.page_size(1), Err(RenderError::PageOutOfRange { .. })));
    }
}
