//! Quantization: reduce an RGB canvas to palette indices, and pack indices
//! into the bit-per-pixel rows the encoder consumes.

use image::{Rgb, RgbImage};

/// An RGB color in `[0.0, 1.0]` per channel, as used by [`super::RenderOptions::palette`].
pub type Color = [f32; 3];

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) }
}

fn linear_distance_sq(a: Color, b: Color) -> f32 {
    (0..3)
        .map(|i| {
            let d = srgb_to_linear(a[i]) - srgb_to_linear(b[i]);
            d * d
        })
        .sum()
}

/// Index of the palette entry nearest `color` in linear sRGB, by squared
/// Euclidean distance.
#[must_use]
pub fn nearest_palette_index(color: Color, palette: &[Color]) -> u8 {
    palette
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| linear_distance_sq(color, *a).total_cmp(&linear_distance_sq(color, *b)))
        .map_or(0, |(i, _)| i as u8)
}

fn pixel_to_color(p: Rgb<u8>) -> Color {
    [f32::from(p.0[0]) / 255.0, f32::from(p.0[1]) / 255.0, f32::from(p.0[2]) / 255.0]
}

/// Per-pixel nearest-palette-entry quantization (no error diffusion).
#[must_use]
pub fn threshold(image: &RgbImage, palette: &[Color]) -> Vec<Vec<u8>> {
    (0..image.height())
        .map(|y| (0..image.width()).map(|x| nearest_palette_index(pixel_to_color(*image.get_pixel(x, y)), palette)).collect())
        .collect()
}

/// Floyd-Steinberg error-diffusion dithering toward `palette`, the default
/// quantization mode. Returns a row-major grid of palette indices, one per
/// pixel.
#[must_use]
pub fn floyd_steinberg(image: &RgbImage, palette: &[Color]) -> Vec<Vec<u8>> {
    let (w, h) = (image.width() as usize, image.height() as usize);
    let mut errors = vec![[0f32; 3]; w * h];
    let mut out = vec![vec![0u8; w]; h];

    for y in 0..h {
        for x in 0..w {
            let base = pixel_to_color(*image.get_pixel(x as u32, y as u32));
            let e = errors[y * w + x];
            let wanted = [base[0] + e[0], base[1] + e[1], base[2] + e[2]];
            let idx = nearest_palette_index(wanted, palette);
            out[y][x] = idx;
            let chosen = palette[idx as usize];
            let residual = [wanted[0] - chosen[0], wanted[1] - chosen[1], wanted[2] - chosen[2]];

            let mut diffuse = |dx: i64, dy: i64, weight: f32| {
                let (nx, ny) = (x as i64 + dx, y as i64 + dy);
                if nx < 0 || ny < 0 || nx as usize >= w || ny as usize >= h {
                    return;
                }
                let slot = &mut errors[ny as usize * w + nx as usize];
                for c in 0..3 {
                    slot[c] += residual[c] * weight;
                }
            };
            diffuse(1, 0, 7.0 / 16.0);
            diffuse(-1, 1, 3.0 / 16.0);
            diffuse(0, 1, 5.0 / 16.0);
            diffuse(1, 1, 1.0 / 16.0);
        }
    }
    out
}

/// Converts RGB to HSV, returning `(hue_degrees, saturation, value)`.
fn rgb_to_hsv(c: Color) -> (f32, f32, f32) {
    let (r, g, b) = (c[0], c[1], c[2]);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let hue = if delta <= f32::EPSILON {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let saturation = if max <= f32::EPSILON { 0.0 } else { delta / max };
    (hue, saturation, max)
}

/// Hue window (degrees from red, either direction) considered "red" for
/// two-color separation.
const RED_HUE_WINDOW: f32 = 30.0;
/// Minimum saturation for a pixel to be classified as red ink.
const RED_SATURATION_THRESHOLD: f32 = 0.35;

/// Separates the red ink plane from an RGB canvas for two-color output:
/// pixels whose hue lies near red with saturation above a threshold become
/// the red plane; everything else quantizes on a two-entry (white, black)
/// palette.
///
/// Returns `(black_indices, red_indices)`, both row-major grids of `0`/`1`.
#[must_use]
pub fn separate_red_channel(image: &RgbImage, dither: bool) -> (Vec<Vec<u8>>, Vec<Vec<u8>>) {
    const WHITE: Color = [1.0, 1.0, 1.0];
    const BLACK: Color = [0.0, 0.0, 0.0];
    let bw_palette = [WHITE, BLACK];

    let (w, h) = (image.width() as usize, image.height() as usize);
    let mut red_mask = vec![vec![0u8; w]; h];
    let mut remainder = RgbImage::new(image.width(), image.height());

    for y in 0..h {
        for x in 0..w {
            let pixel = *image.get_pixel(x as u32, y as u32);
            let color = pixel_to_color(pixel);
            let (hue, saturation, _value) = rgb_to_hsv(color);
            let hue_distance_from_red = hue.min(360.0 - hue);
            if hue_distance_from_red <= RED_HUE_WINDOW && saturation >= RED_SATURATION_THRESHOLD {
                red_mask[y][x] = 1;
                remainder.put_pixel(x as u32, y as u32, Rgb([255, 255, 255]));
            } else {
                remainder.put_pixel(x as u32, y as u32, pixel);
            }
        }
    }

    let black_indices = if dither { floyd_steinberg(&remainder, &bw_palette) } else { threshold(&remainder, &bw_palette) };
    (black_indices, red_mask)
}

/// Packs a row of palette indices into `bytes_per_row` bytes, one bit per
/// pixel (MSB first), setting the bit where `indices[x] == ink_index`.
#[must_use]
pub fn pack_row(indices: &[u8], ink_index: u8, bytes_per_row: usize) -> Vec<u8> {
    let mut row = vec![0u8; bytes_per_row];
    for (x, &idx) in indices.iter().enumerate() {
        if idx != ink_index {
            continue;
        }
        let byte = x / 8;
        if byte >= bytes_per_row {
            continue;
        }
        row[byte] |= 0x80 >> (x % 8);
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_palette_picks_closer_of_black_and_white() {
        let palette = [[1.0, 1.0, 1.0], [0.0, 0.0, 0.0]];
        assert_eq!(nearest_palette_index([0.9, 0.9, 0.9], &palette), 0);
        assert_eq!(nearest_palette_index([0.1, 0.1, 0.1], &palette), 1);
    }

    #[test]
    fn threshold_produces_correct_grid_shape() {
        let image = RgbImage::new(4, 3);
        let palette = [[1.0, 1.0, 1.0], [0.0, 0.0, 0.0]];
        let out = threshold(&image, &palette);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].len(), 4);
        assert_eq!(out[0][0], 0, "blank white image quantizes to the white palette entry");
    }

    #[test]
    fn pure_red_pixel_is_classified_as_red_ink() {
        let mut image = RgbImage::new(1, 1);
        image.put_pixel(0, 0, Rgb([220, 20, 20]));
        let (black, red) = separate_red_channel(&image, false);
        assert_eq!(red[0][0], 1);
        assert_eq!(black[0][0], 0, "red pixel should not also paint the black plane");
    }

    #[test]
    fn pack_row_sets_msb_first() {
        let indices = vec![1, 0, 0, 0, 0, 0, 0, 0, 1];
        let row = pack_row(&indices, 1, 2);
        assert_eq!(row, vec![0b1000_0000, 0b1000_0000]);
    }

    #[test]
    fn floyd_steinberg_output_has_expected_shape() {
        let image = RgbImage::from_pixel(5, 2, Rgb([128, 128, 128]));
        let palette = [[1.0, 1.0, 1.0], [0.0, 0.0, 0.0]];
        let out = floyd_steinberg(&image, &palette);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].len(), 5);
    }
}
