//! # Image Transform Stage
//!
//! Turns a rendered RGB bitmap into the strict black/white image a label
//! driver encodes. The steps always run in this order:
//!
//! 1. **Rotate** by 90/180/270 degrees counter-clockwise, expanding the canvas
//!    (width and height swap for 90/270, nothing is cropped)
//! 2. **Binarize** with a fixed luminance threshold, no dithering
//! 3. **Pad** with `margin` white pixels on every side
//!
//! Padding comes last so the expand-to-fit rotation never sees the margin.
//!
//! No stage allocates a label larger than [`MAX_LABEL_PIXELS`]; oversized
//! requests fail with [`LabelTooLarge`] before any pixel is touched.
//!
//! ## Example
//!
//! ```
//! use image::{DynamicImage, RgbImage};
//! use labelstation::transform::{self, Rotation};
//!
//! let canvas = DynamicImage::ImageRgb8(RgbImage::new(100, 40));
//! let mono = transform::apply(canvas, Rotation::R90, 10).unwrap();
//! assert_eq!((mono.width(), mono.height()), (60, 120));
//!
//! assert!(transform::apply(DynamicImage::new_rgb8(1, 1), Rotation::R0, u32::MAX).is_err());
//! ```

use image::{DynamicImage, GrayImage, ImageFormat, Luma, imageops};
use serde::Serialize;
use std::io::Cursor;
use thiserror::Error;

/// Luminance below this value becomes black.
pub const BLACK_THRESHOLD: u8 = 128;

/// Upper bound on the pixel count of any canvas or label.
pub const MAX_LABEL_PIXELS: u64 = 40_000_000;

/// A canvas plus margin that would overflow or exceed [`MAX_LABEL_PIXELS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("label of {width}x{height} pixels with a {margin} pixel margin exceeds the label size limit")]
pub struct LabelTooLarge {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
}

/// Size of a `width` x `height` canvas with `margin` added on every side.
pub fn padded_size(width: u32, height: u32, margin: u32) -> Result<(u32, u32), LabelTooLarge> {
    let too_large = LabelTooLarge { width, height, margin };
    let pad = margin.checked_mul(2).ok_or(too_large)?;
    let padded_width = width.checked_add(pad).ok_or(too_large)?;
    let padded_height = height.checked_add(pad).ok_or(too_large)?;
    if u64::from(padded_width) * u64::from(padded_height) > MAX_LABEL_PIXELS {
        return Err(too_large);
    }
    Ok((padded_width, padded_height))
}

const BLACK: Luma<u8> = Luma([0]);
const WHITE: Luma<u8> = Luma([255]);

/// Label rotation, counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    /// Map degrees to a rotation. Anything outside {0, 90, 180, 270} is `R0`.
    pub fn from_degrees(degrees: i32) -> Self {
        match degrees {
            90 => Self::R90,
            180 => Self::R180,
            270 => Self::R270,
            _ => Self::R0,
        }
    }

    pub fn degrees(&self) -> i32 {
        match self {
            Self::R0 => 0,
            Self::R90 => 90,
            Self::R180 => 180,
            Self::R270 => 270,
        }
    }
}

/// A strictly 1-bit image: every pixel is either 0 (black) or 255 (white).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonoImage {
    pixels: GrayImage,
}

impl MonoImage {
    /// Binarize any image. Transparent areas are treated as white paper.
    pub fn binarize(image: &DynamicImage) -> Self {
        let source = image.to_luma_alpha8();
        let mut pixels = GrayImage::from_pixel(source.width(), source.height(), WHITE);

        for (x, y, px) in source.enumerate_pixels() {
            let [luma, alpha] = px.0;
            // Composite over white: l * a + 255 * (1 - a)
            let alpha = alpha as u32;
            let composited = (luma as u32 * alpha + 255 * (255 - alpha)) / 255;
            if composited < BLACK_THRESHOLD as u32 {
                pixels.put_pixel(x, y, BLACK);
            }
        }

        Self { pixels }
    }

    /// An all-white image.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            pixels: GrayImage::from_pixel(width, height, WHITE),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    #[inline]
    pub fn is_black(&self, x: u32, y: u32) -> bool {
        self.pixels.get_pixel(x, y)[0] == 0
    }

    pub fn black_pixel_count(&self) -> usize {
        self.pixels.pixels().filter(|p| p[0] == 0).count()
    }

    /// Return a copy with `margin` white pixels added on every side.
    pub fn with_margin(&self, margin: u32) -> Result<Self, LabelTooLarge> {
        let (width, height) = padded_size(self.width(), self.height(), margin)?;
        if margin == 0 {
            return Ok(self.clone());
        }
        let mut padded = Self::blank(width, height);
        imageops::replace(&mut padded.pixels, &self.pixels, margin as i64, margin as i64);
        Ok(padded)
    }

    /// Row-major packed bits, MSB first, 1 = black, rows padded to a byte.
    pub fn packed_rows(&self) -> Vec<u8> {
        let width = self.width() as usize;
        let width_bytes = width.div_ceil(8);
        let mut data = vec![0u8; width_bytes * self.height() as usize];

        for (x, y, px) in self.pixels.enumerate_pixels() {
            if px[0] == 0 {
                let byte_idx = y as usize * width_bytes + x as usize / 8;
                data[byte_idx] |= 0x80 >> (x % 8);
            }
        }

        data
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.pixels
    }

    pub fn into_gray(self) -> GrayImage {
        self.pixels
    }

    /// Encode as PNG (for previews).
    pub fn to_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut out = Cursor::new(Vec::new());
        self.pixels.write_to(&mut out, ImageFormat::Png)?;
        Ok(out.into_inner())
    }
}

/// Rotate with canvas expansion (never crops).
pub fn rotate(image: DynamicImage, rotation: Rotation) -> DynamicImage {
    match rotation {
        Rotation::R0 => image,
        // image's rotate90 is clockwise; label rotation is counter-clockwise
        Rotation::R90 => image.rotate270(),
        Rotation::R180 => image.rotate180(),
        Rotation::R270 => image.rotate90(),
    }
}

/// Run the full stage: rotate → binarize → pad.
///
/// The final size is checked first, so an oversized label costs nothing.
pub fn apply(image: DynamicImage, rotation: Rotation, margin: u32) -> Result<MonoImage, LabelTooLarge> {
    let (width, height) = match rotation {
        Rotation::R90 | Rotation::R270 => (image.height(), image.width()),
        Rotation::R0 | Rotation::R180 => (image.width(), image.height()),
    };
    padded_size(width, height, margin)?;
    let rotated = rotate(image, rotation);
    MonoImage::binarize(&rotated).with_margin(margin)
}
