//! Encoded image → bitmap.
//!
//! Payloads arrive base64 encoded; the format is sniffed from the bytes, so
//! PNG, JPEG, GIF, BMP, WebP etc. all work. Decoded images larger than
//! [`MAX_LABEL_PIXELS`](crate::transform::MAX_LABEL_PIXELS) are refused.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, Rgb, RgbImage};

use super::RenderError;
use crate::transform::padded_size;

/// Decode a base64 payload. Accepts `data:` URLs and embedded whitespace.
pub fn decode_base64(payload: &str) -> Result<Vec<u8>, RenderError> {
    let data = match payload.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => payload,
    };
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(STANDARD.decode(compact)?)
}

/// Decode image bytes of any supported format.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, RenderError> {
    let image = image::load_from_memory(bytes)?;
    padded_size(image.width(), image.height(), 0)?;
    Ok(image)
}

/// Render a base64 payload to a canonical RGB bitmap.
pub fn render_image(payload: &str) -> Result<RgbImage, RenderError> {
    let bytes = decode_base64(payload)?;
    let image = decode_image(&bytes)?;
    Ok(flatten_on_white(&image))
}

/// Drop alpha by compositing over white paper.
pub fn flatten_on_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }
    let rgba = image.to_rgba8();
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, px) in rgba.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        let a = a as u32;
        let blend = |c: u8| ((c as u32 * a + 255 * (255 - a)) / 255) as u8;
        rgb.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    rgb
}
