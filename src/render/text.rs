//! Text → bitmap rendering.
//!
//! The font is resolved once per process: the first entry of
//! [`SYSTEM_FONT_PATHS`] that exists and parses wins, otherwise the built-in
//! Spleen 12x24 bitmap font is scaled to the requested size. Resolution never
//! fails.
//!
//! Text is drawn black on white, anchored top-left at `(margin, margin)`, on a
//! canvas sized to the text plus `2 × margin`. Newlines start a new line.
//! Canvases over the label size limit fail with [`RenderError::TooLarge`].

use ab_glyph::{Font, FontVec, PxScale, ScaleFont, point};
use image::{Rgb, RgbImage};
use spleen_font::{FONT_12X24, PSF2Font};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

use super::RenderError;
use crate::transform::{LabelTooLarge, padded_size};

/// Well-known font locations, probed in order.
pub const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
];

/// Extra pixels between lines of multi-line text.
const LINE_SPACING: u32 = 4;

/// Native cell size of the built-in font.
const BUILTIN_CELL_WIDTH: u32 = 12;
const BUILTIN_CELL_HEIGHT: u32 = 24;

static TEXT_FONT: OnceLock<TextFont> = OnceLock::new();

/// The font used for text labels.
pub enum TextFont {
    /// A TrueType/OpenType font loaded from disk
    System { path: PathBuf, font: FontVec },
    /// Spleen 12x24, compiled in
    BuiltIn,
}

impl TextFont {
    /// Human-readable description for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TextFont::System { path, .. } => path.display().to_string(),
            TextFont::BuiltIn => "built-in Spleen 12x24".to_string(),
        }
    }
}

/// The process-wide text font, resolved on first use.
pub fn text_font() -> &'static TextFont {
    TEXT_FONT.get_or_init(|| {
        let candidates: Vec<&Path> = SYSTEM_FONT_PATHS.iter().map(Path::new).collect();
        let font = resolve_font(&candidates);
        info!(font = %font.describe(), "text font resolved");
        font
    })
}

/// Pick the first candidate that exists and parses; fall back to built-in.
pub fn resolve_font(candidates: &[&Path]) -> TextFont {
    for path in candidates {
        if !path.exists() {
            continue;
        }
        let loaded = std::fs::read(path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| FontVec::try_from_vec(bytes).map_err(|e| e.to_string()));
        match loaded {
            Ok(font) => {
                return TextFont::System {
                    path: path.to_path_buf(),
                    font,
                };
            }
            Err(e) => debug!(path = %path.display(), error = %e, "skipping unusable font"),
        }
    }
    TextFont::BuiltIn
}

/// Render text with the process-wide font.
pub fn render_text(text: &str, font_size: u32, margin: u32) -> Result<RgbImage, RenderError> {
    render_text_with(text_font(), text, font_size, margin)
}

/// Render text with an explicit font.
pub fn render_text_with(
    font: &TextFont,
    text: &str,
    font_size: u32,
    margin: u32,
) -> Result<RgbImage, RenderError> {
    if font_size == 0 {
        return Err(RenderError::Text("font size must be positive".to_string()));
    }
    let lines: Vec<&str> = text.lines().collect();
    let lines = if lines.is_empty() { vec![""] } else { lines };

    match font {
        TextFont::System { font, .. } => draw_outline_text(font, &lines, font_size as f32, margin),
        TextFont::BuiltIn => draw_bitmap_text(&lines, font_size, margin),
    }
}

fn too_large(width: u32, height: u32, margin: u32) -> RenderError {
    RenderError::TooLarge(LabelTooLarge { width, height, margin })
}

/// White canvas of the content plus `margin` on every side, at least 1x1.
fn blank_canvas(content_width: u32, content_height: u32, margin: u32) -> Result<RgbImage, RenderError> {
    let (width, height) = padded_size(content_width, content_height, margin)?;
    Ok(RgbImage::from_pixel(width.max(1), height.max(1), Rgb([255, 255, 255])))
}

fn block_height(line_count: u32, line_height: u32) -> Option<u32> {
    let spacing = line_count.saturating_sub(1).checked_mul(LINE_SPACING)?;
    line_count.checked_mul(line_height)?.checked_add(spacing)
}

/// Anti-aliased TrueType rendering.
fn draw_outline_text(
    font: &FontVec,
    lines: &[&str],
    pixel_height: f32,
    margin: u32,
) -> Result<RgbImage, RenderError> {
    let scale = PxScale::from(pixel_height);
    let scaled = font.as_scaled(scale);

    // Layout: glyph positions per line
    let mut layout = Vec::with_capacity(lines.len());
    let mut content_width = 0f32;
    for line in lines {
        let mut glyphs = Vec::new();
        let mut caret_x = 0.0f32;
        let mut previous = None;
        for ch in line.chars() {
            let glyph_id = font.glyph_id(ch);
            if let Some(prev) = previous {
                caret_x += scaled.kern(prev, glyph_id);
            }
            glyphs.push((glyph_id, caret_x));
            caret_x += scaled.h_advance(glyph_id);
            previous = Some(glyph_id);
        }
        content_width = content_width.max(caret_x);
        layout.push(glyphs);
    }

    let ascent = scaled.ascent();
    // Float to int casts saturate, so an absurd layout fails the size check below
    let line_height = (ascent - scaled.descent()).ceil() as u32;
    let content_width = content_width.ceil() as u32;
    let content_height =
        block_height(lines.len() as u32, line_height).ok_or_else(|| too_large(content_width, u32::MAX, margin))?;
    let mut canvas = blank_canvas(content_width, content_height, margin)?;
    let (width, height) = canvas.dimensions();

    for (line_idx, glyphs) in layout.iter().enumerate() {
        let top = margin as f32 + (line_idx as u32 * (line_height + LINE_SPACING)) as f32;
        let baseline_y = top + ascent;

        for &(glyph_id, glyph_x) in glyphs {
            let glyph = glyph_id.with_scale_and_position(scale, point(margin as f32 + glyph_x, baseline_y));
            let Some(outlined) = font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, coverage| {
                let x = px as i32 + bounds.min.x as i32;
                let y = py as i32 + bounds.min.y as i32;
                if x >= 0 && (x as u32) < width && y >= 0 && (y as u32) < height {
                    let ink = (255.0 * (1.0 - coverage.clamp(0.0, 1.0))).round() as u8;
                    let pixel = canvas.get_pixel_mut(x as u32, y as u32);
                    let value = pixel[0].min(ink);
                    *pixel = Rgb([value, value, value]);
                }
            });
        }
    }

    Ok(canvas)
}

/// Nearest-neighbour scaled Spleen rendering.
fn draw_bitmap_text(lines: &[&str], font_size: u32, margin: u32) -> Result<RgbImage, RenderError> {
    let mut spleen = PSF2Font::new(FONT_12X24)
        .map_err(|_| RenderError::Text("built-in font is unreadable".to_string()))?;

    let cell_height = font_size;
    let cell_width = font_size
        .checked_mul(BUILTIN_CELL_WIDTH)
        .map(|w| w.div_ceil(BUILTIN_CELL_HEIGHT).max(1))
        .ok_or_else(|| too_large(u32::MAX, cell_height, margin))?;
    let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let content_width = u32::try_from(longest)
        .ok()
        .and_then(|n| n.checked_mul(cell_width))
        .ok_or_else(|| too_large(u32::MAX, cell_height, margin))?;
    let content_height =
        block_height(lines.len() as u32, cell_height).ok_or_else(|| too_large(content_width, u32::MAX, margin))?;
    let mut canvas = blank_canvas(content_width, content_height, margin)?;

    for (line_idx, line) in lines.iter().enumerate() {
        let top = margin + line_idx as u32 * (cell_height + LINE_SPACING);

        for (col, ch) in line.chars().enumerate() {
            let mut cell = [[false; BUILTIN_CELL_WIDTH as usize]; BUILTIN_CELL_HEIGHT as usize];
            let utf8 = ch.to_string();
            match spleen.glyph_for_utf8(utf8.as_bytes()) {
                Some(glyph) => {
                    for (row_y, row) in glyph.enumerate() {
                        for (col_x, on) in row.enumerate() {
                            if row_y < cell.len() && col_x < cell[row_y].len() {
                                cell[row_y][col_x] = on;
                            }
                        }
                    }
                }
                // Unknown character: hollow box
                None if !ch.is_whitespace() => {
                    for (row_y, row) in cell.iter_mut().enumerate().skip(2).take(20) {
                        for (col_x, on) in row.iter_mut().enumerate().skip(1).take(10) {
                            *on = row_y == 2 || row_y == 21 || col_x == 1 || col_x == 10;
                        }
                    }
                }
                None => {}
            }

            let left = margin + col as u32 * cell_width;
            for dy in 0..cell_height {
                let src_y = (dy * BUILTIN_CELL_HEIGHT / cell_height) as usize;
                for dx in 0..cell_width {
                    let src_x = (dx * BUILTIN_CELL_WIDTH / cell_width) as usize;
                    if cell[src_y][src_x] {
                        canvas.put_pixel(left + dx, top + dy, Rgb([0, 0, 0]));
                    }
                }
            }
        }
    }

    Ok(canvas)
}
