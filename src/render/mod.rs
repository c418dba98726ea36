//! # Rendering Module
//!
//! Turns a label payload into a canonical RGB bitmap, ready for the
//! [`transform`](crate::transform) stage.
//!
//! ## Modules
//!
//! - [`text`]: Text drawn with the first available system font, or a built-in
//!   bitmap font
//! - [`image`]: Base64 encoded raster images (any format `image` can sniff)
//! - [`document`]: One page of a multi-page document, through a pluggable
//!   rasterizer
//!
//! ## Usage Example
//!
//! ```
//! use labelstation::render::text;
//!
//! let canvas = text::render_text("Hello", 24, 10).unwrap();
//! assert!(canvas.width() > 20);
//! ```

pub mod document;
pub mod image;
pub mod text;

use thiserror::Error;

pub use document::{DocumentRasterizer, PageSource};

/// Errors raised while producing a canonical bitmap.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Payload is not valid base64
    #[error("Invalid base64 data: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Bytes are not a decodable image
    #[error("Failed to decode image: {0}")]
    Image(#[from] ::image::ImageError),

    /// The canvas would exceed the label size limit
    #[error(transparent)]
    TooLarge(#[from] crate::transform::LabelTooLarge),

    /// Text could not be laid out or drawn
    #[error("Failed to render text: {0}")]
    Text(String),

    /// Document could not be opened or a page could not be rasterized
    #[error("Document error: {0}")]
    Document(String),
}
