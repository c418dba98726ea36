//! Document page → bitmap.
//!
//! Documents are rasterized one page at a time through a
//! [`DocumentRasterizer`]. The crate ships a pdfium-backed implementation
//! behind the `pdf` feature; when no rasterizer is available, document jobs
//! fail with `pdf_support_missing` before any page is touched.
//!
//! Pages are rendered at a zoom factor of `dpi / 72` (PDF user space is 72
//! units per inch). A page whose bitmap would exceed the label size limit is
//! refused before it is rendered.

use image::RgbImage;
use std::sync::Arc;

use super::RenderError;

/// PDF user-space units per inch.
pub const POINTS_PER_INCH: f32 = 72.0;

/// Opens document bytes for page-by-page rasterization.
pub trait DocumentRasterizer: Send + Sync {
    /// Short backend name for logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Parse the document. Malformed bytes are an error here.
    fn open<'a>(&'a self, bytes: &'a [u8]) -> Result<Box<dyn PageSource + 'a>, RenderError>;
}

/// An opened document.
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Rasterize one zero-based page to RGB at the given resolution.
    fn render_page(&self, index: usize, dpi: u32) -> Result<RgbImage, RenderError>;
}

/// Zoom factor that maps PDF points to `dpi` pixels per inch.
pub fn zoom_for_dpi(dpi: u32) -> f32 {
    dpi as f32 / POINTS_PER_INCH
}

/// The rasterizer this build can offer, if any.
///
/// With the `pdf` feature this binds the system pdfium library; binding
/// failures are logged and reported as "no rasterizer".
pub fn system_rasterizer() -> Option<Arc<dyn DocumentRasterizer>> {
    #[cfg(feature = "pdf")]
    {
        match pdfium::PdfiumRasterizer::bind() {
            Ok(rasterizer) => return Some(Arc::new(rasterizer)),
            Err(e) => tracing::warn!(error = %e, "pdfium unavailable, document printing disabled"),
        }
    }
    None
}

#[cfg(feature = "pdf")]
pub mod pdfium {
    //! pdfium-backed rasterizer.

    use image::RgbImage;
    use pdfium_render::prelude::*;

    use super::{DocumentRasterizer, PageSource, RenderError, zoom_for_dpi};
    use crate::render::image::flatten_on_white;
    use crate::transform::padded_size;

    pub struct PdfiumRasterizer {
        pdfium: Pdfium,
    }

    impl PdfiumRasterizer {
        /// Bind pdfium from the working directory, falling back to the system library.
        pub fn bind() -> Result<Self, PdfiumError> {
            let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library())?;
            Ok(Self {
                pdfium: Pdfium::new(bindings),
            })
        }
    }

    impl DocumentRasterizer for PdfiumRasterizer {
        fn name(&self) -> &'static str {
            "pdfium"
        }

        fn open<'a>(&'a self, bytes: &'a [u8]) -> Result<Box<dyn PageSource + 'a>, RenderError> {
            let document = self
                .pdfium
                .load_pdf_from_byte_slice(bytes, None)
                .map_err(|e| RenderError::Document(format!("Failed to open PDF: {}", e)))?;
            Ok(Box::new(PdfiumDocument { document }))
        }
    }

    struct PdfiumDocument<'a> {
        document: PdfDocument<'a>,
    }

    impl PageSource for PdfiumDocument<'_> {
        fn page_count(&self) -> usize {
            self.document.pages().len() as usize
        }

        fn render_page(&self, index: usize, dpi: u32) -> Result<RgbImage, RenderError> {
            let page = self
                .document
                .pages()
                .get(index as PdfPageIndex)
                .map_err(|e| RenderError::Document(format!("Failed to load page {}: {}", index + 1, e)))?;
            let zoom = zoom_for_dpi(dpi);
            let width = (page.width().value * zoom).ceil() as u32;
            let height = (page.height().value * zoom).ceil() as u32;
            padded_size(width, height, 0)?;

            let config = PdfRenderConfig::new().scale_page_by_factor(zoom);
            let bitmap = page
                .render_with_config(&config)
                .map_err(|e| RenderError::Document(format!("Failed to render page {}: {}", index + 1, e)))?;

            let (width, height) = (bitmap.width() as u32, bitmap.height() as u32);
            let rgba = image::RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes())
                .ok_or_else(|| RenderError::Document(format!("Page {} bitmap has an unexpected size", index + 1)))?;
            Ok(flatten_on_white(&image::DynamicImage::ImageRgba8(rgba)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_for_dpi() {
        assert_eq!(zoom_for_dpi(72), 1.0);
        assert_eq!(zoom_for_dpi(300), 300.0 / 72.0);
        assert_eq!(zoom_for_dpi(144), 2.0);
    }

    #[cfg(not(feature = "pdf"))]
    #[test]
    fn test_no_rasterizer_without_pdf_feature() {
        assert!(system_rasterizer().is_none());
    }
}
