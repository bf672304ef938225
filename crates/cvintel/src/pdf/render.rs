//! Page-to-bitmap rasterization via `pdfium-render` (C1, §4.1).

use pdfium_render::prelude::*;

use crate::error::{PipelineError, Result};

/// Render every page of a PDF document at the given DPI, producing RGB8
/// pixel buffers and their dimensions.
///
/// Binds to whatever pdfium shared library is discoverable on the system;
/// callers that need a bundled/static binary should set that up via the
/// `pdfium-render` crate's own binding helpers at startup.
pub fn rasterize_pdf(bytes: &[u8], dpi: u32) -> Result<Vec<(Vec<u8>, u32, u32)>> {
    let bindings = Pdfium::bind_to_system_library()
        .map_err(|e| PipelineError::ImageProcessing(format!("failed to bind pdfium: {e}")))?;
    let pdfium = Pdfium::new(bindings);

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| PipelineError::BadInput(format!("invalid PDF: {e}")))?;

    let mut pages = Vec::new();
    for page in document.pages().iter() {
        let width_px = (page.width().value * dpi as f32 / 72.0).round().max(1.0) as i32;
        let height_px = (page.height().value * dpi as f32 / 72.0).round().max(1.0) as i32;

        let config = PdfRenderConfig::new().set_target_width(width_px).set_target_height(height_px);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| PipelineError::ImageProcessing(format!("failed to render PDF page: {e}")))?;

        let rgb = bitmap.as_image().to_rgb8();
        let (w, h) = rgb.dimensions();
        pages.push((rgb.into_raw(), w, h));
    }

    Ok(pages)
}
