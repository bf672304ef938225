//! Image Prep (C1, §4.1): document decoding and enhancement.

pub mod preprocessing;

use image::{DynamicImage, ImageFormat, RgbImage};

use crate::error::{PipelineError, Result};
use crate::pdf::DPI_LADDER;

/// The declared kind of an input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Png,
    Jpeg,
    Tiff,
    Bmp,
    Gif,
    Webp,
}

impl DocumentKind {
    fn image_format(self) -> Option<ImageFormat> {
        match self {
            DocumentKind::Pdf => None,
            DocumentKind::Png => Some(ImageFormat::Png),
            DocumentKind::Jpeg => Some(ImageFormat::Jpeg),
            DocumentKind::Tiff => Some(ImageFormat::Tiff),
            DocumentKind::Bmp => Some(ImageFormat::Bmp),
            DocumentKind::Gif => Some(ImageFormat::Gif),
            DocumentKind::Webp => Some(ImageFormat::WebP),
        }
    }
}

/// One decoded page, in RGB8, plus its pixel dimensions.
#[derive(Debug, Clone)]
pub struct PageImage {
    pub rgb: RgbImage,
    pub width: u32,
    pub height: u32,
}

impl PageImage {
    fn from_dynamic(image: DynamicImage) -> Self {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        Self { rgb, width, height }
    }
}

/// Decode a document into an ordered list of RGB page images (C1).
///
/// PDFs are rasterized page-by-page at 200 DPI; on failure the whole
/// document is retried once at 150 DPI, then once more at 100 DPI, per
/// the DPI ladder in §4.1. Raster formats decode to a single page.
#[cfg(feature = "pdf")]
pub fn decode_document(bytes: &[u8], kind: DocumentKind) -> Result<Vec<PageImage>> {
    match kind {
        DocumentKind::Pdf => decode_pdf(bytes),
        other => decode_raster(bytes, other),
    }
}

#[cfg(not(feature = "pdf"))]
pub fn decode_document(bytes: &[u8], kind: DocumentKind) -> Result<Vec<PageImage>> {
    match kind {
        DocumentKind::Pdf => Err(PipelineError::Unavailable("PDF rendering support is not enabled".into())),
        other => decode_raster(bytes, other),
    }
}

#[cfg(feature = "pdf")]
fn decode_pdf(bytes: &[u8]) -> Result<Vec<PageImage>> {
    let mut last_err = None;
    for dpi in DPI_LADDER {
        match crate::pdf::rasterize_pdf(bytes, dpi) {
            Ok(pages) => {
                return Ok(pages
                    .into_iter()
                    .filter_map(|(raw, w, h)| RgbImage::from_raw(w, h, raw).map(|rgb| PageImage { rgb, width: w, height: h }))
                    .collect());
            }
            Err(e) => {
                tracing::warn!(dpi, error = %e, "PDF rasterization failed, retrying at lower DPI");
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| PipelineError::Internal("PDF rasterization exhausted the DPI ladder".into())))
}

fn decode_raster(bytes: &[u8], kind: DocumentKind) -> Result<Vec<PageImage>> {
    let format = kind
        .image_format()
        .ok_or_else(|| PipelineError::BadInput("unsupported raster format".into()))?;
    let image = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| PipelineError::BadInput(format!("failed to decode image: {e}")))?;
    Ok(vec![PageImage::from_dynamic(image)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_raster_png_single_page() {
        let mut img = image::RgbImage::new(4, 4);
        for p in img.pixels_mut() {
            *p = image::Rgb([10, 20, 30]);
        }
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let pages = decode_raster(&bytes, DocumentKind::Png).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].width, 4);
        assert_eq!(pages[0].height, 4);
    }
}
