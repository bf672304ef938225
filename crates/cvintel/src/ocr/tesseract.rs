//! Tesseract-backed OCR, used as the fallback engine (§4.2).
//!
//! `tesseract`'s image-loading API is path-only, so each call bridges the
//! in-memory page image through a guaranteed-cleanup temp file (§9 manual
//! resource discipline).

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use regex::Regex;

use super::{EngineInfo, EngineRole, OcrBackend};
use crate::error::{PipelineError, Result};
use crate::image::PageImage;
use crate::types::{OcrLine, Polygon};

fn hocr_line_pattern() -> &'static Regex {
    static PATTERN: OnceCell<Regex> = OnceCell::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#"(?s)class='ocr_line'[^>]*title="bbox (\d+) (\d+) (\d+) (\d+)[^"]*">(.*?)</span>\s*</p>|(?s)class='ocr_line'[^>]*title="bbox (\d+) (\d+) (\d+) (\d+)"#,
        )
        .expect("static hOCR line pattern is valid")
    })
}

fn word_conf_pattern() -> &'static Regex {
    static PATTERN: OnceCell<Regex> = OnceCell::new();
    PATTERN.get_or_init(|| Regex::new(r"x_wconf (\d+)").expect("static confidence pattern is valid"))
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceCell<Regex> = OnceCell::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]+>").expect("static tag-strip pattern is valid"))
}

/// Fallback OCR engine backed by the system Tesseract installation.
pub struct TesseractBackend {
    language: String,
}

impl TesseractBackend {
    pub fn new(language: impl Into<String>) -> Self {
        Self { language: language.into() }
    }

    /// Whether a usable Tesseract installation can be initialised at all,
    /// used by the registry to decide whether this engine is available.
    pub fn probe(language: &str) -> bool {
        tesseract::Tesseract::new(None, Some(language)).is_ok()
    }
}

fn recognize(rgb: &image::RgbImage, language: &str) -> Result<Vec<(String, f32, Polygon)>> {
    let tmp = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .map_err(PipelineError::Io)?;
    image::DynamicImage::ImageRgb8(rgb.clone())
        .save_with_format(tmp.path(), image::ImageFormat::Png)
        .map_err(|e| PipelineError::ImageProcessing(format!("failed to stage image for OCR: {e}")))?;

    // `tmp` (a `NamedTempFile`) removes the file on drop regardless of how
    // this function returns, satisfying the cleanup requirement.
    let mut tess = tesseract::Tesseract::new(None, Some(language))
        .map_err(|e| PipelineError::Unavailable(format!("failed to initialise tesseract: {e}")))?;
    tess = tess
        .set_image(tmp.path().to_str().unwrap_or_default())
        .map_err(|e| PipelineError::ImageProcessing(format!("failed to load image into tesseract: {e}")))?;
    let hocr = tess
        .get_hocr_text(0)
        .map_err(|e| PipelineError::Internal(format!("tesseract recognition failed: {e}")))?;

    Ok(parse_hocr_lines(&hocr))
}

fn parse_hocr_lines(hocr: &str) -> Vec<(String, f32, Polygon)> {
    let mut lines = Vec::new();
    for caps in hocr_line_pattern().captures_iter(hocr) {
        let (x0, y0, x1, y1, body) = if let (Some(x0), Some(y0), Some(x1), Some(y1)) = (caps.get(1), caps.get(2), caps.get(3), caps.get(4)) {
            (x0, y0, x1, y1, caps.get(5).map(|m| m.as_str()).unwrap_or(""))
        } else if let (Some(x0), Some(y0), Some(x1), Some(y1)) = (caps.get(6), caps.get(7), caps.get(8), caps.get(9)) {
            (x0, y0, x1, y1, "")
        } else {
            continue;
        };

        let (Ok(x0), Ok(y0), Ok(x1), Ok(y1)) = (
            x0.as_str().parse::<f32>(),
            y0.as_str().parse::<f32>(),
            x1.as_str().parse::<f32>(),
            y1.as_str().parse::<f32>(),
        ) else {
            continue;
        };

        let text = tag_pattern().replace_all(body, " ").trim().to_string();
        if text.is_empty() {
            continue;
        }

        let confidences: Vec<f32> = word_conf_pattern()
            .captures_iter(body)
            .filter_map(|c| c.get(1).and_then(|m| m.as_str().parse::<f32>().ok()))
            .collect();
        let confidence = if confidences.is_empty() {
            0.0
        } else {
            confidences.iter().sum::<f32>() / confidences.len() as f32
        };

        lines.push((text, confidence, Polygon::from_rect(x0, y0, x1 - x0, y1 - y0)));
    }
    lines
}

#[async_trait]
impl OcrBackend for TesseractBackend {
    async fn extract_lines(&self, page: &PageImage, page_index: u32) -> Result<Vec<OcrLine>> {
        let rgb = page.rgb.clone();
        let language = self.language.clone();
        let lines = tokio::task::spawn_blocking(move || recognize(&rgb, &language))
            .await
            .map_err(|e| PipelineError::Internal(format!("OCR task panicked: {e}")))??;

        Ok(lines
            .into_iter()
            .map(|(text, confidence, bbox)| OcrLine::new(text, confidence, bbox, page_index))
            .collect())
    }

    fn info(&self) -> EngineInfo {
        EngineInfo {
            role: EngineRole::Fallback,
            name: "tesseract".to_string(),
            available: Self::probe(&self.language),
            languages: vec![self.language.clone()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hocr_extracts_bbox_and_confidence() {
        let hocr = r#"<p class='ocr_par'><span class='ocr_line' id='line_1_1' title="bbox 10 20 300 45; baseline 0 0; x_size 20">
            <span class='ocrx_word' id='word_1_1' title='bbox 10 20 100 45; x_wconf 92'>Hello</span>
            <span class='ocrx_word' id='word_1_2' title='bbox 110 20 300 45; x_wconf 88'>World</span>
        </span></p>"#;
        let lines = parse_hocr_lines(hocr);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].0.contains("Hello"));
        assert!((lines[0].1 - 90.0).abs() < 1.0);
    }
}
