//! Primary OCR engine: a detector + recognizer pair run through ONNX
//! Runtime (§4.2), in the style of PaddleOCR's DB-detection /
//! CRNN-recognition pipeline. Text-region geometry (contour extraction,
//! min-area-rect, polygon unclip) mirrors the detector/recognizer split
//! used by on-device PaddleOCR ports; angle classification is not run —
//! resumes are assumed upright after `image::auto_orient`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use geo_clipper::{Clipper, EndType, JoinType};
use geo_types::{Coord, LineString, Polygon as GeoPolygon};
use image::RgbImage;
use ndarray::Array4;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use ort::value::Tensor;
use parking_lot::Mutex;

use super::{EngineInfo, EngineRole, OcrBackend, OcrTuning};
use crate::error::{PipelineError, Result};
use crate::image::PageImage;
use crate::types::{OcrLine, Polygon};

const DET_MEAN: [f32; 3] = [0.485 * 255.0, 0.456 * 255.0, 0.406 * 255.0];
const DET_NORM: [f32; 3] = [1.0 / 0.229 / 255.0, 1.0 / 0.224 / 255.0, 1.0 / 0.225 / 255.0];
const REC_MEAN: [f32; 3] = [127.5, 127.5, 127.5];
const REC_NORM: [f32; 3] = [1.0 / 127.5, 1.0 / 127.5, 1.0 / 127.5];
const REC_HEIGHT: u32 = 48;
const MAX_SIDE_LEN: u32 = 960;

/// Paths to the detection and recognition ONNX models plus the character
/// dictionary used to decode CRNN output indices.
#[derive(Debug, Clone)]
pub struct PaddleModelPaths {
    pub detection: PathBuf,
    pub recognition: PathBuf,
    pub dictionary: PathBuf,
}

struct Nets {
    detector: Session,
    recognizer: Session,
    keys: Vec<String>,
}

/// Primary OCR backend: DB-style text detection followed by CRNN-style
/// greedy-CTC recognition, both run through `ort`.
pub struct PaddleOcrBackend {
    nets: Mutex<Option<Nets>>,
    paths: PaddleModelPaths,
    tuning: OcrTuning,
}

impl PaddleOcrBackend {
    /// Construct a backend that lazily loads its ONNX sessions on first
    /// use, so registry construction never itself fails on a missing model.
    pub fn new(paths: PaddleModelPaths, tuning: OcrTuning) -> Self {
        Self { nets: Mutex::new(None), paths, tuning }
    }

    fn load(paths: &PaddleModelPaths) -> Result<Nets> {
        let detector = build_session(&paths.detection)?;
        let recognizer = build_session(&paths.recognition)?;
        let keys = read_dictionary(&paths.dictionary)?;
        Ok(Nets { detector, recognizer, keys })
    }

    fn ensure_loaded(&self) -> Result<()> {
        let mut guard = self.nets.lock();
        if guard.is_none() {
            *guard = Some(Self::load(&self.paths)?);
        }
        Ok(())
    }

    fn recognize_page(&self, rgb: &RgbImage) -> Result<Vec<(String, f32, Polygon)>> {
        self.ensure_loaded()?;
        let mut guard = self.nets.lock();
        let nets = guard.as_mut().expect("ensure_loaded populated the slot");

        let boxes = detect_text_boxes(
            &mut nets.detector,
            rgb,
            self.tuning.box_threshold,
            self.tuning.box_threshold,
            self.tuning.unclip_ratio,
        )?;

        let mut lines = Vec::with_capacity(boxes.len());
        for text_box in boxes {
            if text_box.score < self.tuning.detection_threshold {
                continue;
            }
            let crop = crop_box(rgb, &text_box.points);
            if crop.width() == 0 || crop.height() == 0 {
                continue;
            }
            let (text, score) = recognize_crop(&mut nets.recognizer, &nets.keys, &crop)?;
            if text.trim().is_empty() {
                continue;
            }
            let (x0, y0, x1, y1) = bounds(&text_box.points);
            lines.push((text, score * 100.0, Polygon::from_rect(x0, y0, x1 - x0, y1 - y0)));
        }
        Ok(lines)
    }
}

#[async_trait]
impl OcrBackend for PaddleOcrBackend {
    async fn extract_lines(&self, page: &PageImage, page_index: u32) -> Result<Vec<OcrLine>> {
        let rgb = page.rgb.clone();
        let lines = self.recognize_page(&rgb)?;
        Ok(lines
            .into_iter()
            .map(|(text, confidence, bbox)| OcrLine::new(text, confidence, bbox, page_index))
            .collect())
    }

    fn info(&self) -> EngineInfo {
        EngineInfo {
            role: EngineRole::Primary,
            name: "paddle-ocr".to_string(),
            available: self.paths.detection.exists() && self.paths.recognition.exists(),
            languages: vec!["multi".to_string()],
        }
    }
}

fn build_session(path: &Path) -> Result<Session> {
    Session::builder()
        .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level2))
        .and_then(|b| b.commit_from_file(path))
        .map_err(|e| PipelineError::Unavailable(format!("failed to load ONNX model {}: {e}", path.display())))
}

fn read_dictionary(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(PipelineError::Io)?;
    let mut keys = Vec::with_capacity(content.len() / 3 + 2);
    keys.push("#".to_string());
    keys.extend(content.lines().map(str::to_string));
    keys.push(" ".to_string());
    Ok(keys)
}

struct TextBox {
    points: [(f32, f32); 4],
    score: f32,
}

fn scale_to_model_input(width: u32, height: u32, target: u32) -> (u32, u32, f32, f32) {
    let ratio = if width > height { target as f32 / width as f32 } else { target as f32 / height as f32 };
    let mut dst_w = ((width as f32 * ratio) as u32 / 32).max(1) * 32;
    let mut dst_h = ((height as f32 * ratio) as u32 / 32).max(1) * 32;
    dst_w = dst_w.max(32);
    dst_h = dst_h.max(32);
    (dst_w, dst_h, dst_w as f32 / width as f32, dst_h as f32 / height as f32)
}

fn subtract_mean_normalize(image: &RgbImage, mean: &[f32; 3], norm: &[f32; 3]) -> Array4<f32> {
    let (w, h) = image.dimensions();
    let mut tensor = Array4::<f32>::zeros((1, 3, h as usize, w as usize));
    for (x, y, px) in image.enumerate_pixels() {
        for c in 0..3 {
            let v = px.0[c] as f32 * norm[c] - mean[c] * norm[c];
            tensor[[0, c, y as usize, x as usize]] = v;
        }
    }
    tensor
}

fn detect_text_boxes(
    session: &mut Session,
    source: &RgbImage,
    box_score_thresh: f32,
    box_thresh: f32,
    unclip_ratio: f32,
) -> Result<Vec<TextBox>> {
    let (w, h) = source.dimensions();
    let (dst_w, dst_h, scale_w, scale_h) = scale_to_model_input(w, h, MAX_SIDE_LEN);
    let resized = image::imageops::resize(source, dst_w, dst_h, image::imageops::FilterType::Triangle);
    let input = subtract_mean_normalize(&resized, &DET_MEAN, &DET_NORM);

    let input_name = session
        .inputs()
        .first()
        .map(|i| i.name().to_string())
        .ok_or_else(|| PipelineError::Internal("detection model has no declared input".into()))?;
    let tensor = Tensor::from_array(input)
        .map_err(|e| PipelineError::Internal(format!("failed to build detector tensor: {e}")))?;
    let outputs = session
        .run(ort::inputs![input_name => tensor])
        .map_err(|e| PipelineError::Internal(format!("detector inference failed: {e}")))?;

    let (_, value) = outputs.iter().next().ok_or_else(|| PipelineError::Internal("detector produced no output".into()))?;
    let (_, pred) = value
        .try_extract_tensor::<f32>()
        .map_err(|e| PipelineError::Internal(format!("failed to read detector output: {e}")))?;

    let cbuf: Vec<u8> = pred.iter().map(|p| (p * 255.0) as u8).collect();
    let prob_map = image::ImageBuffer::<image::Luma<f32>, Vec<f32>>::from_vec(dst_w, dst_h, pred.to_vec())
        .ok_or_else(|| PipelineError::Internal("detector output size mismatch".into()))?;
    let binary = image::GrayImage::from_vec(dst_w, dst_h, cbuf)
        .ok_or_else(|| PipelineError::Internal("detector buffer size mismatch".into()))?;

    let thresholded = imageproc::contrast::threshold(
        &binary,
        (box_thresh * 255.0) as u8,
        imageproc::contrast::ThresholdType::Binary,
    );
    let dilated = imageproc::morphology::dilate(&thresholded, imageproc::distance_transform::Norm::LInf, 1);
    let contours = imageproc::contours::find_contours::<i32>(&dilated);

    let mut boxes = Vec::new();
    for contour in contours {
        if contour.points.len() <= 2 {
            continue;
        }
        let Some((min_box, max_side)) = min_area_box(&contour.points) else { continue };
        if max_side < 3.0 {
            continue;
        }
        let score = region_score(&contour, &prob_map);
        if score < box_score_thresh {
            continue;
        }
        let Some(expanded) = unclip(&min_box, unclip_ratio) else { continue };
        if expanded.len() < 4 {
            continue;
        }
        let Some((final_box, final_side)) = min_area_box_f(&expanded) else { continue };
        if final_side < 5.0 {
            continue;
        }
        let points: [(f32, f32); 4] = std::array::from_fn(|i| {
            let (x, y) = final_box[i];
            ((x / scale_w).min(w as f32), (y / scale_h).min(h as f32))
        });
        boxes.push(TextBox { points, score });
    }
    Ok(boxes)
}

fn min_area_box(points: &[imageproc::point::Point<i32>]) -> Option<([(f32, f32); 4], f32)> {
    let rect = imageproc::geometry::min_area_rect(points);
    let pts: Vec<(f32, f32)> = rect.iter().map(|p| (p.x as f32, p.y as f32)).collect();
    order_rect_points(&pts)
}

fn min_area_box_f(points: &[(f32, f32)]) -> Option<([(f32, f32); 4], f32)> {
    let as_points: Vec<imageproc::point::Point<i32>> =
        points.iter().map(|(x, y)| imageproc::point::Point::new(*x as i32, *y as i32)).collect();
    min_area_box(&as_points)
}

fn order_rect_points(pts: &[(f32, f32)]) -> Option<([(f32, f32); 4], f32)> {
    if pts.len() != 4 {
        return None;
    }
    let width = dist(pts[0], pts[1]);
    let height = dist(pts[1], pts[2]);
    let max_side = width.min(height);

    let mut sorted = pts.to_vec();
    sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let (i1, i4) = if sorted[1].1 > sorted[0].1 { (0, 1) } else { (1, 0) };
    let (i2, i3) = if sorted[3].1 > sorted[2].1 { (2, 3) } else { (3, 2) };

    Some(([sorted[i1], sorted[i2], sorted[i3], sorted[i4]], max_side))
}

fn dist(a: (f32, f32), b: (f32, f32)) -> f32 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

fn region_score(
    contour: &imageproc::contours::Contour<i32>,
    prob_map: &image::ImageBuffer<image::Luma<f32>, Vec<f32>>,
) -> f32 {
    let (mut xmin, mut ymin, mut xmax, mut ymax) = (i32::MAX, i32::MAX, i32::MIN, i32::MIN);
    for p in &contour.points {
        xmin = xmin.min(p.x);
        xmax = xmax.max(p.x);
        ymin = ymin.min(p.y);
        ymax = ymax.max(p.y);
    }
    let width = prob_map.width() as i32;
    let height = prob_map.height() as i32;
    xmin = xmin.clamp(0, width - 1);
    xmax = xmax.clamp(0, width - 1);
    ymin = ymin.clamp(0, height - 1);
    ymax = ymax.clamp(0, height - 1);
    let (roi_w, roi_h) = (xmax - xmin + 1, ymax - ymin + 1);
    if roi_w <= 0 || roi_h <= 0 {
        return 0.0;
    }

    let mut mask = image::GrayImage::new(roi_w as u32, roi_h as u32);
    let local: Vec<imageproc::point::Point<i32>> =
        contour.points.iter().map(|p| imageproc::point::Point::new(p.x - xmin, p.y - ymin)).collect();
    imageproc::drawing::draw_polygon_mut(&mut mask, &local, image::Luma([255]));

    let cropped = image::imageops::crop_imm(prob_map, xmin as u32, ymin as u32, roi_w as u32, roi_h as u32).to_image();
    let mut sum = 0.0f32;
    let mut count = 0u32;
    for y in 0..cropped.height() {
        for x in 0..cropped.width() {
            if mask.get_pixel(x, y).0[0] > 0 {
                sum += cropped.get_pixel(x, y).0[0];
                count += 1;
            }
        }
    }
    if count == 0 { 0.0 } else { sum / count as f32 }
}

fn unclip(points: &[(f32, f32); 4], ratio: f32) -> Option<Vec<(f32, f32)>> {
    let width = dist(points[0], points[1]);
    let height = dist(points[1], points[2]);
    if width < 1.001 && height < 1.001 {
        return None;
    }
    let area = signed_area(points).abs();
    let length = perimeter(points);
    if length == 0.0 {
        return None;
    }
    let distance = area * ratio / length;

    let coords: Vec<Coord<f64>> = points.iter().map(|(x, y)| Coord { x: *x as f64, y: *y as f64 }).collect();
    let polygon = GeoPolygon::new(LineString::new(coords), vec![]);
    let solution = polygon.offset(distance as f64, JoinType::Round(2.0), EndType::ClosedPolygon, 1.0).0;
    let expanded = solution.first()?;
    Some(expanded.exterior().points().map(|p| (p.x() as f32, p.y() as f32)).collect())
}

fn signed_area(points: &[(f32, f32); 4]) -> f32 {
    let mut pts = points.to_vec();
    pts.push(points[0]);
    let mut area = 0.0;
    for i in 0..4 {
        area += (pts[i + 1].0 - pts[i].0) * (pts[i + 1].1 + pts[i].1) / 2.0;
    }
    area
}

fn perimeter(points: &[(f32, f32); 4]) -> f32 {
    let mut total = 0.0;
    for i in 0..4 {
        total += dist(points[i], points[(i + 1) % 4]);
    }
    total
}

fn bounds(points: &[(f32, f32); 4]) -> (f32, f32, f32, f32) {
    let xs = points.iter().map(|p| p.0);
    let ys = points.iter().map(|p| p.1);
    (
        xs.clone().fold(f32::MAX, f32::min),
        ys.clone().fold(f32::MAX, f32::min),
        xs.fold(f32::MIN, f32::max),
        ys.fold(f32::MIN, f32::max),
    )
}

fn crop_box(source: &RgbImage, points: &[(f32, f32); 4]) -> RgbImage {
    let (x0, y0, x1, y1) = bounds(points);
    let (x0, y0) = (x0.max(0.0) as u32, y0.max(0.0) as u32);
    let (w, h) = ((x1 - x0 as f32).max(1.0) as u32, (y1 - y0 as f32).max(1.0) as u32);
    let w = w.min(source.width().saturating_sub(x0)).max(1);
    let h = h.min(source.height().saturating_sub(y0)).max(1);
    image::imageops::crop_imm(source, x0, y0, w, h).to_image()
}

fn recognize_crop(session: &mut Session, keys: &[String], crop: &RgbImage) -> Result<(String, f32)> {
    let scale = REC_HEIGHT as f32 / crop.height() as f32;
    let dst_w = ((crop.width() as f32 * scale) as u32).max(1);
    let resized = image::imageops::resize(crop, dst_w, REC_HEIGHT, image::imageops::FilterType::Triangle);
    let input = subtract_mean_normalize(&resized, &REC_MEAN, &REC_NORM);

    let input_name = session
        .inputs()
        .first()
        .map(|i| i.name().to_string())
        .ok_or_else(|| PipelineError::Internal("recognition model has no declared input".into()))?;
    let tensor = Tensor::from_array(input)
        .map_err(|e| PipelineError::Internal(format!("failed to build recognizer tensor: {e}")))?;
    let outputs = session
        .run(ort::inputs![input_name => tensor])
        .map_err(|e| PipelineError::Internal(format!("recognizer inference failed: {e}")))?;

    let (_, value) =
        outputs.iter().next().ok_or_else(|| PipelineError::Internal("recognizer produced no output".into()))?;
    let (shape, data) = value
        .try_extract_tensor::<f32>()
        .map_err(|e| PipelineError::Internal(format!("failed to read recognizer output: {e}")))?;
    let steps = shape[1] as usize;
    let classes = shape[2] as usize;

    Ok(greedy_ctc_decode(data, steps, classes, keys))
}

/// Greedy CTC decode: take the per-timestep argmax, drop the blank class
/// (index 0) and collapse consecutive repeats.
fn greedy_ctc_decode(data: &[f32], steps: usize, classes: usize, keys: &[String]) -> (String, f32) {
    let mut text = String::new();
    let mut score_sum = 0.0f32;
    let mut score_count = 0u32;
    let mut last_index = 0usize;

    for t in 0..steps {
        let row = &data[t * classes..((t + 1) * classes).min(data.len())];
        let (max_index, max_value) =
            row.iter().enumerate().fold((0usize, f32::MIN), |(bi, bv), (i, &v)| if v > bv { (i, v) } else { (bi, bv) });
        if max_index > 0 && max_index < keys.len() && !(t > 0 && max_index == last_index) {
            text.push_str(&keys[max_index]);
            score_sum += max_value;
            score_count += 1;
        }
        last_index = max_index;
    }

    let score = if score_count == 0 { 0.0 } else { score_sum / score_count as f32 };
    (text, score)
}
