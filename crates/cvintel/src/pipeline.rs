//! Orchestrates C3-C8 into the structured-extraction half of the data
//! flow in §2: `(lines, text) → (C3 → C4 → {C5,C6,C7}) + C8 →
//! StructuredCandidate`. [`extract_structured_document`] additionally
//! drives C1-C2 when OCR support is compiled in.

use crate::error::Result;
use crate::layout::{split_columns, DEFAULT_COLUMN_THRESHOLD};
use crate::parse::{parse_education, parse_skills, parse_tier1, parse_work_history};
use crate::sections::locate_sections;
use crate::types::{OcrLine, RawSections, SectionName, StructuredCandidate};

/// Run C3-C8 over OCR lines with geometry: split columns, then hand the
/// reconstructed text to [`structured_candidate_from_text`].
pub fn structured_candidate_from_lines(lines: &[OcrLine]) -> Result<StructuredCandidate> {
    let text = if lines.is_empty() {
        String::new()
    } else {
        let columns = split_columns(lines, DEFAULT_COLUMN_THRESHOLD);
        if columns.right.is_empty() {
            columns.left
        } else {
            format!("{}\n{}", columns.left, columns.right)
        }
    };
    structured_candidate_from_text(&text)
}

/// Run C4-C8 over already-reconstructed text (no line geometry available,
/// e.g. a text-only submission, per §4.3's column-splitter skip path).
pub fn structured_candidate_from_text(text: &str) -> Result<StructuredCandidate> {
    let spans = locate_sections(text);

    let mut experience_text = None;
    let mut education_text = None;
    let mut skills_text = None;
    for span in &spans {
        let slice = text.get(span.start..span.end).unwrap_or_default();
        match span.name {
            SectionName::WorkExperience => experience_text = Some(slice.to_string()),
            SectionName::Education => education_text = Some(slice.to_string()),
            SectionName::Skills => skills_text = Some(slice.to_string()),
        }
    }

    let work_history = experience_text.as_deref().map(parse_work_history).unwrap_or_default();
    let education = education_text.as_deref().map(parse_education).unwrap_or_default();
    let skills = skills_text.as_deref().map(parse_skills).unwrap_or_default();
    let tier1 = parse_tier1(text)?;

    Ok(StructuredCandidate {
        overall_confidence: tier1.overall_confidence(),
        tier1,
        work_history,
        education,
        skills,
        raw_sections: RawSections { experience: experience_text, education: education_text },
    })
}

/// Decode `bytes` as `kind`, OCR every page on the blocking pool (§5),
/// and run the structured-extraction chain over the result.
#[cfg(feature = "ocr")]
pub async fn extract_structured_document(bytes: Vec<u8>, kind: crate::image::DocumentKind, registry: &crate::ocr::registry::OcrBackendRegistry) -> Result<(Vec<OcrLine>, StructuredCandidate)> {
    let pages = tokio::task::spawn_blocking(move || crate::image::decode_document(&bytes, kind))
        .await
        .map_err(|e| crate::error::PipelineError::Internal(format!("document decode task panicked: {e}")))??;

    let mut lines = Vec::new();
    for (index, page) in pages.iter().enumerate() {
        lines.extend(registry.extract_lines(page, index as u32).await?);
    }

    let candidate = structured_candidate_from_lines(&lines)?;
    Ok((lines, candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Polygon;

    fn line(text: &str, left: f32, top: f32) -> OcrLine {
        OcrLine::new(text, 95.0, Polygon::from_rect(left, top, 50.0, 10.0), 0)
    }

    #[test]
    fn empty_lines_yield_no_personal_info_error() {
        let err = structured_candidate_from_lines(&[]).unwrap_err();
        assert!(matches!(err, crate::error::PipelineError::BadInput(_)));
    }

    #[test]
    fn single_column_text_round_trips_through_sections() {
        let lines = vec![
            line("Jane Doe", 10.0, 0.0),
            line("jane.doe@example.com", 10.0, 10.0),
            line("Skills", 10.0, 20.0),
            line("Rust, Python", 10.0, 30.0),
        ];
        let result = structured_candidate_from_lines(&lines).unwrap();
        assert!(result.tier1.email.is_some());
    }
}
