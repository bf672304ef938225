//! Section Locator (C4, §4.4): fuzzy section-header detection and
//! byte-span assignment over the reconstructed document text.

use crate::types::SectionName;

const DEGREE_PREFIXES: &[&str] =
    &["bachelor", "master", "doctor", "associate", "diploma", "certificate", "b.s.", "m.s.", "ph.d."];

const SECTIONS: &[(SectionName, &[&str])] = &[
    (SectionName::WorkExperience, &["work experience", "work history", "employment history", "experience", "employment"]),
    (SectionName::Education, &["education", "academic background", "qualifications", "academic"]),
    (SectionName::Skills, &["skills", "technical skills", "competencies", "technologies", "expertise"]),
];

fn normalize(s: &str) -> String {
    s.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Longest-common-subsequence ratio, matching the definition behind
/// Python's `difflib.SequenceMatcher.ratio()`: `2*M / T` where `M` is the
/// length of the longest common subsequence and `T` is the combined
/// length of both strings.
fn lcs_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let (n, m) = (a.len(), b.len());
    let mut prev = vec![0usize; m + 1];
    let mut curr = vec![0usize; m + 1];
    for i in 1..=n {
        for j in 1..=m {
            curr[j] = if a[i - 1] == b[j - 1] { prev[j - 1] + 1 } else { prev[j].max(curr[j - 1]) };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    let lcs_len = prev[m];
    (2 * lcs_len) as f64 / (n + m) as f64
}

/// Whether `line` is a header for canonical `pattern`, per the three-test
/// fuzzy match and the reject rules in §4.4.
fn matches_header(line: &str, pattern: &str) -> bool {
    let norm_line = normalize(line);
    let norm_pattern = normalize(pattern);

    if norm_line.len() as f64 > norm_pattern.len() as f64 * 3.0 {
        return false;
    }
    if DEGREE_PREFIXES.iter().any(|d| norm_line.starts_with(d)) {
        return false;
    }

    // Test 1: contains, gated on coverage + shared prefix.
    if norm_line.contains(&norm_pattern) {
        let coverage = norm_pattern.len() as f64 / norm_line.len().max(1) as f64;
        let prefix_len = norm_pattern.chars().count().min(4);
        let pattern_prefix: String = norm_pattern.chars().take(prefix_len).collect();
        if coverage >= 0.6 && norm_line.starts_with(&pattern_prefix) {
            return true;
        }
    }

    // Test 2: merged-word match (spaces stripped from both sides).
    let merged_line: String = norm_line.chars().filter(|c| !c.is_whitespace()).collect();
    let merged_pattern: String = norm_pattern.chars().filter(|c| !c.is_whitespace()).collect();
    if !merged_pattern.is_empty() && merged_line.contains(&merged_pattern) {
        return true;
    }

    // Test 3: sequence similarity.
    lcs_ratio(&norm_line, &norm_pattern) >= 0.75
}

/// Decide whether `line` is a header for any canonical section, returning
/// the matched section if so.
fn classify_header(line: &str) -> Option<SectionName> {
    if line.trim().is_empty() {
        return None;
    }
    for (name, patterns) in SECTIONS {
        if patterns.iter().any(|p| matches_header(line, p)) {
            return Some(*name);
        }
    }
    None
}

/// A detected header: the byte offset its own line starts at, and the
/// offset just past it where its body begins.
struct Header {
    name: SectionName,
    line_start: usize,
    body_start: usize,
}

/// Scan `text` line by line for section headers and emit a span for each,
/// running from just after the header to just before the next header's
/// own line (or end-of-text). A document with no headers produces no
/// spans (§4.4).
pub fn locate_sections(text: &str) -> Vec<crate::types::SectionSpan> {
    let mut headers = Vec::new();
    let mut offset = 0usize;
    for raw_line in text.split_inclusive('\n') {
        let trimmed = raw_line.trim_end_matches('\n').trim_end_matches('\r');
        if let Some(name) = classify_header(trimmed) {
            headers.push(Header { name, line_start: offset, body_start: offset + raw_line.len() });
        }
        offset += raw_line.len();
    }

    let mut spans = Vec::with_capacity(headers.len());
    for (i, header) in headers.iter().enumerate() {
        let end = headers.get(i + 1).map(|h| h.line_start).unwrap_or(text.len());
        spans.push(crate::types::SectionSpan { name: header.name, start: header.body_start, end });
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_canonical_headers_and_spans() {
        let text = "John Doe\n\nWork Experience\nEngineer at Acme\n\nEducation\nBSc Computer Science\n";
        let spans = locate_sections(text);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].name, SectionName::WorkExperience);
        assert_eq!(&text[spans[0].start..spans[0].end], "Engineer at Acme\n\n");
        assert_eq!(spans[1].name, SectionName::Education);
        assert_eq!(&text[spans[1].start..spans[1].end], "BSc Computer Science\n");
    }

    #[test]
    fn no_headers_yields_no_spans() {
        assert!(locate_sections("just some plain text\nwith no section headers\n").is_empty());
    }

    #[test]
    fn rejects_degree_line_as_header() {
        assert!(classify_header("Bachelor of Education, State University").is_none());
    }

    #[test]
    fn accepts_merged_word_header() {
        assert_eq!(classify_header("WORKEXPERIENCE"), Some(SectionName::WorkExperience));
    }

    #[test]
    fn lcs_ratio_identical_strings_is_one() {
        assert_eq!(lcs_ratio("skills", "skills"), 1.0);
    }
}
