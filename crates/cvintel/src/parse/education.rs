//! Education Parser (C6, §4.6): degree-starter driven record assembly,
//! with an institution-only fallback pass.

use once_cell::sync::OnceCell;
use regex::Regex;

use crate::types::{ConfidenceField, EducationRecord};

const DEGREE_STARTERS: &[&str] =
    &["bachelor", "master", "doctor", "ph.d", "phd", "associate", "diploma", "certificate", "b.s.", "b.a.", "m.s.", "m.a.", "mba"];
const INSTITUTION_INDICATORS: &[&str] =
    &["university", "college", "institute", "school", "academy", "üniversitesi", "universität"];

fn year_pattern() -> &'static Regex {
    static PATTERN: OnceCell<Regex> = OnceCell::new();
    PATTERN.get_or_init(|| Regex::new(r"(19|20)\d{2}").expect("static year pattern is valid"))
}

fn field(value: impl Into<String>, confidence: f32) -> ConfidenceField {
    ConfidenceField::new(value, confidence, "education")
}

fn is_degree_starter(line: &str) -> bool {
    let lower = line.to_lowercase();
    DEGREE_STARTERS.iter().any(|d| lower.starts_with(d))
}

fn is_institution_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    INSTITUTION_INDICATORS.iter().any(|i| lower.contains(i))
}

fn is_bullet(line: &str) -> bool {
    line.starts_with('-') || line.starts_with('•') || line.starts_with('*')
}

fn strip_bullet(line: &str) -> String {
    line.trim_start_matches(['-', '•', '*']).trim().to_string()
}

fn last_year(line: &str) -> Option<String> {
    year_pattern().find_iter(line).last().map(|m| m.as_str().to_string())
}

/// Strip the graduation year and any separator/punctuation left dangling
/// next to it (e.g. `"Stanford University | 2017"` -> `"Stanford
/// University"`), then strip a leading bullet marker.
fn clean_institution(line: &str) -> String {
    let without_year = year_pattern().replace(line, "");
    let trimmed = without_year.trim_end_matches(|c: char| c.is_whitespace() || matches!(c, '|' | ',' | '-' | '\u{2013}' | '\u{2014}'));
    strip_bullet(trimmed)
}

/// Parse an education section's text into [`EducationRecord`]s (§4.6).
pub fn parse_education(section_text: &str) -> Vec<EducationRecord> {
    let lines: Vec<&str> = super::non_empty_lines(section_text);
    let mut records = Vec::new();
    let mut consumed = vec![false; lines.len()];

    let mut i = 0;
    while i < lines.len() {
        if !is_degree_starter(lines[i]) {
            i += 1;
            continue;
        }

        let mut degree_parts = vec![lines[i]];
        consumed[i] = true;
        let mut j = i + 1;
        while j < lines.len() && !is_institution_line(lines[j]) && year_pattern().find(lines[j]).is_none() && !is_bullet(lines[j])
        {
            degree_parts.push(lines[j]);
            consumed[j] = true;
            j += 1;
        }

        let (institution, year) = if j < lines.len() {
            let inst_line = lines[j];
            consumed[j] = true;
            let institution = clean_institution(inst_line);
            let year = last_year(inst_line).or_else(|| lines.get(j + 1).and_then(|l| last_year(l)));
            (institution, year)
        } else {
            (String::new(), None)
        };

        records.push(EducationRecord {
            degree: field(degree_parts.join(" "), 92.0),
            field_of_study: field(String::new(), 50.0),
            institution: field(institution, 88.0),
            graduation_year: field(year.unwrap_or_default(), 95.0),
        });

        i = j + 1;
    }

    // Fallback pass: an institution line with no degree starter within
    // the two preceding non-institution lines.
    for (idx, line) in lines.iter().enumerate() {
        if consumed[idx] || !is_institution_line(line) {
            continue;
        }
        let preceded_by_starter = (1..=2).any(|back| idx.checked_sub(back).map(|p| is_degree_starter(lines[p])).unwrap_or(false));
        if preceded_by_starter {
            continue;
        }
        records.push(EducationRecord {
            degree: field(String::new(), 70.0),
            field_of_study: field(String::new(), 50.0),
            institution: field(clean_institution(line), 88.0),
            graduation_year: field(last_year(line).unwrap_or_default(), 95.0),
        });
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_degree_institution_and_year() {
        let text = "Bachelor of Science in Computer Science\nState University, 2016";
        let records = parse_education(text);
        assert_eq!(records.len(), 1);
        assert!(records[0].degree.value.contains("Bachelor"));
        assert!(records[0].institution.value.contains("State University"));
        assert_eq!(records[0].graduation_year.value, "2016");
    }

    #[test]
    fn institution_name_excludes_trailing_separator() {
        let text = "Master of Science in Computer Science\nStanford University | 2017";
        let records = parse_education(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].institution.value, "Stanford University");
        assert_eq!(records[0].graduation_year.value, "2017");
    }

    #[test]
    fn institution_only_fallback_record() {
        let text = "Some intro text\nTech Institute, 2012";
        let records = parse_education(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].degree.confidence, 70.0);
        assert!(records[0].institution.value.contains("Tech Institute"));
    }

    #[test]
    fn no_education_lines_yields_no_records() {
        assert!(parse_education("nothing relevant here\n").is_empty());
    }
}
