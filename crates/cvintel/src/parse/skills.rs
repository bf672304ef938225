//! Skills Parser (C7, §4.7): truncation, token normalisation and filtering.

use once_cell::sync::OnceCell;
use regex::Regex;

use crate::types::{ConfidenceField, SkillToken};

const TRUNCATE_AT: &[&str] = &[
    "languages", "language", "reference", "references", "certifications", "projects", "hobbies", "interests", "awards",
    "publications",
];

fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceCell<Regex> = OnceCell::new();
    PATTERN.get_or_init(|| Regex::new(r"^\+?[\d\s\-\(\)]{7,}$").expect("static phone pattern is valid"))
}

fn course_code_pattern() -> &'static Regex {
    static PATTERN: OnceCell<Regex> = OnceCell::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z]{2,4}[-\s]?\d{3,4}").expect("static course-code pattern is valid"))
}

fn month_dated_pattern() -> &'static Regex {
    static PATTERN: OnceCell<Regex> = OnceCell::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(?:19|20)\d{2}")
            .expect("static month-dated pattern is valid")
    })
}

fn all_uppercase_word(token: &str) -> bool {
    token.len() > 3 && token.chars().all(|c| c.is_ascii_uppercase())
}

fn truncate_section(lines: &[&str]) -> Vec<&str> {
    let mut out = Vec::new();
    for line in lines {
        if TRUNCATE_AT.contains(&line.to_lowercase().as_str()) {
            break;
        }
        out.push(*line);
    }
    out
}

/// Parse a skills section's text into deduplicated [`SkillToken`]s (§4.7).
pub fn parse_skills(section_text: &str) -> Vec<SkillToken> {
    let lines: Vec<&str> = super::non_empty_lines(section_text);
    let kept = truncate_section(&lines);
    let joined = kept.join("\n");

    let normalized = joined.replace(['•', '·'], ",").replace('\n', ",");

    let mut seen = std::collections::HashSet::new();
    let mut tokens = Vec::new();

    for raw in normalized.split(',') {
        let trimmed = strip_leading_bullet(raw.trim());
        let trimmed = trimmed.trim_matches(|c| c == '(' || c == ')').trim();
        if trimmed.is_empty() || trimmed.chars().count() < 2 {
            continue;
        }
        if trimmed.split_whitespace().count() > 5 {
            continue;
        }
        if phone_pattern().is_match(trimmed) {
            continue;
        }
        if trimmed.contains('@') {
            continue;
        }
        if month_dated_pattern().is_match(trimmed) {
            continue;
        }
        if course_code_pattern().is_match(trimmed) {
            continue;
        }
        let lower = trimmed.to_lowercase();
        if lower.contains("introduction") || lower.starts_with("intro") {
            continue;
        }
        if all_uppercase_word(trimmed) {
            continue;
        }
        if trimmed.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        if TRUNCATE_AT.contains(&lower.as_str()) {
            continue;
        }

        if seen.insert(lower) {
            tokens.push(SkillToken { name: ConfidenceField::new(trimmed, 90.0, "skills"), matched_skill_id: None });
        }
    }

    tokens
}

fn strip_leading_bullet(s: &str) -> &str {
    let trimmed = s.trim_start();
    if let Some(rest) = trimmed.strip_prefix('-') {
        if rest.starts_with(char::is_whitespace) {
            return rest.trim_start();
        }
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_dedupes_comma_separated_skills() {
        let tokens = parse_skills("Rust, Python, Rust, Go");
        let names: Vec<_> = tokens.iter().map(|t| t.name.value.clone()).collect();
        assert_eq!(names, vec!["Rust", "Python", "Go"]);
    }

    #[test]
    fn truncates_at_certifications_header() {
        let tokens = parse_skills("Rust, Python\nCertifications\nAWS Certified Developer");
        let names: Vec<_> = tokens.iter().map(|t| t.name.value.clone()).collect();
        assert_eq!(names, vec!["Rust", "Python"]);
    }

    #[test]
    fn preserves_dashes_inside_tokens() {
        let tokens = parse_skills("REST-API, CI-CD");
        let names: Vec<_> = tokens.iter().map(|t| t.name.value.clone()).collect();
        assert_eq!(names, vec!["REST-API", "CI-CD"]);
    }

    #[test]
    fn filters_phone_and_email_shaped_tokens() {
        let tokens = parse_skills("Rust, +1 555-123-4567, someone@example.com");
        let names: Vec<_> = tokens.iter().map(|t| t.name.value.clone()).collect();
        assert_eq!(names, vec!["Rust"]);
    }
}
