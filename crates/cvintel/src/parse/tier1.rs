//! Tier-1 Parser (C8, §4.8): name, email, phone and location extraction
//! from the document head.

use once_cell::sync::OnceCell;
use regex::Regex;

use crate::error::{PipelineError, Result};
use crate::types::{ConfidenceField, Tier1Profile};

const TECH_DENYLIST: &[&str] = &[
    "selenium", "gauge", "cypress", "python", "javascript", "react", "angular", "java", "nodejs", "docker", "kubernetes",
    "jenkins", "git", "jira", "postman", "appium", "playwright", "testng", "junit", "maven", "gradle", "spring",
];

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceCell<Regex> = OnceCell::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("static email pattern is valid")
    })
}

fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceCell<Regex> = OnceCell::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:[+]?[1-9]\d{0,2}[-.\s]?)?\(?\d{2,4}\)?[-.\s]?\d{2,4}[-.\s]?\d{2,6}")
            .expect("static phone pattern is valid")
    })
}

fn labelled_location_pattern() -> &'static Regex {
    static PATTERN: OnceCell<Regex> = OnceCell::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(?:Location|Address|City|Based in)\s*:\s*(.+)").expect("static labelled-location pattern is valid")
    })
}

fn city_country_pattern() -> &'static Regex {
    static PATTERN: OnceCell<Regex> = OnceCell::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\b([A-Z][a-zA-Z]+(?:\s+[A-Z][a-zA-Z]+)?),\s*([A-Z][a-zA-Z]+|[A-Z]{2})\b")
            .expect("static city-country pattern is valid")
    })
}

fn field(value: impl Into<String>, confidence: f32) -> ConfidenceField {
    ConfidenceField::new(value, confidence, "tier1")
}

fn contains_denied_tech(candidate: &str) -> bool {
    let lower = candidate.to_lowercase();
    TECH_DENYLIST.iter().any(|tech| lower.split(|c: char| !c.is_alphanumeric()).any(|w| w == *tech))
}

/// Extract personal-information fields from the first lines of a
/// document's text (§4.8). Fails with [`PipelineError::no_personal_info`]
/// if nothing could be recognised.
pub fn parse_tier1(text: &str) -> Result<Tier1Profile> {
    let lines: Vec<&str> = super::non_empty_lines(text);

    let mut profile = Tier1Profile::default();

    for line in lines.iter().take(5) {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.len() >= 2 {
            profile.first_name = Some(field(words[0], 98.0));
            profile.last_name = Some(field(*words.last().unwrap(), 95.0));
            break;
        }
    }

    if let Some(m) = email_pattern().find(text) {
        profile.email = Some(field(m.as_str(), 95.0));
    }

    if let Some(m) = phone_pattern().find(text) {
        profile.phone = Some(field(m.as_str(), 88.0));
    }

    for line in lines.iter().take(15) {
        if let Some(caps) = labelled_location_pattern().captures(line) {
            let candidate = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
            if !contains_denied_tech(candidate) {
                profile.location = Some(field(candidate, 90.0));
                break;
            }
        }
    }

    if profile.location.is_none() {
        for line in lines.iter().take(15) {
            if let Some(m) = city_country_pattern().find(line) {
                if !contains_denied_tech(m.as_str()) {
                    profile.location = Some(field(m.as_str(), 85.0));
                    break;
                }
            }
        }
    }

    if profile.is_empty() {
        return Err(PipelineError::no_personal_info());
    }
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_name_email_phone() {
        let text = "Jane Doe\nSoftware Engineer\nEmail: jane.doe@example.com\nPhone: +1 415-555-0134\n";
        let profile = parse_tier1(text).unwrap();
        assert_eq!(profile.first_name.unwrap().value, "Jane");
        assert_eq!(profile.last_name.unwrap().value, "Doe");
        assert_eq!(profile.email.unwrap().value, "jane.doe@example.com");
        assert!(profile.phone.is_some());
    }

    #[test]
    fn prefers_labelled_location() {
        let text = "Jane Doe\nLocation: Berlin, Germany\n";
        let profile = parse_tier1(text).unwrap();
        assert_eq!(profile.location.unwrap().value, "Berlin, Germany");
    }

    #[test]
    fn recognises_city_label() {
        let text = "Jane Doe\nCity: Austin, TX\n";
        let profile = parse_tier1(text).unwrap();
        assert_eq!(profile.location.unwrap().value, "Austin, TX");
    }

    #[test]
    fn rejects_tech_name_as_location() {
        let text = "Jane Doe\nSelenium, Java\n";
        let profile = parse_tier1(text).unwrap();
        assert!(profile.location.is_none());
    }

    #[test]
    fn empty_document_fails_with_no_personal_info() {
        let err = parse_tier1("\n\n").unwrap_err();
        assert!(matches!(err, PipelineError::BadInput(_)));
    }
}
