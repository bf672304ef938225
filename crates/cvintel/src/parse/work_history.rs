//! Work History Parser (C5, §4.5): date-anchor driven title/company
//! resolution and responsibility collection.

use once_cell::sync::OnceCell;
use regex::Regex;

use crate::types::{ConfidenceField, JobRecord};

const COMPANY_INDICATORS: &[&str] = &[
    "inc", "ltd", "llc", "corp", "gmbh", "ag", "co.", "company", "solutions", "technologies", "services", "consulting",
    "software", ".com",
];
const TITLE_INDICATORS: &[&str] =
    &["/", "engineer", "developer", "manager", "specialist", "analyst", "consultant", "lead", "senior", "junior", "intern"];

fn month_fragment() -> &'static str {
    r"(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|jun(?:e)?|jul(?:y)?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?"
}

fn date_anchor_pattern() -> &'static Regex {
    static PATTERN: OnceCell<Regex> = OnceCell::new();
    PATTERN.get_or_init(|| {
        let month = month_fragment();
        let pattern = format!(
            r"(?i)(?:(?:{month})\s+)?(?:19|20)\d{{2}}\s*(?:[-\u{{2013}}\u{{2014}}]|\bto\b)\s*(?:(?:{month})\s+)?(?:(?:19|20)\d{{2}}|present|current|now)"
        );
        Regex::new(&pattern).expect("static date-anchor pattern is valid")
    })
}

fn is_month_name(token: &str) -> bool {
    static PATTERN: OnceCell<Regex> = OnceCell::new();
    let re = PATTERN.get_or_init(|| {
        Regex::new(&format!(r"(?i)^{}$", month_fragment())).expect("static month pattern is valid")
    });
    re.is_match(token.trim())
}

fn field(value: impl Into<String>, confidence: f32) -> ConfidenceField {
    ConfidenceField::new(value, confidence, "work_history")
}

/// Parse a work-experience section's text into [`JobRecord`]s, alternating
/// between the `SeekingAnchor`/`CollectingResponsibilities` states
/// described in §4.13.
pub fn parse_work_history(section_text: &str) -> Vec<JobRecord> {
    let lines: Vec<&str> = super::non_empty_lines(section_text);
    let anchor_at: Vec<Option<regex::Match>> = lines.iter().map(|l| date_anchor_pattern().find(l)).collect();

    let mut records = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let Some(date_match) = anchor_at[i] else {
            i += 1;
            continue;
        };

        let (title, company) = resolve_title_company(&lines, i, date_match.as_str());
        let (start_date, end_date) = split_dates(date_match.as_str());

        let mut responsibilities = Vec::new();
        let mut j = i + 1;
        while j < lines.len() && anchor_at[j].is_none() {
            let line = lines[j];
            let starts_bullet = line.starts_with('-') || line.starts_with('•') || line.starts_with('*');
            if responsibilities.is_empty() {
                if starts_bullet {
                    responsibilities.push(line);
                }
            } else {
                responsibilities.push(line);
            }
            j += 1;
        }

        records.push(JobRecord {
            job_title: field(&title, if title.is_empty() { 50.0 } else { 90.0 }),
            company: field(&company, 85.0),
            start_date: field(start_date, 95.0),
            end_date: field(end_date, 95.0),
            responsibilities: field(responsibilities.join("\n"), 80.0),
        });

        i = j;
    }
    records
}

fn split_dates(date_text: &str) -> (String, String) {
    static SPLIT: OnceCell<Regex> = OnceCell::new();
    let re = SPLIT.get_or_init(|| Regex::new(r"(?i)[-\u{2013}\u{2014}]|\bto\b").expect("static date split is valid"));
    let mut parts = re.splitn(date_text, 2);
    let start = parts.next().unwrap_or("").trim().to_string();
    let end = parts.next().unwrap_or("").trim().to_string();
    (start, end)
}

fn resolve_title_company(lines: &[&str], anchor_index: usize, date_text: &str) -> (String, String) {
    let anchor_line = lines[anchor_index];

    // Rule 1: a `|` separator on the anchor line.
    if let Some(pipe_pos) = anchor_line.find('|') {
        let company = anchor_line[..pipe_pos].trim().to_string();
        let title = anchor_index.checked_sub(1).map(|p| lines[p].trim().to_string()).unwrap_or_default();
        return (title, company);
    }

    // Rule 2: meaningful text precedes the date on the same line.
    if let Some(date_pos) = anchor_line.find(date_text) {
        let preceding = anchor_line[..date_pos].trim();
        if !preceding.is_empty() && !is_month_name(preceding) {
            let title = anchor_index.checked_sub(1).map(|p| lines[p].trim().to_string()).unwrap_or_default();
            return (title, preceding.to_string());
        }
    }

    // Rule 3: look back two lines and classify by indicator strength.
    let one_before = anchor_index.checked_sub(1).map(|p| lines[p]);
    let two_before = anchor_index.checked_sub(2).map(|p| lines[p]);

    let score = |line: &str| -> (i32, i32) {
        let lower = line.to_lowercase();
        let company_score = COMPANY_INDICATORS.iter().filter(|ind| lower.contains(*ind)).count() as i32;
        let title_score = TITLE_INDICATORS.iter().filter(|ind| lower.contains(*ind)).count() as i32;
        (company_score, title_score)
    };

    match (two_before, one_before) {
        (Some(two), Some(one)) => {
            let (two_company, two_title) = score(two);
            let (one_company, one_title) = score(one);
            let two_is_company = two_company > two_title;
            let one_is_company = one_company > one_title;

            if one_is_company && !two_is_company {
                (two.trim().to_string(), one.trim().to_string())
            } else if two_is_company && !one_is_company {
                (one.trim().to_string(), two.trim().to_string())
            } else {
                // Tie: line two-before is the title, immediately-before is the company.
                (two.trim().to_string(), one.trim().to_string())
            }
        }
        (None, Some(one)) => (String::new(), one.trim().to_string()),
        _ => (String::new(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pipe_separated_anchor() {
        let text = "Senior Engineer\nAcme Corp | Jan 2019 - Present\n- Built things\n- Shipped things";
        let records = parse_work_history(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].job_title.value, "Senior Engineer");
        assert_eq!(records[0].company.value, "Acme Corp");
        assert!(records[0].start_date.value.to_lowercase().contains("2019"));
        assert!(records[0].end_date.value.to_lowercase().contains("present"));
        assert!(records[0].responsibilities.value.contains("Built things"));
    }

    #[test]
    fn parses_company_before_date_on_same_line() {
        let text = "Backend Developer\nInitech Solutions 2018 - 2020\n- Did work";
        let records = parse_work_history(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].job_title.value, "Backend Developer");
        assert_eq!(records[0].company.value, "Initech Solutions");
    }

    #[test]
    fn two_line_lookback_classifies_by_indicator() {
        let text = "Lead Developer\nGlobex Technologies\n2016 - 2018\n- Led the team";
        let records = parse_work_history(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].company.value, "Globex Technologies");
        assert_eq!(records[0].job_title.value, "Lead Developer");
    }

    #[test]
    fn multiple_anchors_produce_multiple_records() {
        let text = "Engineer\nFoo Inc | 2015 - 2017\n- did X\nManager\nBar LLC | 2017 - 2019\n- did Y";
        let records = parse_work_history(text);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].company.value, "Foo Inc");
        assert_eq!(records[1].company.value, "Bar LLC");
        assert_eq!(records[1].job_title.value, "Manager");
    }
}
