//! Structured-field parsers (C5-C8, §4.5-§4.8): work history, education,
//! skills and tier-1 personal information.

pub mod education;
pub mod skills;
pub mod tier1;
pub mod work_history;

pub use education::parse_education;
pub use skills::parse_skills;
pub use tier1::parse_tier1;
pub use work_history::parse_work_history;

/// Split a block of text into its non-empty, trimmed lines, the common
/// input shape every parser in this module operates on.
pub(crate) fn non_empty_lines(text: &str) -> Vec<&str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).collect()
}
