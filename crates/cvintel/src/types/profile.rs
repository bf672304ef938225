//! Structured-extraction output types (§3): section spans through the
//! final [`StructuredCandidate`].

use serde::{Deserialize, Serialize};

/// A canonical section name (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum SectionName {
    WorkExperience,
    Education,
    Skills,
}

/// A byte-range in the reconstructed document text attributed to one
/// canonical section (§3 SectionSpan).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
pub struct SectionSpan {
    pub name: SectionName,
    pub start: usize,
    pub end: usize,
}

/// A single confidence-bearing field, the unit the rest of the data model
/// is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
pub struct ConfidenceField {
    pub value: String,
    pub confidence: f32,
    pub source: String,
}

impl ConfidenceField {
    pub fn new(value: impl Into<String>, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            confidence: confidence.clamp(0.0, 100.0),
            source: source.into(),
        }
    }
}

/// Personal information extracted from the document head (§3, §4.8).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
pub struct Tier1Profile {
    pub first_name: Option<ConfidenceField>,
    pub last_name: Option<ConfidenceField>,
    pub email: Option<ConfidenceField>,
    pub phone: Option<ConfidenceField>,
    pub location: Option<ConfidenceField>,
}

impl Tier1Profile {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.location.is_none()
    }

    /// Arithmetic mean of present field confidences, 0 if none are present.
    pub fn overall_confidence(&self) -> f32 {
        let fields = [&self.first_name, &self.last_name, &self.email, &self.phone, &self.location];
        let present: Vec<f32> = fields.iter().filter_map(|f| f.as_ref().map(|c| c.confidence)).collect();
        if present.is_empty() {
            0.0
        } else {
            present.iter().sum::<f32>() / present.len() as f32
        }
    }
}

/// A structured work-history entry (§3 JobRecord).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
pub struct JobRecord {
    pub job_title: ConfidenceField,
    pub company: ConfidenceField,
    pub start_date: ConfidenceField,
    pub end_date: ConfidenceField,
    pub responsibilities: ConfidenceField,
}

/// A structured education entry (§3 EducationRecord).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
pub struct EducationRecord {
    pub degree: ConfidenceField,
    pub field_of_study: ConfidenceField,
    pub institution: ConfidenceField,
    pub graduation_year: ConfidenceField,
}

/// A deduplicated, filtered skill token (§3 SkillToken).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
pub struct SkillToken {
    pub name: ConfidenceField,
    pub matched_skill_id: Option<String>,
}

/// The raw section text the structured fields were parsed from, kept for
/// debugging/audit purposes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
pub struct RawSections {
    pub experience: Option<String>,
    pub education: Option<String>,
}

/// The complete structured-extraction output for one résumé (§3
/// StructuredCandidate).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "api", derive(utoipa::ToSchema))]
pub struct StructuredCandidate {
    pub overall_confidence: f32,
    pub tier1: Tier1Profile,
    pub work_history: Vec<JobRecord>,
    pub education: Vec<EducationRecord>,
    pub skills: Vec<SkillToken>,
    pub raw_sections: RawSections,
}
