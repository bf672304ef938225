//! Scoring Engine (C10, §4.10): per-criterion evaluation against a
//! normalised candidate profile, with multilingual skill synonyms and
//! an education-level hierarchy.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::types::{CandidateScoringData, CriteriaType, CriterionResult, ScoringCriterion, ScoringResult};

const EDUCATION_LEVELS: &[&str] = &["high_school", "associate", "bachelor", "master", "doctorate", "phd"];

static LANGUAGE_PROFICIENCY_SCORES: Lazy<HashMap<&'static str, f32>> = Lazy::new(|| {
    HashMap::from([
        ("native", 1.0),
        ("fluent", 0.9),
        ("professional", 0.7),
        ("intermediate", 0.5),
        ("basic", 0.3),
        ("beginner", 0.2),
        ("muttersprachler", 1.0),
        ("fließend", 0.9),
        ("verhandlungssicher", 0.8),
        ("fortgeschritten", 0.6),
        ("grundkenntnisse", 0.3),
        ("anadil", 1.0),
        ("akıcı", 0.9),
        ("ileri", 0.7),
        ("orta", 0.5),
        ("başlangıç", 0.2),
    ])
});

static SKILL_SYNONYMS: Lazy<HashMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    HashMap::from([
        ("javascript", vec!["js", "ecmascript", "es6", "es2015"]),
        ("typescript", vec!["ts"]),
        ("python", vec!["py", "python3"]),
        ("java", vec!["j2ee", "jee"]),
        ("c++", vec!["cpp", "cplusplus"]),
        ("c#", vec!["csharp", "c sharp", "dotnet", ".net"]),
        ("react", vec!["reactjs", "react.js"]),
        ("angular", vec!["angularjs", "angular.js"]),
        ("vue", vec!["vuejs", "vue.js"]),
        ("nodejs", vec!["node", "node.js"]),
        ("express", vec!["expressjs", "express.js"]),
        ("sap", vec!["sap erp", "sap ag"]),
        ("abap", vec!["abap/4"]),
        ("fiori", vec!["sap fiori", "sapui5", "ui5"]),
        ("hana", vec!["sap hana", "s/4hana", "s4hana"]),
        ("btp", vec!["sap btp", "business technology platform", "cloud foundry"]),
        ("softwareentwicklung", vec!["software development", "yazılım geliştirme"]),
        ("datenbanken", vec!["databases", "veritabanı"]),
        ("programmierung", vec!["programming", "programlama"]),
        ("projektmanagement", vec!["project management", "proje yönetimi"]),
        ("yazılım", vec!["software"]),
        ("veri analizi", vec!["data analysis", "datenanalyse"]),
        ("web geliştirme", vec!["web development", "webentwicklung"]),
        ("aws", vec!["amazon web services", "amazon aws"]),
        ("azure", vec!["microsoft azure", "ms azure"]),
        ("gcp", vec!["google cloud", "google cloud platform"]),
        ("machine learning", vec!["ml", "makine öğrenimi", "maschinelles lernen"]),
        ("deep learning", vec!["dl", "derin öğrenme"]),
        ("data science", vec!["datenwissenschaft", "veri bilimi"]),
        ("artificial intelligence", vec!["ai", "ki", "künstliche intelligenz", "yapay zeka"]),
    ])
});

fn normalized(s: &str) -> String {
    s.to_lowercase().trim().to_string()
}

fn education_rank(level: &str) -> usize {
    let level = normalized(level);
    if level.is_empty() {
        return 0;
    }
    if let Some(pos) = EDUCATION_LEVELS.iter().position(|l| *l == level) {
        return pos + 1;
    }
    for (i, edu) in EDUCATION_LEVELS.iter().enumerate() {
        if level.contains(edu) || edu.contains(level.as_str()) {
            return i + 1;
        }
    }
    0
}

fn check_education_match(candidate_level: &str, required_level: &str) -> bool {
    let cand = education_rank(candidate_level);
    let req = education_rank(required_level);
    cand > 0 && cand >= req
}

fn check_skill_match(required_skill: &str, candidate_skills: &[String]) -> (bool, String) {
    if candidate_skills.iter().any(|s| s == required_skill) {
        return (true, "found (exact match)".to_string());
    }

    for candidate_skill in candidate_skills {
        if candidate_skill.contains(required_skill) || required_skill.contains(candidate_skill.as_str()) {
            return (true, format!("found (partial match: '{candidate_skill}')"));
        }
    }

    for (canonical, synonyms) in SKILL_SYNONYMS.iter() {
        let mut variants = vec![*canonical];
        variants.extend(synonyms.iter().copied());

        let required_is_variant = variants.contains(&required_skill) || variants.iter().any(|v| required_skill.contains(v));
        if !required_is_variant {
            continue;
        }

        for variant in &variants {
            if candidate_skills.iter().any(|s| s == variant) {
                return (true, format!("found (synonym match: '{variant}')"));
            }
            for candidate_skill in candidate_skills {
                if candidate_skill.contains(variant) || variant.contains(candidate_skill.as_str()) {
                    return (true, format!("found (synonym partial: '{candidate_skill}')"));
                }
            }
        }
    }

    (false, "not found".to_string())
}

struct Evaluation {
    matched: bool,
    points: u32,
    details: String,
}

fn evaluate_skill(value: &str, points_possible: u32, skills: &[String]) -> Evaluation {
    let (matched, detail) = check_skill_match(value, skills);
    Evaluation { matched, points: if matched { points_possible } else { 0 }, details: format!("Skill '{value}' {detail}") }
}

fn evaluate_language(value: &str, points_possible: u32, languages: &HashMap<String, String>) -> Evaluation {
    match languages.get(value) {
        Some(proficiency) => {
            let multiplier = LANGUAGE_PROFICIENCY_SCORES.get(proficiency.as_str()).copied().unwrap_or(0.5);
            let points = (points_possible as f32 * multiplier) as u32;
            Evaluation { matched: true, points, details: format!("Language '{value}' at {proficiency} level") }
        }
        None => Evaluation { matched: false, points: 0, details: format!("Language '{value}' not found") },
    }
}

fn evaluate_certification(value: &str, points_possible: u32, certifications: &[String]) -> Evaluation {
    let matched = certifications.iter().any(|c| c == value || c.contains(value));
    Evaluation {
        matched,
        points: if matched { points_possible } else { 0 },
        details: format!("Certification '{value}' {}", if matched { "found" } else { "not found" }),
    }
}

fn evaluate_experience(criterion: &ScoringCriterion, points_possible: u32, experience_years: f32) -> Evaluation {
    let min_years = criterion.min_value.unwrap_or_else(|| criterion.value.parse().unwrap_or(0)) as f32;

    if experience_years >= min_years {
        if let Some(per_unit) = criterion.per_unit_points {
            let mut points = (experience_years * per_unit) as u32;
            if let Some(cap) = criterion.max_points {
                points = points.min(cap);
            }
            return Evaluation { matched: true, points, details: format!("{experience_years} years experience ({points} points)") };
        }
        return Evaluation { matched: true, points: points_possible, details: format!("{experience_years} years meets {min_years} year requirement") };
    }

    if experience_years > 0.0 && !criterion.required && min_years > 0.0 {
        let partial = (points_possible as f32 * (experience_years / min_years)) as u32;
        return Evaluation {
            matched: false,
            points: partial,
            details: format!("{experience_years} years below {min_years} year requirement (partial credit)"),
        };
    }

    Evaluation { matched: false, points: 0, details: format!("{experience_years} years below {min_years} year requirement") }
}

fn evaluate_education(criterion: &ScoringCriterion, points_possible: u32, education_level: &str) -> Evaluation {
    let required_level = &criterion.value;
    if check_education_match(education_level, required_level) {
        return Evaluation { matched: true, points: points_possible, details: format!("Education '{education_level}' meets '{required_level}' requirement") };
    }

    let cand_rank = education_rank(education_level);
    let req_rank = education_rank(required_level);
    if cand_rank > 0 && req_rank > 0 {
        let partial = (points_possible as f32 * (cand_rank as f32 / req_rank as f32)) as u32;
        let points = if !criterion.required { partial } else { 0 };
        return Evaluation { matched: false, points, details: format!("Education '{education_level}' below '{required_level}'") };
    }

    Evaluation { matched: false, points: 0, details: "Education level not matched".to_string() }
}

fn evaluate_criterion(criterion: &ScoringCriterion, candidate: &CandidateScoringData) -> Evaluation {
    let value = normalized(&criterion.value);
    let points_possible = criterion.points_possible();

    match criterion.criteria_type {
        CriteriaType::Skill => evaluate_skill(&value, points_possible, &candidate.skills),
        CriteriaType::Language => evaluate_language(&value, points_possible, &candidate.languages),
        CriteriaType::Certification => evaluate_certification(&value, points_possible, &candidate.certifications),
        CriteriaType::Experience => evaluate_experience(criterion, points_possible, candidate.experience_years),
        CriteriaType::Education => evaluate_education(criterion, points_possible, &candidate.education_level),
        CriteriaType::Custom => Evaluation { matched: false, points: 0, details: "Unknown criteria type: custom".to_string() },
    }
}

fn normalize_candidate(data: &CandidateScoringData) -> CandidateScoringData {
    CandidateScoringData {
        skills: data.skills.iter().map(|s| normalized(s)).collect(),
        languages: data.languages.iter().map(|(k, v)| (normalized(k), normalized(v))).collect(),
        certifications: data.certifications.iter().map(|c| normalized(c)).collect(),
        experience_years: data.experience_years,
        education_level: normalized(&data.education_level),
    }
}

/// Score a candidate against a job's criteria (§4.10). An empty
/// criteria list scores 100% with nothing matched or missing.
pub fn calculate_score(candidate_data: &CandidateScoringData, criteria: &[ScoringCriterion]) -> ScoringResult {
    if criteria.is_empty() {
        return ScoringResult { total_points: 0, max_points: 0, percentage: 100.0, matched: Vec::new(), missing: Vec::new(), required_missing: Vec::new(), disqualified: false, reason: None };
    }

    let candidate = normalize_candidate(candidate_data);

    let mut matched = Vec::new();
    let mut missing = Vec::new();
    let mut required_missing = Vec::new();
    let mut total_points = 0u32;
    let mut max_points = 0u32;

    for criterion in criteria {
        let points_possible = criterion.points_possible();
        max_points += points_possible;

        let evaluation = evaluate_criterion(criterion, &candidate);
        let result = CriterionResult {
            criteria_type: criterion.criteria_type,
            value: criterion.value.clone(),
            points_possible,
            points_earned: evaluation.points,
            required: criterion.required,
            matched: evaluation.matched,
            details: evaluation.details,
        };

        if evaluation.matched {
            total_points += evaluation.points;
            matched.push(result);
        } else {
            if criterion.required {
                required_missing.push(result.clone());
            }
            missing.push(result);
        }
    }

    let percentage = if max_points > 0 { (total_points as f32 / max_points as f32) * 100.0 } else { 0.0 };
    let disqualified = !required_missing.is_empty();
    let reason = disqualified.then(|| {
        let names: Vec<&str> = required_missing.iter().take(3).map(|c| c.value.as_str()).collect();
        format!("Missing required criteria: {}", names.join(", "))
    });

    ScoringResult {
        total_points,
        max_points,
        percentage: (percentage * 100.0).round() / 100.0,
        matched,
        missing,
        required_missing,
        disqualified,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criterion(criteria_type: CriteriaType, value: &str, points: u32, required: bool) -> ScoringCriterion {
        ScoringCriterion { criteria_type, value: value.to_string(), points, required, weight: 1.0, min_value: None, per_unit_points: None, max_points: None, sort_order: 0 }
    }

    fn candidate() -> CandidateScoringData {
        CandidateScoringData {
            skills: vec!["rust".to_string(), "js".to_string()],
            languages: HashMap::from([("english".to_string(), "fluent".to_string())]),
            certifications: vec!["aws certified developer".to_string()],
            experience_years: 4.0,
            education_level: "bachelor".to_string(),
        }
    }

    #[test]
    fn empty_criteria_scores_full_marks() {
        let result = calculate_score(&candidate(), &[]);
        assert_eq!(result.percentage, 100.0);
        assert!(!result.disqualified);
    }

    #[test]
    fn skill_synonym_matches_across_spelling() {
        let criteria = vec![criterion(CriteriaType::Skill, "javascript", 10, false)];
        let result = calculate_score(&candidate(), &criteria);
        assert_eq!(result.matched.len(), 1);
        assert_eq!(result.total_points, 10);
    }

    #[test]
    fn missing_required_criterion_disqualifies() {
        let criteria = vec![criterion(CriteriaType::Skill, "kotlin", 10, true)];
        let result = calculate_score(&candidate(), &criteria);
        assert!(result.disqualified);
        assert_eq!(result.required_missing.len(), 1);
    }

    #[test]
    fn language_proficiency_scales_points() {
        let criteria = vec![criterion(CriteriaType::Language, "english", 10, false)];
        let result = calculate_score(&candidate(), &criteria);
        assert_eq!(result.total_points, 9);
    }

    #[test]
    fn education_below_requirement_gets_partial_credit_when_optional() {
        let criteria = vec![criterion(CriteriaType::Education, "doctorate", 10, false)];
        let result = calculate_score(&candidate(), &criteria);
        assert!(!result.matched.iter().any(|c| c.value == "doctorate"));
        assert!(result.missing[0].points_earned > 0);
    }

    #[test]
    fn experience_below_threshold_required_scores_zero() {
        let criteria = vec![criterion(CriteriaType::Experience, "6", 10, true)];
        let result = calculate_score(&candidate(), &criteria);
        assert!(result.disqualified);
        assert_eq!(result.required_missing[0].points_earned, 0);
    }
}
