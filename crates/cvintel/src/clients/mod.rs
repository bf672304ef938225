//! Outbound clients for the candidate-data backend (§4.13): an OData-style
//! candidate/job fetcher and the SSO token source it authenticates with.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{PipelineError, Result};
use crate::types::CandidateScoringData;

/// Exponential-backoff retry for any outbound call: base delay 1s,
/// multiplier 2, capped at 60s (§4.13).
pub async fn retry<T, F, Fut>(max_attempts: u32, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    const BASE_DELAY: Duration = Duration::from_secs(1);
    const MAX_DELAY: Duration = Duration::from_secs(60);
    const BACKOFF: u32 = 2;

    let mut delay = BASE_DELAY;
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts => {
                tracing::warn!(attempt, max_attempts, error = %err, "outbound call failed, retrying");
                tokio::time::sleep(delay).await;
                delay = (delay * BACKOFF).min(MAX_DELAY);
                attempt += 1;
            }
            Err(err) => {
                tracing::error!(attempts = attempt, error = %err, "outbound call failed, giving up");
                return Err(err);
            }
        }
    }
}

/// A bearer-token source with its own internal expiry-aware caching.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn token(&self) -> Result<Option<String>>;
}

/// SSO client-credentials token source, caching the bearer token until
/// `expires_in - 60s` before refetching (§4.13).
pub struct ClientCredentialsTokenSource {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    cached: tokio::sync::Mutex<Option<CachedToken>>,
}

struct CachedToken {
    token: String,
    expires_at: std::time::Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

impl ClientCredentialsTokenSource {
    pub fn new(token_url: impl Into<String>, client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            cached: tokio::sync::Mutex::new(None),
        }
    }
}

#[async_trait]
impl TokenSource for ClientCredentialsTokenSource {
    async fn token(&self) -> Result<Option<String>> {
        let mut cached = self.cached.lock().await;
        if let Some(existing) = cached.as_ref() {
            if existing.expires_at > std::time::Instant::now() {
                return Ok(Some(existing.token.clone()));
            }
        }

        let response = self
            .http
            .post(&self.token_url)
            .form(&[("grant_type", "client_credentials"), ("client_id", &self.client_id), ("client_secret", &self.client_secret)])
            .send()
            .await
            .map_err(|e| PipelineError::Upstream(format!("token request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(PipelineError::Upstream(format!("token endpoint returned {}", response.status())));
        }

        let parsed: TokenResponse = response.json().await.map_err(|e| PipelineError::Upstream(format!("invalid token response: {e}")))?;
        let expires_at = std::time::Instant::now() + Duration::from_secs(parsed.expires_in.saturating_sub(60));

        let token = parsed.access_token.clone();
        *cached = Some(CachedToken { token: parsed.access_token, expires_at });
        Ok(Some(token))
    }
}

/// Fetches candidate and job-posting data for scoring (§4.13).
#[async_trait]
pub trait CandidateDataClient: Send + Sync {
    async fn get_candidate(&self, candidate_id: &str) -> Result<Option<CandidateScoringData>>;
}

/// OData-style client against the candidate-data backend (§6.3 contract:
/// `GET /api/Candidates('{id}')?$expand=skills($expand=skill),languages,certifications,experiences,educations`).
pub struct ODataCandidateClient<T: TokenSource> {
    http: reqwest::Client,
    base_url: String,
    token_source: Option<T>,
}

impl<T: TokenSource> ODataCandidateClient<T> {
    pub fn new(base_url: impl Into<String>, token_source: Option<T>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into(), token_source }
    }
}

#[derive(Deserialize, Default)]
struct RawSkillWrapper {
    skill: Option<RawNamed>,
}

#[derive(Deserialize, Default)]
struct RawNamed {
    name: Option<String>,
}

#[derive(Deserialize, Default)]
struct RawLanguage {
    language: Option<String>,
    name: Option<String>,
    proficiency: Option<String>,
    level: Option<String>,
}

#[derive(Deserialize, Default)]
struct RawCertification {
    name: Option<String>,
    title: Option<String>,
}

#[derive(Deserialize, Default)]
struct RawExperience {
    #[serde(rename = "durationYears")]
    duration_years: Option<f32>,
    years: Option<f32>,
}

#[derive(Deserialize, Default)]
struct RawEducation {
    #[serde(rename = "degreeLevel")]
    degree_level: Option<String>,
    degree: Option<String>,
}

#[derive(Deserialize, Default)]
struct RawCandidate {
    #[serde(default)]
    skills: Vec<RawSkillWrapper>,
    #[serde(default)]
    languages: Vec<RawLanguage>,
    #[serde(default)]
    certifications: Vec<RawCertification>,
    #[serde(default, rename = "totalExperienceYears")]
    total_experience_years: Option<f32>,
    #[serde(default)]
    experiences: Vec<RawExperience>,
    #[serde(default, rename = "educationLevel")]
    education_level: Option<String>,
    #[serde(default)]
    educations: Vec<RawEducation>,
}

fn transform_candidate(raw: RawCandidate) -> CandidateScoringData {
    let skills = raw.skills.into_iter().filter_map(|s| s.skill.and_then(|sk| sk.name)).collect();

    let languages = raw
        .languages
        .into_iter()
        .filter_map(|lang| {
            let name = lang.language.or(lang.name)?;
            let proficiency = lang.proficiency.or(lang.level).unwrap_or_else(|| "basic".to_string());
            Some((name, proficiency))
        })
        .collect();

    let certifications = raw.certifications.into_iter().filter_map(|c| c.name.or(c.title)).collect();

    let experience_years = raw.total_experience_years.filter(|y| *y > 0.0).unwrap_or_else(|| {
        raw.experiences.iter().map(|e| e.duration_years.or(e.years).unwrap_or(0.0)).sum()
    });

    let education_level = raw
        .education_level
        .filter(|l| !l.is_empty())
        .or_else(|| raw.educations.iter().find_map(|e| e.degree_level.clone().or_else(|| e.degree.clone())))
        .unwrap_or_default();

    CandidateScoringData { skills, languages, certifications, experience_years, education_level }
}

#[async_trait]
impl<T: TokenSource> CandidateDataClient for ODataCandidateClient<T> {
    async fn get_candidate(&self, candidate_id: &str) -> Result<Option<CandidateScoringData>> {
        let token = match &self.token_source {
            Some(source) => source.token().await?,
            None => None,
        };

        let url = format!("{}/api/Candidates('{candidate_id}')", self.base_url);
        let mut request = self.http.get(&url).query(&[("$expand", "skills($expand=skill),languages,certifications,experiences,educations")]);
        if let Some(bearer) = &token {
            request = request.bearer_auth(bearer);
        }

        let response = retry(3, || async {
            request
                .try_clone()
                .ok_or_else(|| PipelineError::Internal("candidate request could not be cloned for retry".into()))?
                .send()
                .await
                .map_err(|e| PipelineError::Upstream(format!("candidate fetch failed: {e}")))
        })
        .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(PipelineError::Upstream(format!("candidate-data backend returned {}", response.status())));
        }

        let raw: RawCandidate = response.json().await.map_err(|e| PipelineError::Upstream(format!("invalid candidate response: {e}")))?;
        Ok(Some(transform_candidate(raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_falls_back_to_experience_entries_when_total_is_missing() {
        let raw = RawCandidate {
            total_experience_years: None,
            experiences: vec![RawExperience { duration_years: Some(2.0), years: None }, RawExperience { duration_years: None, years: Some(1.5) }],
            ..Default::default()
        };
        let data = transform_candidate(raw);
        assert_eq!(data.experience_years, 3.5);
    }

    #[test]
    fn transform_falls_back_to_first_education_entry() {
        let raw = RawCandidate {
            education_level: None,
            educations: vec![RawEducation { degree_level: None, degree: Some("bachelor".to_string()) }],
            ..Default::default()
        };
        let data = transform_candidate(raw);
        assert_eq!(data.education_level, "bachelor");
    }

    #[tokio::test]
    async fn retry_succeeds_after_transient_failures() {
        let attempts = std::sync::atomic::AtomicU32::new(0);
        let result: Result<u32> = retry(3, || {
            let n = attempts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            async move { if n < 2 { Err(PipelineError::Upstream("transient".into())) } else { Ok(42) } }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
    }
}
