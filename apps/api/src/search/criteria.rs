//! Input normalizer: raw form values in, [`SearchCriteria`] out, plus the
//! required-field gate that decides whether a search may be dispatched.

use serde::Serialize;

use crate::search::resume::ResumeUpload;

/// Slider default on the search form.
pub const DEFAULT_MIN_MATCH_SCORE: u8 = 44;

/// Seniority tiers offered by the experience multi-select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExperienceLevel {
    Internship,
    Entry,
    Mid,
    Senior,
}

impl ExperienceLevel {
    pub const ALL: [ExperienceLevel; 4] = [
        ExperienceLevel::Internship,
        ExperienceLevel::Entry,
        ExperienceLevel::Mid,
        ExperienceLevel::Senior,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ExperienceLevel::Internship => "Internship",
            ExperienceLevel::Entry => "Entry Level",
            ExperienceLevel::Mid => "Mid Level",
            ExperienceLevel::Senior => "Senior Level",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            ExperienceLevel::Internship => "1",
            ExperienceLevel::Entry => "2",
            ExperienceLevel::Mid => "3",
            ExperienceLevel::Senior => "4",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.label() == label)
    }
}

/// "Date posted" recency windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DatePosted {
    OneHour,
    TwoHours,
    ThreeHours,
    SixHours,
    Last24Hours,
    PastWeek,
    Last30Days,
}

impl DatePosted {
    pub const ALL: [DatePosted; 7] = [
        DatePosted::OneHour,
        DatePosted::TwoHours,
        DatePosted::ThreeHours,
        DatePosted::SixHours,
        DatePosted::Last24Hours,
        DatePosted::PastWeek,
        DatePosted::Last30Days,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DatePosted::OneHour => "1hr",
            DatePosted::TwoHours => "2hr",
            DatePosted::ThreeHours => "3hr",
            DatePosted::SixHours => "6hr",
            DatePosted::Last24Hours => "Last 24hr",
            DatePosted::PastWeek => "Past Week",
            DatePosted::Last30Days => "Last 30 days",
        }
    }

    /// Recency code understood by the search backend (`r<seconds>`).
    pub fn code(self) -> &'static str {
        match self {
            DatePosted::OneHour => "r3600",
            DatePosted::TwoHours => "r7200",
            DatePosted::ThreeHours => "r10800",
            DatePosted::SixHours => "r21600",
            DatePosted::Last24Hours => "r86400",
            DatePosted::PastWeek => "r604800",
            DatePosted::Last30Days => "r2592000",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.label() == label)
    }
}

/// Raw values exactly as submitted on the search form.
///
/// Labels are already resolved to their enums at parse time; free text is not
/// yet split.
#[derive(Debug, Clone)]
pub struct SearchForm {
    pub job_titles: String,
    pub locations: String,
    pub experience_levels: Vec<ExperienceLevel>,
    pub date_posted: Option<DatePosted>,
    pub easy_apply: bool,
    pub under_10_applicants: bool,
    pub min_match_score: u8,
    pub resume: Option<ResumeUpload>,
}

impl Default for SearchForm {
    fn default() -> Self {
        SearchForm {
            job_titles: String::new(),
            locations: String::new(),
            experience_levels: Vec::new(),
            date_posted: None,
            easy_apply: false,
            under_10_applicants: false,
            min_match_score: DEFAULT_MIN_MATCH_SCORE,
            resume: None,
        }
    }
}

/// Normalized search filters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchCriteria {
    pub job_titles: Vec<String>,
    pub locations: Vec<String>,
    pub experience_levels: Vec<ExperienceLevel>,
    /// Comma-joined experience codes in selection order, e.g. `"2,4"`.
    pub experience_codes: String,
    pub date_posted: Option<DatePosted>,
    pub easy_apply: bool,
    pub under_10_applicants: bool,
    pub min_match_score: u8,
}

impl SearchCriteria {
    pub fn date_code(&self) -> &'static str {
        self.date_posted.map(DatePosted::code).unwrap_or("")
    }
}

impl SearchForm {
    /// Builds the normalized criteria. Never fails: empty input simply yields
    /// empty lists, which the required-field check reports.
    pub fn normalize(&self) -> SearchCriteria {
        SearchCriteria {
            job_titles: split_comma_list(&self.job_titles),
            locations: split_comma_list(&self.locations),
            experience_levels: self.experience_levels.clone(),
            experience_codes: experience_codes(&self.experience_levels),
            date_posted: self.date_posted,
            easy_apply: self.easy_apply,
            under_10_applicants: self.under_10_applicants,
            min_match_score: self.min_match_score,
        }
    }
}

/// Splits comma-separated text into trimmed, non-empty tokens, keeping order.
pub fn split_comma_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

pub fn experience_codes(levels: &[ExperienceLevel]) -> String {
    levels
        .iter()
        .map(|level| level.code())
        .collect::<Vec<_>>()
        .join(",")
}

/// Inputs that must be present before a search is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
    JobTitles,
    Locations,
    Experience,
    DatePosted,
    Resume,
    ApiKey,
}

impl RequiredField {
    pub fn label(self) -> &'static str {
        match self {
            RequiredField::JobTitles => "job titles",
            RequiredField::Locations => "locations",
            RequiredField::Experience => "experience level",
            RequiredField::DatePosted => "date posted",
            RequiredField::Resume => "resume",
            RequiredField::ApiKey => "API key",
        }
    }
}

/// A search that passed the required-field gate and may be dispatched.
#[derive(Debug, Clone)]
pub struct ReadySearch {
    pub criteria: SearchCriteria,
    pub resume: ResumeUpload,
    pub api_key: String,
}

/// Lists every required input that is missing, in form order.
pub fn missing_fields(
    criteria: &SearchCriteria,
    resume: Option<&ResumeUpload>,
    api_key: Option<&str>,
) -> Vec<RequiredField> {
    let mut missing = Vec::new();
    if criteria.job_titles.is_empty() {
        missing.push(RequiredField::JobTitles);
    }
    if criteria.locations.is_empty() {
        missing.push(RequiredField::Locations);
    }
    if criteria.experience_levels.is_empty() {
        missing.push(RequiredField::Experience);
    }
    if criteria.date_posted.is_none() {
        missing.push(RequiredField::DatePosted);
    }
    if resume.map_or(true, |r| r.bytes.is_empty()) {
        missing.push(RequiredField::Resume);
    }
    if api_key.map_or(true, |k| k.trim().is_empty()) {
        missing.push(RequiredField::ApiKey);
    }
    missing
}

/// Applies the required-field gate, handing the form back on failure so the
/// page can be re-rendered with the user's values.
pub fn prepare(
    mut form: SearchForm,
    api_key: Option<&str>,
) -> Result<ReadySearch, (SearchForm, Vec<RequiredField>)> {
    let criteria = form.normalize();
    let missing = missing_fields(&criteria, form.resume.as_ref(), api_key);

    match (missing.is_empty(), form.resume.take(), api_key) {
        (true, Some(resume), Some(key)) => Ok(ReadySearch {
            criteria,
            resume,
            api_key: key.trim().to_string(),
        }),
        (_, resume, _) => {
            form.resume = resume;
            Err((form, missing))
        }
    }
}
