//! In-process `JobSearcher` and fixtures shared by the search tests.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Notify;

use crate::errors::AppError;
use crate::search::backend::{JobSearcher, SearchRequest};
use crate::search::criteria::{
    prepare, DatePosted, ExperienceLevel, ReadySearch, SearchForm,
};
use crate::search::models::{JobMatchResult, SearchOutcome};
use crate::search::resume::ResumeUpload;

/// Owned copy of what the searcher was called with.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub titles: Vec<String>,
    pub locations: Vec<String>,
    pub experience_codes: String,
    pub date_code: String,
    pub api_key: String,
    pub model_name: String,
    pub resume_path: PathBuf,
    pub resume_existed: bool,
    pub min_score: u8,
}

enum Behavior {
    Return(SearchOutcome),
    Fail(String),
    Stall,
}

pub struct FakeSearcher {
    behavior: Behavior,
    calls: AtomicUsize,
    last: Mutex<Option<SeenRequest>>,
    called: Notify,
}

impl FakeSearcher {
    fn with(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
            called: Notify::new(),
        }
    }

    pub fn returning(outcome: SearchOutcome) -> Self {
        Self::with(Behavior::Return(outcome))
    }

    pub fn failing(message: &str) -> Self {
        Self::with(Behavior::Fail(message.to_string()))
    }

    /// Never answers, like a backend stuck mid-scrape.
    pub fn stalled() -> Self {
        Self::with(Behavior::Stall)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<SeenRequest> {
        self.last.lock().unwrap().clone()
    }

    pub async fn wait_for_call(&self) {
        self.called.notified().await;
    }
}

#[async_trait]
impl JobSearcher for FakeSearcher {
    async fn search(&self, request: &SearchRequest<'_>) -> Result<SearchOutcome, AppError> {
        *self.last.lock().unwrap() = Some(SeenRequest {
            titles: request.titles.to_vec(),
            locations: request.locations.to_vec(),
            experience_codes: request.experience_codes.to_string(),
            date_code: request.date_code.to_string(),
            api_key: request.api_key.to_string(),
            model_name: request.model_name.to_string(),
            resume_path: request.resume_path.to_path_buf(),
            resume_existed: request.resume_path.exists(),
            min_score: request.min_score,
        });
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.called.notify_one();

        match &self.behavior {
            Behavior::Return(outcome) => Ok(outcome.clone()),
            Behavior::Fail(message) => Err(AppError::Backend(message.clone())),
            Behavior::Stall => std::future::pending().await,
        }
    }
}

pub fn resume_upload() -> ResumeUpload {
    ResumeUpload {
        file_name: "resume.pdf".to_string(),
        bytes: Bytes::from_static(b"%PDF-1.4 test resume"),
    }
}

pub fn ready_search() -> ReadySearch {
    let form = SearchForm {
        job_titles: "Data Engineer, ML Engineer".to_string(),
        locations: "Texas".to_string(),
        experience_levels: vec![ExperienceLevel::Entry, ExperienceLevel::Senior],
        date_posted: Some(DatePosted::PastWeek),
        resume: Some(resume_upload()),
        ..SearchForm::default()
    };
    match prepare(form, Some("test-key")) {
        Ok(ready) => ready,
        Err((_, missing)) => panic!("fixture is incomplete: {missing:?}"),
    }
}

/// Two rows: a long description with a real link, and a short one with `N/A`.
pub fn sample_rows() -> Vec<JobMatchResult> {
    vec![
        JobMatchResult {
            title: "Senior Data Engineer".to_string(),
            company: "Acme Analytics".to_string(),
            location: "Austin, TX".to_string(),
            job_type: "Full-time".to_string(),
            post_date: "3 hours ago".to_string(),
            post_link: "https://www.linkedin.com/jobs/view/1001".to_string(),
            description: "x".repeat(350),
            score: 82,
            match_summary: "Strong Spark and Airflow overlap".to_string(),
            jd_experience: "5+ years".to_string(),
            candidate_experience: "6 years".to_string(),
            strengths: vec!["Spark".to_string(), "Airflow".to_string()],
            drawbacks: vec!["No Scala".to_string()],
            priority_needs: vec!["Kafka".to_string()],
            domain: "Fintech".to_string(),
            sponsorship: "Not mentioned".to_string(),
        },
        JobMatchResult {
            title: "ML Engineer".to_string(),
            company: "Widgets & Co".to_string(),
            location: "Remote".to_string(),
            job_type: "Contract".to_string(),
            post_date: "1 day ago".to_string(),
            post_link: "N/A".to_string(),
            description: "Train and ship ranking models.".to_string(),
            score: 57,
            match_summary: "Partial overlap".to_string(),
            jd_experience: "3 years".to_string(),
            candidate_experience: "2 years".to_string(),
            strengths: vec!["PyTorch".to_string()],
            drawbacks: vec![],
            priority_needs: vec!["MLOps".to_string()],
            domain: "E-commerce".to_string(),
            sponsorship: "No".to_string(),
        },
    ]
}

/// A one-page PDF whose content stream draws `text` in Helvetica, with a
/// correct cross-reference table so strict parsers accept it.
pub fn text_pdf(text: &str) -> Vec<u8> {
    let content = format!("BT /F1 24 Tf 72 720 Td ({text}) Tj ET");
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>"
            .to_string(),
        format!(
            "<< /Length {} >>\nstream\n{content}\nendstream",
            content.len()
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, object) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{object}\nendobj\n", index + 1).as_bytes());
    }

    let xref_at = pdf.len();
    pdf.extend_from_slice(
        format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes(),
    );
    for offset in offsets {
        pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    pdf
}
