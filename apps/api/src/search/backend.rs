//! Job search backend: the scraping + resume-matching collaborator.
//!
//! Default: `HttpJobSearcher`, which forwards each search to the external
//! backend service. `AppState` holds an `Arc<dyn JobSearcher>` so tests can
//! substitute an in-process implementation.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::search::models::SearchOutcome;

const SEARCH_ENDPOINT: &str = "/search";

/// Everything the backend needs for one search.
#[derive(Debug, Clone, Copy)]
pub struct SearchRequest<'a> {
    pub titles: &'a [String],
    pub locations: &'a [String],
    pub experience_codes: &'a str,
    pub date_code: &'a str,
    pub api_key: &'a str,
    pub model_name: &'a str,
    /// Temporary PDF, valid for the duration of the call.
    pub resume_path: &'a Path,
    pub min_score: u8,
}

/// The job search trait. Implement this to swap backends without touching
/// the dispatcher or the handlers.
#[async_trait]
pub trait JobSearcher: Send + Sync {
    async fn search(&self, request: &SearchRequest<'_>) -> Result<SearchOutcome, AppError>;
}

/// Calls the search backend over HTTP with a multipart request.
///
/// No retries: a search scrapes and scores for minutes, so a failure is
/// reported back to the user instead of silently doubling the wait.
#[derive(Clone)]
pub struct HttpJobSearcher {
    client: Client,
    base_url: String,
}

impl HttpJobSearcher {
    pub fn new(base_url: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, base_url })
    }

    async fn build_form(request: &SearchRequest<'_>) -> Result<Form, AppError> {
        let resume = tokio::fs::read(request.resume_path).await?;
        let file_name = request
            .resume_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("resume.pdf")
            .to_string();

        let resume_part = Part::bytes(resume)
            .file_name(file_name)
            .mime_str("application/pdf")
            .map_err(|e| AppError::Backend(format!("Failed to build resume part: {e}")))?;

        Ok(Form::new()
            .text(
                "job_titles",
                serde_json::to_string(request.titles).context("encode job titles")?,
            )
            .text(
                "locations",
                serde_json::to_string(request.locations).context("encode locations")?,
            )
            .text("experience_codes", request.experience_codes.to_string())
            .text("date_code", request.date_code.to_string())
            .text("api_key", request.api_key.to_string())
            .text("model_name", request.model_name.to_string())
            .text("min_score", request.min_score.to_string())
            .part("resume", resume_part))
    }
}

#[async_trait]
impl JobSearcher for HttpJobSearcher {
    async fn search(&self, request: &SearchRequest<'_>) -> Result<SearchOutcome, AppError> {
        let url = format!("{}{}", self.base_url, SEARCH_ENDPOINT);
        let form = Self::build_form(request).await?;

        info!(
            "Calling search backend: {} (titles={}, locations={}, min_score={})",
            url,
            request.titles.len(),
            request.locations.len(),
            request.min_score
        );

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Backend(format!("Request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Search backend returned {}: {}", status, body);
            return Err(AppError::Backend(format!(
                "status {}: {}",
                status.as_u16(),
                body
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::Backend(format!("Failed to read response body: {e}")))?;
        let outcome = parse_search_body(&body)?;

        debug!("Search backend returned {} rows", outcome.len());
        Ok(outcome)
    }
}

/// Decodes a backend response body. An empty body means no jobs.
fn parse_search_body(body: &str) -> Result<SearchOutcome, AppError> {
    if body.trim().is_empty() {
        return Ok(SearchOutcome::NoJobs);
    }
    let value: Value = serde_json::from_str(body)
        .map_err(|e| AppError::Backend(format!("Response is not JSON: {e}")))?;
    SearchOutcome::from_table(value)
        .map_err(|e| AppError::Backend(format!("Unexpected result table: {e}")))
}
