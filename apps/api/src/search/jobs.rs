//! Search dispatcher: runs each search as a background task and tracks its
//! progress so the UI can poll or cancel it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{watch, RwLock};
use tokio::task::AbortHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::search::backend::{JobSearcher, SearchRequest};
use crate::search::criteria::ReadySearch;
use crate::search::models::SearchOutcome;
use crate::search::resume::TempResume;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStage {
    Queued,
    PreparingResume,
    Searching,
    Completed,
    Failed,
    Cancelled,
}

impl SearchStage {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SearchStage::Completed | SearchStage::Failed | SearchStage::Cancelled
        )
    }
}

/// Echo of what the user submitted, shown alongside progress and results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchSummary {
    pub job_titles: Vec<String>,
    pub locations: Vec<String>,
    pub experience: Vec<&'static str>,
    pub experience_codes: String,
    pub date_posted: &'static str,
    pub date_code: &'static str,
    pub easy_apply: bool,
    pub under_10_applicants: bool,
    pub min_match_score: u8,
    pub resume_name: String,
    pub resume_size_mb: f64,
}

impl SearchSummary {
    pub fn from_ready(search: &ReadySearch) -> Self {
        let criteria = &search.criteria;
        SearchSummary {
            job_titles: criteria.job_titles.clone(),
            locations: criteria.locations.clone(),
            experience: criteria.experience_levels.iter().map(|l| l.label()).collect(),
            experience_codes: criteria.experience_codes.clone(),
            date_posted: criteria.date_posted.map(|d| d.label()).unwrap_or(""),
            date_code: criteria.date_code(),
            easy_apply: criteria.easy_apply,
            under_10_applicants: criteria.under_10_applicants,
            min_match_score: criteria.min_match_score,
            resume_name: search.resume.file_name.clone(),
            resume_size_mb: search.resume.size_mb(),
        }
    }
}

/// Snapshot of one search, published on every stage change.
#[derive(Debug, Clone, Serialize)]
pub struct SearchStatus {
    pub id: Uuid,
    pub stage: SearchStage,
    pub message: String,
    pub summary: SearchSummary,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub outcome: Option<SearchOutcome>,
    pub error: Option<String>,
}

struct SearchEntry {
    progress: Arc<watch::Sender<SearchStatus>>,
    abort: AbortHandle,
}

/// In-memory registry of running and recently finished searches.
#[derive(Clone)]
pub struct SearchRegistry {
    searches: Arc<RwLock<HashMap<Uuid, SearchEntry>>>,
    searcher: Arc<dyn JobSearcher>,
    model_name: String,
    deadline: Duration,
    retention: Duration,
}

impl SearchRegistry {
    pub fn new(
        searcher: Arc<dyn JobSearcher>,
        model_name: String,
        deadline: Duration,
        retention: Duration,
    ) -> Self {
        Self {
            searches: Arc::new(RwLock::new(HashMap::new())),
            searcher,
            model_name,
            deadline,
            retention,
        }
    }

    /// Starts a search in the background and returns its id immediately.
    pub async fn dispatch(&self, search: ReadySearch) -> Uuid {
        let id = Uuid::new_v4();
        let summary = SearchSummary::from_ready(&search);

        info!(
            search_id = %id,
            "Dispatching search: titles={:?} locations={:?} experience={} date={} min_score={}",
            summary.job_titles,
            summary.locations,
            summary.experience_codes,
            summary.date_code,
            summary.min_match_score
        );

        let (tx, _) = watch::channel(SearchStatus {
            id,
            stage: SearchStage::Queued,
            message: "Search queued".to_string(),
            summary,
            created_at: Utc::now(),
            finished_at: None,
            outcome: None,
            error: None,
        });
        let progress = Arc::new(tx);

        let mut searches = self.searches.write().await;
        self.prune(&mut searches);

        let task = tokio::spawn(run_search(
            Arc::clone(&self.searcher),
            search,
            self.model_name.clone(),
            self.deadline,
            Arc::clone(&progress),
        ));
        searches.insert(
            id,
            SearchEntry {
                progress,
                abort: task.abort_handle(),
            },
        );

        id
    }

    pub async fn status(&self, id: Uuid) -> Option<SearchStatus> {
        let searches = self.searches.read().await;
        searches.get(&id).map(|entry| entry.progress.borrow().clone())
    }

    /// Receiver that observes every stage change of a search.
    #[cfg(test)]
    pub async fn subscribe(&self, id: Uuid) -> Option<watch::Receiver<SearchStatus>> {
        let searches = self.searches.read().await;
        searches.get(&id).map(|entry| entry.progress.subscribe())
    }

    /// Cancels a running search. Finished searches are left as they are.
    /// Aborting the task drops its temporary resume file.
    pub async fn cancel(&self, id: Uuid) -> Option<SearchStatus> {
        let searches = self.searches.read().await;
        let entry = searches.get(&id)?;

        let cancelled = advance(
            &entry.progress,
            SearchStage::Cancelled,
            "Search cancelled".to_string(),
            |_| {},
        );
        if cancelled {
            entry.abort.abort();
            info!(search_id = %id, "Search cancelled");
        }

        let status = entry.progress.borrow().clone();
        Some(status)
    }

    fn prune(&self, searches: &mut HashMap<Uuid, SearchEntry>) {
        let Ok(retention) = chrono::Duration::from_std(self.retention) else {
            return;
        };
        let cutoff = Utc::now() - retention;
        searches.retain(|_, entry| {
            let status = entry.progress.borrow();
            !(status.stage.is_terminal() && status.finished_at.is_some_and(|at| at < cutoff))
        });
    }
}

/// Moves a search to `stage` unless it already finished. Returns whether the
/// status changed.
fn advance(
    progress: &watch::Sender<SearchStatus>,
    stage: SearchStage,
    message: String,
    apply: impl FnOnce(&mut SearchStatus),
) -> bool {
    progress.send_if_modified(|status| {
        if status.stage.is_terminal() {
            return false;
        }
        status.stage = stage;
        status.message = message;
        if stage.is_terminal() {
            status.finished_at = Some(Utc::now());
        }
        apply(status);
        true
    })
}

async fn run_search(
    searcher: Arc<dyn JobSearcher>,
    search: ReadySearch,
    model_name: String,
    deadline: Duration,
    progress: Arc<watch::Sender<SearchStatus>>,
) {
    let id = progress.borrow().id;
    let result = tokio::time::timeout(
        deadline,
        execute(searcher.as_ref(), &search, &model_name, &progress),
    )
    .await;

    match result {
        Ok(Ok(outcome)) => {
            let message = match &outcome {
                SearchOutcome::Table(rows) => {
                    format!("Found {} jobs matching your criteria.", rows.len())
                }
                SearchOutcome::NoJobs => "No jobs!! found matching the criteria.".to_string(),
            };
            info!(search_id = %id, "Search completed: {} rows", outcome.len());
            advance(&progress, SearchStage::Completed, message, |status| {
                status.outcome = Some(outcome)
            });
        }
        Ok(Err(e)) => {
            warn!(search_id = %id, "Search failed: {e}");
            advance(
                &progress,
                SearchStage::Failed,
                "The job search failed.".to_string(),
                |status| status.error = Some(e.to_string()),
            );
        }
        Err(_) => {
            warn!(search_id = %id, "Search timed out after {}s", deadline.as_secs());
            advance(
                &progress,
                SearchStage::Failed,
                "The job search took too long.".to_string(),
                |status| {
                    status.error = Some(format!("Timed out after {}s", deadline.as_secs()))
                },
            );
        }
    }
}

async fn execute(
    searcher: &dyn JobSearcher,
    search: &ReadySearch,
    model_name: &str,
    progress: &watch::Sender<SearchStatus>,
) -> Result<SearchOutcome, AppError> {
    advance(
        progress,
        SearchStage::PreparingResume,
        format!("Using resume: {}", search.resume.file_name),
        |_| {},
    );
    let resume = TempResume::create(&search.resume).await?;

    advance(
        progress,
        SearchStage::Searching,
        "Hang on!! Job search extraction, filtering, and analysis in progress...".to_string(),
        |_| {},
    );

    let criteria = &search.criteria;
    let request = SearchRequest {
        titles: &criteria.job_titles,
        locations: &criteria.locations,
        experience_codes: &criteria.experience_codes,
        date_code: criteria.date_code(),
        api_key: &search.api_key,
        model_name,
        resume_path: resume.path(),
        min_score: criteria.min_match_score,
    };
    let outcome = searcher.search(&request).await;

    drop(resume);
    outcome
}
