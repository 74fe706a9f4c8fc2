//! Progress and results pages for a dispatched search.

use askama::Template;
use uuid::Uuid;

use crate::search::jobs::{SearchStage, SearchStatus, SearchSummary};
use crate::search::models::{JobMatchResult, SearchOutcome};

const PROGRESS_REFRESH_SECS: u32 = 3;

/// Renders whatever state the search is in. Pages for unfinished searches
/// refresh themselves until the search settles.
#[derive(Template)]
#[template(path = "search.html")]
pub struct SearchPage<'a> {
    id: Uuid,
    summary: &'a SearchSummary,
    easy_apply: &'static str,
    under_10_applicants: &'static str,
    refresh_secs: Option<u32>,
    phase: Phase<'a>,
}

enum Phase<'a> {
    Running(&'a str),
    Jobs(Vec<JobCard<'a>>),
    NoJobs,
    Failed(String),
    Cancelled(&'a str),
}

impl<'a> SearchPage<'a> {
    pub fn new(status: &'a SearchStatus) -> Self {
        let phase = match status.stage {
            SearchStage::Queued | SearchStage::PreparingResume | SearchStage::Searching => {
                Phase::Running(&status.message)
            }
            SearchStage::Completed => match &status.outcome {
                Some(SearchOutcome::Table(rows)) if !rows.is_empty() => {
                    Phase::Jobs(rows.iter().map(|row| JobCard { row }).collect())
                }
                _ => Phase::NoJobs,
            },
            SearchStage::Failed => Phase::Failed(format!(
                "{} {}",
                status.message,
                status.error.as_deref().unwrap_or("unknown error")
            )),
            SearchStage::Cancelled => Phase::Cancelled(&status.message),
        };

        SearchPage {
            id: status.id,
            summary: &status.summary,
            easy_apply: yes_no(status.summary.easy_apply),
            under_10_applicants: yes_no(status.summary.under_10_applicants),
            refresh_secs: matches!(phase, Phase::Running(_)).then_some(PROGRESS_REFRESH_SECS),
            phase,
        }
    }
}

/// One result row: headline facts, the match score and a collapsible
/// analysis panel.
#[derive(Template)]
#[template(path = "job_card.html")]
pub struct JobCard<'a> {
    row: &'a JobMatchResult,
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "True"
    } else {
        "False"
    }
}
