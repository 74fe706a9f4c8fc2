//! Axum route handlers for the search form, progress pages and search API.

use askama::Template;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::render::{form::FormPage, results::SearchPage};
use crate::search::criteria::{
    prepare, DatePosted, ExperienceLevel, ReadySearch, RequiredField, SearchForm,
};
use crate::search::jobs::SearchStatus;
use crate::search::resume::{validate_resume, ResumeUpload};
use crate::state::AppState;

pub const MISSING_FIELDS_WARNING: &str = "Please fill all required fields and upload your resume.";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SubmitSearchResponse {
    pub search_id: Uuid,
    pub status_url: String,
}

/// Why a submission was not dispatched.
enum Refusal {
    Missing(Vec<RequiredField>),
    Resume(String),
}

impl Refusal {
    fn warning(&self) -> String {
        match self {
            Refusal::Missing(_) => MISSING_FIELDS_WARNING.to_string(),
            Refusal::Resume(reason) => reason.clone(),
        }
    }

    fn detail(&self) -> String {
        match self {
            Refusal::Missing(fields) => {
                let names: Vec<_> = fields.iter().map(|f| f.label()).collect();
                format!("{MISSING_FIELDS_WARNING} Missing: {}", names.join(", "))
            }
            Refusal::Resume(reason) => reason.clone(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /
pub async fn handle_form(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let blank = SearchForm::default();
    let page = FormPage::new(&blank, None, upload_limit_mb(&state));
    Ok(Html(page.render()?))
}

/// POST /searches
///
/// Re-renders the form with a warning when a required input is missing,
/// otherwise starts the search and redirects to its progress page.
pub async fn handle_submit(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = match read_search_form(multipart).await {
        Ok(form) => form,
        Err(AppError::PayloadTooLarge(detail)) => {
            info!("Search form refused: {detail}");
            let limit_mb = upload_limit_mb(&state);
            let warning = format!("Resume exceeds the {limit_mb}MB upload limit");
            let blank = SearchForm::default();
            let page = FormPage::new(&blank, Some(&warning), limit_mb);
            return Ok((StatusCode::PAYLOAD_TOO_LARGE, Html(page.render()?)).into_response());
        }
        Err(e) => return Err(e),
    };

    match gate(&state, form).await {
        Ok(ready) => {
            let id = state.searches.dispatch(ready).await;
            Ok(Redirect::to(&format!("/searches/{id}")).into_response())
        }
        Err((form, refusal)) => {
            let warning = refusal.warning();
            let page = FormPage::new(&form, Some(&warning), upload_limit_mb(&state));
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(page.render()?)).into_response())
        }
    }
}

/// GET /searches/:id
pub async fn handle_search_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, AppError> {
    let status = find_status(&state, id).await?;
    Ok(Html(SearchPage::new(&status).render()?))
}

/// POST /searches/:id/cancel
pub async fn handle_cancel_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Redirect, AppError> {
    state
        .searches
        .cancel(id)
        .await
        .ok_or_else(|| not_found(id))?;
    Ok(Redirect::to(&format!("/searches/{id}")))
}

/// POST /api/v1/searches
pub async fn handle_api_submit(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitSearchResponse>), AppError> {
    let form = read_search_form(multipart).await?;
    let ready = gate(&state, form)
        .await
        .map_err(|(_, refusal)| AppError::Validation(refusal.detail()))?;

    let search_id = state.searches.dispatch(ready).await;
    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitSearchResponse {
            search_id,
            status_url: format!("/api/v1/searches/{search_id}"),
        }),
    ))
}

/// GET /api/v1/searches/:id
pub async fn handle_api_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SearchStatus>, AppError> {
    Ok(Json(find_status(&state, id).await?))
}

/// DELETE /api/v1/searches/:id
pub async fn handle_api_cancel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SearchStatus>, AppError> {
    let status = state
        .searches
        .cancel(id)
        .await
        .ok_or_else(|| not_found(id))?;
    Ok(Json(status))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn find_status(state: &AppState, id: Uuid) -> Result<SearchStatus, AppError> {
    state.searches.status(id).await.ok_or_else(|| not_found(id))
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Search {id} not found"))
}

fn upload_limit_mb(state: &AppState) -> usize {
    state.config.max_upload_bytes / (1024 * 1024)
}

/// Required-field gate followed by the resume checks. Hands the form back on
/// refusal so it can be re-rendered.
async fn gate(
    state: &AppState,
    form: SearchForm,
) -> Result<ReadySearch, (SearchForm, Refusal)> {
    info!(
        "Search form submitted: job_titles={:?} locations={:?} experience={:?} date_posted={:?} easy_apply={} under_10_applicants={} min_match_score={} resume={:?}",
        form.job_titles,
        form.locations,
        form.experience_levels,
        form.date_posted,
        form.easy_apply,
        form.under_10_applicants,
        form.min_match_score,
        form.resume.as_ref().map(|r| &r.file_name),
    );

    let ready = prepare(form, state.config.gemini_api_key.as_deref())
        .map_err(|(form, missing)| (form, Refusal::Missing(missing)))?;

    if let Err(rejection) = validate_resume(
        &ready.resume,
        state.config.max_upload_bytes,
        state.config.resume_text_check,
    )
    .await
    {
        info!("Resume '{}' refused: {rejection}", ready.resume.file_name);
        let form = form_from_ready(ready);
        return Err((form, Refusal::Resume(rejection.to_string())));
    }

    Ok(ready)
}

fn form_from_ready(ready: ReadySearch) -> SearchForm {
    let criteria = ready.criteria;
    SearchForm {
        job_titles: criteria.job_titles.join(", "),
        locations: criteria.locations.join(", "),
        experience_levels: criteria.experience_levels,
        date_posted: criteria.date_posted,
        easy_apply: criteria.easy_apply,
        under_10_applicants: criteria.under_10_applicants,
        min_match_score: criteria.min_match_score,
        resume: Some(ready.resume),
    }
}

/// Reads the multipart search form. Unknown labels and out-of-range scores
/// are rejected; everything else is left for the required-field gate.
async fn read_search_form(mut multipart: Multipart) -> Result<SearchForm, AppError> {
    let mut form = SearchForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "job_titles" => form.job_titles = field.text().await?,
            "locations" => form.locations = field.text().await?,
            "experience_level" => {
                let label = field.text().await?;
                let level = ExperienceLevel::from_label(label.trim()).ok_or_else(|| {
                    AppError::Validation(format!("Unknown experience level: '{label}'"))
                })?;
                if !form.experience_levels.contains(&level) {
                    form.experience_levels.push(level);
                }
            }
            "date_posted" => {
                let label = field.text().await?;
                let label = label.trim();
                form.date_posted = if label.is_empty() {
                    None
                } else {
                    Some(DatePosted::from_label(label).ok_or_else(|| {
                        AppError::Validation(format!("Unknown date posted option: '{label}'"))
                    })?)
                };
            }
            "easy_apply" => form.easy_apply = is_checked(&field.text().await?),
            "under_10_applicants" => form.under_10_applicants = is_checked(&field.text().await?),
            "min_match_score" => {
                let raw = field.text().await?;
                form.min_match_score = raw
                    .trim()
                    .parse::<u8>()
                    .ok()
                    .filter(|score| *score <= 100)
                    .ok_or_else(|| {
                        AppError::Validation(format!(
                            "Minimum match score must be between 0 and 100, got '{raw}'"
                        ))
                    })?;
            }
            "resume" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let bytes = field.bytes().await?;
                // Browsers send an empty part when no file was chosen.
                form.resume = if file_name.is_empty() && bytes.is_empty() {
                    None
                } else {
                    Some(ResumeUpload { file_name, bytes })
                };
            }
            _ => {
                field.bytes().await?;
            }
        }
    }

    Ok(form)
}

fn is_checked(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "false" | "off" | "0"
    )
}
