use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::{ProfileUpdateRequest, UserProfile};
use crate::parser::fragments::PdfSource;
use crate::parser::models::StructuredResume;
use crate::parser::parse_resume;
use crate::profile::completeness::{compute_completeness_report, CompletenessReport};
use crate::profile::merge::FillPolicy;
use crate::profile::service::{self, ResumeIngestResult};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct ResumeQuery {
    pub user_id: Uuid,
    /// When false, parsed values only fill empty fields. Defaults to true.
    pub replace_existing: Option<bool>,
}

impl ResumeQuery {
    fn policy(&self) -> FillPolicy {
        FillPolicy::from_replace_existing(self.replace_existing.unwrap_or(true))
    }
}

#[derive(Deserialize)]
pub struct ParseUrlRequest {
    pub url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub profile: UserProfile,
    pub completeness: CompletenessReport,
}

impl From<UserProfile> for ProfileResponse {
    fn from(profile: UserProfile) -> Self {
        let completeness = compute_completeness_report(&profile);
        ProfileResponse {
            profile,
            completeness,
        }
    }
}

/// Reads the `file` part of a multipart upload.
async fn read_resume_file(mut multipart: Multipart, max_bytes: usize) -> Result<Bytes, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        debug!(
            "Received resume upload {:?} ({:?})",
            field.file_name(),
            field.content_type()
        );
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read uploaded file: {e}")))?;
        if data.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }
        if data.len() > max_bytes {
            return Err(AppError::Validation(format!(
                "Resume exceeds the {max_bytes} byte limit"
            )));
        }
        return Ok(data);
    }
    Err(AppError::Validation("Missing 'file' field".to_string()))
}

// ────────────────────────────────────────────────────────────────────────────
// Stateless parsing
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resume/parse
pub async fn handle_parse_resume(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<StructuredResume>, AppError> {
    let data = read_resume_file(multipart, state.config.max_resume_bytes).await?;
    let resume = parse_resume(PdfSource::Bytes(data.to_vec()), &state.http).await?;
    Ok(Json(resume))
}

/// POST /api/v1/resume/parse-url
pub async fn handle_parse_resume_url(
    State(state): State<AppState>,
    Json(req): Json<ParseUrlRequest>,
) -> Result<Json<StructuredResume>, AppError> {
    let url = req.url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(AppError::Validation("url must be an http(s) URL".to_string()));
    }
    let resume = parse_resume(PdfSource::Url(url.to_string()), &state.http).await?;
    Ok(Json(resume))
}

// ────────────────────────────────────────────────────────────────────────────
// Profile
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = service::get_profile(state.profiles.as_ref(), params.user_id).await?;
    Ok(Json(profile.into()))
}

/// POST /api/v1/profile
pub async fn handle_provision_profile(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = state.profiles.provision(params.user_id).await?;
    Ok(Json(profile.into()))
}

/// PUT /api/v1/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<ProfileUpdateRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = service::update_profile(state.profiles.as_ref(), params.user_id, req).await?;
    Ok(Json(profile.into()))
}

// ────────────────────────────────────────────────────────────────────────────
// Resume → profile
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/profile/resume
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    Query(params): Query<ResumeQuery>,
    multipart: Multipart,
) -> Result<Json<ResumeIngestResult>, AppError> {
    let data = read_resume_file(multipart, state.config.max_resume_bytes).await?;
    let result =
        service::ingest_resume_upload(&state, params.user_id, data.to_vec(), params.policy())
            .await?;
    Ok(Json(result))
}

/// POST /api/v1/profile/resume/reparse
pub async fn handle_reparse_resume(
    State(state): State<AppState>,
    Query(params): Query<ResumeQuery>,
) -> Result<Json<ResumeIngestResult>, AppError> {
    let result = service::reparse_stored_resume(&state, params.user_id, params.policy()).await?;
    Ok(Json(result))
}

/// POST /api/v1/profile/resume/preview
pub async fn handle_preview_merge(
    State(state): State<AppState>,
    Query(params): Query<ResumeQuery>,
    Json(resume): Json<StructuredResume>,
) -> Result<Json<UserProfile>, AppError> {
    let profile = service::preview_merge(
        state.profiles.as_ref(),
        params.user_id,
        &resume,
        params.policy(),
    )
    .await?;
    Ok(Json(profile))
}
