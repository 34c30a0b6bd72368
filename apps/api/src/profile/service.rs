//! Profile reconciliation flows: resume upload, re-parse, preview and manual edit.

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::{ProfileUpdateRequest, UserProfile};
use crate::parser::fragments::{has_pdf_signature, PdfSource};
use crate::parser::models::StructuredResume;
use crate::parser::{parse_resume, ParseError};
use crate::state::AppState;

use super::merge::{apply_manual_update, apply_parsed_resume, validate_update, FillPolicy};
use super::store::ProfileStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseOutcome {
    /// Fields were extracted and merged into the profile.
    Parsed,
    /// The PDF was readable but no fields were recognized (e.g. a scanned image).
    Empty,
    /// The PDF could not be decoded.
    Failed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeIngestResult {
    pub profile: UserProfile,
    pub parse_outcome: ParseOutcome,
    pub message: String,
}

/// Maps a parse result onto the outcome reported to the client.
pub fn classify_parse(
    result: Result<StructuredResume, ParseError>,
) -> (ParseOutcome, Option<StructuredResume>, String) {
    match result {
        Ok(resume) if resume.is_empty() => (
            ParseOutcome::Empty,
            None,
            "No text could be read from the resume. Please fill in your profile manually."
                .to_string(),
        ),
        Ok(resume) => (
            ParseOutcome::Parsed,
            Some(resume),
            "Profile updated from resume. Please review the details.".to_string(),
        ),
        Err(e) => {
            warn!("Resume parse failed: {e}");
            (
                ParseOutcome::Failed,
                None,
                "Could not read file. Your resume was saved; please fill in your profile manually."
                    .to_string(),
            )
        }
    }
}

/// Returns the stored profile, provisioning an empty one on first use.
pub async fn load_or_provision(
    store: &dyn ProfileStore,
    user_id: Uuid,
) -> Result<UserProfile, AppError> {
    match store.fetch(user_id).await? {
        Some(profile) => Ok(profile),
        None => store.provision(user_id).await,
    }
}

pub async fn get_profile(store: &dyn ProfileStore, user_id: Uuid) -> Result<UserProfile, AppError> {
    store
        .fetch(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile for user {user_id} not found")))
}

/// Merges a parsed resume into the stored profile and saves it.
pub async fn reconcile_resume(
    store: &dyn ProfileStore,
    user_id: Uuid,
    resume: &StructuredResume,
    policy: FillPolicy,
    resume_key: Option<String>,
) -> Result<UserProfile, AppError> {
    let existing = load_or_provision(store, user_id).await?;
    let mut merged = apply_parsed_resume(&existing, resume, policy);
    if resume_key.is_some() {
        merged.resume_key = resume_key;
    }
    store.save(&merged).await
}

/// What the profile would look like after merging `resume`. Nothing is saved.
pub async fn preview_merge(
    store: &dyn ProfileStore,
    user_id: Uuid,
    resume: &StructuredResume,
    policy: FillPolicy,
) -> Result<UserProfile, AppError> {
    let existing = store
        .fetch(user_id)
        .await?
        .unwrap_or_else(|| UserProfile::new(user_id));
    Ok(apply_parsed_resume(&existing, resume, policy))
}

/// Applies a manual form submission made against `req.version`.
pub async fn update_profile(
    store: &dyn ProfileStore,
    user_id: Uuid,
    req: ProfileUpdateRequest,
) -> Result<UserProfile, AppError> {
    validate_update(&req).map_err(AppError::Validation)?;

    let existing = get_profile(store, user_id).await?;
    if existing.version != req.version {
        return Err(AppError::Conflict(format!(
            "Profile changed since version {} (now {}); reload and retry",
            req.version, existing.version
        )));
    }

    let updated = apply_manual_update(&existing, req);
    store.save(&updated).await
}

/// Stores an uploaded resume, parses it and reconciles the profile.
///
/// A resume that fails to parse is still stored and linked to the profile so the
/// user can continue with manual entry. If the profile cannot be saved the new
/// object is removed again.
pub async fn ingest_resume_upload(
    state: &AppState,
    user_id: Uuid,
    bytes: Vec<u8>,
    policy: FillPolicy,
) -> Result<ResumeIngestResult, AppError> {
    if !has_pdf_signature(&bytes) {
        return Err(ParseError::NotPdf.into());
    }

    let existing = load_or_provision(state.profiles.as_ref(), user_id).await?;
    let previous_key = existing.resume_key.clone();

    let parse_result = parse_resume(PdfSource::Bytes(bytes.clone()), &state.http).await;
    let key = state.resumes.store(user_id, bytes).await?;

    let (outcome, resume, message) = classify_parse(parse_result);
    let resume = resume.unwrap_or_default();
    let profile = match reconcile_resume(
        state.profiles.as_ref(),
        user_id,
        &resume,
        policy,
        Some(key.clone()),
    )
    .await
    {
        Ok(profile) => profile,
        Err(e) => {
            warn!("Discarding uploaded resume {key}: profile save failed");
            state.resumes.delete(&key).await;
            return Err(e);
        }
    };

    if let Some(old) = previous_key.filter(|old| Some(old) != profile.resume_key.as_ref()) {
        state.resumes.delete(&old).await;
    }

    info!("Resume ingested for user {user_id}: outcome={outcome:?}");
    Ok(ResumeIngestResult {
        profile,
        parse_outcome: outcome,
        message,
    })
}

/// Re-runs the parser over the stored resume, e.g. after parser improvements.
pub async fn reparse_stored_resume(
    state: &AppState,
    user_id: Uuid,
    policy: FillPolicy,
) -> Result<ResumeIngestResult, AppError> {
    let existing = get_profile(state.profiles.as_ref(), user_id).await?;
    let key = existing
        .resume_key
        .ok_or_else(|| AppError::NotFound(format!("No resume stored for user {user_id}")))?;

    let bytes = state.resumes.fetch(&key).await?;
    let parse_result = parse_resume(PdfSource::Bytes(bytes), &state.http).await;
    let (outcome, resume, message) = classify_parse(parse_result);

    let profile =
        reconcile_resume(state.profiles.as_ref(), user_id, &resume.unwrap_or_default(), policy, None)
            .await?;

    info!("Resume re-parsed for user {user_id}: outcome={outcome:?}");
    Ok(ResumeIngestResult {
        profile,
        parse_outcome: outcome,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::models::ResumeProfile;
    use crate::parser::test_pdf;
    use crate::profile::store::InMemoryProfileStore;

    fn resume_with_phone(phone: &str) -> StructuredResume {
        StructuredResume {
            profile: ResumeProfile {
                phone: Some(phone.into()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_classify_parse_outcomes() {
        let (outcome, resume, _) = classify_parse(Ok(StructuredResume::default()));
        assert_eq!(outcome, ParseOutcome::Empty);
        assert!(resume.is_none());

        let (outcome, resume, _) = classify_parse(Ok(resume_with_phone("+1 555 123 4567")));
        assert_eq!(outcome, ParseOutcome::Parsed);
        assert!(resume.is_some());

        let (outcome, _, message) = classify_parse(Err(ParseError::Encrypted));
        assert_eq!(outcome, ParseOutcome::Failed);
        assert!(message.starts_with("Could not read file"));
    }

    #[tokio::test]
    async fn test_reconcile_provisions_and_saves() {
        let store = InMemoryProfileStore::new();
        let user_id = Uuid::new_v4();
        let profile = reconcile_resume(
            &store,
            user_id,
            &resume_with_phone("+1 555 123 4567"),
            FillPolicy::default(),
            Some("resumes/x/y.pdf".into()),
        )
        .await
        .unwrap();

        assert_eq!(profile.contact_number.as_deref(), Some("+1 555 123 4567"));
        assert_eq!(profile.resume_key.as_deref(), Some("resumes/x/y.pdf"));
        assert_eq!(profile.version, 1);
    }

    #[tokio::test]
    async fn test_empty_resume_keeps_profile_fields() {
        let store = InMemoryProfileStore::new();
        let user_id = Uuid::new_v4();
        reconcile_resume(&store, user_id, &resume_with_phone("+1 555 123 4567"), FillPolicy::default(), None)
            .await
            .unwrap();

        let profile = reconcile_resume(&store, user_id, &StructuredResume::default(), FillPolicy::default(), None)
            .await
            .unwrap();
        assert_eq!(profile.contact_number.as_deref(), Some("+1 555 123 4567"));
    }

    #[tokio::test]
    async fn test_preview_does_not_persist() {
        let store = InMemoryProfileStore::new();
        let user_id = Uuid::new_v4();
        let preview = preview_merge(&store, user_id, &resume_with_phone("+1 555 123 4567"), FillPolicy::default())
            .await
            .unwrap();
        assert_eq!(preview.contact_number.as_deref(), Some("+1 555 123 4567"));
        assert!(store.fetch(user_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_manual_update_with_stale_version_conflicts() {
        let store = InMemoryProfileStore::new();
        let user_id = Uuid::new_v4();
        store.provision(user_id).await.unwrap();

        let updated = update_profile(
            &store,
            user_id,
            ProfileUpdateRequest {
                version: 0,
                department: Some("Physics".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.version, 1);
        assert_eq!(updated.department.as_deref(), Some("Physics"));

        let err = update_profile(
            &store,
            user_id,
            ProfileUpdateRequest {
                version: 0,
                bio: Some("stale".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_manual_update_validation_error() {
        let store = InMemoryProfileStore::new();
        let user_id = Uuid::new_v4();
        store.provision(user_id).await.unwrap();
        let err = update_profile(
            &store,
            user_id,
            ProfileUpdateRequest {
                graduation_year: Some(3000),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_upload_parsed_links_resume_and_replaces_old_key() {
        let (state, profiles, resumes) = AppState::for_tests();
        let user_id = Uuid::new_v4();

        let first = ingest_resume_upload(&state, user_id, test_pdf::jane_doe(), FillPolicy::default())
            .await
            .unwrap();
        assert_eq!(first.parse_outcome, ParseOutcome::Parsed);
        assert_eq!(first.profile.email.as_deref(), Some("jane@example.com"));
        let first_key = first.profile.resume_key.clone().unwrap();
        assert_eq!(resumes.keys().await, vec![first_key.clone()]);

        let second = ingest_resume_upload(&state, user_id, test_pdf::jane_doe(), FillPolicy::default())
            .await
            .unwrap();
        let second_key = second.profile.resume_key.clone().unwrap();
        assert_ne!(first_key, second_key);
        assert_eq!(resumes.keys().await, vec![second_key.clone()]);

        let stored = profiles.fetch(user_id).await.unwrap().unwrap();
        assert_eq!(stored.resume_key.as_deref(), Some(second_key.as_str()));
    }

    #[tokio::test]
    async fn test_upload_empty_parse_still_stores_file() {
        let (state, _, resumes) = AppState::for_tests();
        let user_id = Uuid::new_v4();

        let result = ingest_resume_upload(&state, user_id, test_pdf::build(&[]), FillPolicy::default())
            .await
            .unwrap();
        assert_eq!(result.parse_outcome, ParseOutcome::Empty);
        let key = result.profile.resume_key.unwrap();
        assert_eq!(resumes.keys().await, vec![key]);
    }

    #[tokio::test]
    async fn test_upload_failed_parse_still_stores_file() {
        let (state, _, resumes) = AppState::for_tests();
        let user_id = Uuid::new_v4();
        let corrupt = b"%PDF-1.5\nthis is not a real document".to_vec();

        let result = ingest_resume_upload(&state, user_id, corrupt, FillPolicy::default())
            .await
            .unwrap();
        assert_eq!(result.parse_outcome, ParseOutcome::Failed);
        assert!(result.message.starts_with("Could not read file"));
        let key = result.profile.resume_key.unwrap();
        assert_eq!(resumes.keys().await, vec![key]);
    }

    /// Profile store whose saves always lose the version race.
    struct ConflictingStore(InMemoryProfileStore);

    #[async_trait::async_trait]
    impl ProfileStore for ConflictingStore {
        async fn fetch(&self, user_id: Uuid) -> Result<Option<UserProfile>, AppError> {
            self.0.fetch(user_id).await
        }

        async fn provision(&self, user_id: Uuid) -> Result<UserProfile, AppError> {
            self.0.provision(user_id).await
        }

        async fn save(&self, _profile: &UserProfile) -> Result<UserProfile, AppError> {
            Err(AppError::Conflict("concurrent edit".into()))
        }
    }

    #[tokio::test]
    async fn test_upload_conflict_removes_new_object() {
        let (mut state, _, resumes) = AppState::for_tests();
        state.profiles = std::sync::Arc::new(ConflictingStore(InMemoryProfileStore::new()));

        let err = ingest_resume_upload(&state, Uuid::new_v4(), test_pdf::jane_doe(), FillPolicy::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(resumes.keys().await.is_empty());
    }

    #[tokio::test]
    async fn test_reparse_reads_stored_resume() {
        let (state, profiles, _) = AppState::for_tests();
        let user_id = Uuid::new_v4();
        ingest_resume_upload(&state, user_id, test_pdf::jane_doe(), FillPolicy::default())
            .await
            .unwrap();

        let mut profile = profiles.fetch(user_id).await.unwrap().unwrap();
        profile.department = None;
        profiles.save(&profile).await.unwrap();

        let result = reparse_stored_resume(&state, user_id, FillPolicy::default())
            .await
            .unwrap();
        assert_eq!(result.parse_outcome, ParseOutcome::Parsed);
        assert_eq!(result.profile.department.as_deref(), Some("Computer Science"));
    }
}
