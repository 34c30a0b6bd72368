use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::{UserProfile, UserProfileRow};

/// Persistence seam for alumni profiles.
///
/// `save` is optimistic: it succeeds only when the stored version equals
/// `profile.version`, and returns the profile with the bumped version.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn fetch(&self, user_id: Uuid) -> Result<Option<UserProfile>, AppError>;

    /// Creates an empty profile, or returns the existing one.
    async fn provision(&self, user_id: Uuid) -> Result<UserProfile, AppError>;

    async fn save(&self, profile: &UserProfile) -> Result<UserProfile, AppError>;
}

fn conflict(user_id: Uuid, version: i64) -> AppError {
    AppError::Conflict(format!(
        "Profile {user_id} was modified concurrently (expected version {version}); reload and retry"
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// PostgreSQL
// ────────────────────────────────────────────────────────────────────────────

pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn fetch(&self, user_id: Uuid) -> Result<Option<UserProfile>, AppError> {
        let row: Option<UserProfileRow> =
            sqlx::query_as("SELECT * FROM user_profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(UserProfile::from))
    }

    async fn provision(&self, user_id: Uuid) -> Result<UserProfile, AppError> {
        sqlx::query("INSERT INTO user_profiles (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        self.fetch(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile for user {user_id} not found")))
    }

    async fn save(&self, profile: &UserProfile) -> Result<UserProfile, AppError> {
        // Compare-and-swap on version; never overwrite a newer row
        let row: Option<UserProfileRow> = sqlx::query_as(
            r#"
            UPDATE user_profiles SET
                first_name = $3, last_name = $4, email = $5, contact_number = $6,
                bio = $7, location = $8, linkedin_profile = $9, website = $10,
                graduation_year = $11, department = $12, work_experiences = $13,
                educations = $14, projects = $15, skills = $16, featured_skills = $17,
                resume_key = $18, profile_complete = $19,
                version = version + 1, updated_at = NOW()
            WHERE user_id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(profile.user_id)
        .bind(profile.version)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.email)
        .bind(&profile.contact_number)
        .bind(&profile.bio)
        .bind(&profile.location)
        .bind(&profile.linkedin_profile)
        .bind(&profile.website)
        .bind(profile.graduation_year)
        .bind(&profile.department)
        .bind(Json(&profile.work_experiences))
        .bind(Json(&profile.educations))
        .bind(Json(&profile.projects))
        .bind(&profile.skills)
        .bind(Json(&profile.featured_skills))
        .bind(&profile.resume_key)
        .bind(profile.profile_complete)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                info!("Saved profile for user {} at version {}", row.user_id, row.version);
                Ok(UserProfile::from(row))
            }
            None => match self.fetch(profile.user_id).await? {
                Some(_) => Err(conflict(profile.user_id, profile.version)),
                None => Err(AppError::NotFound(format!(
                    "Profile for user {} not found",
                    profile.user_id
                ))),
            },
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory (local development and tests)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: Mutex<HashMap<Uuid, UserProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn fetch(&self, user_id: Uuid) -> Result<Option<UserProfile>, AppError> {
        Ok(self.profiles.lock().await.get(&user_id).cloned())
    }

    async fn provision(&self, user_id: Uuid) -> Result<UserProfile, AppError> {
        let mut profiles = self.profiles.lock().await;
        Ok(profiles
            .entry(user_id)
            .or_insert_with(|| UserProfile::new(user_id))
            .clone())
    }

    async fn save(&self, profile: &UserProfile) -> Result<UserProfile, AppError> {
        let mut profiles = self.profiles.lock().await;
        let stored = profiles.get_mut(&profile.user_id).ok_or_else(|| {
            AppError::NotFound(format!("Profile for user {} not found", profile.user_id))
        })?;
        if stored.version != profile.version {
            return Err(conflict(profile.user_id, profile.version));
        }

        let mut saved = profile.clone();
        saved.version += 1;
        saved.created_at = stored.created_at;
        saved.updated_at = Utc::now();
        *stored = saved.clone();
        Ok(saved)
    }
}
