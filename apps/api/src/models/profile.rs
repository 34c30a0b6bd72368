use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::parser::models::{EducationEntry, ProjectEntry, WorkExperienceEntry};

pub use crate::parser::models::FeaturedSkill;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkExperience {
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub date: Option<String>,
    pub descriptions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Education {
    pub school: Option<String>,
    pub degree: Option<String>,
    pub date: Option<String>,
    pub gpa: Option<String>,
    pub descriptions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    pub project: Option<String>,
    pub date: Option<String>,
    pub descriptions: Vec<String>,
}

impl From<WorkExperienceEntry> for WorkExperience {
    fn from(entry: WorkExperienceEntry) -> Self {
        WorkExperience {
            company: entry.company,
            job_title: entry.job_title,
            date: entry.date,
            descriptions: entry.descriptions,
        }
    }
}

impl From<EducationEntry> for Education {
    fn from(entry: EducationEntry) -> Self {
        Education {
            school: entry.school,
            degree: entry.degree,
            date: entry.date,
            gpa: entry.gpa,
            descriptions: entry.descriptions,
        }
    }
}

/// The subtitle has no column of its own; it is kept as the first description.
impl From<ProjectEntry> for Project {
    fn from(entry: ProjectEntry) -> Self {
        let descriptions = entry
            .subtitle
            .into_iter()
            .chain(entry.descriptions)
            .collect();
        Project {
            project: entry.project,
            date: entry.date,
            descriptions,
        }
    }
}

/// Canonical alumni profile, as stored and as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub contact_number: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub linkedin_profile: Option<String>,
    pub website: Option<String>,
    pub graduation_year: Option<i32>,
    pub department: Option<String>,
    pub work_experiences: Vec<WorkExperience>,
    pub educations: Vec<Education>,
    pub projects: Vec<Project>,
    /// Flat skill names, de-duplicated.
    pub skills: Vec<String>,
    pub featured_skills: Vec<FeaturedSkill>,
    /// Object key of the most recently uploaded resume.
    pub resume_key: Option<String>,
    pub profile_complete: bool,
    /// Optimistic-concurrency counter, bumped on every save.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// A freshly provisioned, empty profile.
    pub fn new(user_id: Uuid) -> Self {
        let now = Utc::now();
        UserProfile {
            user_id,
            first_name: None,
            last_name: None,
            email: None,
            contact_number: None,
            bio: None,
            location: None,
            linkedin_profile: None,
            website: None,
            graduation_year: None,
            department: None,
            work_experiences: Vec::new(),
            educations: Vec::new(),
            projects: Vec::new(),
            skills: Vec::new(),
            featured_skills: Vec::new(),
            resume_key: None,
            profile_complete: false,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct UserProfileRow {
    pub user_id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub contact_number: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub linkedin_profile: Option<String>,
    pub website: Option<String>,
    pub graduation_year: Option<i32>,
    pub department: Option<String>,
    pub work_experiences: Json<Vec<WorkExperience>>,
    pub educations: Json<Vec<Education>>,
    pub projects: Json<Vec<Project>>,
    pub skills: Vec<String>,
    pub featured_skills: Json<Vec<FeaturedSkill>>,
    pub resume_key: Option<String>,
    pub profile_complete: bool,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserProfileRow> for UserProfile {
    fn from(row: UserProfileRow) -> Self {
        UserProfile {
            user_id: row.user_id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            contact_number: row.contact_number,
            bio: row.bio,
            location: row.location,
            linkedin_profile: row.linkedin_profile,
            website: row.website,
            graduation_year: row.graduation_year,
            department: row.department,
            work_experiences: row.work_experiences.0,
            educations: row.educations.0,
            projects: row.projects.0,
            skills: row.skills,
            featured_skills: row.featured_skills.0,
            resume_key: row.resume_key,
            profile_complete: row.profile_complete,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Body of `PUT /api/v1/profile`. Absent fields are left untouched; `version`
/// must match the stored profile.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    pub version: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub contact_number: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub linkedin_profile: Option<String>,
    pub website: Option<String>,
    pub graduation_year: Option<i32>,
    pub department: Option<String>,
    pub work_experiences: Option<Vec<WorkExperience>>,
    pub educations: Option<Vec<Education>>,
    pub projects: Option<Vec<Project>>,
    pub skills: Option<Vec<String>>,
    pub featured_skills: Option<Vec<FeaturedSkill>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_subtitle_becomes_first_description() {
        let project = Project::from(ProjectEntry {
            project: Some("Alumni Connect".into()),
            subtitle: Some("React, Spring Boot".into()),
            date: None,
            descriptions: vec!["Built the resume parser".into()],
        });
        assert_eq!(
            project.descriptions,
            vec!["React, Spring Boot", "Built the resume parser"]
        );
    }

    #[test]
    fn test_profile_serializes_camel_case() {
        let profile = UserProfile::new(Uuid::nil());
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["contactNumber"], serde_json::Value::Null);
        assert_eq!(json["workExperiences"], serde_json::json!([]));
        assert_eq!(json["profileComplete"], serde_json::json!(false));
        assert_eq!(json["version"], serde_json::json!(0));
    }

    #[test]
    fn test_update_request_requires_only_version() {
        let req: ProfileUpdateRequest =
            serde_json::from_str(r#"{"version": 3, "bio": "Hello"}"#).unwrap();
        assert_eq!(req.version, 3);
        assert_eq!(req.bio.as_deref(), Some("Hello"));
        assert!(req.work_experiences.is_none());
    }
}
