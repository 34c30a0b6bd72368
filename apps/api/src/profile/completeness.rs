use serde::{Deserialize, Serialize};

use crate::models::profile::UserProfile;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompletenessReport {
    /// True once every required field is present.
    pub complete: bool,
    /// Share of tracked fields that are filled, in 0.0..=1.0.
    pub score: f64,
    pub missing_required: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Fields an alumni profile needs before it is listed in the directory.
const REQUIRED_FIELDS: &[&str] = &["graduationYear", "department", "contactNumber"];

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// A profile is complete when graduation year, department and contact number
/// are all set.
pub fn is_profile_complete(profile: &UserProfile) -> bool {
    missing_required(profile).is_empty()
}

fn missing_required(profile: &UserProfile) -> Vec<String> {
    let present = [
        profile.graduation_year.is_some(),
        has_text(&profile.department),
        has_text(&profile.contact_number),
    ];
    REQUIRED_FIELDS
        .iter()
        .zip(present)
        .filter(|(_, present)| !present)
        .map(|(field, _)| field.to_string())
        .collect()
}

pub fn compute_completeness_report(profile: &UserProfile) -> CompletenessReport {
    let missing = missing_required(profile);

    let tracked = [
        has_text(&profile.first_name),
        has_text(&profile.last_name),
        has_text(&profile.email),
        has_text(&profile.contact_number),
        has_text(&profile.bio),
        has_text(&profile.location),
        has_text(&profile.linkedin_profile) || has_text(&profile.website),
        profile.graduation_year.is_some(),
        has_text(&profile.department),
        !profile.work_experiences.is_empty(),
        !profile.educations.is_empty(),
        !profile.projects.is_empty(),
        !profile.skills.is_empty(),
    ];
    let filled = tracked.iter().filter(|f| **f).count();
    let score = filled as f64 / tracked.len() as f64;

    let mut recommendations: Vec<String> = missing
        .iter()
        .map(|field| format!("Add your {field} to complete your profile"))
        .collect();
    if profile.work_experiences.is_empty() {
        recommendations.push("Upload a resume or add work experience manually".to_string());
    }
    if profile.skills.is_empty() {
        recommendations.push("List a few skills so other alumni can find you".to_string());
    }

    CompletenessReport {
        complete: missing.is_empty(),
        score,
        missing_required: missing,
        recommendations,
    }
}
