//! Reconciliation of parsed resumes and manual edits into a `UserProfile`.
//!
//! Every write path goes through `merge_scalar` / `merge_collection`: a target
//! value is only replaced by a non-empty incoming value, so a sparse resume never
//! wipes out data the user typed in by hand.

use std::collections::HashSet;

use crate::models::profile::{Education, Project, ProfileUpdateRequest, UserProfile, WorkExperience};
use crate::parser::features::{end_year, find_degree};
use crate::parser::models::{SkillSet, StructuredResume};

use super::completeness::is_profile_complete;

pub const MIN_GRADUATION_YEAR: i32 = 1950;
pub const MAX_GRADUATION_YEAR: i32 = 2100;

/// How parsed values treat data that is already on the profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FillPolicy {
    /// Any non-empty incoming value replaces the stored one.
    #[default]
    OverwriteNonEmpty,
    /// Only empty stored fields are filled.
    FillEmptyOnly,
}

impl FillPolicy {
    pub fn from_replace_existing(replace_existing: bool) -> Self {
        if replace_existing {
            FillPolicy::OverwriteNonEmpty
        } else {
            FillPolicy::FillEmptyOnly
        }
    }
}

/// Values that can be "empty" for merge purposes.
pub trait Blank {
    fn is_blank(&self) -> bool;
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl Blank for i32 {
    fn is_blank(&self) -> bool {
        false
    }
}

pub fn merge_scalar<T: Blank>(target: &mut Option<T>, incoming: Option<T>, policy: FillPolicy) {
    let Some(value) = incoming.filter(|v| !v.is_blank()) else {
        return;
    };
    let target_empty = target.as_ref().map_or(true, Blank::is_blank);
    if policy == FillPolicy::OverwriteNonEmpty || target_empty {
        *target = Some(value);
    }
}

pub fn merge_collection<T>(target: &mut Vec<T>, incoming: Vec<T>, policy: FillPolicy) {
    if incoming.is_empty() {
        return;
    }
    if policy == FillPolicy::OverwriteNonEmpty || target.is_empty() {
        *target = incoming;
    }
}

fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// ────────────────────────────────────────────────────────────────────────────
// Field derivations
// ────────────────────────────────────────────────────────────────────────────

/// Canonical form of a user-supplied link.
///
/// Keeps `http(s)://` links as they are, adds `https://` to LinkedIn paths and to
/// anything that looks like a bare domain, and otherwise returns the trimmed input.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let lower = trimmed.to_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return trimmed.to_string();
    }
    if lower.starts_with("linkedin.com/")
        || lower.starts_with("www.linkedin.com/")
        || (trimmed.contains('.') && !trimmed.contains(char::is_whitespace))
    {
        return format!("https://{trimmed}");
    }
    trimmed.to_string()
}

fn is_valid_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    (lower.starts_with("http://") || lower.starts_with("https://"))
        && url.contains('.')
        && !url.contains(char::is_whitespace)
}

/// "Jane van der Berg" → ("Jane", "van der Berg").
pub fn split_name(name: &str) -> (Option<String>, Option<String>) {
    let trimmed = name.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((first, last)) => (clean(Some(first)), clean(Some(last))),
        None => (clean(Some(trimmed)), None),
    }
}

/// Field of study from a degree line: "B.E. Computer Science" → "Computer Science",
/// "Bachelor of Science in Physics" → "Physics".
pub fn department_from_degree(degree: &str) -> Option<String> {
    let trim = |s: &str| {
        s.trim_matches(|c: char| c.is_whitespace() || matches!(c, '.' | ',' | '(' | ')' | '-' | ':'))
            .to_string()
    };

    if let Some((_, field)) = degree.rsplit_once(" in ") {
        let field = trim(field);
        return (!field.is_empty()).then_some(field);
    }

    let found = find_degree(degree)?;
    let rest = trim(&degree[found.end()..]);
    if rest.is_empty() || rest.to_lowercase().starts_with("of ") {
        None
    } else {
        Some(rest)
    }
}

/// Featured skill names followed by the comma-separated items of each
/// description, trimmed and de-duplicated (case-insensitive, first spelling kept).
/// A leading "Category:" label on a description is dropped.
pub fn flatten_skill_names(skills: &SkillSet) -> Vec<String> {
    let from_descriptions = skills.descriptions.iter().flat_map(|description| {
        let items = description
            .split_once(':')
            .map_or(description.as_str(), |(_, rest)| rest);
        items.split(',').map(str::to_string).collect::<Vec<_>>()
    });

    let mut seen = HashSet::new();
    skills
        .featured_skills
        .iter()
        .map(|f| f.skill.clone())
        .chain(from_descriptions)
        .filter_map(|name| clean(Some(&name)))
        .filter(|name| seen.insert(name.to_lowercase()))
        .collect()
}

fn dedupe_skills(skills: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    skills
        .into_iter()
        .filter_map(|s| clean(Some(&s)))
        .filter(|s| seen.insert(s.to_lowercase()))
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Merge paths
// ────────────────────────────────────────────────────────────────────────────

/// Merges a parsed resume into `existing`. Pure and idempotent: applying the same
/// resume twice yields the same profile as applying it once. `version` and
/// timestamps are left to the store.
pub fn apply_parsed_resume(
    existing: &UserProfile,
    resume: &StructuredResume,
    policy: FillPolicy,
) -> UserProfile {
    let mut profile = existing.clone();
    let parsed = &resume.profile;

    // identity comes from account registration; the resume only fills gaps
    if let Some(name) = parsed.name.as_deref() {
        let (first, last) = split_name(name);
        merge_scalar(&mut profile.first_name, first, FillPolicy::FillEmptyOnly);
        merge_scalar(&mut profile.last_name, last, FillPolicy::FillEmptyOnly);
    }
    merge_scalar(&mut profile.email, clean(parsed.email.as_deref()), FillPolicy::FillEmptyOnly);

    merge_scalar(&mut profile.contact_number, clean(parsed.phone.as_deref()), policy);
    merge_scalar(&mut profile.bio, clean(parsed.summary.as_deref()), policy);
    merge_scalar(&mut profile.location, clean(parsed.location.as_deref()), policy);

    if let Some(url) = clean(parsed.url.as_deref()) {
        let normalized = Some(normalize_url(&url));
        if url.to_lowercase().contains("linkedin.com") {
            merge_scalar(&mut profile.linkedin_profile, normalized, policy);
        } else {
            merge_scalar(&mut profile.website, normalized, policy);
        }
    }

    if let Some(first_education) = resume.educations.first() {
        let year = first_education.date.as_deref().and_then(end_year);
        merge_scalar(&mut profile.graduation_year, year, policy);
        let department = first_education
            .degree
            .as_deref()
            .and_then(department_from_degree);
        merge_scalar(&mut profile.department, department, policy);
    }

    let work: Vec<WorkExperience> = resume
        .work_experiences
        .iter()
        .cloned()
        .map(WorkExperience::from)
        .collect();
    merge_collection(&mut profile.work_experiences, work, policy);

    let educations: Vec<Education> = resume
        .educations
        .iter()
        .cloned()
        .map(Education::from)
        .collect();
    merge_collection(&mut profile.educations, educations, policy);

    let projects: Vec<Project> = resume
        .projects
        .iter()
        .filter(|p| clean(p.project.as_deref()).is_some() || clean(p.date.as_deref()).is_some())
        .cloned()
        .map(Project::from)
        .collect();
    merge_collection(&mut profile.projects, projects, policy);

    merge_collection(&mut profile.skills, flatten_skill_names(&resume.skills), policy);
    merge_collection(
        &mut profile.featured_skills,
        resume.skills.featured_skills.clone(),
        policy,
    );

    profile.profile_complete = is_profile_complete(&profile);
    profile
}

/// Checks a manual update before it is applied. Returns a user-facing message.
pub fn validate_update(req: &ProfileUpdateRequest) -> Result<(), String> {
    if let Some(year) = req.graduation_year {
        if !(MIN_GRADUATION_YEAR..=MAX_GRADUATION_YEAR).contains(&year) {
            return Err(format!(
                "graduationYear must be between {MIN_GRADUATION_YEAR} and {MAX_GRADUATION_YEAR}"
            ));
        }
    }
    if let Some(featured) = &req.featured_skills {
        if let Some(bad) = featured.iter().find(|f| !(1..=5).contains(&f.rating)) {
            return Err(format!("rating for '{}' must be between 1 and 5", bad.skill));
        }
    }
    for (field, value) in [
        ("linkedinProfile", &req.linkedin_profile),
        ("website", &req.website),
    ] {
        if let Some(raw) = value.as_deref().filter(|v| !v.trim().is_empty()) {
            if !is_valid_url(&normalize_url(raw)) {
                return Err(format!("{field} is not a valid URL"));
            }
        }
    }
    Ok(())
}

/// Applies a form submission. Scalars follow the same non-empty rule as the
/// resume path; a collection that is present replaces the stored one, so the
/// form can clear a list by sending `[]`.
pub fn apply_manual_update(existing: &UserProfile, req: ProfileUpdateRequest) -> UserProfile {
    let mut profile = existing.clone();
    let policy = FillPolicy::OverwriteNonEmpty;

    merge_scalar(&mut profile.first_name, clean(req.first_name.as_deref()), policy);
    merge_scalar(&mut profile.last_name, clean(req.last_name.as_deref()), policy);
    merge_scalar(&mut profile.email, clean(req.email.as_deref()), policy);
    merge_scalar(&mut profile.contact_number, clean(req.contact_number.as_deref()), policy);
    merge_scalar(&mut profile.bio, clean(req.bio.as_deref()), policy);
    merge_scalar(&mut profile.location, clean(req.location.as_deref()), policy);
    merge_scalar(
        &mut profile.linkedin_profile,
        clean(req.linkedin_profile.as_deref()).map(|u| normalize_url(&u)),
        policy,
    );
    merge_scalar(
        &mut profile.website,
        clean(req.website.as_deref()).map(|u| normalize_url(&u)),
        policy,
    );
    merge_scalar(&mut profile.graduation_year, req.graduation_year, policy);
    merge_scalar(&mut profile.department, clean(req.department.as_deref()), policy);

    if let Some(work) = req.work_experiences {
        profile.work_experiences = work;
    }
    if let Some(educations) = req.educations {
        profile.educations = educations;
    }
    if let Some(projects) = req.projects {
        profile.projects = projects;
    }
    if let Some(skills) = req.skills {
        profile.skills = dedupe_skills(skills);
    }
    if let Some(featured) = req.featured_skills {
        profile.featured_skills = featured;
    }

    profile.profile_complete = is_profile_complete(&profile);
    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::models::{
        EducationEntry, FeaturedSkill, ProjectEntry, ResumeProfile, WorkExperienceEntry,
    };
    use uuid::Uuid;

    fn sample_resume() -> StructuredResume {
        StructuredResume {
            profile: ResumeProfile {
                name: Some("Jane Doe".into()),
                email: Some("jane@example.com".into()),
                phone: Some("+91 98765 43210".into()),
                url: Some("linkedin.com/in/jdoe".into()),
                summary: Some("Backend engineer.".into()),
                location: Some("Bangalore, India".into()),
            },
            work_experiences: vec![WorkExperienceEntry {
                company: Some("Acme".into()),
                job_title: Some("Engineer".into()),
                date: Some("2023 - Present".into()),
                descriptions: vec!["Built APIs".into()],
            }],
            educations: vec![EducationEntry {
                school: Some("DSCE".into()),
                degree: Some("B.E. Computer Science".into()),
                date: Some("2019 - 2023".into()),
                gpa: None,
                descriptions: vec![],
            }],
            projects: vec![
                ProjectEntry {
                    project: Some("Parser".into()),
                    ..Default::default()
                },
                ProjectEntry {
                    descriptions: vec!["orphan bullet".into()],
                    ..Default::default()
                },
            ],
            skills: SkillSet {
                featured_skills: vec![FeaturedSkill {
                    skill: "Rust".into(),
                    rating: 4,
                }],
                descriptions: vec!["Languages: Rust, Go,  ".into(), "SQL, , Docker".into()],
            },
        }
    }

    #[test]
    fn test_normalize_url_cases() {
        assert_eq!(normalize_url("  https://x.dev/a "), "https://x.dev/a");
        assert_eq!(normalize_url("http://x.dev"), "http://x.dev");
        assert_eq!(normalize_url("linkedin.com/in/jdoe"), "https://linkedin.com/in/jdoe");
        assert_eq!(
            normalize_url("www.linkedin.com/in/jdoe"),
            "https://www.linkedin.com/in/jdoe"
        );
        assert_eq!(normalize_url("jane.dev"), "https://jane.dev");
        assert_eq!(normalize_url("my portfolio site"), "my portfolio site");
        assert_eq!(normalize_url("   "), "");
    }

    #[test]
    fn test_merge_scalar_policies() {
        let mut target = Some("typed by hand".to_string());
        merge_scalar(&mut target, Some("  ".to_string()), FillPolicy::OverwriteNonEmpty);
        assert_eq!(target.as_deref(), Some("typed by hand"));
        merge_scalar(&mut target, None, FillPolicy::OverwriteNonEmpty);
        assert_eq!(target.as_deref(), Some("typed by hand"));
        merge_scalar(&mut target, Some("parsed".to_string()), FillPolicy::FillEmptyOnly);
        assert_eq!(target.as_deref(), Some("typed by hand"));
        merge_scalar(&mut target, Some("parsed".to_string()), FillPolicy::OverwriteNonEmpty);
        assert_eq!(target.as_deref(), Some("parsed"));
    }

    #[test]
    fn test_apply_parsed_resume_maps_fields() {
        let profile = apply_parsed_resume(
            &UserProfile::new(Uuid::nil()),
            &sample_resume(),
            FillPolicy::default(),
        );
        assert_eq!(profile.first_name.as_deref(), Some("Jane"));
        assert_eq!(profile.last_name.as_deref(), Some("Doe"));
        assert_eq!(profile.contact_number.as_deref(), Some("+91 98765 43210"));
        assert_eq!(
            profile.linkedin_profile.as_deref(),
            Some("https://linkedin.com/in/jdoe")
        );
        assert!(profile.website.is_none());
        assert_eq!(profile.graduation_year, Some(2023));
        assert_eq!(profile.department.as_deref(), Some("Computer Science"));
        assert_eq!(profile.projects.len(), 1);
        assert_eq!(profile.skills, vec!["Rust", "Go", "SQL", "Docker"]);
        assert!(profile.profile_complete);
    }

    #[test]
    fn test_reconciliation_is_idempotent() {
        let mut existing = UserProfile::new(Uuid::nil());
        existing.first_name = Some("Janet".into());
        existing.bio = Some("Hand-written bio".into());
        let resume = sample_resume();

        for policy in [FillPolicy::OverwriteNonEmpty, FillPolicy::FillEmptyOnly] {
            let once = apply_parsed_resume(&existing, &resume, policy);
            let twice = apply_parsed_resume(&once, &resume, policy);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_empty_resume_leaves_profile_unchanged() {
        let mut existing = UserProfile::new(Uuid::nil());
        existing.bio = Some("Hand-written bio".into());
        existing.skills = vec!["Kotlin".into()];
        existing.graduation_year = Some(2015);

        let merged = apply_parsed_resume(&existing, &StructuredResume::default(), FillPolicy::default());
        assert_eq!(merged, existing);
    }

    #[test]
    fn test_identity_fields_only_filled_when_empty() {
        let mut existing = UserProfile::new(Uuid::nil());
        existing.email = Some("jane@alumni.edu".into());
        let merged = apply_parsed_resume(&existing, &sample_resume(), FillPolicy::OverwriteNonEmpty);
        assert_eq!(merged.email.as_deref(), Some("jane@alumni.edu"));
        assert_eq!(merged.first_name.as_deref(), Some("Jane"));
    }

    #[test]
    fn test_fill_empty_only_keeps_existing_values() {
        let mut existing = UserProfile::new(Uuid::nil());
        existing.contact_number = Some("111-222-3333".into());
        existing.work_experiences = vec![WorkExperience {
            company: Some("Manual Co".into()),
            ..Default::default()
        }];
        let merged = apply_parsed_resume(&existing, &sample_resume(), FillPolicy::FillEmptyOnly);
        assert_eq!(merged.contact_number.as_deref(), Some("111-222-3333"));
        assert_eq!(merged.work_experiences[0].company.as_deref(), Some("Manual Co"));
        assert_eq!(merged.location.as_deref(), Some("Bangalore, India"));
    }

    #[test]
    fn test_website_vs_linkedin_routing() {
        let mut resume = StructuredResume::default();
        resume.profile.url = Some("jane.dev".into());
        let merged = apply_parsed_resume(&UserProfile::new(Uuid::nil()), &resume, FillPolicy::default());
        assert_eq!(merged.website.as_deref(), Some("https://jane.dev"));
        assert!(merged.linkedin_profile.is_none());
    }

    #[test]
    fn test_department_from_degree() {
        assert_eq!(
            department_from_degree("B.E. Computer Science").as_deref(),
            Some("Computer Science")
        );
        assert_eq!(
            department_from_degree("Bachelor of Science in Physics").as_deref(),
            Some("Physics")
        );
        assert_eq!(department_from_degree("B.Tech (Electronics)").as_deref(), Some("Electronics"));
        assert_eq!(department_from_degree("Master of Business Administration"), None);
    }

    #[test]
    fn test_manual_update_validation() {
        let bad_year = ProfileUpdateRequest {
            graduation_year: Some(1900),
            ..Default::default()
        };
        assert!(validate_update(&bad_year).is_err());

        let bad_rating = ProfileUpdateRequest {
            featured_skills: Some(vec![FeaturedSkill {
                skill: "Go".into(),
                rating: 7,
            }]),
            ..Default::default()
        };
        assert!(validate_update(&bad_rating).is_err());

        let bad_url = ProfileUpdateRequest {
            website: Some("not a link".into()),
            ..Default::default()
        };
        assert!(validate_update(&bad_url).is_err());

        let ok = ProfileUpdateRequest {
            linkedin_profile: Some("linkedin.com/in/jdoe".into()),
            graduation_year: Some(2020),
            ..Default::default()
        };
        assert!(validate_update(&ok).is_ok());
    }

    #[test]
    fn test_manual_update_shares_merge_rule() {
        let mut existing = UserProfile::new(Uuid::nil());
        existing.bio = Some("Keep me".into());
        existing.skills = vec!["Rust".into()];

        let merged = apply_manual_update(
            &existing,
            ProfileUpdateRequest {
                bio: Some("".into()),
                website: Some("jane.dev".into()),
                skills: Some(vec!["Go".into(), "go".into(), " ".into()]),
                projects: Some(vec![]),
                ..Default::default()
            },
        );
        assert_eq!(merged.bio.as_deref(), Some("Keep me"));
        assert_eq!(merged.website.as_deref(), Some("https://jane.dev"));
        assert_eq!(merged.skills, vec!["Go"]);
        assert!(merged.projects.is_empty());
    }
}
