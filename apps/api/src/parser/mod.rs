//! Resume extraction pipeline.
//!
//! PDF bytes → fragments → lines → sections → `StructuredResume`. Each stage is a
//! plain function from one representation to the next; only the first stage can
//! fail. Misclassification is never an error: unknown content lands in an OTHER
//! section or in a free-text description.

pub mod entries;
pub mod features;
pub mod fragments;
pub mod lines;
pub mod models;
pub mod profile;
pub mod sections;
pub mod skills;

use thiserror::Error;
use tracing::{debug, info};

use self::fragments::{extract_fragments, load_pdf_bytes, PdfSource};
use self::models::{SectionLabel, StructuredResume, TextFragment};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Input is not a PDF document")]
    NotPdf,

    #[error("PDF is encrypted")]
    Encrypted,

    #[error("PDF could not be decoded: {0}")]
    Unreadable(String),

    #[error("Resume download failed: {0}")]
    Fetch(String),

    #[error("Resume file could not be read: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs the layout stages over already-extracted fragments.
pub fn parse_fragments(fragments: &[TextFragment]) -> StructuredResume {
    let lines = lines::group_into_lines(fragments);
    let sections = sections::group_into_sections(lines);
    debug!(
        "Grouped {} fragments into {} sections",
        fragments.len(),
        sections.len()
    );

    let mut resume = StructuredResume::default();
    let profile_sections: Vec<_> = sections
        .iter()
        .filter(|s| s.label == SectionLabel::Profile)
        .collect();
    resume.profile = profile::extract_profile(&profile_sections);

    for section in &sections {
        match section.label {
            SectionLabel::WorkExperience => resume
                .work_experiences
                .extend(entries::extract_work_experiences(section)),
            SectionLabel::Education => resume
                .educations
                .extend(entries::extract_educations(section)),
            SectionLabel::Project => resume.projects.extend(entries::extract_projects(section)),
            SectionLabel::Skills => {
                let skills = skills::extract_skills(section);
                resume.skills.featured_skills.extend(skills.featured_skills);
                resume.skills.descriptions.extend(skills.descriptions);
            }
            SectionLabel::Profile | SectionLabel::Other => {}
        }
    }
    resume
}

/// Parses an in-memory PDF. CPU-bound; call from a blocking context.
pub fn parse_resume_bytes(bytes: &[u8]) -> Result<StructuredResume, ParseError> {
    let fragments = extract_fragments(bytes)?;
    let resume = parse_fragments(&fragments);
    info!(
        "Parsed resume: {} work, {} education, {} projects, {} featured skills, empty={}",
        resume.work_experiences.len(),
        resume.educations.len(),
        resume.projects.len(),
        resume.skills.featured_skills.len(),
        resume.is_empty()
    );
    Ok(resume)
}

/// Loads a resume from `source` and parses it on the blocking thread pool.
pub async fn parse_resume(
    source: PdfSource,
    http: &reqwest::Client,
) -> Result<StructuredResume, ParseError> {
    let bytes = load_pdf_bytes(source, http).await?;
    tokio::task::spawn_blocking(move || parse_resume_bytes(&bytes))
        .await
        .map_err(|e| ParseError::Unreadable(format!("parser task failed: {e}")))?
}


#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::parser::models::{Line, Section};

    #[test]
    fn test_end_to_end_jane_doe() {
        let resume = parse_resume_bytes(&test_pdf::jane_doe()).unwrap();

        assert_eq!(resume.profile.name.as_deref(), Some("Jane Doe"));
        assert_eq!(resume.profile.email.as_deref(), Some("jane@example.com"));
        assert_eq!(resume.educations.len(), 1);
        let education = &resume.educations[0];
        assert_eq!(education.school.as_deref(), Some("DSCE, Bangalore"));
        assert_eq!(education.degree.as_deref(), Some("B.E. Computer Science"));
        assert_eq!(education.date.as_deref(), Some("2019 - 2023"));
        assert!(resume.work_experiences.is_empty());
    }

    #[test]
    fn test_non_pdf_input_is_unreadable() {
        let err = parse_resume_bytes(b"Name: Jane Doe\nEmail: jane@example.com").unwrap_err();
        assert!(matches!(err, ParseError::NotPdf));
    }

    #[test]
    fn test_pdf_without_text_layer_yields_empty_resume() {
        let resume = parse_resume_bytes(&test_pdf::build(&[])).unwrap();
        assert!(resume.is_empty());
    }

    #[test]
    fn test_sections_partition_extracted_lines() {
        let fragments = extract_fragments(&test_pdf::jane_doe()).unwrap();
        let lines = lines::group_into_lines(&fragments);
        let sections: Vec<Section> = sections::group_into_sections(lines.clone());
        let rejoined: Vec<Line> = sections.into_iter().flat_map(|s| s.lines).collect();
        assert_eq!(rejoined, lines);
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_parse_fragments_concatenates_repeated_sections() {
        let fragment = |text: &str, y: f32, size: f32| TextFragment {
            text: text.to_string(),
            x: 40.0,
            y,
            width: 200.0,
            height: size,
            font_size: size,
            bold: false,
            italic: false,
            page: 1,
        };
        let resume = parse_fragments(&[
            fragment("Jane Doe", 10.0, 18.0),
            fragment("EXPERIENCE", 40.0, 12.0),
            fragment("Acme Corp, 2020 - 2022", 56.0, 10.0),
            fragment("PROJECTS", 80.0, 12.0),
            fragment("Resume Parser", 96.0, 10.0),
            fragment("WORK HISTORY", 120.0, 12.0),
            fragment("Globex, 2018 - 2020", 136.0, 10.0),
        ]);
        let companies: Vec<_> = resume
            .work_experiences
            .iter()
            .map(|w| w.company.as_deref())
            .collect();
        assert_eq!(companies, vec![Some("Acme Corp"), Some("Globex")]);
        assert_eq!(resume.projects[0].project.as_deref(), Some("Resume Parser"));
    }

    #[tokio::test]
    async fn test_parse_resume_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&test_pdf::jane_doe()).unwrap();

        let http = reqwest::Client::new();
        let resume = parse_resume(PdfSource::Path(file.path().to_path_buf()), &http)
            .await
            .unwrap();
        assert_eq!(resume.profile.name.as_deref(), Some("Jane Doe"));
    }

    #[tokio::test]
    async fn test_missing_path_is_io_error() {
        let http = reqwest::Client::new();
        let err = parse_resume(PdfSource::Path("/nonexistent/resume.pdf".into()), &http)
            .await
            .unwrap_err();
        assert!(matches!(err, ParseError::Io(_)));
    }
}
