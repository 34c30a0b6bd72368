//! Lines → labeled sections.
//!
//! A line opens a new section when it matches a heading keyword or when it looks
//! like a heading typographically (noticeably larger than body text, or a short
//! bold all-caps line). Everything before the first heading is the PROFILE block.

use std::collections::HashMap;

use super::features::{has_date, is_bullet, is_email, is_phone, is_url};
use super::models::{Line, Section, SectionLabel};

/// Maximum words for a line to be treated as a heading.
const MAX_HEADING_WORDS: usize = 4;

/// Font-size outlier thresholds relative to the body size.
const HEADING_SIZE_RATIO: f32 = 1.15;
const HEADING_SIZE_MIN_DELTA: f32 = 1.0;

/// Heading keywords, most specific first. The first phrase found wins, so
/// "project experience" is a PROJECT heading, not WORK_EXPERIENCE.
const HEADING_KEYWORDS: &[(&str, SectionLabel)] = &[
    // multi-word phrases
    ("project experience", SectionLabel::Project),
    ("academic projects", SectionLabel::Project),
    ("personal projects", SectionLabel::Project),
    ("key projects", SectionLabel::Project),
    ("work experience", SectionLabel::WorkExperience),
    ("professional experience", SectionLabel::WorkExperience),
    ("relevant experience", SectionLabel::WorkExperience),
    ("internship experience", SectionLabel::WorkExperience),
    ("employment history", SectionLabel::WorkExperience),
    ("work history", SectionLabel::WorkExperience),
    ("career history", SectionLabel::WorkExperience),
    ("academic background", SectionLabel::Education),
    ("educational background", SectionLabel::Education),
    ("academic qualifications", SectionLabel::Education),
    ("educational qualifications", SectionLabel::Education),
    ("technical skills", SectionLabel::Skills),
    ("core competencies", SectionLabel::Skills),
    ("key skills", SectionLabel::Skills),
    ("tech stack", SectionLabel::Skills),
    ("professional summary", SectionLabel::Profile),
    ("career objective", SectionLabel::Profile),
    ("about me", SectionLabel::Profile),
    ("contact information", SectionLabel::Profile),
    ("personal details", SectionLabel::Profile),
    ("positions of responsibility", SectionLabel::Other),
    ("extracurricular activities", SectionLabel::Other),
    ("areas of interest", SectionLabel::Other),
    // core single words
    ("projects", SectionLabel::Project),
    ("project", SectionLabel::Project),
    ("experience", SectionLabel::WorkExperience),
    ("employment", SectionLabel::WorkExperience),
    ("internships", SectionLabel::WorkExperience),
    ("internship", SectionLabel::WorkExperience),
    ("education", SectionLabel::Education),
    ("academics", SectionLabel::Education),
    ("qualifications", SectionLabel::Education),
    ("skills", SectionLabel::Skills),
    ("technologies", SectionLabel::Skills),
    ("expertise", SectionLabel::Skills),
    ("competencies", SectionLabel::Skills),
    ("summary", SectionLabel::Profile),
    ("objective", SectionLabel::Profile),
    ("profile", SectionLabel::Profile),
    ("about", SectionLabel::Profile),
    // blocks that only close the previous section
    ("certifications", SectionLabel::Other),
    ("certificates", SectionLabel::Other),
    ("awards", SectionLabel::Other),
    ("achievements", SectionLabel::Other),
    ("honors", SectionLabel::Other),
    ("publications", SectionLabel::Other),
    ("languages", SectionLabel::Other),
    ("interests", SectionLabel::Other),
    ("hobbies", SectionLabel::Other),
    ("activities", SectionLabel::Other),
    ("volunteering", SectionLabel::Other),
    ("leadership", SectionLabel::Other),
    ("coursework", SectionLabel::Other),
    ("references", SectionLabel::Other),
];

/// Character-weighted modal font size of the document, bucketed to 0.5pt.
pub fn body_font_size(lines: &[Line]) -> f32 {
    let mut weights: HashMap<i32, usize> = HashMap::new();
    for line in lines {
        let bucket = (line.font_size * 2.0).round() as i32;
        *weights.entry(bucket).or_default() += line.char_count();
    }
    weights
        .into_iter()
        .max_by(|(size_a, weight_a), (size_b, weight_b)| {
            weight_a.cmp(weight_b).then(size_b.cmp(size_a))
        })
        .map(|(bucket, _)| bucket as f32 / 2.0)
        .unwrap_or(super::fragments::DEFAULT_FONT_SIZE)
}

fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '&' { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn contains_words(haystack: &str, phrase: &str) -> bool {
    let words: Vec<&str> = haystack.split(' ').collect();
    let needle: Vec<&str> = phrase.split(' ').collect();
    words.windows(needle.len()).any(|w| w == needle.as_slice())
}

/// Label for a heading text, if it names a known section.
///
/// Exact matches always count; a short line that merely contains the phrase only
/// counts when `emphasized` (the line stands out typographically).
pub fn match_heading_keyword(text: &str, emphasized: bool) -> Option<SectionLabel> {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return None;
    }
    if let Some((_, label)) = HEADING_KEYWORDS.iter().find(|(phrase, _)| *phrase == normalized) {
        return Some(*label);
    }
    let word_count = normalized.split(' ').count();
    if !emphasized || word_count > MAX_HEADING_WORDS {
        return None;
    }
    HEADING_KEYWORDS
        .iter()
        .find(|(phrase, _)| contains_words(&normalized, phrase))
        .map(|(_, label)| *label)
}

fn is_heading_shaped(text: &str) -> bool {
    let words = text.split_whitespace().count();
    let carries_content = text.contains(',')
        || text
            .split_once(':')
            .is_some_and(|(_, rest)| !rest.trim().is_empty());
    (1..=MAX_HEADING_WORDS).contains(&words)
        && !carries_content
        && !is_bullet(text)
        && !is_email(text)
        && !is_phone(text)
        && !is_url(text)
        && !has_date(text)
}

fn is_all_caps(text: &str) -> bool {
    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase())
}

/// Decides whether `line` opens a new section and with which label.
pub fn classify_heading(line: &Line, index: usize, body_size: f32) -> Option<SectionLabel> {
    let text = line.text();
    if index == 0 || !is_heading_shaped(&text) {
        return None;
    }

    let larger = line.font_size >= body_size * HEADING_SIZE_RATIO
        && line.font_size >= body_size + HEADING_SIZE_MIN_DELTA;
    let bold_caps = line.is_bold() && is_all_caps(&text);
    let emphasized = larger
        || line.is_bold()
        || is_all_caps(&text)
        || text.trim_end().ends_with(':');

    if let Some(label) = match_heading_keyword(&text, emphasized) {
        return Some(label);
    }
    (larger || bold_caps).then_some(SectionLabel::Other)
}

/// Partitions lines into labeled sections. Concatenating every section's lines
/// in order reproduces the input.
pub fn group_into_sections(lines: Vec<Line>) -> Vec<Section> {
    let body_size = body_font_size(&lines);
    let mut sections = Vec::new();
    let mut current = Section {
        label: SectionLabel::Profile,
        has_heading: false,
        lines: Vec::new(),
    };

    for (index, line) in lines.into_iter().enumerate() {
        match classify_heading(&line, index, body_size) {
            Some(label) => {
                let finished = std::mem::replace(
                    &mut current,
                    Section {
                        label,
                        has_heading: true,
                        lines: vec![line],
                    },
                );
                if !finished.lines.is_empty() {
                    sections.push(finished);
                }
            }
            None => current.lines.push(line),
        }
    }
    if !current.lines.is_empty() {
        sections.push(current);
    }
    sections
}
