use super::features::{find_email, find_phone, find_url, has_job_title, is_location, strip_bullet};
use super::models::{Line, ResumeProfile, Section};

/// Separators commonly used to put several contact items on one line.
const SEGMENT_SEPARATORS: &[char] = &['|', '•', '·', '◆', '⋄'];

const MAX_NAME_WORDS: usize = 5;

fn segments(text: &str) -> impl Iterator<Item = &str> {
    text.split(SEGMENT_SEPARATORS)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn looks_like_name(text: &str) -> bool {
    let words = text.split_whitespace().count();
    (1..=MAX_NAME_WORDS).contains(&words)
        && text.len() <= 48
        && text.chars().any(char::is_alphabetic)
        && !text.chars().any(|c| c.is_ascii_digit() || matches!(c, '@' | ':' | '/'))
        && !text.ends_with('.')
}

/// Extracts contact fields and a summary from the PROFILE sections.
///
/// The name is only taken from the untitled block at the top of the resume;
/// sections opened by a "Summary"/"Objective" heading contribute to the summary.
pub fn extract_profile(sections: &[&Section]) -> ResumeProfile {
    let mut profile = ResumeProfile::default();
    let mut summary: Vec<String> = Vec::new();

    for section in sections {
        for line in section.body() {
            let consumed = consume_line(&mut profile, line, !section.has_heading);
            if !consumed {
                let text = strip_bullet(&line.text()).to_string();
                if !text.is_empty() {
                    summary.push(text);
                }
            }
        }
    }

    if !summary.is_empty() {
        profile.summary = Some(summary.join(" "));
    }
    profile
}

/// Assigns any contact features found on the line. Returns true when the line
/// was used for at least one field.
fn consume_line(profile: &mut ResumeProfile, line: &Line, name_allowed: bool) -> bool {
    let text = line.text();
    let mut consumed = false;
    let mut name_candidate: Option<&str> = None;

    for segment in segments(&text) {
        let mut matched = false;
        if let Some(email) = find_email(segment) {
            profile.email.get_or_insert_with(|| email.to_string());
            matched = true;
        }
        if let Some(phone) = find_phone(segment) {
            profile.phone.get_or_insert_with(|| phone.to_string());
            matched = true;
        }
        if let Some(url) = find_url(segment) {
            profile.url.get_or_insert(url);
            matched = true;
        }
        // "Software Engineer, Google" is a headline, not a place.
        if !matched
            && profile.location.is_none()
            && is_location(segment)
            && !has_job_title(segment)
        {
            profile.location = Some(segment.to_string());
            matched = true;
        }
        if matched {
            consumed = true;
        } else if name_candidate.is_none() {
            name_candidate = Some(segment);
        }
    }

    if let Some(candidate) = name_candidate {
        if name_allowed && profile.name.is_none() && looks_like_name(candidate) {
            profile.name = Some(candidate.to_string());
            consumed = true;
        }
    }
    consumed
}
