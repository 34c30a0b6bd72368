//! Entry extractors for WORK_EXPERIENCE, EDUCATION and PROJECT sections.
//!
//! A section body is first split into entry groups using layout cues, then each
//! group is read the same way: pick the date, take the first remaining line as
//! the primary label and a short following line as the secondary label, and
//! collect everything else as descriptions.

use super::features::{
    find_date_range, find_gpa, find_single_date, has_degree, has_job_title, has_school, is_bullet,
    strip_bullet,
};
use super::models::{EducationEntry, Line, ProjectEntry, Section, WorkExperienceEntry};

/// A vertical gap this many times the median line pitch is a blank line.
const BLANK_LINE_PITCH_RATIO: f32 = 1.5;

/// Font-size increase (pt) that marks the start of a new entry.
const FONT_JUMP: f32 = 0.5;

/// Secondary labels are short; longer lines are descriptions.
const MAX_SECONDARY_WORDS: usize = 10;

/// Characters trimmed from what is left of a line after removing its date.
const SEPARATOR_CHARS: &[char] = &[',', '|', '-', '–', '—', ':', '(', ')', '·', '•', '@'];

/// Separators that may join two labels on a single line.
const INLINE_LABEL_SEPARATORS: &[&str] = &[" | ", " — ", " – ", " - ", " · "];

// ────────────────────────────────────────────────────────────────────────────
// Entry grouping
// ────────────────────────────────────────────────────────────────────────────

fn median_pitch(lines: &[Line]) -> Option<f32> {
    let mut pitches: Vec<f32> = lines
        .windows(2)
        .filter(|w| w[0].page == w[1].page)
        .map(|w| w[1].y - w[0].y)
        .filter(|gap| *gap > 0.5)
        .collect();
    if pitches.is_empty() {
        return None;
    }
    pitches.sort_by(f32::total_cmp);
    Some(pitches[pitches.len() / 2])
}

/// Splits a section body into entry groups.
///
/// A new entry starts at a blank-line sized gap, a jump up in font size, a bold
/// line following a non-bold one, or a non-bullet line back at (or left of) the
/// bullet column after a run of bullets.
pub fn split_entry_groups(lines: &[Line]) -> Vec<&[Line]> {
    let pitch = median_pitch(lines);
    let mut groups = Vec::new();
    let mut start = 0;
    let mut bullet_x: Option<f32> = None;
    let mut in_bullets = false;

    for i in 0..lines.len() {
        let line = &lines[i];
        let text = line.text();
        let bullet = is_bullet(&text);

        if i > start {
            let prev = &lines[i - 1];
            let gap = (line.page == prev.page).then(|| line.y - prev.y);
            let blank = matches!((gap, pitch), (Some(g), Some(p)) if g > p * BLANK_LINE_PITCH_RATIO);
            let font_jump = line.font_size > prev.font_size + FONT_JUMP;
            let bold_start = line.is_bold() && !prev.is_bold();
            let back_out = !bullet
                && in_bullets
                && bullet_x.is_some_and(|x| line.x <= x + 1.0);

            if blank || font_jump || bold_start || back_out {
                groups.push(&lines[start..i]);
                start = i;
                bullet_x = None;
                in_bullets = false;
            }
        }

        if bullet {
            bullet_x.get_or_insert(line.x);
            in_bullets = true;
        }
    }
    if start < lines.len() {
        groups.push(&lines[start..]);
    }
    groups
}

// ────────────────────────────────────────────────────────────────────────────
// Reading one entry
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct EntryDraft {
    primary: Option<String>,
    secondary: Option<String>,
    date: Option<String>,
    gpa: Option<String>,
    descriptions: Vec<String>,
}

struct DraftLine {
    text: String,
    bullet: bool,
}

fn trim_separators(text: &str) -> String {
    text.trim_matches(|c: char| c.is_whitespace() || SEPARATOR_CHARS.contains(&c))
        .to_string()
}

fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}

/// Removes the entry's date from the lines it came from.
///
/// Preference: a full range on a non-bullet line, then a single date on a
/// non-bullet line, then a full range inside a bullet.
fn take_date(lines: &mut [DraftLine]) -> Option<String> {
    let position = lines
        .iter()
        .position(|l| !l.bullet && find_date_range(&l.text).is_some())
        .map(|i| (i, true))
        .or_else(|| {
            lines
                .iter()
                .position(|l| !l.bullet && find_single_date(&l.text).is_some())
                .map(|i| (i, false))
        })
        .or_else(|| {
            lines
                .iter()
                .position(|l| l.bullet && find_date_range(&l.text).is_some())
                .map(|i| (i, true))
        });

    let (index, range) = position?;
    let line = &mut lines[index];
    let found = if range {
        find_date_range(&line.text)
    } else {
        find_single_date(&line.text)
    }?;
    let date = found.as_str().trim().to_string();
    let remainder = format!("{} {}", &line.text[..found.start()], &line.text[found.end()..]);
    line.text = if line.bullet {
        remainder.split_whitespace().collect::<Vec<_>>().join(" ")
    } else {
        trim_separators(&remainder.split_whitespace().collect::<Vec<_>>().join(" "))
    };
    Some(date)
}

fn take_gpa(lines: &mut [DraftLine]) -> Option<String> {
    for line in lines.iter_mut() {
        if let Some((value, found)) = find_gpa(&line.text) {
            let remainder = format!("{} {}", &line.text[..found.start()], &line.text[found.end()..]);
            line.text = trim_separators(&remainder.split_whitespace().collect::<Vec<_>>().join(" "));
            return Some(value);
        }
    }
    None
}

fn read_entry(group: &[Line], with_gpa: bool) -> EntryDraft {
    let mut lines: Vec<DraftLine> = group
        .iter()
        .map(|line| {
            let text = line.text();
            let bullet = is_bullet(&text);
            DraftLine {
                text: if bullet { strip_bullet(&text).to_string() } else { text },
                bullet,
            }
        })
        .collect();

    let mut draft = EntryDraft {
        gpa: if with_gpa { take_gpa(&mut lines) } else { None },
        date: take_date(&mut lines),
        ..Default::default()
    };

    let mut rest = lines.into_iter().filter(|l| !l.text.is_empty()).peekable();

    if let Some(first) = rest.next_if(|l| !l.bullet) {
        draft.primary = Some(first.text);
        if let Some(second) = rest.next_if(|l| {
            !l.bullet && l.text.split_whitespace().count() <= MAX_SECONDARY_WORDS
        }) {
            draft.secondary = Some(second.text);
        }
    }

    let mut seen_bullet = false;
    for line in rest {
        if line.bullet {
            seen_bullet = true;
            draft.descriptions.push(line.text);
        } else if seen_bullet {
            // wrapped continuation of the previous bullet
            if let Some(last) = draft.descriptions.last_mut() {
                last.push(' ');
                last.push_str(&line.text);
            }
        } else {
            draft.descriptions.push(line.text);
        }
    }
    draft
}

/// Splits "A | B" style single-line labels into two parts.
fn split_inline_labels(text: &str) -> Option<(String, String)> {
    INLINE_LABEL_SEPARATORS.iter().find_map(|sep| {
        let (left, right) = text.split_once(sep)?;
        let (left, right) = (trim_separators(left), trim_separators(right));
        (!left.is_empty() && !right.is_empty()).then_some((left, right))
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Section-specific readers
// ────────────────────────────────────────────────────────────────────────────

pub fn extract_work_experiences(section: &Section) -> Vec<WorkExperienceEntry> {
    split_entry_groups(section.body())
        .into_iter()
        .map(|group| work_entry(read_entry(group, false)))
        .filter(|entry| {
            entry.company.is_some()
                || entry.job_title.is_some()
                || entry.date.is_some()
                || !entry.descriptions.is_empty()
        })
        .collect()
}

fn work_entry(draft: EntryDraft) -> WorkExperienceEntry {
    let (mut first, mut second) = (draft.primary, draft.secondary);

    if second.is_none() {
        if let Some(line) = first.clone() {
            if let Some((title, company)) = split_title_at_company(&line) {
                return WorkExperienceEntry {
                    company: Some(company),
                    job_title: Some(title),
                    date: draft.date,
                    descriptions: draft.descriptions,
                };
            }
            if let Some((left, right)) = split_inline_labels(&line) {
                first = Some(left);
                second = Some(right);
            }
        }
    }

    let first_is_title = first.as_deref().is_some_and(has_job_title);
    let second_is_title = second.as_deref().is_some_and(has_job_title);
    let (company, job_title) = if first_is_title && !second_is_title {
        (second, first)
    } else {
        (first, second)
    };

    WorkExperienceEntry {
        company,
        job_title,
        date: draft.date,
        descriptions: draft.descriptions,
    }
}

/// "Software Engineer at Acme" → ("Software Engineer", "Acme").
fn split_title_at_company(text: &str) -> Option<(String, String)> {
    [" at ", " @ "].iter().find_map(|sep| {
        let (title, company) = text.split_once(sep)?;
        let (title, company) = (trim_separators(title), trim_separators(company));
        (has_job_title(&title) && !company.is_empty()).then_some((title, company))
    })
}

pub fn extract_educations(section: &Section) -> Vec<EducationEntry> {
    split_entry_groups(section.body())
        .into_iter()
        .map(|group| education_entry(read_entry(group, true)))
        .filter(|entry| {
            entry.school.is_some()
                || entry.degree.is_some()
                || entry.date.is_some()
                || entry.gpa.is_some()
                || !entry.descriptions.is_empty()
        })
        .collect()
}

fn education_entry(draft: EntryDraft) -> EducationEntry {
    let (mut first, mut second) = (draft.primary, draft.secondary);

    if second.is_none() {
        if let Some((left, right)) = first.as_deref().and_then(split_inline_labels) {
            first = Some(left);
            second = Some(right);
        }
    }

    let first_is_degree = first.as_deref().is_some_and(has_degree);
    let second_is_degree = second.as_deref().is_some_and(has_degree);
    let second_is_school = second.as_deref().is_some_and(has_school);
    let first_is_school = first.as_deref().is_some_and(has_school);

    let (school, degree) = if (first_is_degree && !second_is_degree)
        || (second_is_school && !first_is_school)
    {
        (second, first)
    } else {
        (first, second)
    };

    EducationEntry {
        school,
        degree,
        date: draft.date,
        gpa: draft.gpa,
        descriptions: draft.descriptions,
    }
}

pub fn extract_projects(section: &Section) -> Vec<ProjectEntry> {
    split_entry_groups(section.body())
        .into_iter()
        .map(|group| {
            let draft = read_entry(group, false);
            ProjectEntry {
                project: draft.primary,
                subtitle: draft.secondary,
                date: draft.date,
                descriptions: draft.descriptions,
            }
        })
        .filter(|entry| {
            entry.project.is_some()
                || entry.subtitle.is_some()
                || entry.date.is_some()
                || !entry.descriptions.is_empty()
        })
        .collect()
}
