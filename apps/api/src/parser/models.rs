//! Intermediate and output types of the resume parsing pipeline.
//!
//! Fragments → Lines → Sections are internal representations; `StructuredResume`
//! is the wire type handed to profile reconciliation and returned by the parse API.

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Layout types
// ────────────────────────────────────────────────────────────────────────────

/// One positioned run of text extracted from a PDF page.
///
/// Coordinates use a top-left origin with `y` growing downward, so sorting by `y`
/// yields reading order within a page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    /// 1-based page number.
    pub page: u32,
}

impl TextFragment {
    pub fn mid_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    fn char_count(&self) -> usize {
        self.text.chars().filter(|c| !c.is_whitespace()).count()
    }
}

/// Fragments judged to share a single visual row, ordered left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub fragments: Vec<TextFragment>,
    pub page: u32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Size of the fragment carrying the most characters.
    pub font_size: f32,
}

impl Line {
    /// Builds a line from fragments already known to share a row.
    /// Fragments are re-sorted left to right; the bounding box is their union.
    pub fn from_fragments(mut fragments: Vec<TextFragment>) -> Self {
        fragments.sort_by(|a, b| a.x.total_cmp(&b.x));

        let page = fragments.first().map(|f| f.page).unwrap_or(1);
        let left = fragments.iter().map(|f| f.x).fold(f32::INFINITY, f32::min);
        let top = fragments.iter().map(|f| f.y).fold(f32::INFINITY, f32::min);
        let right = fragments
            .iter()
            .map(TextFragment::right)
            .fold(f32::NEG_INFINITY, f32::max);
        let bottom = fragments
            .iter()
            .map(|f| f.y + f.height)
            .fold(f32::NEG_INFINITY, f32::max);

        let font_size = fragments
            .iter()
            .max_by(|a, b| {
                a.char_count()
                    .cmp(&b.char_count())
                    .then(a.font_size.total_cmp(&b.font_size))
            })
            .map(|f| f.font_size)
            .unwrap_or(0.0);

        let (x, y, width, height) = if fragments.is_empty() {
            (0.0, 0.0, 0.0, 0.0)
        } else {
            (left, top, right - left, bottom - top)
        };

        Line {
            fragments,
            page,
            x,
            y,
            width,
            height,
            font_size,
        }
    }

    /// Line text with whitespace collapsed. A space is inserted between fragments
    /// that do not touch horizontally.
    pub fn text(&self) -> String {
        let mut out = String::new();
        let mut prev_right: Option<f32> = None;
        for fragment in &self.fragments {
            if let Some(right) = prev_right {
                let gap = fragment.x - right;
                let touching = gap < fragment.font_size * 0.15;
                if !touching && !out.ends_with(' ') && !fragment.text.starts_with(' ') {
                    out.push(' ');
                }
            }
            out.push_str(&fragment.text);
            prev_right = Some(fragment.right());
        }
        out.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// True when most of the line's characters are bold.
    pub fn is_bold(&self) -> bool {
        let (bold, total) = self.fragments.iter().fold((0, 0), |(b, t), f| {
            let n = f.char_count();
            (if f.bold { b + n } else { b }, t + n)
        });
        total > 0 && bold * 2 > total
    }

    pub fn char_count(&self) -> usize {
        self.fragments.iter().map(TextFragment::char_count).sum()
    }
}

/// Fixed set of section labels a resume is partitioned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionLabel {
    Profile,
    Education,
    WorkExperience,
    Project,
    Skills,
    Other,
}

/// A labeled contiguous run of lines. When `has_heading` is set, `lines[0]` is
/// the heading line that opened the section.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub label: SectionLabel,
    pub has_heading: bool,
    pub lines: Vec<Line>,
}

impl Section {
    /// Lines after the heading.
    pub fn body(&self) -> &[Line] {
        if self.has_heading && !self.lines.is_empty() {
            &self.lines[1..]
        } else {
            &self.lines
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Structured output
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeProfile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub url: Option<String>,
    pub summary: Option<String>,
    pub location: Option<String>,
}

impl ResumeProfile {
    pub fn is_empty(&self) -> bool {
        [
            &self.name,
            &self.email,
            &self.phone,
            &self.url,
            &self.summary,
            &self.location,
        ]
        .iter()
        .all(|v| v.is_none())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkExperienceEntry {
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub date: Option<String>,
    pub descriptions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EducationEntry {
    pub school: Option<String>,
    pub degree: Option<String>,
    pub date: Option<String>,
    pub gpa: Option<String>,
    pub descriptions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectEntry {
    pub project: Option<String>,
    pub subtitle: Option<String>,
    pub date: Option<String>,
    pub descriptions: Vec<String>,
}

/// A visually emphasized skill with an inferred proficiency in 1..=5.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedSkill {
    pub skill: String,
    pub rating: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkillSet {
    pub featured_skills: Vec<FeaturedSkill>,
    pub descriptions: Vec<String>,
}

/// Terminal output of one parse. Never persisted verbatim; it is merged into a
/// `UserProfile` by `profile::merge::apply_parsed_resume`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StructuredResume {
    pub profile: ResumeProfile,
    pub work_experiences: Vec<WorkExperienceEntry>,
    pub educations: Vec<EducationEntry>,
    pub projects: Vec<ProjectEntry>,
    pub skills: SkillSet,
}

impl StructuredResume {
    /// An all-empty result. Callers treat it as a soft failure (e.g. a scanned
    /// resume without a text layer) and fall back to manual entry.
    pub fn is_empty(&self) -> bool {
        self.profile.is_empty()
            && self.work_experiences.is_empty()
            && self.educations.is_empty()
            && self.projects.is_empty()
            && self.skills.featured_skills.is_empty()
            && self.skills.descriptions.is_empty()
    }
}
