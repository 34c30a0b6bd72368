//! Feature scorers: pure, stateless per-field heuristics.
//!
//! Each scorer inspects one line (or token) for a single semantic feature. They are
//! composed by the section extractors and never call each other, except that the
//! URL scorer masks out email spans first so `jane@example.com` is not read as
//! the domain `example.com`.

use lazy_static::lazy_static;
use regex::{Match, Regex};

lazy_static! {
    static ref RE_EMAIL: Regex =
        Regex::new(r"(?i)[a-z0-9._%+\-]+@[a-z0-9\-]+(?:\.[a-z0-9\-]+)*\.[a-z]{2,}").unwrap();

    /// Loose phone shape; digit count is checked separately.
    static ref RE_PHONE: Regex =
        Regex::new(r"(?:\+\s?)?(?:\(\d{1,4}\)[\s.\-]?)?\d{1,5}(?:[\s.\-]?\d{2,5}){1,4}").unwrap();

    static ref RE_URL_WITH_SCHEME: Regex = Regex::new(r"(?i)\bhttps?://[^\s|,;]+").unwrap();

    static ref RE_URL_BARE: Regex = Regex::new(
        r"(?i)\b(?:www\.)?[a-z0-9][a-z0-9\-]*(?:\.[a-z0-9\-]+)*\.(?:com|org|net|io|dev|in|me|co|edu|ai|app|xyz|tech|us|uk|gov|info|site|page)\b(?:/[^\s|,;]*)?"
    )
    .unwrap();

    static ref RE_DATE_RANGE: Regex = Regex::new(&format!(
        r"(?i)\b{date}\s*(?:-|–|—|\bto\b|\btill\b|\buntil\b)\s*(?:{date}|present\b|current\b|now\b|ongoing\b|date\b)",
        date = DATE_PATTERN
    ))
    .unwrap();

    static ref RE_DATE_SINGLE: Regex = Regex::new(&format!(r"(?i)\b{}", DATE_PATTERN)).unwrap();

    static ref RE_BULLET: Regex =
        Regex::new(r"^\s*(?:[•●○◦▪▫■□➢➤►▸‣⁃∙·*✓✔]|[-–—](?:\s|$))\s*").unwrap();

    static ref RE_LOCATION: Regex = Regex::new(
        r"^[A-Z][A-Za-z.'\-]*(?: [A-Z][A-Za-z.'\-]*){0,2}, ?[A-Z][A-Za-z.'\-]*(?: [A-Za-z.'\-]+){0,2}(?:, ?[A-Z][A-Za-z.'\-]*(?: [A-Za-z.'\-]+){0,2})?$"
    )
    .unwrap();

    static ref RE_GPA: Regex = Regex::new(
        r"(?i)\b(?:c?gpa|grade|score)\s*[:\-]?\s*(\d{1,2}(?:\.\d{1,2})?(?:\s*/\s*\d{1,3}(?:\.\d{1,2})?)?%?)"
    )
    .unwrap();

    static ref RE_JOB_TITLE: Regex = Regex::new(&format!(r"\b(?:{})\b", JOB_TITLES.join("|"))).unwrap();

    static ref RE_SCHOOL: Regex = Regex::new(
        r"\b(?:College|University|Institute|School|Academy|Polytechnic|Vidyalaya|IIT|NIT|IIIT)\b"
    )
    .unwrap();

    static ref RE_DEGREE: Regex = Regex::new(
        r"(?i:\b(?:bachelor|master|associate|doctor(?:ate)?|diploma)\b)|\b[BM]\.(?:E|S|A|Sc|Tech|Com|Arch)\b\.?|\b[BM](?:Tech|Sc|Com|Arch)\b|\b(?:MBA|BCA|MCA|BBA|PhD|Ph\.D)\b"
    )
    .unwrap();

    static ref RE_RATING_GLYPHS: Regex = Regex::new(r"([●•★✪◆■⬤]+)\s*([○◦☆◇□]*)\s*$").unwrap();

    static ref RE_RATING_BRACKET: Regex = Regex::new(
        r"[(\[]\s*(\d+(?:\.\d+)?)\s*(?:/\s*(\d+(?:\.\d+)?))?\s*[)\]]\s*$"
    )
    .unwrap();

    static ref RE_RATING_FRACTION: Regex =
        Regex::new(r"(?:[:\-–]\s*)?(\d+(?:\.\d+)?)\s*/\s*(\d+(?:\.\d+)?)\s*$").unwrap();
}

/// Month or season (optional) followed by a year; also `MM/YYYY`.
const DATE_PATTERN: &str = r"(?:(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?|spring|summer|fall|autumn|winter)\.?,?\s+|\d{1,2}\s*/\s*)?(?:19|20)\d{2}\b";

const JOB_TITLES: &[&str] = &[
    "Accountant",
    "Administrator",
    "Advisor",
    "Analyst",
    "Apprentice",
    "Architect",
    "Assistant",
    "Associate",
    "Auditor",
    "CEO",
    "CTO",
    "Co-Founder",
    "Consultant",
    "Coordinator",
    "Designer",
    "Developer",
    "Director",
    "Editor",
    "Engineer",
    "Fellow",
    "Founder",
    "Freelancer",
    "Head",
    "Intern",
    "Lead",
    "Lecturer",
    "Manager",
    "Officer",
    "Operator",
    "President",
    "Professor",
    "Programmer",
    "Recruiter",
    "Representative",
    "Researcher",
    "Scientist",
    "Specialist",
    "Supervisor",
    "Teacher",
    "Technician",
    "Trainee",
    "Tutor",
    "VP",
    "Volunteer",
];

// ────────────────────────────────────────────────────────────────────────────
// Contact features
// ────────────────────────────────────────────────────────────────────────────

pub fn find_email(text: &str) -> Option<&str> {
    RE_EMAIL.find(text).map(|m| m.as_str())
}

pub fn is_email(text: &str) -> bool {
    find_email(text).is_some()
}

/// First phone-shaped run with 10–15 digits. Separators (spaces, dots, dashes,
/// parentheses, a leading `+`) are tolerated and kept in the returned slice.
pub fn find_phone(text: &str) -> Option<&str> {
    RE_PHONE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .find(|candidate| {
            let digits = candidate.chars().filter(char::is_ascii_digit).count();
            (10..=15).contains(&digits)
        })
}

pub fn is_phone(text: &str) -> bool {
    find_phone(text).is_some()
}

/// Dotted tokens that look like bare domains but are degrees or frameworks.
const DOMAIN_LOOKALIKES: &[&str] = &[
    "b.tech", "m.tech", "b.com", "m.com", "asp.net", "vb.net", "ado.net",
];

fn trim_url(url: &str) -> &str {
    url.trim_end_matches(|c: char| matches!(c, '.' | ')' | ']'))
}

/// Rejects `B.Tech`-style tokens: a known lookalike, or a single-letter label
/// before the TLD with no `www.` or path to vouch for it.
fn is_plausible_bare_domain(candidate: &str) -> bool {
    let lower = candidate.to_lowercase();
    let host = lower.split('/').next().unwrap_or_default();
    if DOMAIN_LOOKALIKES.contains(&host) {
        return false;
    }
    if host.starts_with("www.") || lower.contains('/') {
        return true;
    }
    host.split('.').next().is_some_and(|label| label.len() > 1)
}

/// First URL in the line, with or without a scheme. Email addresses are ignored.
pub fn find_url(text: &str) -> Option<String> {
    let masked = RE_EMAIL.replace_all(text, |caps: &regex::Captures| " ".repeat(caps[0].len()));
    if let Some(found) = RE_URL_WITH_SCHEME.find(&masked) {
        return Some(trim_url(found.as_str()).to_string());
    }
    RE_URL_BARE
        .find_iter(&masked)
        .map(|m| trim_url(m.as_str()))
        .find(|candidate| is_plausible_bare_domain(candidate))
        .map(str::to_string)
}

pub fn is_url(text: &str) -> bool {
    find_url(text).is_some()
}

/// "City, Region" style segment made of short capitalized tokens.
pub fn is_location(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.len() <= 60 && RE_LOCATION.is_match(trimmed)
}

// ────────────────────────────────────────────────────────────────────────────
// Dates
// ────────────────────────────────────────────────────────────────────────────

/// A full range such as `Jan 2020 - Present` or `2019 - 2023`.
pub fn find_date_range(text: &str) -> Option<Match<'_>> {
    RE_DATE_RANGE.find(text)
}

/// A single month/year or year, e.g. `May 2021`.
pub fn find_single_date(text: &str) -> Option<Match<'_>> {
    RE_DATE_SINGLE.find(text)
}

/// True for lines carrying any date: a range or a single month/year.
pub fn has_date(text: &str) -> bool {
    find_date_range(text).is_some() || find_single_date(text).is_some()
}

/// Last four-digit year in a date string. `None` for open ranges ending in
/// "Present"/"Current".
pub fn end_year(date: &str) -> Option<i32> {
    let lower = date.to_lowercase();
    if ["present", "current", "now", "ongoing"]
        .iter()
        .any(|w| lower.trim_end().ends_with(w))
    {
        return None;
    }
    RE_DATE_SINGLE
        .find_iter(date)
        .last()
        .and_then(|m| {
            let s = m.as_str();
            s.get(s.len().saturating_sub(4)..)
                .and_then(|year| year.parse::<i32>().ok())
        })
}

// ────────────────────────────────────────────────────────────────────────────
// Layout markers
// ────────────────────────────────────────────────────────────────────────────

pub fn is_bullet(text: &str) -> bool {
    RE_BULLET.is_match(text)
}

/// Text with a leading bullet glyph (and following whitespace) removed.
pub fn strip_bullet(text: &str) -> &str {
    match RE_BULLET.find(text) {
        Some(m) => text[m.end()..].trim(),
        None => text.trim(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Entry-label features
// ────────────────────────────────────────────────────────────────────────────

/// GPA value (e.g. `8.7/10`, `3.8`) and the full matched span to remove.
pub fn find_gpa(text: &str) -> Option<(String, Match<'_>)> {
    let caps = RE_GPA.captures(text)?;
    let whole = caps.get(0)?;
    let value = caps.get(1)?.as_str().split_whitespace().collect::<String>();
    Some((value, whole))
}

pub fn has_job_title(text: &str) -> bool {
    RE_JOB_TITLE.is_match(text)
}

pub fn has_school(text: &str) -> bool {
    RE_SCHOOL.is_match(text)
}

pub fn has_degree(text: &str) -> bool {
    RE_DEGREE.is_match(text)
}

/// First degree name or abbreviation, e.g. `B.E.` in `B.E. Computer Science`.
pub fn find_degree(text: &str) -> Option<Match<'_>> {
    RE_DEGREE.find(text)
}

// ────────────────────────────────────────────────────────────────────────────
// Skill rating indicators
// ────────────────────────────────────────────────────────────────────────────

/// Splits a trailing proficiency indicator off a skill line.
///
/// Recognizes glyph runs (`Rust ●●●●○`), bracketed numbers (`Go (4/5)`, `SQL [3]`)
/// and bare fractions (`Python - 8/10`). Returns the skill name and a rating in 1..=5.
pub fn parse_rating_indicator(text: &str) -> Option<(String, u8)> {
    let text = text.trim();

    if let Some(caps) = RE_RATING_GLYPHS.captures(text) {
        let filled = caps.get(1).map(|m| m.as_str().chars().count()).unwrap_or(0);
        let empty = caps.get(2).map(|m| m.as_str().chars().count()).unwrap_or(0);
        let name = skill_name(&text[..caps.get(0)?.start()]);
        if !name.is_empty() && filled > 0 {
            return Some((name, normalize_rating(filled as f32, (filled + empty).max(5) as f32)));
        }
    }

    for re in [&*RE_RATING_BRACKET, &*RE_RATING_FRACTION] {
        if let Some(caps) = re.captures(text) {
            let value: f32 = caps.get(1)?.as_str().parse().ok()?;
            let scale = match caps.get(2) {
                Some(m) => m.as_str().parse().ok()?,
                None => implied_scale(value),
            };
            let name = skill_name(&text[..caps.get(0)?.start()]);
            if !name.is_empty() && scale > 0.0 {
                return Some((name, normalize_rating(value, scale)));
            }
        }
    }

    None
}

/// Maps `value` on a `0..=scale` range into a 1..=5 rating.
pub fn normalize_rating(value: f32, scale: f32) -> u8 {
    if scale <= 0.0 || !value.is_finite() {
        return 1;
    }
    ((value / scale) * 5.0).round().clamp(1.0, 5.0) as u8
}

fn implied_scale(value: f32) -> f32 {
    if value <= 5.0 {
        5.0
    } else if value <= 10.0 {
        10.0
    } else {
        100.0
    }
}

fn skill_name(raw: &str) -> String {
    raw.trim()
        .trim_end_matches(|c: char| matches!(c, ':' | '-' | '–' | '|' | ','))
        .trim()
        .to_string()
}
