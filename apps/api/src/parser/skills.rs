use super::features::{parse_rating_indicator, strip_bullet};
use super::models::{FeaturedSkill, Section, SkillSet};
use super::sections::body_font_size;

/// Emphasized lines longer than this are treated as plain descriptions.
const MAX_FEATURED_WORDS: usize = 4;

/// Extracts featured skills (rated or visually emphasized) and free-text skill
/// descriptions from a SKILLS section.
pub fn extract_skills(section: &Section) -> SkillSet {
    let body = section.body();
    let mut skills = SkillSet::default();
    if body.is_empty() {
        return skills;
    }

    let base_size = body_font_size(body);
    let bold_lines = body.iter().filter(|l| l.is_bold()).count();
    let mostly_plain = bold_lines * 2 < body.len();

    for line in body {
        let text = strip_bullet(&line.text()).to_string();
        if text.is_empty() {
            continue;
        }

        if let Some((skill, rating)) = parse_rating_indicator(&text) {
            skills.featured_skills.push(FeaturedSkill { skill, rating });
            continue;
        }

        let larger = line.font_size >= base_size + 1.0;
        let bold = mostly_plain && line.is_bold();
        let short_label = text.split_whitespace().count() <= MAX_FEATURED_WORDS
            && !text.contains(',')
            && !text.contains(':');

        if (larger || bold) && short_label {
            let rating = (3 + u8::from(larger) + u8::from(bold)).min(5);
            skills.featured_skills.push(FeaturedSkill { skill: text, rating });
        } else {
            skills.descriptions.push(text);
        }
    }
    skills
}
