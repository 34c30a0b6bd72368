use super::models::{Line, TextFragment};

/// Fragments whose vertical midpoints differ by less than this fraction of the
/// font size share a row.
const SAME_ROW_TOLERANCE: f32 = 0.4;

/// Lower bound for the row tolerance in points, so tiny fonts still group.
const MIN_ROW_TOLERANCE: f32 = 2.0;

/// A horizontal gap wider than this many ems splits a row into separate lines
/// (e.g. a right-aligned date far from its title).
const COLUMN_GAP_EMS: f32 = 4.0;

/// Clusters fragments into lines ordered top-to-bottom, left-to-right.
///
/// No column detection is attempted: text from side-by-side columns that
/// happen to share a baseline ends up interleaved in one line.
pub fn group_into_lines(fragments: &[TextFragment]) -> Vec<Line> {
    let mut sorted: Vec<&TextFragment> = fragments
        .iter()
        .filter(|f| !f.text.trim().is_empty())
        .collect();
    sorted.sort_by(|a, b| {
        a.page
            .cmp(&b.page)
            .then(a.mid_y().total_cmp(&b.mid_y()))
            .then(a.x.total_cmp(&b.x))
    });

    let mut rows: Vec<Vec<TextFragment>> = Vec::new();
    let mut anchor: Option<(u32, f32, f32)> = None;

    for fragment in sorted {
        let joins = anchor.is_some_and(|(page, mid, size)| {
            let tolerance = (size.max(fragment.font_size) * SAME_ROW_TOLERANCE).max(MIN_ROW_TOLERANCE);
            page == fragment.page && (fragment.mid_y() - mid).abs() <= tolerance
        });

        match rows.last_mut() {
            Some(row) if joins => row.push(fragment.clone()),
            _ => {
                anchor = Some((fragment.page, fragment.mid_y(), fragment.font_size));
                rows.push(vec![fragment.clone()]);
            }
        }
    }

    rows.into_iter().flat_map(split_wide_gaps).collect()
}

fn split_wide_gaps(mut row: Vec<TextFragment>) -> Vec<Line> {
    row.sort_by(|a, b| a.x.total_cmp(&b.x));

    let mut lines = Vec::new();
    let mut current: Vec<TextFragment> = Vec::new();
    for fragment in row {
        if let Some(prev) = current.last() {
            let gap = fragment.x - prev.right();
            if gap > prev.font_size.max(fragment.font_size) * COLUMN_GAP_EMS {
                lines.push(Line::from_fragments(std::mem::take(&mut current)));
            }
        }
        current.push(fragment);
    }
    if !current.is_empty() {
        lines.push(Line::from_fragments(current));
    }
    lines
}
