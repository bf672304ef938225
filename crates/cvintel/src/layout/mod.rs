//! Layout Splitter (C3, §4.3): reading-order reconstruction and
//! column separation by x-coordinate.

use crate::types::OcrLine;

/// Default left/right column split threshold, in pixels.
pub const DEFAULT_COLUMN_THRESHOLD: f32 = 500.0;

/// The two reading-order column texts produced by [`split_columns`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnText {
    pub left: String,
    pub right: String,
}

/// Assign each line to a column by its left-x against `threshold`, then
/// join each column's lines by ascending top-y, newline-joined (§4.3).
///
/// With no lines, both columns are empty strings.
pub fn split_columns(lines: &[OcrLine], threshold: f32) -> ColumnText {
    let mut left: Vec<&OcrLine> = Vec::new();
    let mut right: Vec<&OcrLine> = Vec::new();

    for line in lines {
        if line.bbox.left() < threshold {
            left.push(line);
        } else {
            right.push(line);
        }
    }

    left.sort_by(|a, b| a.bbox.top().partial_cmp(&b.bbox.top()).unwrap_or(std::cmp::Ordering::Equal));
    right.sort_by(|a, b| a.bbox.top().partial_cmp(&b.bbox.top()).unwrap_or(std::cmp::Ordering::Equal));

    ColumnText {
        left: left.iter().map(|l| l.text.as_str()).collect::<Vec<_>>().join("\n"),
        right: right.iter().map(|l| l.text.as_str()).collect::<Vec<_>>().join("\n"),
    }
}

/// When the caller has no line geometry (e.g. a text-only source), the
/// splitter is skipped entirely and the raw newline-joined text stands in
/// for both reading-order reconstruction and section location (§4.3).
pub fn raw_text(lines: &[OcrLine]) -> String {
    lines.iter().map(|l| l.text.as_str()).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Polygon;

    fn line(text: &str, left: f32, top: f32) -> OcrLine {
        OcrLine::new(text, 90.0, Polygon::from_rect(left, top, 50.0, 10.0), 0)
    }

    #[test]
    fn assigns_by_left_x_threshold() {
        let lines = vec![line("a", 10.0, 5.0), line("b", 600.0, 1.0)];
        let cols = split_columns(&lines, DEFAULT_COLUMN_THRESHOLD);
        assert_eq!(cols.left, "a");
        assert_eq!(cols.right, "b");
    }

    #[test]
    fn sorts_each_column_by_top_y() {
        let lines = vec![line("second", 10.0, 20.0), line("first", 10.0, 5.0)];
        let cols = split_columns(&lines, DEFAULT_COLUMN_THRESHOLD);
        assert_eq!(cols.left, "first\nsecond");
    }

    #[test]
    fn empty_input_yields_empty_columns() {
        let cols = split_columns(&[], DEFAULT_COLUMN_THRESHOLD);
        assert_eq!(cols, ColumnText::default());
    }
}
