//! Table Detector (C12, §4.12): y-bucket row grouping over OCR lines.

use crate::types::{DetectedTable, OcrLine};

const BUCKET_SIZE: f32 = 25.0;

fn bucket(line: &OcrLine) -> i64 {
    (line.bbox.y_center() / BUCKET_SIZE).round() as i64
}

/// Group lines into rows by a 25px y-center bucket, then group consecutive
/// multi-line rows into tables (§4.12).
pub fn detect_tables(lines: &[OcrLine]) -> Vec<DetectedTable> {
    let mut buckets: std::collections::BTreeMap<i64, Vec<&OcrLine>> = std::collections::BTreeMap::new();
    for line in lines {
        buckets.entry(bucket(line)).or_default().push(line);
    }

    let mut rows: Vec<(i64, Vec<String>)> = Vec::new();
    for (key, mut members) in buckets {
        if members.len() < 2 {
            continue;
        }
        members.sort_by(|a, b| a.bbox.left().partial_cmp(&b.bbox.left()).unwrap_or(std::cmp::Ordering::Equal));
        rows.push((key, members.iter().map(|l| l.text.clone()).collect()));
    }
    rows.sort_by_key(|(key, _)| *key);

    let mut tables = Vec::new();
    let mut current: Vec<Vec<String>> = Vec::new();
    let mut last_key: Option<i64> = None;

    for (key, row) in rows {
        let contiguous = last_key.map(|prev| key - prev == 1).unwrap_or(true);
        if !contiguous && !current.is_empty() {
            flush_table(&mut current, &mut tables);
        }
        current.push(row);
        last_key = Some(key);
    }
    flush_table(&mut current, &mut tables);

    tables
}

fn flush_table(current: &mut Vec<Vec<String>>, tables: &mut Vec<DetectedTable>) {
    if current.len() >= 2 {
        tables.push(DetectedTable::from_rows(std::mem::take(current)));
    } else {
        current.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Polygon;

    fn line(text: &str, left: f32, y_center: f32) -> OcrLine {
        OcrLine::new(text, 90.0, Polygon::from_rect(left, y_center - 5.0, 20.0, 10.0), 0)
    }

    #[test]
    fn groups_two_consecutive_multi_line_rows_into_a_table() {
        let lines = vec![
            line("a1", 0.0, 100.0),
            line("b1", 100.0, 100.0),
            line("a2", 0.0, 125.0),
            line("b2", 100.0, 125.0),
        ];
        let tables = detect_tables(&lines);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].row_count, 2);
        assert_eq!(tables[0].col_count, 2);
    }

    #[test]
    fn single_row_bucket_is_not_a_table() {
        let lines = vec![line("a1", 0.0, 100.0), line("b1", 100.0, 100.0)];
        assert!(detect_tables(&lines).is_empty());
    }

    #[test]
    fn single_column_lines_are_not_rows() {
        let lines = vec![line("a1", 0.0, 100.0), line("a2", 0.0, 125.0), line("a3", 0.0, 150.0)];
        assert!(detect_tables(&lines).is_empty());
    }
}
