//! Table-detector output (§3, §4.12).

use serde::{Deserialize, Serialize};

/// A reconstructed table derived from OCR line groupings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedTable {
    pub rows: Vec<Vec<String>>,
    pub row_count: usize,
    pub col_count: usize,
}

impl DetectedTable {
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        let col_count = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        Self { row_count: rows.len(), col_count, rows }
    }
}
