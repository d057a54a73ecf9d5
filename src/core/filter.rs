use crate::domain::model::RawRecord;

fn fold(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Keep rows whose `column` cell equals `literal`, ignoring surrounding
/// whitespace and case. Rows without that cell never match.
pub fn filter_record_type(rows: Vec<RawRecord>, column: usize, literal: &str) -> Vec<RawRecord> {
    let wanted = fold(literal);
    rows.into_iter()
        .filter(|row| row.cell(column).is_some_and(|value| fold(value) == wanted))
        .collect()
}
