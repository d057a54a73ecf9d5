use crate::domain::model::{OutputRecord, RawRecord};
use crate::domain::schema::{CompiledColumnMap, Normalizer};
use crate::utils::error::RouterError;
use regex::Regex;
use std::sync::OnceLock;

static PLAIN_DECIMAL: OnceLock<Regex> = OnceLock::new();

fn plain_decimal() -> &'static Regex {
    PLAIN_DECIMAL.get_or_init(|| {
        Regex::new(r"^([+-]?)(\d+)(?:\.\d*)?$").expect("static phone pattern is valid")
    })
}

/// Phone cells often arrive float-rendered (`9876543210.0`) because the
/// spreadsheet coerced the column to numbers. Numeric values become their
/// integer digit string; anything else is returned trimmed.
pub fn normalize_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    // 純十進位數字直接截斷字串，避免 f64 精度損失
    if let Some(caps) = plain_decimal().captures(trimmed) {
        let digits = caps[2].trim_start_matches('0');
        let digits = if digits.is_empty() { "0" } else { digits };
        return if &caps[1] == "-" && digits != "0" {
            format!("-{}", digits)
        } else {
            digits.to_string()
        };
    }

    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => format!("{:.0}", value.trunc()),
        _ => trimmed.to_string(),
    }
}

#[derive(Debug, Default)]
pub struct TransformOutcome {
    pub records: Vec<OutputRecord>,
    /// `SchemaAccessError`s for rows too narrow for the column map.
    pub skipped: Vec<RouterError>,
}

/// Map each row into the output schema. Rows narrower than the column map
/// requires are left out and reported instead of failing the batch.
pub fn transform(rows: &[RawRecord], map: &CompiledColumnMap) -> TransformOutcome {
    let mut outcome = TransformOutcome::default();

    for row in rows {
        if row.width() < map.min_width {
            tracing::warn!(
                "⚠️ {} row {}: {} columns, need {}",
                row.origin,
                row.line,
                row.width(),
                map.min_width
            );
            outcome.skipped.push(RouterError::SchemaAccessError {
                file: row.origin.to_string(),
                line: row.line,
                width: row.width(),
                required: map.min_width,
            });
            continue;
        }
        outcome.records.push(map_row(row, map));
    }

    outcome
}

fn map_row(row: &RawRecord, map: &CompiledColumnMap) -> OutputRecord {
    let mut record = OutputRecord::default();

    for field in &map.fields {
        let raw = row.cell(field.source).unwrap_or_default();
        let value = match field.normalize {
            Some(Normalizer::Phone) => normalize_phone(raw),
            Some(Normalizer::Trim) => raw.trim().to_string(),
            None => raw.to_string(),
        };
        let value = match &field.prefix {
            Some(prefix) => format!("{}{}", prefix, value),
            None => value,
        };
        record.set_at(field.target, value);
    }

    for (target, value) in &map.constants {
        record.set_at(*target, value.clone());
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::{ColumnMap, OUTPUT_HEADERS};
    use std::sync::Arc;

    fn master_row(location: &str, phone: &str) -> RawRecord {
        let mut cells = vec![String::new(); 16];
        cells[1] = "Res_resale".to_string();
        cells[3] = "Sunil Patil".to_string();
        cells[4] = phone.to_string();
        cells[5] = location.to_string();
        cells[6] = "Flat 12, Ivy Estate".to_string();
        cells[7] = "2 BHK".to_string();
        cells[8] = "950".to_string();
        cells[15] = "6500000".to_string();
        RawRecord::new(Arc::from("master.csv"), 1, cells)
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("9876543210.0"), "9876543210");
        assert_eq!(normalize_phone("9876543210"), "9876543210");
        assert_eq!(normalize_phone(" 9876543210 "), "9876543210");
        assert_eq!(normalize_phone("abc"), "abc");
        assert_eq!(normalize_phone(""), "");
        assert_eq!(normalize_phone("   "), "");
        assert_eq!(normalize_phone("9.87654321E9"), "9876543210");
        assert_eq!(normalize_phone("98765 43210"), "98765 43210");
        assert_eq!(normalize_phone("NaN"), "NaN");
        assert_eq!(normalize_phone("12345678901234567890.0"), "12345678901234567890");
    }

    #[test]
    fn test_location_gets_prefix_and_area_does_not() {
        let map = ColumnMap::default().compile().unwrap();
        let outcome = transform(&[master_row("Wagholi", "9876543210.0")], &map);

        let record = &outcome.records[0];
        assert_eq!(record.get("Location"), Some("P-Wagholi"));
        assert_eq!(record.get("Area"), Some("Wagholi"));
        assert_eq!(record.get("Phone1"), Some("9876543210"));
        assert_eq!(record.get("First Name"), Some("Sunil Patil"));
        assert_eq!(record.get("Property Sell Address"), Some("Flat 12, Ivy Estate"));
        assert_eq!(record.get("BHK"), Some("2 BHK"));
        assert_eq!(record.get("Sq.Ft.-Sq.Yd."), Some("950"));
        assert_eq!(record.get("Price"), Some("6500000"));
    }

    #[test]
    fn test_location_keeps_raw_whitespace() {
        let map = ColumnMap::default().compile().unwrap();
        let outcome = transform(&[master_row("Wagholi ", "")], &map);
        assert_eq!(outcome.records[0].get("Location"), Some("P-Wagholi "));
        assert_eq!(outcome.records[0].get("Phone1"), Some(""));
    }

    #[test]
    fn test_constants_and_empty_fields() {
        let map = ColumnMap::default().compile().unwrap();
        let outcome = transform(&[master_row("Kharadi", "1")], &map);
        let record = &outcome.records[0];

        assert_eq!(record.get("Company"), Some("NEW"));
        assert_eq!(record.get("Property Type"), Some("Residential"));
        assert_eq!(record.get("Property Available For"), Some("Sell"));

        let populated = record.iter().filter(|(_, v)| !v.is_empty()).count();
        assert_eq!(populated, 11);
        assert_eq!(record.values().len(), OUTPUT_HEADERS.len());
    }

    #[test]
    fn test_narrow_rows_are_skipped_and_reported() {
        let map = ColumnMap::default().compile().unwrap();
        let narrow = RawRecord::new(
            Arc::from("short.csv"),
            7,
            vec!["a".into(), "Res_resale".into(), "".into(), "x".into(), "1".into(), "Baner".into()],
        );
        let outcome = transform(&[narrow, master_row("Baner", "2")], &map);

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.skipped.len(), 1);
        assert!(matches!(
            &outcome.skipped[0],
            RouterError::SchemaAccessError { file, line: 7, width: 6, required: 16 } if file == "short.csv"
        ));
    }
}
