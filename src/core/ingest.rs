use crate::domain::model::{FileFormat, InputFile, RawRecord};
use crate::utils::error::{Result, RouterError};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::Timelike;
use std::io::Cursor;
use std::sync::Arc;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Default)]
pub struct IngestReport {
    pub records: Vec<RawRecord>,
    pub failures: Vec<RouterError>,
    pub files_read: usize,
}

/// Parse every file independently and concatenate the rows. A file that fails
/// to parse is recorded in `failures` and contributes no rows.
pub fn ingest(files: Vec<InputFile>) -> IngestReport {
    let mut report = IngestReport::default();

    for file in files {
        let origin: Arc<str> = Arc::from(file.name.as_str());
        let parsed = match file.format {
            FileFormat::Delimited => read_delimited(&origin, &file.bytes),
            FileFormat::Spreadsheet => read_spreadsheet(&origin, file.bytes),
        };

        match parsed {
            Ok(rows) => {
                tracing::debug!("📄 {}: {} rows", origin, rows.len());
                report.files_read += 1;
                report.records.extend(rows);
            }
            Err(e) => {
                tracing::warn!("⚠️ Skipping {}: {}", origin, e);
                report.failures.push(RouterError::FileParseError {
                    file: origin.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    report
}

fn read_delimited(origin: &Arc<str>, bytes: &[u8]) -> Result<Vec<RawRecord>> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let header_width = reader.headers()?.len();
    let mut rows = Vec::new();

    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
        // 短列補齊到表頭寬度，行為與資料框一致
        if cells.len() < header_width {
            cells.resize(header_width, String::new());
        }
        rows.push(RawRecord::new(origin.clone(), index + 1, cells));
    }

    Ok(rows)
}

fn read_spreadsheet(origin: &Arc<str>, bytes: Vec<u8>) -> Result<Vec<RawRecord>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| RouterError::ProcessingError {
            message: "workbook has no worksheets".to_string(),
        })??;

    // Range 從第一個有值的儲存格開始，補回前面的空欄與空列，欄位索引才會對齊 A 欄
    let (start_row, start_col) = range
        .start()
        .map(|(row, col)| (row as usize, col as usize))
        .unwrap_or((0, 0));
    let width = start_col + range.width();

    let mut rows: Vec<RawRecord> = (1..start_row)
        .map(|line| RawRecord::new(origin.clone(), line, vec![String::new(); width]))
        .collect();

    for (index, row) in range.rows().enumerate() {
        let line = start_row + index;
        if line == 0 {
            continue;
        }
        let mut cells = vec![String::new(); start_col];
        cells.extend(row.iter().map(render_cell));
        rows.push(RawRecord::new(origin.clone(), line, cells));
    }

    Ok(rows)
}

/// Render a spreadsheet cell the way it reads on screen. Whole floats lose
/// their fractional part here, so `9876543210` stays a digit string.
pub(crate) fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) if value.num_seconds_from_midnight() == 0 => {
                value.format("%Y-%m-%d").to_string()
            }
            Some(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}
