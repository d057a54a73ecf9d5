use crate::domain::model::{ExportBundle, ExportFile, ExportFormat, OutputRecord};
use crate::domain::schema::OUTPUT_HEADERS;
use crate::utils::error::Result;
use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook};
use std::collections::HashSet;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// `19Oct2026` style stamp used in every output name.
pub fn date_stamp(date: NaiveDate) -> String {
    date.format("%d%b%Y").to_string()
}

pub fn export_filename(agent: &str, date: NaiveDate, format: ExportFormat) -> String {
    // 名稱裡的路徑分隔符會在壓縮檔內變成資料夾
    let safe_agent: String = agent
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("{}.{}.{}", safe_agent, date_stamp(date), format.extension())
}

pub fn archive_filename(prefix: &str, date: NaiveDate) -> String {
    format!("{}_{}.zip", prefix, date_stamp(date))
}

impl ExportBundle {
    /// One file per agent with rows; agents with nothing matched get no file.
    /// Names that collide after sanitizing (`A/B` and `A_B`) get a `-2`, `-3`
    /// suffix so every agent keeps its own entry in the archive.
    pub fn from_partitions(
        agent_rows: Vec<(String, Vec<OutputRecord>)>,
        date: NaiveDate,
        format: ExportFormat,
    ) -> Self {
        let mut used = HashSet::new();
        let files = agent_rows
            .into_iter()
            .filter(|(_, rows)| !rows.is_empty())
            .map(|(agent, rows)| {
                let mut filename = export_filename(&agent, date, format);
                let mut suffix = 2;
                while !used.insert(filename.to_lowercase()) {
                    filename = export_filename(&format!("{}-{}", agent, suffix), date, format);
                    suffix += 1;
                }
                if suffix > 2 {
                    tracing::warn!("⚠️ File name for '{}' already taken, using {}", agent, filename);
                }
                ExportFile {
                    filename,
                    agent,
                    rows,
                }
            })
            .collect();
        ExportBundle { files }
    }
}

pub fn render_csv(rows: &[OutputRecord]) -> Result<Vec<u8>> {
    let mut buffer = UTF8_BOM.to_vec();
    {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(&mut buffer);
        writer.write_record(OUTPUT_HEADERS)?;
        for row in rows {
            writer.write_record(row.values())?;
        }
        writer.flush()?;
    }
    Ok(buffer)
}

pub fn render_xlsx(rows: &[OutputRecord]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();

    for (col, header) in OUTPUT_HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }
    for (index, row) in rows.iter().enumerate() {
        let row_num = (index + 1) as u32;
        for (col, value) in row.values().iter().enumerate() {
            if !value.is_empty() {
                worksheet.write_string(row_num, col as u16, value)?;
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Serialize every file in the bundle and pack them into one ZIP, returned
/// as bytes. Nothing is written to disk here.
pub fn export_archive(bundle: &ExportBundle, format: ExportFormat) -> Result<Vec<u8>> {
    tracing::debug!("Creating ZIP archive with {} files", bundle.files.len());

    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for file in &bundle.files {
        let data = match format {
            ExportFormat::Csv => render_csv(&file.rows)?,
            ExportFormat::Xlsx => render_xlsx(&file.rows)?,
        };
        zip.start_file::<_, ()>(file.filename.as_str(), FileOptions::default())?;
        zip.write_all(&data)?;
        tracing::debug!("📦 {} ({} rows, {} bytes)", file.filename, file.rows.len(), data.len());
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::RawRecord;
    use crate::domain::schema::ColumnMap;
    use std::io::Read;
    use std::sync::Arc;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn output_rows(locations: &[&str]) -> Vec<OutputRecord> {
        let map = ColumnMap::default().compile().unwrap();
        let rows: Vec<RawRecord> = locations
            .iter()
            .map(|loc| {
                let mut cells = vec![String::new(); 16];
                cells[3] = "Owner, Senior".to_string();
                cells[5] = loc.to_string();
                RawRecord::new(Arc::from("m.csv"), 1, cells)
            })
            .collect();
        crate::core::transform::transform(&rows, &map).records
    }

    #[test]
    fn test_names() {
        assert_eq!(date_stamp(date()), "19Oct2026");
        assert_eq!(export_filename("Atul", date(), ExportFormat::Csv), "Atul.19Oct2026.csv");
        assert_eq!(export_filename("A/B", date(), ExportFormat::Xlsx), "A_B.19Oct2026.xlsx");
        assert_eq!(
            archive_filename("Processed_CSVs", date()),
            "Processed_CSVs_19Oct2026.zip"
        );
    }

    #[test]
    fn test_empty_agents_get_no_file() {
        let bundle = ExportBundle::from_partitions(
            vec![
                ("Atul".to_string(), output_rows(&["Wagholi"])),
                ("Neha".to_string(), Vec::new()),
            ],
            date(),
            ExportFormat::Csv,
        );
        assert_eq!(bundle.filenames(), vec!["Atul.19Oct2026.csv"]);
    }

    #[test]
    fn test_colliding_agent_names_stay_distinct() {
        let bundle = ExportBundle::from_partitions(
            vec![
                ("A/B".to_string(), output_rows(&["Wagholi"])),
                ("A_B".to_string(), output_rows(&["Baner"])),
                ("a_b".to_string(), output_rows(&["Aundh"])),
            ],
            date(),
            ExportFormat::Csv,
        );
        assert_eq!(
            bundle.filenames(),
            vec!["A_B.19Oct2026.csv", "A_B-2.19Oct2026.csv", "a_b-3.19Oct2026.csv"]
        );

        let bytes = export_archive(&bundle, ExportFormat::Csv).unwrap();
        let archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 3);
    }

    #[test]
    fn test_csv_has_bom_header_and_quoting() {
        let data = render_csv(&output_rows(&["Wagholi"])).unwrap();
        assert!(data.starts_with(UTF8_BOM));

        let text = String::from_utf8(data[UTF8_BOM.len()..].to_vec()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), OUTPUT_HEADERS.join(","));
        let row = lines.next().unwrap();
        assert!(row.starts_with("\"Owner, Senior\",,NEW,"));
        assert!(row.contains(",P-Wagholi,"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_archive_contains_each_file() {
        let bundle = ExportBundle::from_partitions(
            vec![
                ("Atul".to_string(), output_rows(&["Wagholi"])),
                ("Neha".to_string(), output_rows(&["Baner", "Aundh"])),
            ],
            date(),
            ExportFormat::Csv,
        );
        let bytes = export_archive(&bundle, ExportFormat::Csv).unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();

        assert_eq!(archive.len(), 2);
        let mut content = String::new();
        archive
            .by_name("Neha.19Oct2026.csv")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_xlsx_export_reads_back() {
        use calamine::{open_workbook_auto_from_rs, Reader};

        let data = render_xlsx(&output_rows(&["Wagholi"])).unwrap();
        let mut workbook = open_workbook_auto_from_rs(std::io::Cursor::new(data)).unwrap();
        let range = workbook.worksheet_range_at(0).unwrap().unwrap();

        assert_eq!(range.height(), 2);
        assert_eq!(range.width(), 36);
        assert_eq!(
            range.get_value((1, 17)).map(|c| c.to_string()),
            Some("P-Wagholi".to_string())
        );
    }
}
