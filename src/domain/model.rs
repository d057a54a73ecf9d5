use crate::domain::schema::{header_index, OUTPUT_HEADERS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub name: String,
    pub locations: Vec<String>,
}

impl Agent {
    pub fn new(name: impl Into<String>, locations: Vec<String>) -> Self {
        Self {
            name: name.into(),
            locations,
        }
    }
}

/// Split a raw comma-joined location list, trimming each entry and dropping
/// empty segments.
pub fn parse_locations(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|loc| !loc.is_empty())
        .map(str::to_string)
        .collect()
}

/// Agent name → locations, in the order agents were first added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Directory {
    agents: Vec<Agent>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 同名時覆蓋既有的地點清單並保留原位置
    pub fn upsert(&mut self, agent: Agent) {
        match self.agents.iter_mut().find(|a| a.name == agent.name) {
            Some(existing) => existing.locations = agent.locations,
            None => self.agents.push(agent),
        }
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.agents.len();
        self.agents.retain(|a| a.name != name);
        self.agents.len() != before
    }

    pub fn get(&self, name: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.name == name)
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn names(&self) -> Vec<String> {
        self.agents.iter().map(|a| a.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl FromIterator<Agent> for Directory {
    fn from_iter<I: IntoIterator<Item = Agent>>(iter: I) -> Self {
        let mut directory = Directory::new();
        for agent in iter {
            directory.upsert(agent);
        }
        directory
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Delimited,
    Spreadsheet,
}

impl FileFormat {
    /// `.csv` is delimited text, anything else is handed to the spreadsheet reader.
    pub fn from_name(name: &str) -> Self {
        let is_csv = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv {
            FileFormat::Delimited
        } else {
            FileFormat::Spreadsheet
        }
    }
}

#[derive(Debug, Clone)]
pub struct InputFile {
    pub name: String,
    pub bytes: Vec<u8>,
    pub format: FileFormat,
}

impl InputFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let format = FileFormat::from_name(&name);
        Self {
            name,
            bytes,
            format,
        }
    }

    pub fn with_format(name: impl Into<String>, bytes: Vec<u8>, format: FileFormat) -> Self {
        Self {
            name: name.into(),
            bytes,
            format,
        }
    }
}

/// One data row of an input file. Meaning comes from cell position only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub origin: Arc<str>,
    /// 1-based data row number, header excluded.
    pub line: usize,
    pub cells: Vec<String>,
}

impl RawRecord {
    pub fn new(origin: Arc<str>, line: usize, cells: Vec<String>) -> Self {
        Self {
            origin,
            line,
            cells,
        }
    }

    pub fn cell(&self, index: usize) -> Option<&str> {
        self.cells.get(index).map(String::as_str)
    }

    pub fn width(&self) -> usize {
        self.cells.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord {
    values: Vec<String>,
}

impl Default for OutputRecord {
    fn default() -> Self {
        Self {
            values: vec![String::new(); OUTPUT_HEADERS.len()],
        }
    }
}

impl OutputRecord {
    pub fn get(&self, field: &str) -> Option<&str> {
        header_index(field).map(|i| self.values[i].as_str())
    }

    pub(crate) fn set_at(&mut self, index: usize, value: String) {
        self.values[index] = value;
    }

    /// Values in schema order.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        OUTPUT_HEADERS
            .iter()
            .copied()
            .zip(self.values.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" => Ok(ExportFormat::Xlsx),
            other => Err(format!("unsupported export format '{}', expected csv or xlsx", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportFile {
    pub agent: String,
    pub filename: String,
    pub rows: Vec<OutputRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct ExportBundle {
    pub files: Vec<ExportFile>,
}

impl ExportBundle {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn filenames(&self) -> Vec<String> {
        self.files.iter().map(|f| f.filename.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_locations_trims_and_drops_empty() {
        assert_eq!(
            parse_locations(" Wagholi, Kharadi ,,  Viman Nagar ,"),
            vec!["Wagholi", "Kharadi", "Viman Nagar"]
        );
        assert!(parse_locations(" , ").is_empty());
    }

    #[test]
    fn test_directory_upsert_last_write_wins_in_place() {
        let mut directory = Directory::new();
        directory.upsert(Agent::new("Atul", vec!["Wagholi".into()]));
        directory.upsert(Agent::new("Neha", vec!["Baner".into()]));
        directory.upsert(Agent::new("Atul", vec!["Kharadi".into()]));

        assert_eq!(directory.names(), vec!["Atul", "Neha"]);
        assert_eq!(directory.get("Atul").unwrap().locations, vec!["Kharadi"]);
        assert!(directory.remove("Neha"));
        assert!(!directory.remove("Neha"));
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn test_file_format_from_name() {
        assert_eq!(FileFormat::from_name("master.csv"), FileFormat::Delimited);
        assert_eq!(FileFormat::from_name("MASTER.CSV"), FileFormat::Delimited);
        assert_eq!(FileFormat::from_name("master.xlsx"), FileFormat::Spreadsheet);
        assert_eq!(FileFormat::from_name("master.xls"), FileFormat::Spreadsheet);
    }

    #[test]
    fn test_output_record_starts_empty() {
        let record = OutputRecord::default();
        assert_eq!(record.values().len(), 36);
        assert_eq!(record.get("Company"), Some(""));
        assert_eq!(record.get("Nope"), None);
    }

    #[test]
    fn test_export_format_parse() {
        assert_eq!("CSV".parse::<ExportFormat>(), Ok(ExportFormat::Csv));
        assert_eq!("xlsx".parse::<ExportFormat>(), Ok(ExportFormat::Xlsx));
        assert!("json".parse::<ExportFormat>().is_err());
    }
}
