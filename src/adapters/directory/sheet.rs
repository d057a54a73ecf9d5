use crate::domain::model::{parse_locations, Agent, Directory};
use crate::domain::ports::DirectoryStore;
use crate::utils::error::{Result, RouterError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Published spreadsheet ("Publish to web > CSV") holding the directory:
/// column A is the agent name, column B the comma-joined locations.
pub struct SheetDirectory {
    url: String,
    client: Client,
}

impl SheetDirectory {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    fn unavailable(&self, reason: impl ToString) -> RouterError {
        RouterError::SourceUnavailable {
            origin: self.url.clone(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl DirectoryStore for SheetDirectory {
    async fn load(&self) -> Result<Directory> {
        tracing::debug!("Fetching directory sheet: {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| self.unavailable(e))?;

        let status = response.status();
        tracing::debug!("Directory sheet response status: {}", status);
        if !status.is_success() {
            return Err(self.unavailable(format!("HTTP {}", status)));
        }

        let body = response.bytes().await.map_err(|e| self.unavailable(e))?;
        parse_sheet(&body).map_err(|e| self.unavailable(e))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Parse the two-column directory feed. The first row is a header; columns are
/// read by position so header renames don't matter.
pub fn parse_sheet(bytes: &[u8]) -> Result<Directory> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let mut directory = Directory::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let name = record.get(0).unwrap_or_default().trim();
        if name.is_empty() {
            tracing::warn!("⚠️ Directory row {} has no agent name, skipping", index + 2);
            continue;
        }
        let locations = record.get(1).map(parse_locations).unwrap_or_default();
        directory.upsert(Agent::new(name, locations));
    }

    Ok(directory)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sheet() {
        let feed = "BDE Name,Locations\nAtul, Wagholi , Kharadi\n\"Neha\",\"Baner, Aundh,\"\n,Hadapsar\nRavi\n";
        let directory = parse_sheet(feed.as_bytes()).unwrap();

        assert_eq!(directory.names(), vec!["Atul", "Neha", "Ravi"]);
        // 未加引號的逗號把地點拆到第三欄，只讀第二欄
        assert_eq!(directory.get("Atul").unwrap().locations, vec!["Wagholi"]);
        assert_eq!(directory.get("Neha").unwrap().locations, vec!["Baner", "Aundh"]);
        assert!(directory.get("Ravi").unwrap().locations.is_empty());
    }

    #[test]
    fn test_duplicate_names_last_write_wins() {
        let feed = "name,locs\nAtul,Wagholi\nAtul,\"Kharadi, Viman Nagar\"\n";
        let directory = parse_sheet(feed.as_bytes()).unwrap();

        assert_eq!(directory.len(), 1);
        assert_eq!(
            directory.get("Atul").unwrap().locations,
            vec!["Kharadi", "Viman Nagar"]
        );
    }

    #[test]
    fn test_header_only_sheet_is_empty_directory() {
        let directory = parse_sheet(b"name,locations\n").unwrap();
        assert!(directory.is_empty());
    }
}
