use crate::domain::model::ExportBundle;
use crate::utils::error::RouterError;
use crate::utils::monitor::PhaseStats;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    /// No selected agent received any row. Not an error.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentCount {
    pub agent: String,
    pub rows: usize,
}

#[derive(Debug, Default)]
pub struct RoutingStats {
    pub files_read: usize,
    pub ingested: usize,
    pub filtered: usize,
    pub per_agent: Vec<AgentCount>,
    pub overlapping_rows: usize,
    pub unknown_agents: Vec<String>,
    pub file_failures: Vec<RouterError>,
    pub skipped_rows: Vec<RouterError>,
}

/// Output of the transform phase: the bundle to pack plus what happened on
/// the way.
#[derive(Debug, Default)]
pub struct RoutingResult {
    pub bundle: ExportBundle,
    pub stats: RoutingStats,
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub status: RunStatus,
    pub archive_name: Option<String>,
    pub archive_path: Option<String>,
    pub archive_bytes: usize,
    pub files: Vec<String>,
    pub files_read: usize,
    pub ingested: usize,
    pub filtered: usize,
    pub per_agent: Vec<AgentCount>,
    pub overlapping_rows: usize,
    pub unknown_agents: Vec<String>,
    pub file_failures: Vec<String>,
    pub skipped_rows: usize,
    #[serde(skip)]
    pub phases: Vec<PhaseStats>,
}

impl RunReport {
    pub fn from_stats(status: RunStatus, stats: RoutingStats) -> Self {
        Self {
            status,
            archive_name: None,
            archive_path: None,
            archive_bytes: 0,
            files: Vec::new(),
            files_read: stats.files_read,
            ingested: stats.ingested,
            filtered: stats.filtered,
            per_agent: stats.per_agent,
            overlapping_rows: stats.overlapping_rows,
            unknown_agents: stats.unknown_agents,
            file_failures: stats.file_failures.iter().map(|e| e.to_string()).collect(),
            skipped_rows: stats.skipped_rows.len(),
            phases: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status == RunStatus::Empty
    }
}
