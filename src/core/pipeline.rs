use crate::core::export::{archive_filename, export_archive};
use crate::core::filter::filter_record_type;
use crate::core::ingest::{ingest, IngestReport};
use crate::core::partition::{partition, OverlapPolicy};
use crate::core::report::{AgentCount, RoutingResult, RoutingStats, RunReport, RunStatus};
use crate::core::transform::transform;
use crate::core::{ConfigProvider, DirectoryStore, Pipeline, Storage};
use crate::domain::model::{Directory, ExportBundle, InputFile};
use crate::utils::error::{Result, RouterError};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum InputSource {
    Path(PathBuf),
    Memory(InputFile),
}

/// What one run works on: the uploaded files, which agents to build files for
/// and the date stamped into output names.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub inputs: Vec<InputSource>,
    /// `None` selects every agent in the directory.
    pub selection: Option<Vec<String>>,
    pub run_date: NaiveDate,
}

impl RunRequest {
    pub fn new(inputs: Vec<InputSource>, run_date: NaiveDate) -> Self {
        Self {
            inputs,
            selection: None,
            run_date,
        }
    }

    pub fn with_selection(mut self, agents: Vec<String>) -> Self {
        self.selection = Some(agents);
        self
    }
}

pub struct RoutingPipeline<S: Storage, D: DirectoryStore, C: ConfigProvider> {
    storage: S,
    directory: D,
    config: C,
    request: RunRequest,
}

impl<S: Storage, D: DirectoryStore, C: ConfigProvider> RoutingPipeline<S, D, C> {
    pub fn new(storage: S, directory: D, config: C, request: RunRequest) -> Self {
        Self {
            storage,
            directory,
            config,
            request,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, D: DirectoryStore, C: ConfigProvider> Pipeline for RoutingPipeline<S, D, C> {
    async fn snapshot(&self) -> Result<Directory> {
        tracing::debug!("Loading directory from {}", self.directory.describe());
        let directory = self.directory.load().await?;
        tracing::info!("👥 Directory loaded: {} agents", directory.len());
        for agent in directory.agents() {
            tracing::debug!("👤 {} ({} locs)", agent.name, agent.locations.len());
        }
        Ok(directory)
    }

    async fn extract(&self) -> Result<IngestReport> {
        let mut files = Vec::with_capacity(self.request.inputs.len());
        let mut read_failures = Vec::new();

        for input in &self.request.inputs {
            match input {
                InputSource::Memory(file) => files.push(file.clone()),
                InputSource::Path(path) => {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.display().to_string());
                    match tokio::fs::read(path).await {
                        Ok(bytes) => files.push(InputFile::new(name, bytes)),
                        Err(e) => {
                            tracing::warn!("⚠️ Cannot read {}: {}", path.display(), e);
                            read_failures.push(RouterError::FileParseError {
                                file: name,
                                reason: e.to_string(),
                            });
                        }
                    }
                }
            }
        }

        let mut report = ingest(files);
        read_failures.append(&mut report.failures);
        report.failures = read_failures;
        Ok(report)
    }

    async fn transform(&self, directory: &Directory, ingested: IngestReport) -> Result<RoutingResult> {
        let column_map = self.config.column_map();
        let compiled = column_map.compile()?;

        let mut stats = RoutingStats {
            files_read: ingested.files_read,
            ingested: ingested.records.len(),
            file_failures: ingested.failures,
            ..RoutingStats::default()
        };

        let filtered = filter_record_type(
            ingested.records,
            column_map.record_type_column,
            &column_map.record_type_value,
        );
        stats.filtered = filtered.len();
        tracing::info!(
            "🔎 {} of {} rows are '{}'",
            stats.filtered,
            stats.ingested,
            column_map.record_type_value
        );

        let partitioned = partition(
            &filtered,
            directory,
            self.request.selection.as_deref(),
            column_map.location_column,
            OverlapPolicy::from_allow_overlap(self.config.allow_overlap()),
        );
        stats.overlapping_rows = partitioned.overlapping_rows;
        stats.unknown_agents = partitioned.unknown_agents;

        let mut agent_rows = Vec::with_capacity(partitioned.buckets.len());
        // 重疊時同一列會進多個桶，略過的列只記一次
        let mut seen_skipped = HashSet::new();
        for bucket in partitioned.buckets {
            let outcome = transform(&bucket.rows, &compiled);
            stats.skipped_rows.extend(outcome.skipped.into_iter().filter(|e| match e {
                RouterError::SchemaAccessError { file, line, .. } => {
                    seen_skipped.insert((file.clone(), *line))
                }
                _ => true,
            }));
            stats.per_agent.push(AgentCount {
                agent: bucket.agent.clone(),
                rows: outcome.records.len(),
            });
            agent_rows.push((bucket.agent, outcome.records));
        }

        if !stats.skipped_rows.is_empty() {
            tracing::warn!(
                "⚠️ {} rows skipped: narrower than {} columns",
                stats.skipped_rows.len(),
                compiled.min_width()
            );
        }

        let bundle = ExportBundle::from_partitions(
            agent_rows,
            self.request.run_date,
            self.config.export_format(),
        );

        Ok(RoutingResult { bundle, stats })
    }

    async fn load(&self, result: RoutingResult) -> Result<RunReport> {
        if result.bundle.is_empty() {
            tracing::warn!("No matching data found. Check agent locations and the master files.");
            return Ok(RunReport::from_stats(RunStatus::Empty, result.stats));
        }

        let format = self.config.export_format();
        let archive = export_archive(&result.bundle, format)?;
        let name = archive_filename(self.config.archive_prefix(), self.request.run_date);

        tracing::debug!("Writing ZIP file ({} bytes) to storage", archive.len());
        self.storage.write_file(&name, &archive).await?;

        let mut report = RunReport::from_stats(RunStatus::Completed, result.stats);
        report.files = result.bundle.filenames();
        report.archive_path = Some(self.storage.locate(&name));
        report.archive_name = Some(name);
        report.archive_bytes = archive.len();
        Ok(report)
    }
}
