use crate::core::ingest::IngestReport;
use crate::core::report::{RoutingResult, RunReport};
use crate::domain::model::{Directory, ExportFormat};
use crate::domain::schema::ColumnMap;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Where `path` ends up, for reporting.
    fn locate(&self, path: &str) -> String;
}

/// Read side of the agent directory. The engine calls `load` once per run and
/// routes against that snapshot.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn load(&self) -> Result<Directory>;

    fn describe(&self) -> String;
}

#[async_trait]
pub trait EditableDirectoryStore: DirectoryStore {
    async fn upsert(&self, name: &str, locations: Vec<String>) -> Result<Directory>;
    async fn remove(&self, name: &str) -> Result<bool>;
}

pub trait ConfigProvider: Send + Sync {
    fn column_map(&self) -> &ColumnMap;
    fn allow_overlap(&self) -> bool;
    fn export_format(&self) -> ExportFormat;
    fn output_path(&self) -> &str;
    fn archive_prefix(&self) -> &str;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn snapshot(&self) -> Result<Directory>;
    async fn extract(&self) -> Result<IngestReport>;
    async fn transform(&self, directory: &Directory, ingested: IngestReport)
        -> Result<RoutingResult>;
    async fn load(&self, result: RoutingResult) -> Result<RunReport>;
}
