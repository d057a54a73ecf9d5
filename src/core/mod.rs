pub mod etl;
pub mod export;
pub mod filter;
pub mod ingest;
pub mod partition;
pub mod pipeline;
pub mod report;
pub mod transform;

pub use crate::domain::model::{Directory, OutputRecord, RawRecord};
pub use crate::domain::ports::{
    ConfigProvider, DirectoryStore, EditableDirectoryStore, Pipeline, Storage,
};
pub use crate::utils::error::Result;
